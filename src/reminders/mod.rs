//! Posting-nudge reminders: window arithmetic, schedule building, and the
//! foreground controller.
//!
//! A schedule is a rolling multi-day batch of randomized trigger times, one
//! per window per day, each carrying a deterministic tag. Rebuilding is always
//! a full replace keyed by those tags, so repeated enables, app reloads, and
//! periodic resyncs can never stack duplicate notifications.

pub mod dispatch;
mod prefs;

pub use prefs::PrefStore;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::models::{NotificationWindow, Reminder, MESSAGE_POOL, REMINDER_TITLE};
use dispatch::NotificationDelivery;

/// Days of reminders planned ahead on the trigger-capable path.
pub const LOOKAHEAD_DAYS: u32 = 3;

/// Draw one trigger instant inside the window anchored at `day_start`.
///
/// Returns `None` when the window has already passed relative to `now_ms`, or
/// when the drawn instant is not strictly in the future (clock skew and
/// boundary-rounding guard). A window already underway is clamped so the draw
/// never lands in its past portion.
pub(crate) fn draw_in_window(
    day_start: DateTime<Utc>,
    window: &NotificationWindow,
    now_ms: i64,
    rng: &mut impl Rng,
) -> Option<i64> {
    let start_ms = (day_start + Duration::minutes(window.start_minutes() as i64)).timestamp_millis();
    let end_ms = (day_start + Duration::minutes(window.end_minutes() as i64)).timestamp_millis();
    if now_ms >= end_ms {
        return None;
    }
    let effective_start = start_ms.max(now_ms);
    let drawn = rng.gen_range(effective_start..end_ms);
    (drawn > now_ms).then_some(drawn)
}

/// Compute the rolling reminder schedule: one uniformly random trigger per
/// window per day for `lookahead_days` days, skipping window-days that have
/// already passed.
///
/// Produces at most `lookahead_days * windows.len()` reminders. Tags are
/// `{dayOffset}-{startHour}-{windowIndex}`, so rebuilding the same lookahead
/// from the same instant yields the same tag set.
pub fn build_schedule(
    now: DateTime<Utc>,
    lookahead_days: u32,
    windows: &[NotificationWindow],
    rng: &mut impl Rng,
) -> Vec<Reminder> {
    let now_ms = now.timestamp_millis();
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_utc();

    let mut reminders = Vec::new();
    for day_offset in 0..lookahead_days {
        let day_start = midnight + Duration::days(day_offset as i64);
        for (index, window) in windows.iter().enumerate() {
            let window = window.normalized();
            let Some(time_ms) = draw_in_window(day_start, &window, now_ms, rng) else {
                continue;
            };
            reminders.push(Reminder {
                time_ms,
                title: REMINDER_TITLE.to_string(),
                body: MESSAGE_POOL[rng.gen_range(0..MESSAGE_POOL.len())].to_string(),
                tag: format!("{}-{}-{}", day_offset, window.start_hour, index),
            });
        }
    }
    reminders
}

/// Foreground controller for the reminder subsystem.
///
/// Owns the enabled preference and drives full-replace rescheduling through
/// whichever delivery strategy was injected at startup. Nothing else about a
/// schedule is persisted; it is recomputed on every (re)trigger.
pub struct ReminderEngine {
    delivery: Arc<dyn NotificationDelivery>,
    prefs: Arc<PrefStore>,
    windows: Vec<NotificationWindow>,
}

impl ReminderEngine {
    pub fn new(
        delivery: Arc<dyn NotificationDelivery>,
        prefs: Arc<PrefStore>,
        windows: Vec<NotificationWindow>,
    ) -> Self {
        Self {
            delivery,
            prefs,
            windows,
        }
    }

    /// Turn reminders on and build a fresh schedule. Always cancel-then-arm,
    /// so enabling twice leaves exactly one batch armed.
    pub fn enable(&self, now: DateTime<Utc>, rng: &mut impl Rng) {
        self.prefs.set_enabled(true);
        self.reschedule(now, rng);
    }

    /// Recompute the schedule if the preference is on (app reload with a
    /// persisted preference, periodic resync).
    pub fn resync(&self, now: DateTime<Utc>, rng: &mut impl Rng) {
        if self.prefs.enabled() {
            self.reschedule(now, rng);
        }
    }

    /// Turn reminders off and cancel everything armed. By the time this
    /// returns no previously armed notification will fire.
    pub fn disable(&self) {
        self.prefs.set_enabled(false);
        self.delivery.cancel_all();
    }

    pub fn enabled(&self) -> bool {
        self.prefs.enabled()
    }

    fn reschedule(&self, now: DateTime<Utc>, rng: &mut impl Rng) {
        let batch = build_schedule(now, LOOKAHEAD_DAYS, &self.windows, rng);
        tracing::debug!("Scheduling {} reminders", batch.len());
        // The strategy cancels everything previously armed before arming.
        self.delivery.schedule_batch(&batch);
    }
}
