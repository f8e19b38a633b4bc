//! Notification delivery strategies and the control-message worker.
//!
//! The runtime's capability is probed once at startup and the matching
//! [`NotificationDelivery`] strategy is injected; nothing downstream branches
//! on capability again. A missing deferred-trigger mechanism is normal
//! degradation to the timer path, not an error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::{NotificationWindow, Reminder, MESSAGE_POOL, REMINDER_TITLE};
use crate::now_ms;
use crate::reminders::{draw_in_window, PrefStore};

/// The runtime lost permission to present notifications. Treated as an
/// implicit disable, never retried.
#[derive(Debug, thiserror::Error)]
#[error("notification capability revoked")]
pub struct CapabilityRevoked;

/// Presents notifications to whatever surface the runtime offers.
pub trait NotificationSink: Send + Sync {
    /// Whether deferred triggers that outlive this process can be armed.
    fn supports_deferred_triggers(&self) -> bool;

    fn show(&self, reminder: &Reminder) -> Result<(), CapabilityRevoked>;
}

/// Sink for headless runs: notifications land in the log.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn supports_deferred_triggers(&self) -> bool {
        false
    }

    fn show(&self, reminder: &Reminder) -> Result<(), CapabilityRevoked> {
        tracing::info!("Notification [{}]: {} - {}", reminder.tag, reminder.title, reminder.body);
        Ok(())
    }
}

/// Delivery mechanism available on this runtime, probed once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    DeferredTrigger,
    TimerFallback,
}

impl Capability {
    pub fn detect(sink: &dyn NotificationSink) -> Self {
        if sink.supports_deferred_triggers() {
            Capability::DeferredTrigger
        } else {
            Capability::TimerFallback
        }
    }
}

/// One delivery strategy: either the persistent trigger registry or the
/// in-process timer chain. Rescheduling through either is a full replace.
pub trait NotificationDelivery: Send + Sync {
    /// Replace everything armed with this batch. Cancel-then-arm, never
    /// additive.
    fn schedule_batch(&self, batch: &[Reminder]);

    /// Cancel everything armed. When this returns, nothing previously armed
    /// will fire.
    fn cancel_all(&self);

    fn show_now(&self, reminder: &Reminder) -> Result<(), CapabilityRevoked>;
}

/// Build the strategy matching the detected capability.
pub fn select_delivery(
    capability: Capability,
    sink: Arc<dyn NotificationSink>,
    windows: Vec<NotificationWindow>,
    prefs: Arc<PrefStore>,
) -> Arc<dyn NotificationDelivery> {
    match capability {
        Capability::DeferredTrigger => Arc::new(TriggerDelivery {
            registry: Arc::new(TriggerRegistry::default()),
            sink,
        }),
        Capability::TimerFallback => {
            tracing::debug!("Deferred triggers unavailable, using timer fallback");
            Arc::new(TimerDelivery::new(sink, windows, prefs))
        }
    }
}

// ============================================================
// Trigger path
// ============================================================

/// Stand-in for the out-of-process trigger scheduler: armed reminders keyed
/// by tag, surviving independently of the engine that armed them.
#[derive(Default)]
pub struct TriggerRegistry {
    armed: Mutex<HashMap<String, Reminder>>,
}

impl TriggerRegistry {
    pub fn arm(&self, reminder: Reminder) {
        self.armed
            .lock()
            .expect("trigger registry lock poisoned")
            .insert(reminder.tag.clone(), reminder);
    }

    /// Remove every armed entry, whatever its tag looks like. Entries armed
    /// by older builds with unrecognizable tags must not survive a sweep.
    pub fn sweep_all(&self) -> usize {
        let mut armed = self.armed.lock().expect("trigger registry lock poisoned");
        let removed = armed.len();
        armed.clear();
        removed
    }

    pub fn armed_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .armed
            .lock()
            .expect("trigger registry lock poisoned")
            .keys()
            .cloned()
            .collect();
        tags.sort();
        tags
    }

    pub fn armed_len(&self) -> usize {
        self.armed
            .lock()
            .expect("trigger registry lock poisoned")
            .len()
    }
}

/// Persistent-trigger strategy: the whole batch is handed to the registry and
/// outlives the process that armed it.
pub struct TriggerDelivery {
    registry: Arc<TriggerRegistry>,
    sink: Arc<dyn NotificationSink>,
}

impl TriggerDelivery {
    pub fn new(registry: Arc<TriggerRegistry>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { registry, sink }
    }

    pub fn registry(&self) -> Arc<TriggerRegistry> {
        self.registry.clone()
    }
}

impl NotificationDelivery for TriggerDelivery {
    fn schedule_batch(&self, batch: &[Reminder]) {
        let swept = self.registry.sweep_all();
        if swept > 0 {
            tracing::debug!("Swept {} previously armed triggers", swept);
        }
        for reminder in batch {
            self.registry.arm(reminder.clone());
        }
    }

    fn cancel_all(&self) {
        self.registry.sweep_all();
    }

    fn show_now(&self, reminder: &Reminder) -> Result<(), CapabilityRevoked> {
        self.sink.show(reminder)
    }
}

// ============================================================
// Timer fallback path
// ============================================================

struct TimerBatch {
    handles: Vec<JoinHandle<()>>,
    cancelled: Arc<AtomicBool>,
}

/// In-process fallback: one repeating task per window, each firing once per
/// day and re-arming itself for the next. Requires the process to stay alive.
pub struct TimerDelivery {
    sink: Arc<dyn NotificationSink>,
    windows: Vec<NotificationWindow>,
    prefs: Arc<PrefStore>,
    batch: Mutex<Option<TimerBatch>>,
}

impl TimerDelivery {
    pub fn new(
        sink: Arc<dyn NotificationSink>,
        windows: Vec<NotificationWindow>,
        prefs: Arc<PrefStore>,
    ) -> Self {
        Self {
            sink,
            windows,
            prefs,
            batch: Mutex::new(None),
        }
    }

    fn teardown(&self) {
        let mut slot = self.batch.lock().expect("timer batch lock poisoned");
        if let Some(old) = slot.take() {
            old.cancelled.store(true, Ordering::SeqCst);
            for handle in old.handles {
                handle.abort();
            }
        }
    }
}

impl NotificationDelivery for TimerDelivery {
    fn schedule_batch(&self, _batch: &[Reminder]) {
        // The fallback path schedules from the windows themselves, one day at
        // a time; the multi-day batch only matters on the trigger path.
        self.teardown();

        let cancelled = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::with_capacity(self.windows.len());
        for (index, window) in self.windows.iter().enumerate() {
            handles.push(tokio::spawn(run_window_timer(
                self.sink.clone(),
                self.prefs.clone(),
                window.normalized(),
                index,
                cancelled.clone(),
            )));
        }

        *self.batch.lock().expect("timer batch lock poisoned") = Some(TimerBatch {
            handles,
            cancelled,
        });
    }

    fn cancel_all(&self) {
        self.teardown();
    }

    fn show_now(&self, reminder: &Reminder) -> Result<(), CapabilityRevoked> {
        self.sink.show(reminder)
    }
}

struct FiringPlan {
    target_ms: i64,
    /// End of the window-day the target belongs to. The next draw starts
    /// here, so one window never fires twice on the same day.
    window_end_ms: i64,
    tag: String,
    body: String,
}

/// Wait out a drawn instant inside the window, fire once, re-arm for the next
/// day. Exits when cancelled or when the sink reports the capability revoked;
/// revocation also tears down the sibling timers via the shared flag and
/// clears the enabled preference.
async fn run_window_timer(
    sink: Arc<dyn NotificationSink>,
    prefs: Arc<PrefStore>,
    window: NotificationWindow,
    index: usize,
    cancelled: Arc<AtomicBool>,
) {
    let mut after_ms = now_ms();
    loop {
        let Some(plan) = next_firing(&window, index, after_ms) else {
            tracing::warn!("Window timer could not plan a next firing, stopping");
            return;
        };

        let wait = (plan.target_ms - now_ms()).max(0) as u64;
        tokio::time::sleep(Duration::from_millis(wait)).await;

        if cancelled.load(Ordering::SeqCst) {
            return;
        }

        let reminder = Reminder {
            time_ms: plan.target_ms,
            title: REMINDER_TITLE.to_string(),
            body: plan.body,
            tag: plan.tag,
        };
        if sink.show(&reminder).is_err() {
            tracing::warn!("Notification capability revoked, disabling reminders");
            cancelled.store(true, Ordering::SeqCst);
            prefs.set_enabled(false);
            return;
        }

        // This window-day is done; the next draw lands on a later day.
        after_ms = plan.window_end_ms;
    }
}

/// Next instant this window fires, drawn at or after `after_ms`: the
/// remaining span of that day's window, or the next day's full span once it
/// has passed.
fn next_firing(window: &NotificationWindow, index: usize, after_ms: i64) -> Option<FiringPlan> {
    let after = DateTime::<Utc>::from_timestamp_millis(after_ms)?;
    let midnight = after.date_naive().and_hms_opt(0, 0, 0)?.and_utc();

    let mut rng = rand::thread_rng();
    let (day_offset, day_start, target_ms) =
        match draw_in_window(midnight, window, after_ms, &mut rng) {
            Some(ms) => (0, midnight, ms),
            None => {
                let next_day = midnight + ChronoDuration::days(1);
                (1, next_day, draw_in_window(next_day, window, after_ms, &mut rng)?)
            }
        };
    let window_end_ms =
        (day_start + ChronoDuration::minutes(window.end_minutes() as i64)).timestamp_millis();
    let body = MESSAGE_POOL[rng.gen_range(0..MESSAGE_POOL.len())].to_string();
    Some(FiringPlan {
        target_ms,
        window_end_ms,
        tag: format!("{}-{}-{}", day_offset, window.start_hour, index),
        body,
    })
}

// ============================================================
// Control-message channel
// ============================================================

/// Messages from the foreground context to the delivery worker. Sends are
/// fire-and-forget; no acknowledgement flows back.
#[derive(Debug, Clone)]
pub enum ControlMessage {
    ScheduleReminders { reminders: Vec<Reminder> },
    CancelReminders,
    ShowNow { title: String, body: String, tag: String },
}

/// Handle for posting control messages to the delivery worker.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<ControlMessage>,
}

impl Dispatcher {
    /// Spawn the worker that applies control messages against the injected
    /// delivery strategy. A revoked capability reported while showing an
    /// immediate notification tears the schedule down and clears the enabled
    /// preference.
    pub fn spawn(
        delivery: Arc<dyn NotificationDelivery>,
        prefs: Arc<PrefStore>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<ControlMessage>();
        let handle = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message {
                    ControlMessage::ScheduleReminders { reminders } => {
                        delivery.schedule_batch(&reminders);
                    }
                    ControlMessage::CancelReminders => {
                        delivery.cancel_all();
                    }
                    ControlMessage::ShowNow { title, body, tag } => {
                        let reminder = Reminder {
                            time_ms: now_ms(),
                            title,
                            body,
                            tag,
                        };
                        if delivery.show_now(&reminder).is_err() {
                            tracing::warn!(
                                "Notification capability revoked, tearing down schedule"
                            );
                            delivery.cancel_all();
                            prefs.set_enabled(false);
                        }
                    }
                }
            }
        });
        (Self { tx }, handle)
    }

    pub fn send(&self, message: ControlMessage) {
        if self.tx.send(message).is_err() {
            tracing::warn!("Delivery worker is gone, dropping control message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reminder(tag: &str) -> Reminder {
        Reminder {
            time_ms: 0,
            title: REMINDER_TITLE.to_string(),
            body: "test".to_string(),
            tag: tag.to_string(),
        }
    }

    #[test]
    fn sweep_removes_entries_with_foreign_tags() {
        let registry = TriggerRegistry::default();
        registry.arm(reminder("0-8-0"));
        registry.arm(reminder("legacy-opaque-tag"));

        assert_eq!(registry.sweep_all(), 2);
        assert_eq!(registry.armed_len(), 0);
    }

    #[test]
    fn schedule_batch_replaces_previous_batch() {
        let delivery = TriggerDelivery::new(Arc::new(TriggerRegistry::default()), Arc::new(LogSink));
        let registry = delivery.registry();

        delivery.schedule_batch(&[reminder("0-8-0"), reminder("1-8-0")]);
        delivery.schedule_batch(&[reminder("0-12-1")]);

        assert_eq!(registry.armed_tags(), vec!["0-12-1"]);
    }

    #[test]
    fn capability_detection_follows_the_sink() {
        assert_eq!(Capability::detect(&LogSink), Capability::TimerFallback);

        struct TriggerSink;
        impl NotificationSink for TriggerSink {
            fn supports_deferred_triggers(&self) -> bool {
                true
            }
            fn show(&self, _: &Reminder) -> Result<(), CapabilityRevoked> {
                Ok(())
            }
        }
        assert_eq!(Capability::detect(&TriggerSink), Capability::DeferredTrigger);
    }
}
