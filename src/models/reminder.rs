use serde::{Deserialize, Serialize};

/// One planned posting-nudge notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Absolute trigger time in milliseconds since the Unix epoch.
    pub time_ms: i64,
    pub title: String,
    /// Chosen from [`MESSAGE_POOL`].
    pub body: String,
    /// Deterministic identity `{dayOffset}-{startHour}-{windowIndex}`.
    ///
    /// Shared between a reminder and its eventual notification so the whole
    /// batch can be cancelled by tag-set, and so rebuilding the same lookahead
    /// window from the same instant is reproducible.
    pub tag: String,
}

/// A daily recurring interval `[start, end)` in wall-clock hours and minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationWindow {
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
}

impl NotificationWindow {
    pub const fn new(start_hour: u32, start_minute: u32, end_hour: u32, end_minute: u32) -> Self {
        Self {
            start_hour,
            start_minute,
            end_hour,
            end_minute,
        }
    }

    /// Window start as minutes past midnight.
    pub fn start_minutes(&self) -> u32 {
        self.start_hour * 60 + self.start_minute
    }

    /// Window end as minutes past midnight.
    pub fn end_minutes(&self) -> u32 {
        self.end_hour * 60 + self.end_minute
    }

    /// Coerce a degenerate window (`end <= start`) to a one-hour span anchored
    /// at `start`.
    pub fn normalized(self) -> Self {
        if self.end_minutes() > self.start_minutes() {
            return self;
        }
        let end = self.start_minutes() + 60;
        Self {
            end_hour: end / 60,
            end_minute: end % 60,
            ..self
        }
    }
}

/// The three system-wide nudge windows: morning, midday, evening.
pub const DEFAULT_WINDOWS: [NotificationWindow; 3] = [
    NotificationWindow::new(8, 0, 10, 0),
    NotificationWindow::new(12, 30, 14, 0),
    NotificationWindow::new(19, 0, 21, 30),
];

/// Title shared by every reminder notification.
pub const REMINDER_TITLE: &str = "driftnote";

/// Fixed pool of nudge bodies; the scheduler picks one per reminder.
pub const MESSAGE_POOL: &[&str] = &[
    "What's happening around you? Drop a note.",
    "Leave a little something on the map.",
    "Someone nearby might want to hear from you.",
    "A thought, a mood, a moment. Pin it.",
    "Your corner of the map looks quiet. Change that?",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_keeps_valid_window() {
        let w = NotificationWindow::new(8, 0, 10, 30).normalized();
        assert_eq!(w, NotificationWindow::new(8, 0, 10, 30));
    }

    #[test]
    fn normalized_coerces_inverted_window_to_one_hour() {
        let w = NotificationWindow::new(10, 0, 9, 0).normalized();
        assert_eq!(w.start_minutes(), 10 * 60);
        assert_eq!(w.end_minutes(), 11 * 60);
    }

    #[test]
    fn normalized_coerces_empty_window_to_one_hour() {
        let w = NotificationWindow::new(14, 30, 14, 30).normalized();
        assert_eq!(w.end_hour, 15);
        assert_eq!(w.end_minute, 30);
    }
}
