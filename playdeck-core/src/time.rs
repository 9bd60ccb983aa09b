//! Duration formatting for the player panel.

use std::time::Duration;

pub trait DurationExt {
    /// Format as `HH:MM:SS`, truncating to whole seconds.
    ///
    /// Hours are not wrapped, so a 100 hour duration renders as `100:00:00`.
    fn to_hms(&self) -> String;
}

impl DurationExt for Duration {
    fn to_hms(&self) -> String {
        let total = self.as_secs();
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

/// Sum durations, saturating instead of overflowing.
pub fn total_duration<'a>(durations: impl IntoIterator<Item = &'a Duration>) -> Duration {
    durations
        .into_iter()
        .fold(Duration::ZERO, |acc, d| acc.saturating_add(*d))
}
