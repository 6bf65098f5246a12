use chrono::{DateTime, Utc};

/// Hour and minute label shown under chat bubbles, e.g. `"22:13"`.
#[must_use]
pub fn format_message_time(value: DateTime<Utc>) -> String {
    value.format("%H:%M").to_string()
}
