//! Wall-clock timestamps for `Info` stamps and save-folder names

use chrono::Local;

/// Timestamp format: ISO-like, with `-` instead of `:` so it is a valid path component.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.6f";

/// Current local time as a human-readable string.
///
/// Microsecond resolution, so two folders created in quick succession
/// rarely collide.
#[must_use]
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}
