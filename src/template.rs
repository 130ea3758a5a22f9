use std::fmt::Write;

use chrono::{DateTime, TimeZone};
use tracing::warn;

pub const TIME: &str = "{time}";
pub const USERNAME: &str = "{username}";
pub const MESSAGE: &str = "{message}";
pub const CONNECTION_STATUS: &str = "{connectionstatus}";

/// Substitute each `(token, value)` pair into `template`.
///
/// Plain find-and-replace: every occurrence of a token is replaced, order in
/// the template does not matter, and unknown `{...}` text is left alone.
/// Values are inserted verbatim.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |acc, (token, value)| {
            acc.replace(token, value)
        })
}

/// Render `time` with a strftime pattern.
///
/// chrono panics when an invalid pattern is converted with `to_string`, so
/// the pattern is written through `fmt::Write`; on error the raw pattern is
/// returned instead.
pub fn format_timestamp<Tz>(time: &DateTime<Tz>, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    if write!(out, "{}", time.format(pattern)).is_err() {
        warn!("Invalid date format '{}', using it verbatim", pattern);
        return pattern.to_string();
    }
    out
}
