//! Parsing of `LastUsedDate` values.
//!
//! The canonical layout is `YYYY-MM-DD HH:MM:SS.ffffff+HH:MM`. Strict mode
//! accepts only that layout; lenient mode also takes RFC 3339, any fraction
//! length (or none) and offsets written as `+HHMM` or `+HH`.

use time::{format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampParsing {
    #[default]
    Strict,
    Lenient,
}

/// Returns `None` for anything the mode does not accept.
pub fn parse(value: &str, mode: TimestampParsing) -> Option<OffsetDateTime> {
    match mode {
        TimestampParsing::Strict => parse_strict(value),
        TimestampParsing::Lenient => parse_lenient(value.trim()),
    }
}

fn parse_strict(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(
        value,
        format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6][offset_hour sign:mandatory]:[offset_minute]"
        ),
    )
    .ok()
}

fn parse_lenient(value: &str) -> Option<OffsetDateTime> {
    parse_strict(value)
        .or_else(|| OffsetDateTime::parse(value, &Rfc3339).ok())
        .or_else(|| {
            OffsetDateTime::parse(
                value,
                format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]][offset_hour sign:mandatory]:[offset_minute]"
                ),
            )
            .ok()
        })
        .or_else(|| {
            OffsetDateTime::parse(
                value,
                format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]][offset_hour sign:mandatory][offset_minute]"
                ),
            )
            .ok()
        })
        .or_else(|| {
            OffsetDateTime::parse(
                value,
                format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]][offset_hour sign:mandatory]"
                ),
            )
            .ok()
        })
}

/// Renders a timestamp in the canonical layout, normalized to UTC.
pub fn format_canonical(value: OffsetDateTime) -> Result<String, time::error::Format> {
    value.to_offset(UtcOffset::UTC).format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6][offset_hour sign:mandatory]:[offset_minute]"
    ))
}
