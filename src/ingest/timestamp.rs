//! Creation timestamp parsing and the lookback cutoff.
//!
//! Zoned timestamps keep their wall-clock reading: the offset is dropped, not
//! applied, before comparing against a naive cutoff.

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

const DATE_ONLY: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const CLOCK: &[FormatItem<'static>] = format_description!(
    "[hour][optional [:[minute][optional [:[second][optional [.[subsecond]]]]]]]"
);
const OFFSET: &[FormatItem<'static>] = format_description!(
    "[offset_hour sign:mandatory][optional [:[offset_minute][optional [:[offset_second]]]]]"
);
const OFFSET_COMPACT: &[FormatItem<'static>] =
    format_description!("[offset_hour sign:mandatory][offset_minute]");

/// Parses an ISO-8601 creation timestamp into a naive date-time.
///
/// Accepts `YYYY-MM-DD`, optionally followed by `T`, `t` or a space and a
/// clock of `HH[:MM[:SS[.fraction]]]`, optionally followed by `Z` or a
/// `+HH[:MM[:SS]]` / `+HHMM` offset. The input is not trimmed.
pub fn parse_created_at(value: &str) -> Option<PrimitiveDateTime> {
    let date = Date::parse(value.get(..10)?, DATE_ONLY).ok()?;
    let rest = &value[10..];
    if rest.is_empty() {
        return Some(date.midnight());
    }

    let rest = rest.strip_prefix(&['T', 't', ' '][..])?;
    let (clock, offset) = match rest.find(&['Z', 'z', '+', '-'][..]) {
        Some(idx) => (&rest[..idx], Some(&rest[idx..])),
        None => (rest, None),
    };
    let time = Time::parse(clock, CLOCK).ok()?;
    if let Some(offset) = offset {
        if !is_offset(offset) {
            return None;
        }
    }
    Some(PrimitiveDateTime::new(date, time))
}

fn is_offset(value: &str) -> bool {
    matches!(value, "Z" | "z")
        || UtcOffset::parse(value, OFFSET).is_ok()
        || UtcOffset::parse(value, OFFSET_COMPACT).is_ok()
}

/// Current local wall-clock time, or UTC when the local offset is unknown.
pub fn local_now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    PrimitiveDateTime::new(now.date(), now.time())
}

pub fn cutoff_from(now: PrimitiveDateTime, lookback_days: u32) -> PrimitiveDateTime {
    now.saturating_sub(Duration::days(i64::from(lookback_days)))
}

pub fn format_date(value: PrimitiveDateTime) -> String {
    let date = value.date();
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month() as u8,
        date.day()
    )
}
