use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::models::{AvailabilitySlot, DayOfWeek};

/// Minutes in a full day; also the value "24:00" parses to
pub const MINUTES_PER_DAY: u32 = 1440;

/// Parse an "HH:MM" wall-clock string into minutes since midnight
///
/// Seconds, when present ("HH:MM:SS"), are ignored. "24:00" is accepted
/// as end-of-day and parses to 1440.
///
/// # Returns
/// Minutes since midnight, or None for malformed input
pub fn parse_time_minutes(value: &str) -> Option<u32> {
    let mut parts = value.split(':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = parts.next()?.trim().parse().ok()?;

    if hours == 24 && minutes == 0 {
        return Some(MINUTES_PER_DAY);
    }
    if hours > 23 || minutes > 59 {
        return None;
    }

    Some(hours * 60 + minutes)
}

/// Requested session window as (day, start, end) in minutes since midnight
///
/// The end is exclusive. A session that crosses midnight produces an end
/// past 1440, which no weekly window can contain, so it never matches.
pub fn requested_window(
    scheduled_date: DateTime<Utc>,
    duration_minutes: u32,
) -> (DayOfWeek, u32, u32) {
    let start = scheduled_date.hour() * 60 + scheduled_date.minute();
    (
        DayOfWeek::from(scheduled_date.weekday()),
        start,
        start + duration_minutes,
    )
}

/// Check if a single slot fully contains [start, end)
///
/// Slots flagged unavailable or carrying unparseable times never match.
#[inline]
pub fn slot_contains(slot: &AvailabilitySlot, start: u32, end: u32) -> bool {
    if !slot.is_available {
        return false;
    }
    let slot_start = match parse_time_minutes(&slot.start_time) {
        Some(minutes) => minutes,
        None => return false,
    };
    let slot_end = match parse_time_minutes(&slot.end_time) {
        Some(minutes) => minutes,
        None => return false,
    };

    slot_start <= start && end <= slot_end
}

/// Check if any weekly window covers the full requested session
///
/// # Arguments
/// * `availability` - The trainer's weekly windows
/// * `scheduled_date` - Requested session start (UTC)
/// * `duration_minutes` - Requested session length
///
/// # Returns
/// true when one window on the right weekday contains the whole session
pub fn covers_requested_slot(
    availability: &[AvailabilitySlot],
    scheduled_date: DateTime<Utc>,
    duration_minutes: u32,
) -> bool {
    let (day, start, end) = requested_window(scheduled_date, duration_minutes);

    availability
        .iter()
        .filter(|slot| slot.day_of_week == day)
        .any(|slot| slot_contains(slot, start, end))
}

/// Sum of weekly bookable hours across available windows
///
/// Unparseable or inverted windows contribute nothing.
pub fn weekly_available_hours(availability: &[AvailabilitySlot]) -> f64 {
    availability
        .iter()
        .filter(|slot| slot.is_available)
        .filter_map(|slot| {
            let start = parse_time_minutes(&slot.start_time)?;
            let end = parse_time_minutes(&slot.end_time)?;
            if end > start {
                Some((end - start) as f64 / 60.0)
            } else {
                None
            }
        })
        .sum()
}
