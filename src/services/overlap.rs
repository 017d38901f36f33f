use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::{Booking, BookingStatus};

/// Half-open interval overlap: `[a_start, a_end)` against `[b_start, b_end)`.
/// Touching intervals (one ends exactly when the other starts) do not
/// overlap; this boundary drives both conflict detection and column packing.
pub fn overlaps(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Number of non-cancelled bookings sitting on exactly this (date, time)
/// slot. Slot-based, not continuous: the public widget books on a fixed
/// grid, so capacity is counted per grid point.
pub fn count_at(bookings: &[Booking], date: NaiveDate, time: NaiveTime) -> usize {
    bookings
        .iter()
        .filter(|b| b.status != BookingStatus::Cancelled && b.date == date && b.time == time)
        .count()
}

/// First confirmed booking for `staff_id` whose interval overlaps
/// `[start, end)`, skipping `exclude_id` (the booking being moved/edited).
/// Unassigned bookings never conflict with each other here; their capacity
/// is governed by the slot-full rule instead.
pub fn find_conflict<'a>(
    bookings: &'a [Booking],
    staff_id: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    exclude_id: Option<&str>,
) -> Option<&'a Booking> {
    bookings.iter().find(|b| {
        b.status == BookingStatus::Confirmed
            && b.staff_id.as_deref() == Some(staff_id)
            && exclude_id != Some(b.id.as_str())
            && overlaps(b.start_date_time(), b.end_date_time(), start, end)
    })
}
