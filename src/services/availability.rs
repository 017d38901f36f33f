use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::models::Booking;
use crate::services::overlap;

/// A slot is full once the number of non-cancelled bookings at that exact
/// grid point reaches the roster size. Capacity is counted across all staff
/// ("any available stylist" semantics), not per resource.
///
/// With an empty roster no slot is ever full: a misconfigured roster must
/// not make the business unbookable.
pub fn is_slot_full(
    bookings: &[Booking],
    staff_count: usize,
    date: NaiveDate,
    time: NaiveTime,
) -> bool {
    staff_count > 0 && overlap::count_at(bookings, date, time) >= staff_count
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotAvailability {
    pub time: String,
    pub full: bool,
}

/// The public widget's slot list for one day: every grid point between
/// `open_hour` (inclusive) and `close_hour` (exclusive), flagged full or
/// not. Re-evaluated on every date change or booking refresh.
pub fn day_slots(
    bookings: &[Booking],
    staff_count: usize,
    date: NaiveDate,
    open_hour: u32,
    close_hour: u32,
    step_minutes: u32,
) -> Vec<SlotAvailability> {
    let step = step_minutes.clamp(1, 60);
    let mut slots = Vec::new();
    for hour in open_hour..close_hour {
        let mut minute = 0;
        while minute < 60 {
            if let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) {
                slots.push(SlotAvailability {
                    time: time.format("%H:%M").to_string(),
                    full: is_slot_full(bookings, staff_count, date, time),
                });
            }
            minute += step;
        }
    }
    slots
}
