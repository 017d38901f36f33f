use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

/// Rounds the minute component to the nearest multiple of `step_minutes`
/// (half-up), rolling over hour and day boundaries. Every pointer-derived
/// time goes through this so results always land on bookable grid lines.
pub fn quantize(dt: NaiveDateTime, step_minutes: u32) -> NaiveDateTime {
    if step_minutes == 0 {
        return dt;
    }
    let step = i64::from(step_minutes) * 60;
    let day_start = dt.date().and_time(NaiveTime::MIN);
    let seconds = (dt - day_start).num_seconds();
    let rounded = (seconds + step / 2) / step * step;
    day_start + Duration::seconds(rounded)
}

/// Hour tick labels for the planner's time column, inclusive of both bounds:
/// `hour_labels(0, 23)` yields "00:00" through "23:00".
pub fn hour_labels(start_hour: u32, end_hour: u32) -> Vec<String> {
    (start_hour..=end_hour).map(|h| format!("{h:02}:00")).collect()
}

/// Converts a vertical pixel offset inside the day grid to a time of day.
/// Returns `None` when the offset falls outside the representable day.
pub fn pixel_offset_to_time(offset_px: f64, px_per_hour: f64, start_hour: u32) -> Option<NaiveTime> {
    if px_per_hour <= 0.0 {
        return None;
    }
    let hours_from_start = offset_px / px_per_hour;
    let total_minutes = (f64::from(start_hour) + hours_from_start) * 60.0;
    let rounded = total_minutes.round();
    if rounded < 0.0 || rounded >= 24.0 * 60.0 {
        return None;
    }
    let minutes = rounded as u32;
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

/// Inverse of [`pixel_offset_to_time`]; round-trips exactly for whole-minute
/// times, and within one pixel otherwise.
pub fn time_to_pixel_offset(time: NaiveTime, px_per_hour: f64, start_hour: u32) -> f64 {
    let hours = f64::from(time.hour()) + f64::from(time.minute()) / 60.0;
    (hours - f64::from(start_hour)) * px_per_hour
}
