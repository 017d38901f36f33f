use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::service;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub client_name: String,
    pub client_phone: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: i32,
    pub service_name: Option<String>,
    /// `None` means "unassigned / first available stylist".
    pub staff_id: Option<String>,
    pub status: BookingStatus,
    pub reminder_sent: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn start_date_time(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Derived, never persisted. Bad durations are clamped to one grid step
    /// so a corrupt row cannot break overlap tests or rendering.
    pub fn end_date_time(&self) -> NaiveDateTime {
        let minutes = self.duration_minutes.max(service::MIN_DURATION_MINUTES);
        self.start_date_time() + Duration::minutes(minutes as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Confirmed,
        }
    }
}

/// Allow-listed partial update for PATCH: only these fields can ever reach
/// a SET clause, whatever the request body contained.
#[derive(Debug, Default, Clone)]
pub struct BookingUpdate {
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub service_name: Option<String>,
    pub staff_id: Option<String>,
    pub status: Option<BookingStatus>,
    pub notes: Option<String>,
}
