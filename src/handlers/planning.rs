use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::BookingStatus;
use crate::services::availability::{self, SlotAvailability};
use crate::services::layout::{self, CalendarEvent};
use crate::services::timegrid;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DayQuery {
    pub date: String,
}

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {s}")))
}

// GET /api/availability?date=YYYY-MM-DD — the widget's slot picker data.
#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub date: String,
    pub slots: Vec<SlotAvailability>,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DayQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let date = parse_date(&query.date)?;

    let (bookings, staff_count) = {
        let db = state.db.lock().unwrap();
        (
            queries::list_bookings(&db, Some(date))?,
            queries::list_staff(&db)?.len(),
        )
    };

    let slots = availability::day_slots(
        &bookings,
        staff_count,
        date,
        state.config.open_hour,
        state.config.close_hour,
        state.config.slot_step_minutes,
    );
    Ok(Json(AvailabilityResponse {
        date: query.date,
        slots,
    }))
}

// GET /api/planning/day?date=YYYY-MM-DD — events with column layout, the
// exact data the day planner renders.
#[derive(Serialize)]
pub struct PlannedEvent {
    pub id: String,
    pub title: String,
    pub staff_id: Option<String>,
    pub staff_name: Option<String>,
    pub staff_color: Option<String>,
    pub start: String,
    pub end: String,
    pub column_index: usize,
    pub total_columns: usize,
}

#[derive(Serialize)]
pub struct PlanningDayResponse {
    pub date: String,
    pub hour_labels: Vec<String>,
    pub events: Vec<PlannedEvent>,
}

pub async fn get_planning_day(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DayQuery>,
) -> Result<Json<PlanningDayResponse>, AppError> {
    let date = parse_date(&query.date)?;

    let (bookings, staff) = {
        let db = state.db.lock().unwrap();
        (queries::list_bookings(&db, Some(date))?, queries::list_staff(&db)?)
    };

    let events: Vec<CalendarEvent> = bookings
        .iter()
        .filter(|b| b.status != BookingStatus::Cancelled)
        .map(CalendarEvent::from_booking)
        .collect();

    let positioned = layout::layout_day(&events);

    let events = positioned
        .into_iter()
        .map(|p| {
            // Orphaned staff references resolve to no column metadata rather
            // than an error.
            let member = p
                .event
                .staff_id
                .as_deref()
                .and_then(|id| staff.iter().find(|s| s.id == id));
            PlannedEvent {
                id: p.event.id,
                title: p.event.title,
                staff_id: p.event.staff_id.clone(),
                staff_name: member.map(|s| s.name.clone()),
                staff_color: member.map(|s| s.color.clone()),
                start: p.event.start.format("%Y-%m-%d %H:%M").to_string(),
                end: p.event.end.format("%Y-%m-%d %H:%M").to_string(),
                column_index: p.layout.column_index,
                total_columns: p.layout.total_columns,
            }
        })
        .collect();

    Ok(Json(PlanningDayResponse {
        date: query.date,
        hour_labels: timegrid::hour_labels(0, 23),
        events,
    }))
}
