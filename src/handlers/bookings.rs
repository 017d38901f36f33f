use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::require_admin;
use crate::models::{service, Booking, BookingStatus, BookingUpdate};
use crate::services::{overlap, phone, reschedule, timegrid};
use crate::state::AppState;

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|_| AppError::Validation(format!("invalid date: {s}")))
}

fn parse_time(s: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(s, TIME_FMT)
        .map_err(|_| AppError::Validation(format!("invalid time: {s}")))
}

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub client_name: String,
    pub client_phone: String,
    pub date: String,
    pub time: String,
    pub end_time: String,
    pub duration_minutes: i32,
    pub service_name: Option<String>,
    pub staff_id: Option<String>,
    pub status: String,
    pub reminder_sent: bool,
    pub notes: Option<String>,
}

impl BookingResponse {
    fn from_booking(b: &Booking) -> Self {
        Self {
            id: b.id.clone(),
            client_name: b.client_name.clone(),
            client_phone: b.client_phone.clone(),
            date: b.date.format(DATE_FMT).to_string(),
            time: b.time.format(TIME_FMT).to_string(),
            end_time: b.end_date_time().format(TIME_FMT).to_string(),
            duration_minutes: b.duration_minutes,
            service_name: b.service_name.clone(),
            staff_id: b.staff_id.clone(),
            status: b.status.as_str().to_string(),
            reminder_sent: b.reminder_sent,
            notes: b.notes.clone(),
        }
    }
}

// GET /api/bookings?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub date: Option<String>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let date = query.date.as_deref().map(parse_date).transpose()?;
    let bookings = {
        let db = state.db.lock().unwrap();
        queries::list_bookings(&db, date)?
    };
    Ok(Json(bookings.iter().map(BookingResponse::from_booking).collect()))
}

// POST /api/bookings — public widget and admin form both land here.
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub client_name: String,
    pub client_phone: String,
    pub date: String,
    pub time: String,
    pub duration_minutes: Option<i32>,
    pub service_name: Option<String>,
    pub staff_id: Option<String>,
    pub notes: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    if req.client_name.trim().is_empty() {
        return Err(AppError::Validation("client_name is required".to_string()));
    }
    let chat = phone::chat_id(
        &req.client_phone,
        &state.config.country_code,
        state.config.national_number_len,
    )
    .ok_or_else(|| AppError::Validation(format!("invalid phone: {}", req.client_phone)))?;

    let date = parse_date(&req.date)?;
    let time = parse_time(&req.time)?;
    let duration = match req.duration_minutes {
        Some(d) if d >= 1 => d,
        Some(d) => return Err(AppError::Validation(format!("invalid duration: {d}"))),
        None => service::default_duration(req.service_name.as_deref()),
    };

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        client_name: req.client_name.trim().to_string(),
        client_phone: req.client_phone.clone(),
        date,
        time,
        duration_minutes: duration,
        service_name: req.service_name,
        staff_id: req.staff_id,
        status: BookingStatus::Confirmed,
        reminder_sent: false,
        notes: req.notes,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        if let Some(staff_id) = booking.staff_id.as_deref() {
            let day = queries::list_bookings(&db, Some(date))?;
            if let Some(existing) = overlap::find_conflict(
                &day,
                staff_id,
                booking.start_date_time(),
                booking.end_date_time(),
                None,
            ) {
                return Err(AppError::Conflict(format!(
                    "staff member already booked at {}",
                    existing.time.format(TIME_FMT)
                )));
            }
        }
        queries::create_booking(&db, &booking)?;
    }

    // Confirmation is best-effort: a messaging failure never reverts the
    // booking, the client just doesn't get the WhatsApp note.
    let text = format!(
        "Votre réservation est confirmée pour le {} à {}.",
        booking.date.format("%d/%m/%Y"),
        booking.time.format(TIME_FMT),
    );
    if let Err(e) = state.messaging.send_message(&chat, &text).await {
        tracing::warn!(booking_id = %booking.id, error = %e, "confirmation send failed");
    }

    Ok((StatusCode::CREATED, Json(BookingResponse::from_booking(&booking))))
}

// PATCH /api/bookings/:id
#[derive(Deserialize)]
pub struct UpdateBookingRequest {
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub service_name: Option<String>,
    pub staff_id: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    require_admin(&headers, state.auth.as_ref())?;

    let update = BookingUpdate {
        client_name: req.client_name,
        client_phone: req.client_phone,
        date: req.date.as_deref().map(parse_date).transpose()?,
        time: req.time.as_deref().map(parse_time).transpose()?,
        duration_minutes: req.duration_minutes,
        service_name: req.service_name,
        staff_id: req.staff_id,
        status: req.status.as_deref().map(BookingStatus::from_str),
        notes: req.notes,
    };

    let db = state.db.lock().unwrap();
    let existing = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    // Merge to the post-update picture before checking for a double booking.
    let mut merged = existing.clone();
    if let Some(v) = update.date {
        merged.date = v;
    }
    if let Some(v) = update.time {
        merged.time = v;
    }
    if let Some(v) = update.duration_minutes {
        merged.duration_minutes = v;
    }
    if let Some(v) = &update.staff_id {
        merged.staff_id = Some(v.clone());
    }
    if let Some(v) = &update.status {
        merged.status = v.clone();
    }

    if merged.status == BookingStatus::Confirmed {
        if let Some(staff_id) = merged.staff_id.as_deref() {
            let day = queries::list_bookings(&db, Some(merged.date))?;
            if overlap::find_conflict(
                &day,
                staff_id,
                merged.start_date_time(),
                merged.end_date_time(),
                Some(&id),
            )
            .is_some()
            {
                return Err(AppError::Conflict(
                    "staff member already booked in that interval".to_string(),
                ));
            }
        }
    }

    queries::update_booking_fields(&db, &id, &update)?;
    let refreshed = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    Ok(Json(BookingResponse::from_booking(&refreshed)))
}

// POST /api/bookings/:id/move — drag-to-reschedule drop target.
#[derive(Deserialize)]
pub struct MoveBookingRequest {
    pub date: String,
    pub time: String,
    pub staff_id: Option<String>,
}

pub async fn move_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<MoveBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    require_admin(&headers, state.auth.as_ref())?;

    let date = parse_date(&req.date)?;
    let time = parse_time(&req.time)?;
    // Drops snap to the grid even if the client sent a raw pointer time.
    let start = timegrid::quantize(date.and_time(time), reschedule::DRAG_SNAP_MINUTES);

    let db = state.db.lock().unwrap();
    let mut booking = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    booking.date = start.date();
    booking.time = start.time();
    // Absent staff_id keeps the current column.
    if let Some(staff) = &req.staff_id {
        booking.staff_id = Some(staff.clone());
    }

    if let Some(staff_id) = booking.staff_id.as_deref() {
        let day = queries::list_bookings(&db, Some(booking.date))?;
        if overlap::find_conflict(
            &day,
            staff_id,
            booking.start_date_time(),
            booking.end_date_time(),
            Some(&id),
        )
        .is_some()
        {
            return Err(AppError::Conflict(
                "staff member already booked in that interval".to_string(),
            ));
        }
    }

    let update = BookingUpdate {
        date: Some(booking.date),
        time: Some(booking.time),
        staff_id: req.staff_id,
        ..BookingUpdate::default()
    };
    queries::update_booking_fields(&db, &id, &update)?;

    Ok(Json(BookingResponse::from_booking(&booking)))
}

// DELETE /api/bookings/:id — hard delete, no undo.
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&headers, state.auth.as_ref())?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_booking(&db, &id)?
    };
    if !deleted {
        return Err(AppError::NotFound(format!("booking {id}")));
    }
    Ok(Json(serde_json::json!({ "msg": "deleted" })))
}
