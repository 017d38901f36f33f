use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::services::messaging::MessagingProvider;
use crate::services::phone;

/// Injectable clock so the window math is deterministic in tests and pinned
/// to the salon's timezone, never the host default.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// System clock shifted by a fixed UTC offset.
pub struct FixedOffsetClock {
    offset_minutes: i32,
}

impl FixedOffsetClock {
    pub fn new(offset_minutes: i32) -> Self {
        Self { offset_minutes }
    }
}

impl Clock for FixedOffsetClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc() + Duration::minutes(i64::from(self.offset_minutes))
    }
}

/// Both deployment variants behind one parameterization: a rolling
/// lead-time window checked on every tick, or a once-daily pass over
/// tomorrow's bookings anchored at a fixed hour.
#[derive(Debug, Clone)]
pub enum ReminderAnchor {
    RollingWindow {
        lead_min_minutes: i64,
        lead_max_minutes: i64,
    },
    FixedHourDaily {
        run_hour: u32,
    },
}

#[derive(Debug, Clone)]
pub struct ReminderPolicy {
    pub anchor: ReminderAnchor,
    pub tick_interval_minutes: u64,
}

/// The [start, end) window of booking start instants this tick targets, or
/// `None` when the tick should do nothing (daily anchor outside its hour).
pub fn target_window(
    anchor: &ReminderAnchor,
    now: NaiveDateTime,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    match anchor {
        ReminderAnchor::RollingWindow {
            lead_min_minutes,
            lead_max_minutes,
        } => Some((
            now + Duration::minutes(*lead_min_minutes),
            now + Duration::minutes(*lead_max_minutes),
        )),
        ReminderAnchor::FixedHourDaily { run_hour } => {
            if now.hour() != *run_hour {
                return None;
            }
            let tomorrow = now.date().succ_opt()?.and_time(NaiveTime::MIN);
            Some((tomorrow, tomorrow + Duration::days(1)))
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct TickReport {
    pub candidates: usize,
    pub sent: usize,
    pub failed: usize,
    pub invalid_phone: usize,
}

/// Recurring task firing one WhatsApp reminder per confirmed booking whose
/// start falls in the policy window. `reminder_sent` is read before the
/// send and written only after a confirmed send, so under a single
/// scheduler instance each booking is notified at most once. Running
/// several instances concurrently is unsupported and can double-send.
pub struct ReminderScheduler {
    db: Arc<Mutex<Connection>>,
    messaging: Arc<dyn MessagingProvider>,
    clock: Arc<dyn Clock>,
    policy: ReminderPolicy,
    country_code: String,
    national_number_len: usize,
}

impl ReminderScheduler {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        messaging: Arc<dyn MessagingProvider>,
        clock: Arc<dyn Clock>,
        policy: ReminderPolicy,
        country_code: String,
        national_number_len: usize,
    ) -> Self {
        Self {
            db,
            messaging,
            clock,
            policy,
            country_code,
            national_number_len,
        }
    }

    pub async fn tick(&self) -> anyhow::Result<TickReport> {
        let now = self.clock.now();
        let Some((window_start, window_end)) = target_window(&self.policy.anchor, now) else {
            return Ok(TickReport::default());
        };

        let candidates = {
            let db = self.db.lock().unwrap();
            queries::reminder_candidates(&db, window_start, window_end)?
        };

        let mut report = TickReport {
            candidates: candidates.len(),
            ..TickReport::default()
        };

        // Sequential on purpose: respects provider rate limits and keeps the
        // per-booking read-check-send-write effectively atomic.
        for booking in candidates {
            let Some(chat) = phone::chat_id(
                &booking.client_phone,
                &self.country_code,
                self.national_number_len,
            ) else {
                tracing::warn!(booking_id = %booking.id, "cannot normalize phone, skipping reminder");
                report.invalid_phone += 1;
                continue;
            };

            let text = format!(
                "Rappel: votre rendez-vous{} est prévu le {} à {}. À bientôt!",
                booking
                    .service_name
                    .as_deref()
                    .map(|s| format!(" ({s})"))
                    .unwrap_or_default(),
                booking.date.format("%d/%m/%Y"),
                booking.time.format("%H:%M"),
            );

            match self.messaging.send_message(&chat, &text).await {
                Ok(()) => {
                    let db = self.db.lock().unwrap();
                    queries::mark_reminder_sent(&db, &booking.id)?;
                    report.sent += 1;
                }
                Err(e) => {
                    // Left unmarked: retried on a later tick while still in
                    // window, otherwise it lapses (no backfill).
                    tracing::warn!(booking_id = %booking.id, error = %e, "reminder send failed");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    pub async fn run(self) {
        let period = StdDuration::from_secs(self.policy.tick_interval_minutes.max(1) * 60);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match self.tick().await {
                Ok(report) if report.candidates > 0 => {
                    tracing::info!(
                        candidates = report.candidates,
                        sent = report.sent,
                        failed = report.failed,
                        invalid_phone = report.invalid_phone,
                        "reminder tick"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "reminder tick failed"),
            }
        }
    }
}
