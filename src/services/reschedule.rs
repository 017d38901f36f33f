use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::services::layout::CalendarEvent;
use crate::services::timegrid;

/// Drag positions snap to this grid after the pixel-to-time conversion.
pub const DRAG_SNAP_MINUTES: u32 = 15;

/// Lifecycle of one drag-move. A move, once dropped, always ends in
/// `Committed` or `RolledBack`; there is no mid-flight cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePhase {
    Idle,
    Dragging,
    Committed,
    RolledBack,
}

/// The computed outcome of a drop: quantized start plus the resource column
/// the event was dropped on. Duration is preserved, so the new end never
/// appears here.
#[derive(Debug, Clone, PartialEq)]
pub struct DragMove {
    pub event_id: String,
    pub new_start: NaiveDateTime,
    pub new_staff_id: Option<String>,
}

/// The narrow write contract the engine needs from storage: a partial
/// update of (date, time, staff) with a success/failure signal.
#[async_trait]
pub trait BookingWriter: Send + Sync {
    async fn reschedule(
        &self,
        id: &str,
        date: NaiveDate,
        time: NaiveTime,
        staff_id: Option<&str>,
    ) -> anyhow::Result<()>;
}

/// Translates a drop position into a [`DragMove`]. Returns `None` when the
/// event is unknown or the drop lands outside the representable day.
pub fn plan_move(
    events: &[CalendarEvent],
    event_id: &str,
    day: NaiveDate,
    drop_offset_px: f64,
    px_per_hour: f64,
    start_hour: u32,
    target_staff: Option<String>,
) -> Option<DragMove> {
    events.iter().find(|ev| ev.id == event_id)?;
    let time = timegrid::pixel_offset_to_time(drop_offset_px, px_per_hour, start_hour)?;
    let new_start = timegrid::quantize(day.and_time(time), DRAG_SNAP_MINUTES);
    Some(DragMove {
        event_id: event_id.to_string(),
        new_start,
        new_staff_id: target_staff,
    })
}

/// Pure optimistic application of a move: a new event list where the moved
/// event keeps its duration at the new start and resource. The input is
/// never mutated, which is what keeps rollback sound.
pub fn apply_move(events: &[CalendarEvent], mv: &DragMove) -> Vec<CalendarEvent> {
    events
        .iter()
        .map(|ev| {
            if ev.id == mv.event_id {
                let duration = ev.end - ev.start;
                let mut moved = ev.clone();
                moved.start = mv.new_start;
                moved.end = mv.new_start + duration;
                moved.staff_id = mv.new_staff_id.clone();
                moved
            } else {
                ev.clone()
            }
        })
        .collect()
}

/// Optimistic-with-rollback reschedule over a local event snapshot.
///
/// The local list is updated before the storage round trip so the UI never
/// blocks on the network; on write failure the pre-move snapshot is
/// restored verbatim and the error surfaced.
pub struct RescheduleEngine {
    events: Vec<CalendarEvent>,
    phase: MovePhase,
}

impl RescheduleEngine {
    pub fn new(events: Vec<CalendarEvent>) -> Self {
        Self {
            events,
            phase: MovePhase::Idle,
        }
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn phase(&self) -> MovePhase {
        self.phase
    }

    pub fn begin_drag(&mut self) {
        self.phase = MovePhase::Dragging;
    }

    pub async fn commit(&mut self, mv: DragMove, writer: &dyn BookingWriter) -> anyhow::Result<()> {
        let snapshot = self.events.clone();
        self.events = apply_move(&self.events, &mv);

        match writer
            .reschedule(
                &mv.event_id,
                mv.new_start.date(),
                mv.new_start.time(),
                mv.new_staff_id.as_deref(),
            )
            .await
        {
            Ok(()) => {
                self.phase = MovePhase::Committed;
                Ok(())
            }
            Err(e) => {
                self.events = snapshot;
                self.phase = MovePhase::RolledBack;
                Err(e)
            }
        }
    }
}
