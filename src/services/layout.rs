use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::models::service;
use crate::models::Booking;
use crate::services::overlap::overlaps;

/// One block on the day planner, already resolved to absolute instants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub staff_id: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl CalendarEvent {
    pub fn from_booking(booking: &Booking) -> Self {
        Self {
            id: booking.id.clone(),
            title: booking.client_name.clone(),
            staff_id: booking.staff_id.clone(),
            start: booking.start_date_time(),
            end: booking.end_date_time(),
        }
    }
}

/// Horizontal lane assignment for one event. Invariants: overlapping events
/// never share `column_index`, and `column_index < total_columns`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutSlot {
    pub column_index: usize,
    pub total_columns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedEvent {
    #[serde(flatten)]
    pub event: CalendarEvent,
    pub layout: LayoutSlot,
}

/// Packs one day's events into non-overlapping visual columns.
///
/// Events are placed in a fixed order (start ascending, longer first on
/// ties) and each takes the lowest column not occupied by an event it
/// directly overlaps. A second pass widens `total_columns` to the column
/// count of the event's transitive overlap cluster, so a chain of overlaps
/// renders as equal-width lanes while sequentially-overlapping events never
/// claim more lanes than the cluster actually uses.
///
/// Pure and deterministic: the input is never mutated, and identical input
/// always yields identical layout (the sort is stable).
pub fn layout_day(events: &[CalendarEvent]) -> Vec<PositionedEvent> {
    let min_len = Duration::minutes(i64::from(service::MIN_DURATION_MINUTES));
    // Zero or negative lengths clamp to one grid step rather than erroring,
    // keeping rendering resilient to bad data.
    let spans: Vec<(NaiveDateTime, NaiveDateTime)> = events
        .iter()
        .map(|ev| {
            let end = if ev.end > ev.start { ev.end } else { ev.start + min_len };
            (ev.start, end.max(ev.start + min_len).min(ev.start + Duration::days(1)))
        })
        .collect();

    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by(|&a, &b| {
        spans[a]
            .0
            .cmp(&spans[b].0)
            .then_with(|| (spans[b].1 - spans[b].0).cmp(&(spans[a].1 - spans[a].0)))
    });

    // Greedy placement: lowest column free among directly-overlapping
    // already-placed events.
    let mut columns = vec![0usize; events.len()];
    let mut placed: Vec<usize> = Vec::with_capacity(events.len());
    for &idx in &order {
        let taken: Vec<usize> = placed
            .iter()
            .filter(|&&p| overlaps(spans[idx].0, spans[idx].1, spans[p].0, spans[p].1))
            .map(|&p| columns[p])
            .collect();
        let mut column = 0;
        while taken.contains(&column) {
            column += 1;
        }
        columns[idx] = column;
        placed.push(idx);
    }

    // Widening pass: every member of a transitive overlap cluster shares the
    // cluster's column count, so a 3-way chain renders as consistent lanes.
    // Processing in start order means a cluster ends exactly when the next
    // event starts at or after the running max end.
    fn close_cluster(cluster: &mut Vec<usize>, max_col: usize, totals: &mut [usize]) {
        for &i in cluster.iter() {
            totals[i] = max_col + 1;
        }
        cluster.clear();
    }
    let mut totals = vec![1usize; events.len()];
    let mut cluster: Vec<usize> = Vec::new();
    let mut cluster_end: Option<NaiveDateTime> = None;
    let mut cluster_max_col = 0usize;
    for &idx in &order {
        let continues = matches!(cluster_end, Some(end) if spans[idx].0 < end);
        if !continues {
            close_cluster(&mut cluster, cluster_max_col, &mut totals);
            cluster_max_col = 0;
            cluster_end = None;
        }
        cluster.push(idx);
        cluster_max_col = cluster_max_col.max(columns[idx]);
        cluster_end = Some(cluster_end.map_or(spans[idx].1, |e| e.max(spans[idx].1)));
    }
    close_cluster(&mut cluster, cluster_max_col, &mut totals);

    events
        .iter()
        .enumerate()
        .map(|(i, ev)| PositionedEvent {
            event: ev.clone(),
            layout: LayoutSlot {
                column_index: columns[i],
                total_columns: totals[i],
            },
        })
        .collect()
}
