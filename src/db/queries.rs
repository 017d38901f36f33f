use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::models::booking::BookingUpdate;
use crate::models::{Booking, BookingStatus, Client, StaffMember};

const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";

const BOOKING_COLUMNS: &str = "id, client_name, client_phone, date, time, duration_minutes, \
     service_name, staff_id, status, reminder_sent, notes, created_at, updated_at";

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FMT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| anyhow::anyhow!("invalid time {s:?}: {e}"))
}

fn parse_booking_row(row: &Row) -> anyhow::Result<Booking> {
    let date_str: String = row.get(3)?;
    let time_str: String = row.get(4)?;
    let status_str: String = row.get(8)?;
    let reminder_sent: i64 = row.get(9)?;
    let created_str: String = row.get(11)?;
    let updated_str: String = row.get(12)?;

    Ok(Booking {
        id: row.get(0)?,
        client_name: row.get(1)?,
        client_phone: row.get(2)?,
        date: NaiveDate::parse_from_str(&date_str, DATE_FMT)
            .map_err(|e| anyhow::anyhow!("invalid date {date_str:?}: {e}"))?,
        time: parse_time(&time_str)?,
        duration_minutes: row.get(5)?,
        service_name: row.get(6)?,
        staff_id: row.get(7)?,
        status: BookingStatus::from_str(&status_str),
        reminder_sent: reminder_sent != 0,
        notes: row.get(10)?,
        created_at: NaiveDateTime::parse_from_str(&created_str, TIMESTAMP_FMT)
            .unwrap_or_else(|_| Utc::now().naive_utc()),
        updated_at: NaiveDateTime::parse_from_str(&updated_str, TIMESTAMP_FMT)
            .unwrap_or_else(|_| Utc::now().naive_utc()),
    })
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, client_name, client_phone, date, time, duration_minutes, \
         service_name, staff_id, status, reminder_sent, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            booking.id,
            booking.client_name,
            booking.client_phone,
            booking.date.format(DATE_FMT).to_string(),
            booking.time.format(TIME_FMT).to_string(),
            booking.duration_minutes,
            booking.service_name,
            booking.staff_id,
            booking.status.as_str(),
            booking.reminder_sent as i64,
            booking.notes,
            booking.created_at.format(TIMESTAMP_FMT).to_string(),
            booking.updated_at.format(TIMESTAMP_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn list_bookings(conn: &Connection, date: Option<NaiveDate>) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match date {
        Some(date) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE date = ?1 ORDER BY time ASC, id ASC"
            ),
            vec![Box::new(date.format(DATE_FMT).to_string()) as Box<dyn rusqlite::types::ToSql>],
        ),
        None => (
            format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY date DESC, time DESC"),
            vec![],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Partial update over an explicit allow-list of columns; client-supplied
/// field names never reach the SET clause.
pub fn update_booking_fields(
    conn: &Connection,
    id: &str,
    update: &BookingUpdate,
) -> anyhow::Result<bool> {
    let mut sets: Vec<&'static str> = vec![];
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(v) = &update.client_name {
        sets.push("client_name = ?");
        values.push(Box::new(v.clone()));
    }
    if let Some(v) = &update.client_phone {
        sets.push("client_phone = ?");
        values.push(Box::new(v.clone()));
    }
    if let Some(v) = update.date {
        sets.push("date = ?");
        values.push(Box::new(v.format(DATE_FMT).to_string()));
    }
    if let Some(v) = update.time {
        sets.push("time = ?");
        values.push(Box::new(v.format(TIME_FMT).to_string()));
    }
    if let Some(v) = update.duration_minutes {
        sets.push("duration_minutes = ?");
        values.push(Box::new(v));
    }
    if let Some(v) = &update.service_name {
        sets.push("service_name = ?");
        values.push(Box::new(v.clone()));
    }
    if let Some(v) = &update.staff_id {
        sets.push("staff_id = ?");
        values.push(Box::new(v.clone()));
    }
    if let Some(v) = &update.status {
        sets.push("status = ?");
        values.push(Box::new(v.as_str().to_string()));
    }
    if let Some(v) = &update.notes {
        sets.push("notes = ?");
        values.push(Box::new(v.clone()));
    }

    if sets.is_empty() {
        return Ok(false);
    }

    sets.push("updated_at = ?");
    values.push(Box::new(
        Utc::now().naive_utc().format(TIMESTAMP_FMT).to_string(),
    ));
    values.push(Box::new(id.to_string()));

    let assignments: Vec<String> = sets
        .iter()
        .enumerate()
        .map(|(i, s)| s.replace('?', &format!("?{}", i + 1)))
        .collect();
    let sql = format!(
        "UPDATE bookings SET {} WHERE id = ?{}",
        assignments.join(", "),
        values.len()
    );

    let params_refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|p| p.as_ref()).collect();
    let count = conn.execute(&sql, params_refs.as_slice())?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

/// Confirmed, not-yet-reminded bookings whose start instant falls in
/// `[window_start, window_end)`. Dates and times are stored as sortable
/// text, so the comparison happens on the concatenated instant.
pub fn reminder_candidates(
    conn: &Connection,
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> anyhow::Result<Vec<Booking>> {
    let start = window_start.format("%Y-%m-%d %H:%M").to_string();
    let end = window_end.format("%Y-%m-%d %H:%M").to_string();

    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings \
         WHERE status = 'confirmed' AND reminder_sent = 0 \
         AND (date || ' ' || time) >= ?1 AND (date || ' ' || time) < ?2 \
         ORDER BY date ASC, time ASC"
    ))?;

    let rows = stmt.query_map(params![start, end], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn mark_reminder_sent(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(TIMESTAMP_FMT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET reminder_sent = 1, updated_at = ?1 WHERE id = ?2",
        params![now, id],
    )?;
    Ok(count > 0)
}

// ── Staff ──

pub fn list_staff(conn: &Connection) -> anyhow::Result<Vec<StaffMember>> {
    let mut stmt =
        conn.prepare("SELECT id, name, color, specialty FROM staff ORDER BY name ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(StaffMember {
            id: row.get(0)?,
            name: row.get(1)?,
            color: row.get(2)?,
            specialty: row.get(3)?,
        })
    })?;

    let mut staff = vec![];
    for row in rows {
        staff.push(row?);
    }
    Ok(staff)
}

pub fn create_staff(conn: &Connection, member: &StaffMember) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO staff (id, name, color, specialty) VALUES (?1, ?2, ?3, ?4)",
        params![member.id, member.name, member.color, member.specialty],
    )?;
    Ok(())
}

/// Deleting a staff member leaves their bookings in place; orphaned
/// `staff_id` references render as unassigned.
pub fn delete_staff(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM staff WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Clients ──

pub fn list_clients(conn: &Connection) -> anyhow::Result<Vec<Client>> {
    let mut stmt = conn
        .prepare("SELECT id, first_name, last_name, phone FROM clients ORDER BY first_name ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Client {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            phone: row.get(3)?,
        })
    })?;

    let mut clients = vec![];
    for row in rows {
        clients.push(row?);
    }
    Ok(clients)
}

pub fn create_client(conn: &Connection, client: &Client) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO clients (id, first_name, last_name, phone) VALUES (?1, ?2, ?3, ?4)",
        params![client.id, client.first_name, client.last_name, client.phone],
    )?;
    Ok(())
}

pub fn update_client(conn: &Connection, client: &Client) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE clients SET first_name = ?1, last_name = ?2, phone = ?3 WHERE id = ?4",
        params![client.first_name, client.last_name, client.phone, client.id],
    )?;
    Ok(count > 0)
}

pub fn delete_client(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM clients WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn booking(id: &str, date: &str, time: &str) -> Booking {
        let created = Utc::now().naive_utc();
        Booking {
            id: id.to_string(),
            client_name: "Amina".to_string(),
            client_phone: "0612345678".to_string(),
            date: NaiveDate::parse_from_str(date, DATE_FMT).unwrap(),
            time: NaiveTime::parse_from_str(time, TIME_FMT).unwrap(),
            duration_minutes: 45,
            service_name: Some("Coupe".to_string()),
            staff_id: Some("s1".to_string()),
            status: BookingStatus::Confirmed,
            reminder_sent: false,
            notes: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_create_and_fetch_booking() {
        let conn = setup_db();
        create_booking(&conn, &booking("b1", "2025-06-16", "10:00")).unwrap();

        let fetched = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(fetched.client_name, "Amina");
        assert_eq!(fetched.time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(fetched.status, BookingStatus::Confirmed);
        assert!(!fetched.reminder_sent);

        assert!(get_booking_by_id(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_list_bookings_by_date() {
        let conn = setup_db();
        create_booking(&conn, &booking("b1", "2025-06-16", "10:00")).unwrap();
        create_booking(&conn, &booking("b2", "2025-06-16", "09:00")).unwrap();
        create_booking(&conn, &booking("b3", "2025-06-17", "09:00")).unwrap();

        let day = list_bookings(&conn, NaiveDate::from_ymd_opt(2025, 6, 16)).unwrap();
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].id, "b2");

        let all = list_bookings(&conn, None).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_update_booking_fields_allow_list() {
        let conn = setup_db();
        create_booking(&conn, &booking("b1", "2025-06-16", "10:00")).unwrap();

        let update = BookingUpdate {
            time: Some(NaiveTime::from_hms_opt(11, 30, 0).unwrap()),
            staff_id: Some("s2".to_string()),
            notes: Some("colour touch-up".to_string()),
            ..BookingUpdate::default()
        };
        assert!(update_booking_fields(&conn, "b1", &update).unwrap());

        let fetched = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(fetched.time, NaiveTime::from_hms_opt(11, 30, 0).unwrap());
        assert_eq!(fetched.staff_id.as_deref(), Some("s2"));
        assert_eq!(fetched.notes.as_deref(), Some("colour touch-up"));
        // Untouched fields stay put
        assert_eq!(fetched.client_name, "Amina");
    }

    #[test]
    fn test_update_with_no_fields_is_noop() {
        let conn = setup_db();
        create_booking(&conn, &booking("b1", "2025-06-16", "10:00")).unwrap();
        assert!(!update_booking_fields(&conn, "b1", &BookingUpdate::default()).unwrap());
    }

    #[test]
    fn test_reminder_candidates_window() {
        let conn = setup_db();
        create_booking(&conn, &booking("in", "2025-06-16", "10:00")).unwrap();
        create_booking(&conn, &booking("before", "2025-06-16", "08:00")).unwrap();
        create_booking(&conn, &booking("after", "2025-06-16", "12:00")).unwrap();

        let start = NaiveDate::from_ymd_opt(2025, 6, 16)
            .unwrap()
            .and_hms_opt(9, 45, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 6, 16)
            .unwrap()
            .and_hms_opt(10, 5, 0)
            .unwrap();
        let candidates = reminder_candidates(&conn, start, end).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "in");

        assert!(mark_reminder_sent(&conn, "in").unwrap());
        assert!(reminder_candidates(&conn, start, end).unwrap().is_empty());
    }

    #[test]
    fn test_staff_crud_and_orphaned_bookings() {
        let conn = setup_db();
        let member = StaffMember {
            id: "s1".to_string(),
            name: "Leila".to_string(),
            color: "#EC4899".to_string(),
            specialty: Some("coloriste".to_string()),
        };
        create_staff(&conn, &member).unwrap();
        create_booking(&conn, &booking("b1", "2025-06-16", "10:00")).unwrap();

        assert_eq!(list_staff(&conn).unwrap().len(), 1);
        assert!(delete_staff(&conn, "s1").unwrap());

        // Booking survives with its now-dangling staff reference.
        let fetched = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(fetched.staff_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_client_crud() {
        let conn = setup_db();
        let mut client = Client {
            id: "c1".to_string(),
            first_name: "Sara".to_string(),
            last_name: Some("B".to_string()),
            phone: "0612345678".to_string(),
        };
        create_client(&conn, &client).unwrap();
        assert_eq!(list_clients(&conn).unwrap().len(), 1);

        client.phone = "0698765432".to_string();
        assert!(update_client(&conn, &client).unwrap());
        assert_eq!(list_clients(&conn).unwrap()[0].phone, "0698765432");

        assert!(delete_client(&conn, "c1").unwrap());
        assert!(list_clients(&conn).unwrap().is_empty());
    }
}
