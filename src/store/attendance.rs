use crate::model::{AttendanceRecord, AttendanceStatus, DateRange, NewAttendance};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use std::collections::HashMap;

fn from_row(r: &Row<'_>) -> rusqlite::Result<AttendanceRecord> {
    let status: String = r.get(3)?;
    Ok(AttendanceRecord {
        id: r.get(0)?,
        student_id: r.get(1)?,
        date: r.get(2)?,
        status: AttendanceStatus::from_db(&status),
        marked_by: r.get(4)?,
    })
}

pub fn find_attendance(
    conn: &Connection,
    student_id: i64,
    date: NaiveDate,
) -> rusqlite::Result<Option<AttendanceRecord>> {
    conn.query_row(
        "SELECT id, student_id, date, status, marked_by
         FROM attendance
         WHERE student_id = ? AND date = ?
         ORDER BY id
         LIMIT 1",
        (student_id, date),
        from_row,
    )
    .optional()
}

/// Overwrite status/marked_by of the `(student_id, date)` record, or insert
/// one. Returns the record id. Duplicate rows for the same key (possible in
/// imported databases) collapse into the lowest-id one. Run inside a
/// transaction so the lookup and the writes land together.
pub fn upsert_attendance(conn: &Connection, rec: &NewAttendance) -> rusqlite::Result<i64> {
    match find_attendance(conn, rec.student_id, rec.date)? {
        Some(existing) => {
            conn.execute(
                "UPDATE attendance SET status = ?, marked_by = ? WHERE student_id = ? AND date = ?",
                (rec.status.as_str(), rec.marked_by, rec.student_id, rec.date),
            )?;
            conn.execute(
                "DELETE FROM attendance WHERE student_id = ? AND date = ? AND id != ?",
                (rec.student_id, rec.date, existing.id),
            )?;
            Ok(existing.id)
        }
        None => {
            conn.execute(
                "INSERT INTO attendance(student_id, date, status, marked_by) VALUES(?, ?, ?, ?)",
                (rec.student_id, rec.date, rec.status.as_str(), rec.marked_by),
            )?;
            Ok(conn.last_insert_rowid())
        }
    }
}

/// Records dated within `range` (both ends inclusive), oldest first.
pub fn list_attendance(conn: &Connection, range: DateRange) -> rusqlite::Result<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_id, date, status, marked_by
         FROM attendance
         WHERE date >= ? AND date <= ?
         ORDER BY date, id",
    )?;
    let rows = stmt.query_map((range.from, range.to), from_row)?;
    rows.collect()
}

/// Status already marked for each student on `date`.
pub fn statuses_on(conn: &Connection, date: NaiveDate) -> rusqlite::Result<HashMap<i64, AttendanceStatus>> {
    let mut stmt = conn.prepare("SELECT student_id, status FROM attendance WHERE date = ?")?;
    let rows = stmt.query_map([date], |r| {
        let status: String = r.get(1)?;
        Ok((r.get::<_, i64>(0)?, AttendanceStatus::from_db(&status)))
    })?;
    rows.collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    pub student_id: i64,
    pub student: String,
    pub date: String,
    pub status: AttendanceStatus,
}

/// Records dated within `range`, newest first, joined with student names.
pub fn list_recent(conn: &Connection, range: DateRange) -> rusqlite::Result<Vec<AttendanceEntry>> {
    let mut stmt = conn.prepare(
        "SELECT a.student_id, trim(s.first_name || ' ' || s.last_name), a.date, a.status
         FROM attendance a
         JOIN students s ON s.id = a.student_id
         WHERE a.date >= ? AND a.date <= ?
         ORDER BY a.date DESC, a.id DESC",
    )?;
    let rows = stmt.query_map((range.from, range.to), |r| {
        let status: String = r.get(3)?;
        Ok(AttendanceEntry {
            student_id: r.get(0)?,
            student: r.get(1)?,
            date: r.get(2)?,
            status: AttendanceStatus::from_db(&status),
        })
    })?;
    rows.collect()
}

pub fn delete_for_student(conn: &Connection, student_id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM attendance WHERE student_id = ?", [student_id])
}
