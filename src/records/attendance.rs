use crate::error::{RecordError, RecordResult};
use crate::model::{AttendanceRecord, AttendanceStatus, DateRange, NewAttendance, Session};
use crate::store;
use crate::store::attendance::AttendanceEntry;
use chrono::{Days, NaiveDate};
use rusqlite::Connection;
use tracing::info;

/// Default look-back of the "recent attendance" view.
pub const RECENT_DAYS: u64 = 7;

/// Mark a student Present/Absent for a day. A second mark for the same
/// student and day overwrites the first, attributed to `session`'s user.
pub fn mark_attendance(
    conn: &Connection,
    session: &Session,
    student_id: i64,
    date: NaiveDate,
    status: &str,
) -> RecordResult<AttendanceRecord> {
    let status = AttendanceStatus::parse_markable(status)
        .ok_or_else(|| RecordError::validation("status must be Present or Absent"))?;

    let tx = conn.unchecked_transaction()?;
    if store::students::get_student(&tx, student_id)?.is_none() {
        return Err(RecordError::not_found("student not found"));
    }
    store::attendance::upsert_attendance(
        &tx,
        &NewAttendance {
            student_id,
            date,
            status,
            marked_by: session.user_id,
        },
    )?;
    let rec = store::attendance::find_attendance(&tx, student_id, date)?
        .ok_or_else(|| RecordError::not_found("attendance record vanished"))?;
    tx.commit()?;

    info!(
        student_id,
        date = %date,
        status = rec.status.as_str(),
        marked_by = session.user_id,
        "attendance marked"
    );
    Ok(rec)
}

pub fn get_attendance(conn: &Connection, student_id: i64, date: NaiveDate) -> RecordResult<Option<AttendanceRecord>> {
    Ok(store::attendance::find_attendance(conn, student_id, date)?)
}

pub fn list_attendance(conn: &Connection, range: DateRange) -> RecordResult<Vec<AttendanceRecord>> {
    if range.from > range.to {
        return Err(RecordError::validation("from must not be after to"));
    }
    Ok(store::attendance::list_attendance(conn, range)?)
}

/// Marks from the last `days` days up to and including `today`, newest
/// first. Future-dated marks are left out.
pub fn recent_attendance(conn: &Connection, today: NaiveDate, days: u64) -> RecordResult<Vec<AttendanceEntry>> {
    let since = today
        .checked_sub_days(Days::new(days))
        .ok_or_else(|| RecordError::validation("days reaches before the earliest date"))?;
    Ok(store::attendance::list_recent(conn, DateRange::new(since, today))?)
}
