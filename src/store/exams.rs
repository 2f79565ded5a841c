use crate::model::{ExamSlot, ExamSlotInput};
use rusqlite::{Connection, OptionalExtension, Row};

fn from_row(r: &Row<'_>) -> rusqlite::Result<ExamSlot> {
    Ok(ExamSlot {
        id: r.get(0)?,
        exam_title: r.get(1)?,
        class_name: r.get(2)?,
        subject: r.get(3)?,
        exam_date: r.get(4)?,
        start_time: r.get(5)?,
        end_time: r.get(6)?,
        room: r.get(7)?,
    })
}

pub fn insert_exam(conn: &Connection, e: &ExamSlotInput) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO exam_schedule(exam_title, class_name, subject, exam_date, start_time, end_time, room)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &e.exam_title,
            &e.class_name,
            &e.subject,
            &e.exam_date,
            &e.start_time,
            &e.end_time,
            &e.room,
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_exam(conn: &Connection, id: i64, e: &ExamSlotInput) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE exam_schedule
         SET exam_title = ?, class_name = ?, subject = ?, exam_date = ?,
             start_time = ?, end_time = ?, room = ?
         WHERE id = ?",
        (
            &e.exam_title,
            &e.class_name,
            &e.subject,
            &e.exam_date,
            &e.start_time,
            &e.end_time,
            &e.room,
            id,
        ),
    )
}

pub fn delete_exam(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM exam_schedule WHERE id = ?", [id])
}

pub fn get_exam(conn: &Connection, id: i64) -> rusqlite::Result<Option<ExamSlot>> {
    conn.query_row(
        "SELECT id, exam_title, class_name, subject, exam_date, start_time, end_time, room
         FROM exam_schedule WHERE id = ?",
        [id],
        from_row,
    )
    .optional()
}

/// Chronological: by date, then start time.
pub fn list_exams(conn: &Connection) -> rusqlite::Result<Vec<ExamSlot>> {
    let mut stmt = conn.prepare(
        "SELECT id, exam_title, class_name, subject, exam_date, start_time, end_time, room
         FROM exam_schedule
         ORDER BY exam_date, start_time, id",
    )?;
    let rows = stmt.query_map([], from_row)?;
    rows.collect()
}
