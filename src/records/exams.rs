use crate::error::{RecordError, RecordResult};
use crate::model::{format_date, parse_date, parse_time, ExamSlot, ExamSlotInput, TIME_FORMAT};
use crate::records::required;
use crate::store;
use rusqlite::Connection;
use tracing::info;

fn normalize(input: &ExamSlotInput) -> RecordResult<ExamSlotInput> {
    let exam_date = required(&input.exam_date, "exam date")?;
    let exam_date = parse_date(&exam_date)
        .map(format_date)
        .ok_or_else(|| RecordError::validation("exam date must be YYYY-MM-DD"))?;
    let start = parse_time(&required(&input.start_time, "start time")?)
        .ok_or_else(|| RecordError::validation("start time must be HH:MM"))?;
    let end = parse_time(&required(&input.end_time, "end time")?)
        .ok_or_else(|| RecordError::validation("end time must be HH:MM"))?;
    if end <= start {
        return Err(RecordError::validation("end time must be after start time"));
    }
    Ok(ExamSlotInput {
        exam_title: required(&input.exam_title, "exam title")?,
        class_name: required(&input.class_name, "class")?,
        subject: required(&input.subject, "subject")?,
        exam_date,
        start_time: start.format(TIME_FORMAT).to_string(),
        end_time: end.format(TIME_FORMAT).to_string(),
        room: input.room.trim().to_string(),
    })
}

pub fn create_exam(conn: &Connection, input: &ExamSlotInput) -> RecordResult<ExamSlot> {
    let e = normalize(input)?;
    let id = store::exams::insert_exam(conn, &e)?;
    info!(exam_id = id, title = %e.exam_title, date = %e.exam_date, "exam scheduled");
    get_exam(conn, id)
}

pub fn update_exam(conn: &Connection, id: i64, input: &ExamSlotInput) -> RecordResult<ExamSlot> {
    let e = normalize(input)?;
    if store::exams::update_exam(conn, id, &e)? == 0 {
        return Err(RecordError::not_found("exam schedule not found"));
    }
    get_exam(conn, id)
}

pub fn delete_exam(conn: &Connection, id: i64) -> RecordResult<()> {
    if store::exams::delete_exam(conn, id)? == 0 {
        return Err(RecordError::not_found("exam schedule not found"));
    }
    info!(exam_id = id, "exam removed");
    Ok(())
}

pub fn get_exam(conn: &Connection, id: i64) -> RecordResult<ExamSlot> {
    store::exams::get_exam(conn, id)?
        .ok_or_else(|| RecordError::not_found("exam schedule not found"))
}

pub fn list_exams(conn: &Connection) -> RecordResult<Vec<ExamSlot>> {
    Ok(store::exams::list_exams(conn)?)
}
