use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::with_session;
use crate::ipc::params::{get_date_or_today, get_opt_str, get_required_i64, get_required_str, get_str_or_empty};
use crate::ipc::types::{AppState, Request};
use crate::model::{format_date, Session, StudentInput};
use crate::records::students;
use rusqlite::Connection;
use serde_json::{json, Value};

fn parse_student_input(params: &Value) -> Result<StudentInput, HandlerErr> {
    Ok(StudentInput {
        first_name: get_str_or_empty(params, "firstName")?,
        last_name: get_str_or_empty(params, "lastName")?,
        dob: get_str_or_empty(params, "dob")?,
        admission_no: get_str_or_empty(params, "admissionNo")?,
        class_name: get_str_or_empty(params, "className")?,
        section: get_str_or_empty(params, "section")?,
        guardian_name: get_str_or_empty(params, "guardianName")?,
        phone: get_str_or_empty(params, "phone")?,
    })
}

fn students_list(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let query = get_opt_str(params, "query")?;
    let list = students::list_students(conn, query.as_deref())?;
    Ok(json!({ "students": list }))
}

fn students_get(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_i64(params, "studentId")?;
    Ok(json!({ "student": students::get_student(conn, id)? }))
}

fn students_find_by_admission(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let adm = get_required_str(params, "admissionNo")?;
    Ok(json!({ "student": students::find_by_admission(conn, &adm)? }))
}

fn students_create(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let input = parse_student_input(params)?;
    let student = students::create_student(conn, &input)?;
    Ok(json!({ "studentId": student.id, "student": student }))
}

fn students_update(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_i64(params, "studentId")?;
    let input = parse_student_input(params)?;
    Ok(json!({ "student": students::update_student(conn, id, &input)? }))
}

fn students_delete(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_i64(params, "studentId")?;
    students::delete_student(conn, id)?;
    Ok(json!({ "ok": true }))
}

fn students_roster(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let class_filter = get_opt_str(params, "className")?;
    let date = get_date_or_today(params, "date")?;
    let roster = students::roster(conn, class_filter.as_deref(), date)?;
    Ok(json!({ "date": format_date(date), "students": roster }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "students.list" => Some(with_session(state, req, students_list)),
        "students.get" => Some(with_session(state, req, students_get)),
        "students.findByAdmission" => Some(with_session(state, req, students_find_by_admission)),
        "students.create" => Some(with_session(state, req, students_create)),
        "students.update" => Some(with_session(state, req, students_update)),
        "students.delete" => Some(with_session(state, req, students_delete)),
        "students.roster" => Some(with_session(state, req, students_roster)),
        _ => None,
    }
}
