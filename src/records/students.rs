use crate::clock;
use crate::error::{map_unique, RecordError, RecordResult};
use crate::model::{AttendanceStatus, Student, StudentInput};
use crate::records::required;
use crate::store;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

const DUPLICATE_ADMISSION: &str = "admission number must be unique";

fn normalize(input: &StudentInput) -> RecordResult<StudentInput> {
    Ok(StudentInput {
        first_name: required(&input.first_name, "first name")?,
        admission_no: required(&input.admission_no, "admission number")?,
        last_name: input.last_name.trim().to_string(),
        dob: input.dob.trim().to_string(),
        class_name: input.class_name.trim().to_string(),
        section: input.section.trim().to_string(),
        guardian_name: input.guardian_name.trim().to_string(),
        phone: input.phone.trim().to_string(),
    })
}

pub fn create_student(conn: &Connection, input: &StudentInput) -> RecordResult<Student> {
    let s = normalize(input)?;
    let id = store::students::insert_student(conn, &s, &clock::now_timestamp())
        .map_err(|e| map_unique(e, DUPLICATE_ADMISSION))?;
    info!(student_id = id, admission_no = %s.admission_no, "student created");
    get_student(conn, id)
}

pub fn update_student(conn: &Connection, id: i64, input: &StudentInput) -> RecordResult<Student> {
    let s = normalize(input)?;
    let changed = store::students::update_student(conn, id, &s)
        .map_err(|e| map_unique(e, DUPLICATE_ADMISSION))?;
    if changed == 0 {
        return Err(RecordError::not_found("student not found"));
    }
    get_student(conn, id)
}

/// Remove the student with their attendance, payments and fees.
pub fn delete_student(conn: &Connection, id: i64) -> RecordResult<()> {
    let tx = conn.unchecked_transaction()?;
    store::attendance::delete_for_student(&tx, id)?;
    store::fees::delete_for_student(&tx, id)?;
    if store::students::delete_student(&tx, id)? == 0 {
        return Err(RecordError::not_found("student not found"));
    }
    tx.commit()?;
    info!(student_id = id, "student deleted");
    Ok(())
}

pub fn get_student(conn: &Connection, id: i64) -> RecordResult<Student> {
    store::students::get_student(conn, id)?
        .ok_or_else(|| RecordError::not_found("student not found"))
}

pub fn find_by_admission(conn: &Connection, admission_no: &str) -> RecordResult<Student> {
    let adm = required(admission_no, "admission number")?;
    store::students::find_by_admission(conn, &adm)?
        .ok_or_else(|| RecordError::not_found("student admission number not found"))
}

pub fn list_students(conn: &Connection, query: Option<&str>) -> RecordResult<Vec<Student>> {
    Ok(store::students::list_students(conn, query)?)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub student_id: i64,
    pub name: String,
    pub class_name: String,
    pub section: String,
    /// Already-marked status for the roster day, if any.
    pub status: Option<AttendanceStatus>,
}

/// Students to mark for `date`, optionally limited to a class.
pub fn roster(conn: &Connection, class_filter: Option<&str>, date: NaiveDate) -> RecordResult<Vec<RosterEntry>> {
    let students = store::students::list_by_class(conn, class_filter)?;
    let mut marked = store::attendance::statuses_on(conn, date)?;
    Ok(students
        .into_iter()
        .map(|s| RosterEntry {
            student_id: s.id,
            name: s.display_name(),
            status: marked.remove(&s.id),
            class_name: s.class_name,
            section: s.section,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::test_support;

    fn input(first: &str, adm: &str) -> StudentInput {
        StudentInput {
            first_name: first.into(),
            last_name: "Khan".into(),
            admission_no: adm.into(),
            class_name: "Grade 1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn first_name_and_admission_are_required() {
        let conn = test_support::conn();
        let e = create_student(&conn, &input("  ", "ADM1")).expect_err("no first name");
        assert_eq!(e.code(), "validation");
        let e = create_student(&conn, &input("Aisha", "")).expect_err("no admission");
        assert_eq!(e.code(), "validation");
        assert!(list_students(&conn, None).expect("list").is_empty());
    }

    #[test]
    fn duplicate_admission_is_conflict_and_keeps_original() {
        let conn = test_support::conn();
        let original = create_student(&conn, &input("Aisha", "ADM001")).expect("create");
        let e = create_student(&conn, &input("Ravi", "ADM001")).expect_err("duplicate");
        assert!(matches!(e, RecordError::Conflict(_)));

        let still = get_student(&conn, original.id).expect("get");
        assert_eq!(still.first_name, "Aisha");
        assert_eq!(list_students(&conn, None).expect("list").len(), 1);
    }

    #[test]
    fn update_to_taken_admission_is_conflict() {
        let conn = test_support::conn();
        let _a = create_student(&conn, &input("Aisha", "ADM001")).expect("a");
        let b = create_student(&conn, &input("Ravi", "ADM002")).expect("b");
        let e = update_student(&conn, b.id, &input("Ravi", "ADM001")).expect_err("dup");
        assert_eq!(e.code(), "conflict");
        assert_eq!(get_student(&conn, b.id).expect("get").admission_no, "ADM002");
    }

    #[test]
    fn update_missing_student_is_not_found() {
        let conn = test_support::conn();
        let e = update_student(&conn, 42, &input("X", "Y")).expect_err("missing");
        assert_eq!(e.code(), "not_found");
    }

    #[test]
    fn delete_removes_dependents() {
        let conn = test_support::conn();
        let s = create_student(&conn, &input("Aisha", "ADM001")).expect("create");
        conn.execute(
            "INSERT INTO attendance(student_id, date, status, marked_by) VALUES(?, '2024-01-02', 'Present', 1)",
            [s.id],
        )
        .expect("attendance");
        conn.execute(
            "INSERT INTO fees(student_id, description, amount, due_date, status, created_at)
             VALUES(?, 'Tuition', 10, '2024-01-01', 'pending', 't')",
            [s.id],
        )
        .expect("fee");

        delete_student(&conn, s.id).expect("delete");
        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM attendance", [], |r| r.get(0))
            .expect("count");
        assert_eq!(left, 0);
        assert_eq!(delete_student(&conn, s.id).expect_err("gone").code(), "not_found");
    }

    #[test]
    fn roster_carries_existing_marks() {
        let conn = test_support::conn();
        let a = create_student(&conn, &input("Aisha", "ADM001")).expect("a");
        let b = create_student(&conn, &input("Ravi", "ADM002")).expect("b");
        conn.execute(
            "INSERT INTO attendance(student_id, date, status, marked_by) VALUES(?, '2024-01-02', 'Absent', 1)",
            [b.id],
        )
        .expect("attendance");
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).expect("date");
        let r = roster(&conn, Some("Grade"), day).expect("roster");
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].student_id, a.id);
        assert_eq!(r[0].status, None);
        assert_eq!(r[1].status, Some(AttendanceStatus::Absent));
        assert_eq!(r[1].name, "Ravi Khan");
    }
}
