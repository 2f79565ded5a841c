use crate::model::{Student, StudentInput};
use rusqlite::{Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, first_name, last_name, dob, admission_no, class_name,
                       section, guardian_name, phone, created_at";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(0)?,
        first_name: r.get(1)?,
        last_name: r.get(2)?,
        dob: r.get(3)?,
        admission_no: r.get(4)?,
        class_name: r.get(5)?,
        section: r.get(6)?,
        guardian_name: r.get(7)?,
        phone: r.get(8)?,
        created_at: r.get(9)?,
    })
}

pub fn insert_student(
    conn: &Connection,
    s: &StudentInput,
    created_at: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO students(
           first_name, last_name, dob, admission_no, class_name,
           section, guardian_name, phone, created_at
         ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &s.first_name,
            &s.last_name,
            &s.dob,
            &s.admission_no,
            &s.class_name,
            &s.section,
            &s.guardian_name,
            &s.phone,
            created_at,
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_student(conn: &Connection, id: i64, s: &StudentInput) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE students
         SET first_name = ?, last_name = ?, dob = ?, admission_no = ?, class_name = ?,
             section = ?, guardian_name = ?, phone = ?
         WHERE id = ?",
        (
            &s.first_name,
            &s.last_name,
            &s.dob,
            &s.admission_no,
            &s.class_name,
            &s.section,
            &s.guardian_name,
            &s.phone,
            id,
        ),
    )
}

pub fn delete_student(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM students WHERE id = ?", [id])
}

pub fn get_student(conn: &Connection, id: i64) -> rusqlite::Result<Option<Student>> {
    conn.query_row(
        &format!("SELECT {} FROM students WHERE id = ?", COLUMNS),
        [id],
        from_row,
    )
    .optional()
}

pub fn find_by_admission(conn: &Connection, admission_no: &str) -> rusqlite::Result<Option<Student>> {
    conn.query_row(
        &format!("SELECT {} FROM students WHERE admission_no = ?", COLUMNS),
        [admission_no.trim()],
        from_row,
    )
    .optional()
}

/// Make `%`, `_` and `\` match literally in a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Newest first. A non-empty `query` matches case-insensitively against
/// "first last" and the admission number.
pub fn list_students(conn: &Connection, query: Option<&str>) -> rusqlite::Result<Vec<Student>> {
    let q = query.map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty());
    match q {
        Some(q) => {
            let pattern = format!("%{}%", escape_like(&q));
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM students
                 WHERE lower(first_name) || ' ' || lower(last_name) LIKE ?1 ESCAPE '\\'
                    OR lower(admission_no) LIKE ?1 ESCAPE '\\'
                 ORDER BY id DESC",
                COLUMNS
            ))?;
            let rows = stmt.query_map([pattern], from_row)?;
            rows.collect()
        }
        None => {
            let mut stmt =
                conn.prepare(&format!("SELECT {} FROM students ORDER BY id DESC", COLUMNS))?;
            let rows = stmt.query_map([], from_row)?;
            rows.collect()
        }
    }
}

/// Students whose class contains `class_filter`, in creation order.
pub fn list_by_class(conn: &Connection, class_filter: Option<&str>) -> rusqlite::Result<Vec<Student>> {
    let filter = class_filter.map(str::trim).filter(|f| !f.is_empty());
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM students
         WHERE ?1 IS NULL OR class_name LIKE '%' || ?1 || '%'
         ORDER BY id",
        COLUMNS
    ))?;
    let rows = stmt.query_map([filter], from_row)?;
    rows.collect()
}

pub fn count_students(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support;

    fn input(first: &str, last: &str, adm: &str, class_name: &str) -> StudentInput {
        StudentInput {
            first_name: first.into(),
            last_name: last.into(),
            admission_no: adm.into(),
            class_name: class_name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn search_matches_name_and_admission() {
        let conn = test_support::conn();
        insert_student(&conn, &input("Aisha", "Khan", "ADM001", "Grade 1"), "t").expect("a");
        insert_student(&conn, &input("Ravi", "Patel", "ADM002", "Grade 2"), "t").expect("b");

        let by_name = list_students(&conn, Some("aisha k")).expect("list");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].admission_no, "ADM001");

        let by_adm = list_students(&conn, Some("adm002")).expect("list");
        assert_eq!(by_adm.len(), 1);
        assert_eq!(by_adm[0].first_name, "Ravi");

        let all = list_students(&conn, Some("  ")).expect("list");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].first_name, "Ravi", "newest first");
    }

    #[test]
    fn search_wildcards_match_literally() {
        let conn = test_support::conn();
        insert_student(&conn, &input("Aisha", "Khan", "ADM_1", "Grade 1"), "t").expect("a");
        insert_student(&conn, &input("Ravi", "Patel", "ADMX1", "Grade 2"), "t").expect("b");

        let underscore = list_students(&conn, Some("adm_")).expect("list");
        assert_eq!(underscore.len(), 1);
        assert_eq!(underscore[0].admission_no, "ADM_1");
        assert!(list_students(&conn, Some("%")).expect("list").is_empty());
        assert_eq!(escape_like(r"50%_a\b"), r"50\%\_a\\b");
    }

    #[test]
    fn class_filter_is_substring_and_ordered_by_id() {
        let conn = test_support::conn();
        insert_student(&conn, &input("A", "", "1", "Grade 10"), "t").expect("a");
        insert_student(&conn, &input("B", "", "2", "Grade 2"), "t").expect("b");
        insert_student(&conn, &input("C", "", "3", "Grade 1"), "t").expect("c");

        let g1 = list_by_class(&conn, Some("Grade 1")).expect("list");
        let names: Vec<_> = g1.iter().map(|s| s.first_name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
        assert_eq!(list_by_class(&conn, None).expect("all").len(), 3);
    }

    #[test]
    fn find_by_admission_trims_input() {
        let conn = test_support::conn();
        insert_student(&conn, &input("A", "B", "ADM9", ""), "t").expect("a");
        assert!(find_by_admission(&conn, " ADM9 ").expect("find").is_some());
        assert!(find_by_admission(&conn, "ADM8").expect("find").is_none());
    }
}
