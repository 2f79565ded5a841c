use crate::model::{Fee, FeeStatus, Payment};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;

fn fee_from_row(r: &Row<'_>) -> rusqlite::Result<Fee> {
    let status: String = r.get(5)?;
    Ok(Fee {
        id: r.get(0)?,
        student_id: r.get(1)?,
        description: r.get(2)?,
        amount: r.get(3)?,
        due_date: r.get(4)?,
        status: FeeStatus::from_db(&status),
        created_at: r.get(6)?,
    })
}

fn payment_from_row(r: &Row<'_>) -> rusqlite::Result<Payment> {
    Ok(Payment {
        id: r.get(0)?,
        fee_id: r.get(1)?,
        student_id: r.get(2)?,
        amount: r.get(3)?,
        method: r.get(4)?,
        tx_ref: r.get(5)?,
        paid_at: r.get(6)?,
    })
}

#[derive(Debug, Clone)]
pub struct NewFee<'a> {
    pub student_id: i64,
    pub description: &'a str,
    pub amount: f64,
    pub due_date: &'a str,
    pub created_at: &'a str,
}

pub fn insert_fee(conn: &Connection, fee: &NewFee<'_>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO fees(student_id, description, amount, due_date, status, created_at)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            fee.student_id,
            fee.description,
            fee.amount,
            fee.due_date,
            FeeStatus::Pending.as_str(),
            fee.created_at,
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_fee(conn: &Connection, id: i64) -> rusqlite::Result<Option<Fee>> {
    conn.query_row(
        "SELECT id, student_id, description, amount, due_date, status, created_at
         FROM fees WHERE id = ?",
        [id],
        fee_from_row,
    )
    .optional()
}

pub fn list_fees(
    conn: &Connection,
    student_id: Option<i64>,
    status: Option<FeeStatus>,
) -> rusqlite::Result<Vec<Fee>> {
    let mut sql = String::from(
        "SELECT id, student_id, description, amount, due_date, status, created_at
         FROM fees WHERE 1 = 1",
    );
    let mut bind: Vec<Value> = Vec::new();
    if let Some(sid) = student_id {
        sql.push_str(" AND student_id = ?");
        bind.push(Value::Integer(sid));
    }
    match status {
        Some(FeeStatus::Paid) => sql.push_str(" AND status = 'paid'"),
        Some(FeeStatus::Pending) => sql.push_str(" AND status != 'paid'"),
        None => {}
    }
    sql.push_str(" ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(bind), fee_from_row)?;
    rows.collect()
}

/// Lowest-id fee of the student that is not yet paid.
pub fn find_oldest_unpaid_fee(conn: &Connection, student_id: i64) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM fees WHERE student_id = ? AND status != 'paid' ORDER BY id LIMIT 1",
        [student_id],
        |r| r.get(0),
    )
    .optional()
}

pub fn mark_fee_paid(conn: &Connection, fee_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE fees SET status = ? WHERE id = ?",
        (FeeStatus::Paid.as_str(), fee_id),
    )
}

pub fn count_paid_fees(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM fees WHERE status = 'paid'", [], |r| {
        r.get(0)
    })
}

/// Detach payments from the fee, then remove it.
pub fn delete_fee(conn: &Connection, fee_id: i64) -> rusqlite::Result<usize> {
    conn.execute("UPDATE payments SET fee_id = NULL WHERE fee_id = ?", [fee_id])?;
    conn.execute("DELETE FROM fees WHERE id = ?", [fee_id])
}

#[derive(Debug, Clone)]
pub struct NewPayment<'a> {
    pub fee_id: Option<i64>,
    pub student_id: i64,
    pub amount: f64,
    pub method: &'a str,
    pub tx_ref: &'a str,
    pub paid_at: &'a str,
}

pub fn insert_payment(conn: &Connection, p: &NewPayment<'_>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO payments(fee_id, student_id, amount, method, tx_ref, paid_at)
         VALUES(?, ?, ?, ?, ?, ?)",
        (p.fee_id, p.student_id, p.amount, p.method, p.tx_ref, p.paid_at),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_payment(conn: &Connection, id: i64) -> rusqlite::Result<Option<Payment>> {
    conn.query_row(
        "SELECT id, fee_id, student_id, amount, method, tx_ref, paid_at
         FROM payments WHERE id = ?",
        [id],
        payment_from_row,
    )
    .optional()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEntry {
    #[serde(flatten)]
    pub payment: Payment,
    pub student: String,
}

/// Most recent payments first, joined with student names.
pub fn list_recent_payments(conn: &Connection, limit: i64) -> rusqlite::Result<Vec<PaymentEntry>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.fee_id, p.student_id, p.amount, p.method, p.tx_ref, p.paid_at,
                trim(s.first_name || ' ' || s.last_name)
         FROM payments p
         JOIN students s ON s.id = p.student_id
         ORDER BY p.paid_at DESC, p.id DESC
         LIMIT ?",
    )?;
    let rows = stmt.query_map([limit], |r| {
        Ok(PaymentEntry {
            payment: payment_from_row(r)?,
            student: r.get(7)?,
        })
    })?;
    rows.collect()
}

/// Remove every payment and fee that belongs to the student.
pub fn delete_for_student(conn: &Connection, student_id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM payments WHERE student_id = ?", [student_id])?;
    conn.execute("DELETE FROM fees WHERE student_id = ?", [student_id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support;

    fn fee(conn: &Connection, student_id: i64) -> i64 {
        insert_fee(
            conn,
            &NewFee {
                student_id,
                description: "Tuition",
                amount: 100.0,
                due_date: "2024-09-01",
                created_at: "2024-08-01T00:00:00",
            },
        )
        .expect("insert fee")
    }

    #[test]
    fn oldest_unpaid_is_lowest_id_not_yet_paid() {
        let conn = test_support::conn();
        let sid = test_support::student(&conn, "A1");
        let other = test_support::student(&conn, "A2");
        let _ = fee(&conn, other);
        let f1 = fee(&conn, sid);
        let f2 = fee(&conn, sid);

        assert_eq!(find_oldest_unpaid_fee(&conn, sid).expect("find"), Some(f1));
        mark_fee_paid(&conn, f1).expect("pay");
        assert_eq!(find_oldest_unpaid_fee(&conn, sid).expect("find"), Some(f2));
        mark_fee_paid(&conn, f2).expect("pay");
        assert_eq!(find_oldest_unpaid_fee(&conn, sid).expect("find"), None);
        assert_eq!(count_paid_fees(&conn).expect("count"), 2);
    }

    #[test]
    fn list_filters_by_student_and_status() {
        let conn = test_support::conn();
        let sid = test_support::student(&conn, "A1");
        let other = test_support::student(&conn, "A2");
        let f1 = fee(&conn, sid);
        let _f2 = fee(&conn, sid);
        let _f3 = fee(&conn, other);
        mark_fee_paid(&conn, f1).expect("pay");

        assert_eq!(list_fees(&conn, None, None).expect("all").len(), 3);
        assert_eq!(list_fees(&conn, Some(sid), None).expect("student").len(), 2);
        let paid = list_fees(&conn, Some(sid), Some(FeeStatus::Paid)).expect("paid");
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].id, f1);
        assert_eq!(
            list_fees(&conn, None, Some(FeeStatus::Pending)).expect("pending").len(),
            2
        );
    }

    #[test]
    fn deleting_a_fee_unlinks_its_payments() {
        let conn = test_support::conn();
        let sid = test_support::student(&conn, "A1");
        let f1 = fee(&conn, sid);
        let pid = insert_payment(
            &conn,
            &NewPayment {
                fee_id: Some(f1),
                student_id: sid,
                amount: 100.0,
                method: "cash",
                tx_ref: "",
                paid_at: "2024-08-02T10:00:00",
            },
        )
        .expect("payment");

        assert_eq!(delete_fee(&conn, f1).expect("delete"), 1);
        let p = get_payment(&conn, pid).expect("get").expect("payment");
        assert_eq!(p.fee_id, None);
        assert!(get_fee(&conn, f1).expect("get").is_none());
    }
}
