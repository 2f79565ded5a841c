use crate::clock;
use crate::error::{RecordError, RecordResult};
use crate::model::{format_date, parse_date, Fee, FeeStatus, Payment};
use crate::records::{non_negative_amount, students};
use crate::store;
use crate::store::fees::{NewFee, NewPayment, PaymentEntry};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

pub const DEFAULT_DESCRIPTION: &str = "Tuition";
pub const DEFAULT_METHOD: &str = "cash";
pub const RECENT_PAYMENTS_LIMIT: i64 = 50;

#[derive(Debug, Clone, Default)]
pub struct InvoiceRequest {
    pub admission_no: String,
    pub amount: f64,
    pub description: Option<String>,
    pub due_date: Option<String>,
}

/// Create a pending fee for the student with the given admission number.
pub fn create_invoice(conn: &Connection, req: &InvoiceRequest, today: NaiveDate) -> RecordResult<Fee> {
    let amount = non_negative_amount(req.amount)?;
    let description = req
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_DESCRIPTION);
    let due_date = match req.due_date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_date(raw)
            .map(format_date)
            .ok_or_else(|| RecordError::validation("due date must be YYYY-MM-DD"))?,
        None => format_date(today),
    };

    let student = students::find_by_admission(conn, &req.admission_no)?;
    let id = store::fees::insert_fee(
        conn,
        &NewFee {
            student_id: student.id,
            description,
            amount,
            due_date: &due_date,
            created_at: &clock::now_timestamp(),
        },
    )?;
    info!(fee_id = id, student_id = student.id, amount, "invoice created");
    store::fees::get_fee(conn, id)?.ok_or_else(|| RecordError::not_found("fee not found"))
}

#[derive(Debug, Clone, Default)]
pub struct PaymentRequest {
    pub admission_no: String,
    pub amount: f64,
    pub method: Option<String>,
    pub tx_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub student: String,
    /// Fee this payment settled, if the student had one outstanding.
    pub settled_fee_id: Option<i64>,
}

/// Record a payment and settle the student's oldest unpaid fee with it.
///
/// The whole amount goes to that single fee, which becomes `paid` whatever
/// the amount. With no unpaid fee the payment is stored unlinked.
pub fn record_payment(conn: &Connection, req: &PaymentRequest) -> RecordResult<PaymentReceipt> {
    let amount = non_negative_amount(req.amount)?;
    let method = req
        .method
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_METHOD);
    let tx_ref = req.tx_ref.as_deref().map(str::trim).unwrap_or("");

    let student = students::find_by_admission(conn, &req.admission_no)?;

    let tx = conn.unchecked_transaction()?;
    let fee_id = store::fees::find_oldest_unpaid_fee(&tx, student.id)?;
    let payment_id = store::fees::insert_payment(
        &tx,
        &NewPayment {
            fee_id,
            student_id: student.id,
            amount,
            method,
            tx_ref,
            paid_at: &clock::now_timestamp(),
        },
    )?;
    if let Some(fid) = fee_id {
        store::fees::mark_fee_paid(&tx, fid)?;
    }
    let payment = store::fees::get_payment(&tx, payment_id)?
        .ok_or_else(|| RecordError::not_found("payment not found"))?;
    tx.commit()?;

    info!(
        payment_id,
        student_id = student.id,
        amount,
        settled_fee_id = ?fee_id,
        "payment recorded"
    );
    Ok(PaymentReceipt {
        payment,
        student: student.display_name(),
        settled_fee_id: fee_id,
    })
}

pub fn list_fees(conn: &Connection, student_id: Option<i64>, status: Option<FeeStatus>) -> RecordResult<Vec<Fee>> {
    Ok(store::fees::list_fees(conn, student_id, status)?)
}

pub fn delete_fee(conn: &Connection, fee_id: i64) -> RecordResult<()> {
    let tx = conn.unchecked_transaction()?;
    if store::fees::delete_fee(&tx, fee_id)? == 0 {
        return Err(RecordError::not_found("fee not found"));
    }
    tx.commit()?;
    Ok(())
}

pub fn recent_payments(conn: &Connection, limit: Option<i64>) -> RecordResult<Vec<PaymentEntry>> {
    let limit = limit.unwrap_or(RECENT_PAYMENTS_LIMIT).clamp(1, 1000);
    Ok(store::fees::list_recent_payments(conn, limit)?)
}
