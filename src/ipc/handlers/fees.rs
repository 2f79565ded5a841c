use crate::clock;
use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::with_session;
use crate::ipc::params::{get_opt_i64, get_opt_str, get_required_f64, get_required_i64, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{FeeStatus, Session};
use crate::records::fees::{self, InvoiceRequest, PaymentRequest};
use rusqlite::Connection;
use serde_json::{json, Value};

fn fees_create_invoice(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let req = InvoiceRequest {
        admission_no: get_required_str(params, "admissionNo")?,
        amount: get_required_f64(params, "amount")?,
        description: get_opt_str(params, "description")?,
        due_date: get_opt_str(params, "dueDate")?,
    };
    let fee = fees::create_invoice(conn, &req, clock::today())?;
    Ok(json!({ "fee": fee }))
}

fn fees_list(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let student_id = get_opt_i64(params, "studentId")?;
    let status = match get_opt_str(params, "status")?.as_deref() {
        None | Some("") | Some("all") => None,
        Some("paid") => Some(FeeStatus::Paid),
        Some("pending") | Some("unpaid") => Some(FeeStatus::Pending),
        Some(other) => {
            return Err(HandlerErr::bad_params(format!(
                "status must be paid or pending, got {}",
                other
            )))
        }
    };
    Ok(json!({ "fees": fees::list_fees(conn, student_id, status)? }))
}

fn fees_delete(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_i64(params, "feeId")?;
    fees::delete_fee(conn, id)?;
    Ok(json!({ "ok": true }))
}

fn payments_record(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let req = PaymentRequest {
        admission_no: get_required_str(params, "admissionNo")?,
        amount: get_required_f64(params, "amount")?,
        method: get_opt_str(params, "method")?,
        tx_ref: get_opt_str(params, "txRef")?,
    };
    let receipt = fees::record_payment(conn, &req)?;
    Ok(serde_json::to_value(receipt)?)
}

fn payments_list(conn: &Connection, _session: &Session, params: &Value) -> Result<Value, HandlerErr> {
    let limit = get_opt_i64(params, "limit")?;
    Ok(json!({ "payments": fees::recent_payments(conn, limit)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "fees.createInvoice" => Some(with_session(state, req, fees_create_invoice)),
        "fees.list" => Some(with_session(state, req, fees_list)),
        "fees.delete" => Some(with_session(state, req, fees_delete)),
        "payments.record" => Some(with_session(state, req, payments_record)),
        "payments.list" => Some(with_session(state, req, payments_list)),
        _ => None,
    }
}
