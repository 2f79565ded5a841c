//! Record operations: the façade the IPC layer calls. Each function
//! validates its input, runs its statements in one transaction where more
//! than one is needed, and reports failures as [`RecordError`].
//!
//! [`RecordError`]: crate::error::RecordError

pub mod attendance;
pub mod dashboard;
pub mod exams;
pub mod fees;
pub mod students;
pub mod users;

use crate::error::{RecordError, RecordResult};

/// Trim and require a non-empty value.
pub(crate) fn required(value: &str, field: &str) -> RecordResult<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(RecordError::validation(format!("{} is required", field)));
    }
    Ok(v.to_string())
}

pub(crate) fn non_negative_amount(amount: f64) -> RecordResult<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(RecordError::validation("amount must be a non-negative number"));
    }
    Ok(amount)
}
