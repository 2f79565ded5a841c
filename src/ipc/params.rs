use crate::clock;
use crate::ipc::error::HandlerErr;
use crate::model::parse_date;
use chrono::NaiveDate;
use serde_json::Value;

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Missing and null both read as `None`; any other non-string is an error.
pub fn get_opt_str(params: &Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(HandlerErr::bad_params(format!("{} must be a string", key))),
    }
}

/// Like `get_opt_str` but absent fields become "".
pub fn get_str_or_empty(params: &Value, key: &str) -> Result<String, HandlerErr> {
    Ok(get_opt_str(params, key)?.unwrap_or_default())
}

pub fn get_required_i64(params: &Value, key: &str) -> Result<i64, HandlerErr> {
    get_opt_i64(params, key)?.ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_opt_i64(params: &Value, key: &str) -> Result<Option<i64>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be an integer", key))),
    }
}

pub fn get_required_f64(params: &Value, key: &str) -> Result<f64, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Err(HandlerErr::bad_params(format!("missing {}", key))),
        Some(v) => v
            .as_f64()
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a number", key))),
    }
}

pub fn get_opt_date(params: &Value, key: &str) -> Result<Option<NaiveDate>, HandlerErr> {
    match get_opt_str(params, key)? {
        None => Ok(None),
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be YYYY-MM-DD", key))),
    }
}

pub fn get_date_or_today(params: &Value, key: &str) -> Result<NaiveDate, HandlerErr> {
    Ok(get_opt_date(params, key)?.unwrap_or_else(clock::today))
}

pub fn get_required_date(params: &Value, key: &str) -> Result<NaiveDate, HandlerErr> {
    get_opt_date(params, key)?.ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}
