use crate::error::RecordResult;
use crate::model::DateRange;
use crate::stats::{self, TrendPoint};
use crate::store;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub today: String,
    pub total_students: i64,
    pub paid_fees: i64,
    /// Present percentage over the last 30 days; 0 with no records.
    pub attendance_30d: f64,
    pub attendance_trend: Vec<TrendPoint>,
}

pub fn summary(conn: &Connection, today: NaiveDate) -> RecordResult<DashboardSummary> {
    let window = stats::rolling_window(today);
    let recent = store::attendance::list_attendance(conn, window)?;

    let months = stats::trend_windows(today);
    let trend_records = match (months.first(), months.last()) {
        (Some(first), Some(last)) => {
            store::attendance::list_attendance(conn, DateRange::new(first.start, last.last_day()))?
        }
        _ => Vec::new(),
    };

    Ok(DashboardSummary {
        today: crate::model::format_date(today),
        total_students: store::students::count_students(conn)?,
        paid_fees: store::fees::count_paid_fees(conn)?,
        attendance_30d: stats::rolling_percentage(&recent, today),
        attendance_trend: stats::monthly_trend(&trend_records, today),
    })
}
