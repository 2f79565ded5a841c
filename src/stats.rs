use crate::model::{AttendanceRecord, AttendanceStatus, DateRange};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

/// Length of the dashboard's rolling attendance window, in days before today.
pub const ROLLING_WINDOW_DAYS: u64 = 30;

/// Number of calendar months shown in the attendance trend.
pub const TREND_MONTHS: u32 = 6;

/// One-decimal rounding used for every displayed percentage:
/// `floor(10*x + 0.5) / 10`
pub fn round_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceTally {
    pub present: usize,
    pub total: usize,
}

impl AttendanceTally {
    /// Present share of all records, in percent. An empty tally is 0.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        round_1_decimal(100.0 * self.present as f64 / self.total as f64)
    }

    /// Like `percent`, but an empty tally has no value at all.
    pub fn percent_or_none(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.percent())
        }
    }
}

pub fn tally<'a, I>(statuses: I) -> AttendanceTally
where
    I: IntoIterator<Item = &'a AttendanceStatus>,
{
    let mut t = AttendanceTally::default();
    for s in statuses {
        t.total += 1;
        if s.is_present() {
            t.present += 1;
        }
    }
    t
}

pub fn present_percentage<'a, I>(statuses: I) -> f64
where
    I: IntoIterator<Item = &'a AttendanceStatus>,
{
    tally(statuses).percent()
}

/// `[today - 30 days, today]`.
pub fn rolling_window(today: NaiveDate) -> DateRange {
    let from = today
        .checked_sub_days(Days::new(ROLLING_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MIN);
    DateRange::new(from, today)
}

/// Attendance percentage over the rolling window ending `today`. Records
/// outside the window are ignored.
pub fn rolling_percentage(records: &[AttendanceRecord], today: NaiveDate) -> f64 {
    let window = rolling_window(today);
    present_percentage(
        records
            .iter()
            .filter(|r| window.contains(r.date))
            .map(|r| &r.status),
    )
}

/// A calendar month as the half-open range `[start, next_start)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: NaiveDate,
    pub next_start: NaiveDate,
}

impl MonthWindow {
    pub fn containing(d: NaiveDate) -> Option<MonthWindow> {
        let start = d.with_day(1)?;
        let next_start = start.checked_add_months(Months::new(1))?;
        Some(MonthWindow { start, next_start })
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        d >= self.start && d < self.next_start
    }

    /// Last day that still belongs to the month.
    pub fn last_day(&self) -> NaiveDate {
        self.next_start.pred_opt().unwrap_or(self.start)
    }

    pub fn key(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }

    pub fn label(&self) -> String {
        self.start.format("%b").to_string()
    }
}

/// The current month and the five before it, oldest first.
pub fn trend_windows(today: NaiveDate) -> Vec<MonthWindow> {
    let Some(current) = MonthWindow::containing(today) else {
        return Vec::new();
    };
    (0..TREND_MONTHS)
        .rev()
        .filter_map(|back| {
            let start = current.start.checked_sub_months(Months::new(back))?;
            MonthWindow::containing(start)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub month: String,
    pub label: String,
    /// `None` when the month has no attendance records at all.
    pub percent: Option<f64>,
    pub records: usize,
}

pub fn monthly_trend(records: &[AttendanceRecord], today: NaiveDate) -> Vec<TrendPoint> {
    trend_windows(today)
        .into_iter()
        .map(|w| {
            let t = tally(
                records
                    .iter()
                    .filter(|r| w.contains(r.date))
                    .map(|r| &r.status),
            );
            TrendPoint {
                month: w.key(),
                label: w.label(),
                percent: t.percent_or_none(),
                records: t.total,
            }
        })
        .collect()
}
