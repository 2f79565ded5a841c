use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Accountant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Accountant => "accountant",
        }
    }

    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "teacher" => Some(Role::Teacher),
            "accountant" => Some(Role::Accountant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

/// Identity of whoever is operating the app. Passed explicitly into any
/// operation that records who did something.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub admission_no: String,
    pub class_name: String,
    pub section: String,
    pub guardian_name: String,
    pub phone: String,
    pub created_at: String,
}

impl Student {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Editable student fields, as entered on the add/edit form.
#[derive(Debug, Clone, Default)]
pub struct StudentInput {
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub admission_no: String,
    pub class_name: String,
    pub section: String,
    pub guardian_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceStatus {
    Present,
    Absent,
    /// Anything else found in the table. Counts as not present.
    Other(String),
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Other(s) => s.as_str(),
        }
    }

    pub fn from_db(raw: &str) -> AttendanceStatus {
        match raw {
            "Present" => AttendanceStatus::Present,
            "Absent" => AttendanceStatus::Absent,
            other => AttendanceStatus::Other(other.to_string()),
        }
    }

    /// Strict parse for the write path: only Present/Absent may be marked.
    pub fn parse_markable(raw: &str) -> Option<AttendanceStatus> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "present" => Some(AttendanceStatus::Present),
            "absent" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, AttendanceStatus::Present)
    }
}

impl Serialize for AttendanceStatus {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    #[serde(serialize_with = "ser_date")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub marked_by: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub student_id: i64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub marked_by: i64,
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        DateRange { from, to }
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        d >= self.from && d <= self.to
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeStatus {
    Pending,
    Paid,
}

impl FeeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FeeStatus::Pending => "pending",
            FeeStatus::Paid => "paid",
        }
    }

    pub fn from_db(raw: &str) -> FeeStatus {
        if raw == "paid" {
            FeeStatus::Paid
        } else {
            FeeStatus::Pending
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
    pub id: i64,
    pub student_id: i64,
    pub description: String,
    pub amount: f64,
    pub due_date: String,
    pub status: FeeStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub fee_id: Option<i64>,
    pub student_id: i64,
    pub amount: f64,
    pub method: String,
    pub tx_ref: String,
    pub paid_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSlot {
    pub id: i64,
    pub exam_title: String,
    pub class_name: String,
    pub subject: String,
    pub exam_date: String,
    pub start_time: String,
    pub end_time: String,
    pub room: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExamSlotInput {
    pub exam_title: String,
    pub class_name: String,
    pub subject: String,
    pub exam_date: String,
    pub start_time: String,
    pub end_time: String,
    pub room: String,
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).ok()
}

pub fn format_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

fn ser_date<S: serde::Serializer>(d: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_date(*d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_is_not_present() {
        let s = AttendanceStatus::from_db("Late");
        assert_eq!(s, AttendanceStatus::Other("Late".to_string()));
        assert!(!s.is_present());
        assert_eq!(s.as_str(), "Late");
    }

    #[test]
    fn markable_status_is_case_insensitive() {
        assert_eq!(
            AttendanceStatus::parse_markable(" present "),
            Some(AttendanceStatus::Present)
        );
        assert_eq!(AttendanceStatus::parse_markable("Late"), None);
    }

    #[test]
    fn date_range_is_inclusive() {
        let from = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let r = DateRange::new(from, to);
        assert!(r.contains(from));
        assert!(r.contains(to));
        assert!(!r.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
    }
}
