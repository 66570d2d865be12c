use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SessionType {
    Lecture,
    Laboratory,
}

/// One student's row for one session.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Attendance {
    pub id: u64,
    pub student_id: u64,
    pub attendance_date: NaiveDate,
    /// Blank until the student checks in
    pub time_in: Option<NaiveDateTime>,
    pub status: String,
    pub section: String,
    pub subject_id: String,
    #[sqlx(rename = "type")]
    pub session_type: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub photo: Option<String>,
}

/// Attendance row joined with the student's name and section.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceWithStudent {
    #[sqlx(flatten)]
    pub record: Attendance,
    pub student_name: String,
    pub student_section: String,
    /// The student's external identifier (`students.student_id`)
    pub student_code: String,
}

/// Projection used by the aggregate reports.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DatedStatus {
    pub attendance_date: NaiveDate,
    pub status: String,
}
