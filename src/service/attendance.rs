use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::{
    clock::{self, ServiceClock},
    error::{ServiceError, ServiceResult, is_constraint_violation},
    model::attendance::{Attendance, AttendanceStatus, AttendanceWithStudent, SessionType},
    models::{non_blank, string_or_number},
};

/// Rows per INSERT statement; keeps the bind count well under MySQL's 65535 placeholders.
const INSERT_CHUNK: usize = 1000;

pub(crate) const JOINED_SELECT: &str = r#"
    SELECT a.id, a.student_id, a.attendance_date, a.time_in, a.status, a.section,
           a.subject_id, a.type, a.start_time, a.end_time, a.photo,
           s.name AS student_name, s.section AS student_section, s.student_id AS student_code
    FROM attendance a
    JOIN students s ON s.id = a.student_id
"#;

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartSessionRequest {
    #[schema(example = "SBIT3I")]
    pub section: Option<String>,
    #[serde(rename = "type")]
    #[schema(example = "lecture")]
    pub session_type: Option<String>,
    #[schema(example = "09:00")]
    pub start_time: Option<String>,
    #[schema(example = "11:00")]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    #[schema(example = "SIA101", value_type = String)]
    pub subject_id: Option<String>,
}

/// Validated session-defining fields shared by every row of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub section: String,
    pub session_type: SessionType,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub subject_id: String,
}

impl StartSessionRequest {
    pub fn validate(&self) -> ServiceResult<Session> {
        let section = non_blank(&self.section)
            .ok_or_else(|| ServiceError::validation("Section is required."))?;
        let subject_id = non_blank(&self.subject_id)
            .ok_or_else(|| ServiceError::validation("Subject is required."))?;
        let session_type = non_blank(&self.session_type)
            .ok_or_else(|| ServiceError::validation("Session type is required."))?
            .parse::<SessionType>()
            .map_err(|_| ServiceError::validation("Session type must be lecture or laboratory."))?;
        let start_time = clock::parse_time_of_day(
            non_blank(&self.start_time)
                .ok_or_else(|| ServiceError::validation("Start time is required."))?,
        )?;
        let end_time = clock::parse_time_of_day(
            non_blank(&self.end_time).ok_or_else(|| ServiceError::validation("End time is required."))?,
        )?;

        Ok(Session {
            section: section.to_string(),
            session_type,
            start_time,
            end_time,
            subject_id: subject_id.to_string(),
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckInRequest {
    /// Surrogate id of the student (`students.id`)
    #[serde(rename = "studentId")]
    #[schema(example = 1)]
    pub student_id: Option<u64>,
    /// Encoded image captured by the scanner
    pub photo: Option<String>,
    /// `YYYY-MM-DD`, `MM/DD/YYYY` or an RFC 3339 instant; today when absent
    #[schema(example = "10/17/2026")]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EditRecordRequest {
    #[schema(example = 1)]
    pub student_id: Option<u64>,
    #[schema(example = "08:05")]
    pub time_in: Option<String>,
    #[schema(example = "2026-10-17")]
    pub attendance_date: Option<String>,
    #[schema(example = "LATE")]
    pub status: Option<String>,
    pub photo: Option<String>,
}

/// Fully parsed overwrite for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEdit {
    pub student_id: u64,
    pub attendance_date: NaiveDate,
    pub time_in: NaiveDateTime,
    pub status: AttendanceStatus,
    pub photo: Option<String>,
}

impl EditRecordRequest {
    pub fn validate(&self, clock: &ServiceClock) -> ServiceResult<RecordEdit> {
        let required = || ServiceError::validation("All fields are required.");

        let student_id = self.student_id.ok_or_else(required)?;
        let time_in = non_blank(&self.time_in).ok_or_else(required)?;
        let attendance_date = non_blank(&self.attendance_date).ok_or_else(required)?;
        let status = non_blank(&self.status).ok_or_else(required)?;

        let status = status
            .parse::<AttendanceStatus>()
            .map_err(|_| ServiceError::validation("Status must be PRESENT, ABSENT or LATE."))?;
        let (attendance_date, time_in) = clock.parse_edit(attendance_date, time_in)?;

        Ok(RecordEdit {
            student_id,
            attendance_date,
            time_in,
            status,
            photo: self.photo.clone(),
        })
    }
}

/// Attendance row as rendered by the list and detail views.
#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceView {
    pub id: u64,
    pub student_id: u64,
    #[serde(rename = "studentName")]
    pub student_name: String,
    /// Locale timestamp in the service timezone, e.g. `10/17/2026, 12:00:00 AM`
    pub attendance_date: String,
    #[schema(example = "2026-10-17 08:05:00")]
    pub time_in: Option<String>,
    pub status: String,
    pub section: String,
    pub subject_id: String,
    #[serde(rename = "type")]
    pub session_type: String,
    pub start_time: String,
    pub end_time: String,
    pub photo: Option<String>,
}

impl From<AttendanceWithStudent> for AttendanceView {
    fn from(row: AttendanceWithStudent) -> Self {
        let Attendance {
            id,
            student_id,
            attendance_date,
            time_in,
            status,
            section,
            subject_id,
            session_type,
            start_time,
            end_time,
            photo,
        } = row.record;

        Self {
            id,
            student_id,
            student_name: row.student_name,
            attendance_date: clock::format_display(attendance_date),
            time_in: time_in.map(clock::format_datetime),
            status,
            section,
            subject_id,
            session_type,
            start_time: start_time.format("%H:%M:%S").to_string(),
            end_time: end_time.format("%H:%M:%S").to_string(),
            photo,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckInOutcome {
    #[schema(example = "2026-10-17")]
    pub attendance_date: String,
    #[schema(example = "2026-10-17 08:05:00")]
    pub time_in: String,
}

/// Session lifecycle and per-record mutation. Holds no state between calls.
#[derive(Clone)]
pub struct AttendanceService {
    pool: MySqlPool,
    clock: ServiceClock,
}

impl AttendanceService {
    pub fn new(pool: MySqlPool, clock: ServiceClock) -> Self {
        Self { pool, clock }
    }

    /// Opens a session: one ABSENT row per rostered student, dated today, in one transaction.
    #[instrument(name = "start_session", skip(self, req), fields(section = ?req.section, subject = ?req.subject_id))]
    pub async fn start_session(&self, req: &StartSessionRequest) -> ServiceResult<u64> {
        let session = req.validate()?;
        let today = self.clock.today();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(ServiceError::db("Failed to open transaction"))?;

        let roster: Vec<u64> = sqlx::query_scalar("SELECT id FROM students ORDER BY id")
            .fetch_all(&mut *tx)
            .await
            .map_err(ServiceError::db("Failed to fetch roster"))?;

        let mut inserted = 0u64;
        for chunk in roster.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<MySql> = QueryBuilder::new(
                "INSERT INTO attendance \
                 (student_id, attendance_date, section, time_in, status, subject_id, type, start_time, end_time, photo) ",
            );
            qb.push_values(chunk, |mut row, student_id| {
                row.push_bind(*student_id)
                    .push_bind(today)
                    .push_bind(session.section.clone())
                    .push_bind(None::<NaiveDateTime>)
                    .push_bind(AttendanceStatus::Absent.to_string())
                    .push_bind(session.subject_id.clone())
                    .push_bind(session.session_type.to_string())
                    .push_bind(session.start_time)
                    .push_bind(session.end_time)
                    .push_bind(None::<String>);
            });

            inserted += qb
                .build()
                .execute(&mut *tx)
                .await
                .map_err(ServiceError::db("Failed to insert attendance rows"))?
                .rows_affected();
        }

        tx.commit()
            .await
            .map_err(ServiceError::db("Failed to commit attendance session"))?;

        info!(rows = inserted, date = %today, "Attendance session started");
        Ok(inserted)
    }

    /// Marks the student's row for `date` PRESENT. With several sessions on one
    /// day the earliest still-ABSENT row wins.
    #[instrument(name = "check_in", skip(self, req), fields(student_id = ?req.student_id))]
    pub async fn check_in(&self, req: &CheckInRequest) -> ServiceResult<CheckInOutcome> {
        let student_id = req
            .student_id
            .ok_or_else(|| ServiceError::validation("Student ID is required."))?;
        let date = self.clock.normalize_date(req.date.as_deref())?;
        let now = self.clock.now();

        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET time_in = ?, status = ?, photo = ?
            WHERE student_id = ? AND attendance_date = ?
            ORDER BY (status = 'ABSENT') DESC, id ASC
            LIMIT 1
            "#,
        )
        .bind(now)
        .bind(AttendanceStatus::Present.as_ref())
        .bind(&req.photo)
        .bind(student_id)
        .bind(date)
        .execute(&self.pool)
        .await
        .map_err(ServiceError::db("Failed to update attendance"))?;

        if result.rows_affected() == 0 {
            debug!(%date, "No attendance row to check in");
            return Err(ServiceError::not_found(
                "No matching attendance record found to update.",
            ));
        }

        Ok(CheckInOutcome {
            attendance_date: clock::format_date(date),
            time_in: clock::format_datetime(now),
        })
    }

    /// Unconstrained overwrite of one record.
    #[instrument(name = "edit_record", skip(self, req), fields(status = ?req.status))]
    pub async fn edit_record(&self, id: u64, req: &EditRecordRequest) -> ServiceResult<()> {
        let edit = req.validate(&self.clock)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(ServiceError::db("Failed to open transaction"))?;

        let matching: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(ServiceError::db("Failed to look up attendance record"))?;
        if matching == 0 {
            return Err(ServiceError::not_found(
                "No matching attendance record found to update.",
            ));
        }

        sqlx::query(
            r#"
            UPDATE attendance
            SET student_id = ?, time_in = ?, attendance_date = ?, status = ?, photo = ?
            WHERE id = ?
            "#,
        )
        .bind(edit.student_id)
        .bind(edit.time_in)
        .bind(edit.attendance_date)
        .bind(edit.status.as_ref())
        .bind(&edit.photo)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_constraint_violation(&e) {
                ServiceError::validation(format!("Unknown student {}", edit.student_id))
            } else {
                ServiceError::db("Failed to update attendance")(e)
            }
        })?;

        tx.commit()
            .await
            .map_err(ServiceError::db("Failed to commit attendance update"))?;

        Ok(())
    }

    #[instrument(name = "delete_record", skip(self))]
    pub async fn delete_record(&self, id: u64) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(ServiceError::db("Failed to delete attendance record"))?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("Attendance record not found."));
        }

        Ok(())
    }

    pub async fn list_records(&self) -> ServiceResult<Vec<AttendanceView>> {
        let sql = format!("{JOINED_SELECT} ORDER BY a.attendance_date DESC, a.id ASC");
        let rows = sqlx::query_as::<_, AttendanceWithStudent>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(ServiceError::db("Failed to fetch attendance"))?;

        Ok(rows.into_iter().map(AttendanceView::from).collect())
    }

    pub async fn get_record(&self, id: u64) -> ServiceResult<AttendanceView> {
        let sql = format!("{JOINED_SELECT} WHERE a.id = ?");
        sqlx::query_as::<_, AttendanceWithStudent>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ServiceError::db("Failed to fetch attendance record"))?
            .map(AttendanceView::from)
            .ok_or_else(|| ServiceError::not_found("Attendance record not found."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn clock() -> ServiceClock {
        ServiceClock::new(FixedOffset::east_opt(8 * 3600).unwrap())
    }

    fn start(section: &str, kind: &str, from: &str, to: &str, subject: &str) -> StartSessionRequest {
        StartSessionRequest {
            section: Some(section.into()),
            session_type: Some(kind.into()),
            start_time: Some(from.into()),
            end_time: Some(to.into()),
            subject_id: Some(subject.into()),
        }
    }

    #[test]
    fn session_fields_are_parsed() {
        let s = start("SBIT3I", "lecture", "09:00", "11:00", "SIA101").validate().unwrap();
        assert_eq!(s.section, "SBIT3I");
        assert_eq!(s.session_type, SessionType::Lecture);
        assert_eq!(s.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(s.end_time, NaiveTime::from_hms_opt(11, 0, 0).unwrap());
    }

    #[test]
    fn session_rejects_unknown_type_and_bad_times() {
        assert!(start("SBIT3I", "seminar", "09:00", "11:00", "SIA101").validate().is_err());
        assert!(start("SBIT3I", "lecture", "9am", "11:00", "SIA101").validate().is_err());
        assert!(start(" ", "lecture", "09:00", "11:00", "SIA101").validate().is_err());
    }

    #[test]
    fn session_request_uses_wire_names() {
        let req: StartSessionRequest = serde_json::from_str(
            r#"{"section":"SBIT3I","type":"laboratory","start_time":"13:00","end_time":"15:30","subject_id":101}"#,
        )
        .unwrap();
        let s = req.validate().unwrap();
        assert_eq!(s.session_type, SessionType::Laboratory);
        assert_eq!(s.subject_id, "101");
    }

    fn edit(student: Option<u64>, time: &str, date: &str, status: &str) -> EditRecordRequest {
        EditRecordRequest {
            student_id: student,
            time_in: Some(time.into()),
            attendance_date: Some(date.into()),
            status: Some(status.into()),
            photo: None,
        }
    }

    #[test]
    fn edit_requires_every_field() {
        let err = edit(None, "08:00", "2026-10-17", "LATE").validate(&clock()).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(m) if m == "All fields are required."));

        let err = edit(Some(1), "", "2026-10-17", "LATE").validate(&clock()).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn edit_rejects_unparseable_values() {
        let err = edit(Some(1), "08:00", "not-a-date", "LATE").validate(&clock()).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(m) if m == "Invalid date or time value."));

        assert!(edit(Some(1), "8 o'clock", "2026-10-17", "LATE").validate(&clock()).is_err());
        assert!(edit(Some(1), "08:00", "2026-10-17", "EXCUSED").validate(&clock()).is_err());
    }

    #[test]
    fn edit_accepts_any_status() {
        for (raw, expected) in [
            ("PRESENT", AttendanceStatus::Present),
            ("absent", AttendanceStatus::Absent),
            ("Late", AttendanceStatus::Late),
        ] {
            let e = edit(Some(9), "07:45:10", "2026-10-17", raw).validate(&clock()).unwrap();
            assert_eq!(e.status, expected);
            assert_eq!(e.student_id, 9);
            assert_eq!(clock::format_datetime(e.time_in), "2026-10-17 07:45:10");
        }
    }

    #[test]
    fn list_view_renders_service_timezone_strings() {
        let row = AttendanceWithStudent {
            record: Attendance {
                id: 5,
                student_id: 2,
                attendance_date: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
                time_in: None,
                status: "ABSENT".into(),
                section: "SBIT3I".into(),
                subject_id: "SIA101".into(),
                session_type: "lecture".into(),
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
                photo: None,
            },
            student_name: "Ana".into(),
            student_section: "SBIT3I".into(),
            student_code: "2021-0002".into(),
        };

        let json = serde_json::to_value(AttendanceView::from(row)).unwrap();
        assert_eq!(json["attendance_date"], "10/17/2026, 12:00:00 AM");
        assert_eq!(json["studentName"], "Ana");
        assert_eq!(json["type"], "lecture");
        assert!(json["time_in"].is_null());
    }
}
