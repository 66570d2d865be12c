use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use sqlx::MySqlPool;
use strum::IntoEnumIterator;
use tracing::warn;
use utoipa::ToSchema;

use crate::{
    clock::{self, ServiceClock},
    error::{ServiceError, ServiceResult},
    model::attendance::{AttendanceStatus, AttendanceWithStudent, DatedStatus},
    service::attendance::JOINED_SELECT,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct DailyEntry {
    pub id: u64,
    #[serde(rename = "studentName")]
    pub student_name: String,
    #[schema(example = "2026-10-17")]
    pub attendance_date: String,
    #[schema(example = "PRESENT")]
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeeklyEntry {
    pub id: u64,
    /// External student identifier
    #[schema(example = "2021-00123")]
    pub student_id: String,
    pub name: String,
    pub section: String,
    #[schema(example = "2026-10-17")]
    pub attendance_date: String,
    pub status: String,
}

/// Raw row within the current month.
#[derive(Debug, Serialize, ToSchema)]
pub struct MonthRecord {
    pub id: u64,
    pub student_id: u64,
    #[serde(rename = "studentName")]
    pub student_name: String,
    pub section: String,
    pub subject_id: String,
    #[serde(rename = "type")]
    pub session_type: String,
    #[schema(example = "2026-10-17")]
    pub attendance_date: String,
    pub time_in: Option<String>,
    pub status: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyCounts {
    #[schema(example = "October 2026")]
    pub month: String,
    pub present: u64,
    pub absent: u64,
    pub late: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, ToSchema)]
pub struct YearlyCounts {
    pub year: i32,
    pub attendance_count: u64,
    pub present_count: u64,
    pub absent_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    /// Always `["PRESENT", "ABSENT", "LATE"]`
    pub labels: Vec<String>,
    /// Counts in the same order as `labels`
    pub attendance_breakdown: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_students: i64,
    pub total_classes: i64,
    pub total_attendance_entries: i64,
    /// Percentage of PRESENT rows, one decimal place
    #[schema(example = 83.3)]
    pub attendance_rate: f64,
}

fn parse_status(raw: &str) -> ServiceResult<AttendanceStatus> {
    raw.parse().map_err(|_| {
        warn!(status = raw, "Unknown attendance status in storage");
        ServiceError::Internal(format!("Unknown attendance status {raw}"))
    })
}

/// Per-month present/absent/late counts, chronological. Months with no rows are absent.
pub fn summarize_by_month(rows: &[DatedStatus]) -> ServiceResult<Vec<MonthlyCounts>> {
    let mut months: BTreeMap<NaiveDate, MonthlyCounts> = BTreeMap::new();

    for row in rows {
        let first = row.attendance_date.with_day(1).unwrap_or(row.attendance_date);
        let entry = months.entry(first).or_insert_with(|| MonthlyCounts {
            month: first.format("%B %Y").to_string(),
            ..Default::default()
        });
        match parse_status(&row.status)? {
            AttendanceStatus::Present => entry.present += 1,
            AttendanceStatus::Absent => entry.absent += 1,
            AttendanceStatus::Late => entry.late += 1,
        }
    }

    Ok(months.into_values().collect())
}

/// Per-year totals, ascending by year. LATE rows count toward the total only.
pub fn summarize_by_year(rows: &[DatedStatus]) -> ServiceResult<Vec<YearlyCounts>> {
    let mut years: BTreeMap<i32, YearlyCounts> = BTreeMap::new();

    for row in rows {
        let year = row.attendance_date.year();
        let entry = years.entry(year).or_insert_with(|| YearlyCounts {
            year,
            ..Default::default()
        });
        entry.attendance_count += 1;
        match parse_status(&row.status)? {
            AttendanceStatus::Present => entry.present_count += 1,
            AttendanceStatus::Absent => entry.absent_count += 1,
            AttendanceStatus::Late => {}
        }
    }

    Ok(years.into_values().collect())
}

/// Fixed PRESENT, ABSENT, LATE ordering with zeros filled in.
pub fn status_breakdown(counts: &[(String, i64)]) -> ServiceResult<Overview> {
    let mut by_status: BTreeMap<String, u64> = BTreeMap::new();
    for (status, count) in counts {
        let status = parse_status(status)?;
        *by_status.entry(status.to_string()).or_default() += (*count).max(0) as u64;
    }

    let labels: Vec<String> = AttendanceStatus::iter().map(|s| s.to_string()).collect();
    let attendance_breakdown = labels
        .iter()
        .map(|l| by_status.get(l).copied().unwrap_or(0))
        .collect();

    Ok(Overview {
        labels,
        attendance_breakdown,
    })
}

/// present / total * 100, rounded to one decimal; 0 when there are no rows.
pub fn attendance_rate(present: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let rate = present as f64 / total as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

/// Read-only statistics over the attendance table.
#[derive(Clone)]
pub struct ReportService {
    pool: MySqlPool,
    clock: ServiceClock,
}

impl ReportService {
    pub fn new(pool: MySqlPool, clock: ServiceClock) -> Self {
        Self { pool, clock }
    }

    async fn joined_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        order: &str,
    ) -> ServiceResult<Vec<AttendanceWithStudent>> {
        let sql = format!("{JOINED_SELECT} WHERE a.attendance_date BETWEEN ? AND ? ORDER BY {order}");
        sqlx::query_as::<_, AttendanceWithStudent>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await
            .map_err(ServiceError::db("Failed to fetch attendance report rows"))
    }

    async fn dated_statuses(&self) -> ServiceResult<Vec<DatedStatus>> {
        sqlx::query_as::<_, DatedStatus>("SELECT attendance_date, status FROM attendance")
            .fetch_all(&self.pool)
            .await
            .map_err(ServiceError::db("Failed to fetch attendance statuses"))
    }

    /// Rows for one calendar day (today by default).
    pub async fn daily(&self, date: Option<&str>) -> ServiceResult<Vec<DailyEntry>> {
        let day = self.clock.normalize_date(date)?;
        let rows = self.joined_between(day, day, "a.id").await?;

        Ok(rows
            .into_iter()
            .map(|r| DailyEntry {
                id: r.record.id,
                student_name: r.student_name,
                attendance_date: clock::format_date(r.record.attendance_date),
                status: r.record.status,
            })
            .collect())
    }

    pub async fn weekly(&self) -> ServiceResult<Vec<WeeklyEntry>> {
        let (from, to) = self.clock.week_window();
        let rows = self
            .joined_between(from, to, "s.section, s.name, a.attendance_date")
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| WeeklyEntry {
                id: r.record.id,
                student_id: r.student_code,
                name: r.student_name,
                section: r.student_section,
                attendance_date: clock::format_date(r.record.attendance_date),
                status: r.record.status,
            })
            .collect())
    }

    pub async fn monthly(&self) -> ServiceResult<Vec<MonthlyCounts>> {
        summarize_by_month(&self.dated_statuses().await?)
    }

    pub async fn monthly_range(&self) -> ServiceResult<Vec<MonthRecord>> {
        let (from, to) = self.clock.month_window();
        let rows = self.joined_between(from, to, "a.attendance_date, a.id").await?;

        Ok(rows
            .into_iter()
            .map(|r| MonthRecord {
                id: r.record.id,
                student_id: r.record.student_id,
                student_name: r.student_name,
                section: r.record.section,
                subject_id: r.record.subject_id,
                session_type: r.record.session_type,
                attendance_date: clock::format_date(r.record.attendance_date),
                time_in: r.record.time_in.map(clock::format_datetime),
                status: r.record.status,
            })
            .collect())
    }

    pub async fn yearly(&self) -> ServiceResult<Vec<YearlyCounts>> {
        summarize_by_year(&self.dated_statuses().await?)
    }

    pub async fn overview(&self) -> ServiceResult<Overview> {
        let counts: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM attendance GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(ServiceError::db("Failed to fetch attendance overview"))?;

        status_breakdown(&counts)
    }

    pub async fn stats(&self) -> ServiceResult<Stats> {
        let count = |sql: &'static str| {
            let pool = self.pool.clone();
            async move {
                sqlx::query_scalar::<_, i64>(sql)
                    .fetch_one(&pool)
                    .await
                    .map_err(ServiceError::db("Failed to compute stats"))
            }
        };

        let (total_students, total_classes, total_attendance_entries, present) = futures::try_join!(
            count("SELECT COUNT(*) FROM students"),
            count("SELECT COUNT(*) FROM classes"),
            count("SELECT COUNT(*) FROM attendance"),
            count("SELECT COUNT(*) FROM attendance WHERE status = 'PRESENT'"),
        )?;

        Ok(Stats {
            total_students,
            total_classes,
            total_attendance_entries,
            attendance_rate: attendance_rate(present, total_attendance_entries),
        })
    }
}
