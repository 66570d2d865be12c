use crate::{
    error::ServiceError,
    service::{report::ReportService, roster::RosterService},
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DailyQuery {
    /// Calendar date, `YYYY-MM-DD`; today in the service timezone when omitted
    pub date: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/attendance/daily",
    params(DailyQuery),
    responses(
        (status = 200, body = [crate::service::report::DailyEntry]),
        (status = 400, description = "Invalid date value"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reports"
)]
pub async fn daily(
    service: web::Data<ReportService>,
    query: web::Query<DailyQuery>,
) -> Result<impl Responder, ServiceError> {
    Ok(HttpResponse::Ok().json(service.daily(query.date.as_deref()).await?))
}

/// Rows of the last seven days, ordered by section, name, date
#[utoipa::path(
    get,
    path = "/api/attendance/weekly",
    responses((status = 200, body = [crate::service::report::WeeklyEntry]), (status = 500)),
    tag = "Reports"
)]
pub async fn weekly(service: web::Data<ReportService>) -> Result<impl Responder, ServiceError> {
    Ok(HttpResponse::Ok().json(service.weekly().await?))
}

/// Present/absent/late counts per month
#[utoipa::path(
    get,
    path = "/api/attendance/monthly",
    responses((status = 200, body = [crate::service::report::MonthlyCounts]), (status = 500)),
    tag = "Reports"
)]
pub async fn monthly(service: web::Data<ReportService>) -> Result<impl Responder, ServiceError> {
    Ok(HttpResponse::Ok().json(service.monthly().await?))
}

/// Raw rows of the current month
#[utoipa::path(
    get,
    path = "/api/attendance/monthlyreport",
    responses((status = 200, body = [crate::service::report::MonthRecord]), (status = 500)),
    tag = "Reports"
)]
pub async fn monthly_report(
    service: web::Data<ReportService>,
) -> Result<impl Responder, ServiceError> {
    Ok(HttpResponse::Ok().json(service.monthly_range().await?))
}

#[utoipa::path(
    get,
    path = "/api/attendance/yearly",
    responses((status = 200, body = [crate::service::report::YearlyCounts]), (status = 500)),
    tag = "Reports"
)]
pub async fn yearly(service: web::Data<ReportService>) -> Result<impl Responder, ServiceError> {
    Ok(HttpResponse::Ok().json(service.yearly().await?))
}

#[utoipa::path(
    get,
    path = "/api/attendance/overview",
    responses((status = 200, body = crate::service::report::Overview), (status = 500)),
    tag = "Reports"
)]
pub async fn overview(service: web::Data<ReportService>) -> Result<impl Responder, ServiceError> {
    Ok(HttpResponse::Ok().json(service.overview().await?))
}

#[utoipa::path(
    get,
    path = "/api/stats",
    responses((status = 200, body = crate::service::report::Stats), (status = 500)),
    tag = "Reports"
)]
pub async fn stats(service: web::Data<ReportService>) -> Result<impl Responder, ServiceError> {
    Ok(HttpResponse::Ok().json(service.stats().await?))
}

/// Number of teacher accounts
#[utoipa::path(
    get,
    path = "/api/professors",
    responses(
        (status = 200, body = Object, example = json!({ "count": 12 })),
        (status = 500)
    ),
    tag = "Reports"
)]
pub async fn professors(service: web::Data<RosterService>) -> Result<impl Responder, ServiceError> {
    let count = service.count_professors().await?;
    Ok(HttpResponse::Ok().json(json!({ "count": count })))
}
