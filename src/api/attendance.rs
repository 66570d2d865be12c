use crate::{
    auth::auth::AuthUser,
    error::ServiceError,
    models::MessageResponse,
    service::attendance::{
        AttendanceService, CheckInRequest, EditRecordRequest, StartSessionRequest,
    },
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::info;

/// Start an attendance session for the whole roster
#[utoipa::path(
    post,
    path = "/api/start-attendance",
    request_body = StartSessionRequest,
    responses(
        (status = 200, description = "One ABSENT row inserted per student", body = Object, example = json!({
            "message": "Attendance started successfully",
            "inserted": 42
        })),
        (status = 400, description = "Missing or malformed session fields"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn start_attendance(
    service: web::Data<AttendanceService>,
    payload: web::Json<StartSessionRequest>,
) -> Result<impl Responder, ServiceError> {
    let inserted = service.start_session(&payload).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance started successfully",
        "inserted": inserted
    })))
}

/// Check a student in (scanner / camera flow)
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Row marked PRESENT", body = Object, example = json!({
            "message": "Attendance updated successfully!",
            "attendance_date": "2026-10-17",
            "time_in": "2026-10-17 08:05:00"
        })),
        (status = 400, description = "Student ID is required."),
        (status = 404, description = "No matching attendance record found to update."),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    caller: Option<AuthUser>,
    service: web::Data<AttendanceService>,
    payload: web::Json<CheckInRequest>,
) -> Result<impl Responder, ServiceError> {
    let outcome = service.check_in(&payload).await?;

    if let Some(caller) = caller {
        info!(
            recorded_by = caller.user_id,
            role = %caller.role,
            student_id = ?payload.student_id,
            "Check-in recorded"
        );
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance updated successfully!",
        "attendance_date": outcome.attendance_date,
        "time_in": outcome.time_in
    })))
}

/// List every attendance row with the student's name
#[utoipa::path(
    get,
    path = "/api/attendance",
    responses(
        (
            status = 200,
            description = "All attendance rows",
            body = [crate::service::attendance::AttendanceView]
        ),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    service: web::Data<AttendanceService>,
) -> Result<impl Responder, ServiceError> {
    Ok(HttpResponse::Ok().json(service.list_records().await?))
}

/// Get one attendance row
#[utoipa::path(
    get,
    path = "/api/attendance/{id}",
    params(("id", Path, description = "Attendance record ID")),
    responses(
        (status = 200, body = crate::service::attendance::AttendanceView),
        (status = 404, description = "Attendance record not found."),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn get_attendance(
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
) -> Result<impl Responder, ServiceError> {
    Ok(HttpResponse::Ok().json(service.get_record(path.into_inner()).await?))
}

/// Overwrite an attendance row
#[utoipa::path(
    put,
    path = "/api/attendance/{id}",
    params(("id", Path, description = "Attendance record ID")),
    request_body = EditRecordRequest,
    responses(
        (status = 200, body = MessageResponse),
        (status = 400, description = "Missing or unparseable fields"),
        (status = 404, description = "No matching attendance record found to update."),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn update_attendance(
    caller: Option<AuthUser>,
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
    payload: web::Json<EditRecordRequest>,
) -> Result<impl Responder, ServiceError> {
    let id = path.into_inner();
    service.edit_record(id, &payload).await?;

    if let Some(caller) = caller {
        info!(
            edited_by = caller.user_id,
            email = %caller.email,
            role = %caller.role,
            id,
            "Attendance record edited"
        );
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Attendance updated successfully!")))
}

/// Delete an attendance row
#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(("id", Path, description = "Attendance record ID")),
    responses(
        (status = 200, body = MessageResponse),
        (status = 404, description = "Attendance record not found."),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
) -> Result<impl Responder, ServiceError> {
    service.delete_record(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Attendance record deleted successfully.",
    )))
}
