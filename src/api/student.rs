use crate::{
    error::ServiceError,
    service::roster::{NewStudentRequest, RosterService},
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/students",
    responses(
        (status = 200, description = "Full roster", body = [crate::model::student::Student]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Students"
)]
pub async fn list_students(service: web::Data<RosterService>) -> Result<impl Responder, ServiceError> {
    Ok(HttpResponse::Ok().json(service.list_students().await?))
}

/// Register a student on the roster
#[utoipa::path(
    post,
    path = "/api/add-students",
    request_body = NewStudentRequest,
    responses(
        (status = 201, description = "Student added", body = Object, example = json!({
            "message": "Student added successfully!",
            "id": 17
        })),
        (status = 400, description = "Student ID, name, section, and classification are required."),
        (status = 409, description = "Student ID already exists"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Students"
)]
pub async fn add_student(
    service: web::Data<RosterService>,
    payload: web::Json<NewStudentRequest>,
) -> Result<impl Responder, ServiceError> {
    let id = service.add_student(&payload).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Student added successfully!",
        "id": id
    })))
}
