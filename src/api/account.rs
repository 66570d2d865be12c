use crate::{
    error::ServiceError,
    models::{LoginReqDto, LoginResponse, MessageResponse},
    service::account::{AccountService, NewAccountRequest, UpdateAccountRequest},
};
use actix_web::{HttpResponse, Responder, web};

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, body = LoginResponse),
        (status = 400, description = "Email and password are required."),
        (status = 401, description = "Invalid email or password."),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn login(
    service: web::Data<AccountService>,
    payload: web::Json<LoginReqDto>,
) -> Result<impl Responder, ServiceError> {
    let data = service.login(&payload).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        success: true,
        data,
    }))
}

#[utoipa::path(
    get,
    path = "/api/accounts",
    responses((status = 200, body = [crate::model::user::Account]), (status = 500)),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn list_accounts(service: web::Data<AccountService>) -> Result<impl Responder, ServiceError> {
    Ok(HttpResponse::Ok().json(service.list_accounts().await?))
}

#[utoipa::path(
    post,
    path = "/api/accounts",
    request_body = NewAccountRequest,
    responses(
        (
            status = 201,
            description = "Created account, password omitted",
            body = crate::model::user::Account
        ),
        (status = 400, description = "Missing field or unknown role"),
        (status = 409, description = "Email already exists."),
        (status = 500)
    ),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn add_account(
    service: web::Data<AccountService>,
    payload: web::Json<NewAccountRequest>,
) -> Result<impl Responder, ServiceError> {
    Ok(HttpResponse::Created().json(service.add_account(&payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/accounts/{id}",
    params(("id", Path, description = "Account ID")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, body = crate::model::user::Account),
        (status = 400, description = "Email and role are required."),
        (status = 404, description = "Account not found."),
        (status = 500)
    ),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn update_account(
    service: web::Data<AccountService>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAccountRequest>,
) -> Result<impl Responder, ServiceError> {
    Ok(HttpResponse::Ok().json(service.update_account(path.into_inner(), &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/accounts/{id}",
    params(("id", Path, description = "Account ID")),
    responses(
        (status = 200, body = MessageResponse),
        (status = 404, description = "Account not found."),
        (status = 500)
    ),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn delete_account(
    service: web::Data<AccountService>,
    path: web::Path<u64>,
) -> Result<impl Responder, ServiceError> {
    service.delete_account(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Account deleted successfully.")))
}
