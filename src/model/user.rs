use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub role: String,
    /// Argon2 PHC string
    pub password: String,
}

/// Account as exposed over the API; the password hash never leaves the service.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct Account {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "registrar@campus.edu")]
    pub email: String,
    #[schema(example = "teacher")]
    pub role: String,
}
