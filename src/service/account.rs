use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

use crate::{
    auth::{
        jwt::generate_access_token,
        password::{hash_password, verify_dummy, verify_password},
    },
    error::{ServiceError, ServiceResult, is_constraint_violation},
    model::{
        role::Role,
        user::{Account, User},
    },
    models::{LoginData, LoginReqDto, non_blank},
};

const INVALID_CREDENTIALS: &str = "Invalid email or password.";

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewAccountRequest {
    #[schema(example = "teacher@campus.edu")]
    pub email: Option<String>,
    #[schema(example = "teacher")]
    pub role: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAccountRequest {
    #[schema(example = "teacher@campus.edu")]
    pub email: Option<String>,
    #[schema(example = "admin")]
    pub role: Option<String>,
}

fn parse_role(raw: &str) -> ServiceResult<Role> {
    Role::parse(raw).ok_or_else(|| ServiceError::validation("Role must be admin, teacher or guard."))
}

/// Credential check and account administration.
#[derive(Clone)]
pub struct AccountService {
    pool: MySqlPool,
    jwt_secret: String,
    access_token_ttl: usize,
}

impl AccountService {
    pub fn new(pool: MySqlPool, jwt_secret: String, access_token_ttl: usize) -> Self {
        Self {
            pool,
            jwt_secret,
            access_token_ttl,
        }
    }

    /// Unknown email and wrong password produce the same AuthError.
    #[instrument(name = "auth_login", skip(self, req), fields(email = ?req.email))]
    pub async fn login(&self, req: &LoginReqDto) -> ServiceResult<LoginData> {
        let (email, password) = match (non_blank(&req.email), req.password.as_deref()) {
            (Some(e), Some(p)) if !p.is_empty() => (e, p),
            _ => return Err(ServiceError::validation("Email and password are required.")),
        };

        debug!("Fetching user from database");

        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, role, password FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(ServiceError::db("Failed to login."))?;

        let Some(user) = user else {
            verify_dummy(password);
            info!("Invalid credentials: user not found");
            return Err(ServiceError::Auth(INVALID_CREDENTIALS.into()));
        };

        if let Err(e) = verify_password(password, &user.password) {
            info!(error = %e, user_id = user.id, "Invalid credentials: password mismatch");
            return Err(ServiceError::Auth(INVALID_CREDENTIALS.into()));
        }

        let role = Role::parse(&user.role).ok_or_else(|| {
            error!(user_id = user.id, role = %user.role, "Stored role is not recognised");
            ServiceError::Internal("Unknown role".into())
        })?;

        let token = generate_access_token(
            user.id,
            user.email.clone(),
            role,
            &self.jwt_secret,
            self.access_token_ttl,
        )
        .map_err(|e| {
            error!(error = %e, "Failed to sign access token");
            ServiceError::Internal("Failed to login.".into())
        })?;

        if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
            .bind(user.id)
            .execute(&self.pool)
            .await
        {
            error!(error = %e, "Failed to update last_login_at");
            // intentionally not failing login
        }

        info!(user_id = user.id, %role, "Login successful");

        Ok(LoginData {
            user_id: user.id,
            role,
            token,
        })
    }

    pub async fn list_accounts(&self) -> ServiceResult<Vec<Account>> {
        sqlx::query_as::<_, Account>("SELECT id, email, role FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(ServiceError::db("Failed to fetch accounts"))
    }

    #[instrument(name = "add_account", skip(self, req), fields(email = ?req.email))]
    pub async fn add_account(&self, req: &NewAccountRequest) -> ServiceResult<Account> {
        let required = || ServiceError::validation("Email, role, and password are required.");
        let email = non_blank(&req.email).ok_or_else(required)?;
        let role = parse_role(non_blank(&req.role).ok_or_else(required)?)?;
        let password = req
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(required)?;

        let hashed = hash_password(password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            ServiceError::Internal("Failed to add account".into())
        })?;

        let result = sqlx::query("INSERT INTO users (email, role, password) VALUES (?, ?, ?)")
            .bind(email)
            .bind(role.as_ref())
            .bind(&hashed)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    ServiceError::Conflict("Email already exists.".into())
                } else {
                    ServiceError::db("Failed to add account")(e)
                }
            })?;

        Ok(Account {
            id: result.last_insert_id(),
            email: email.to_string(),
            role: role.to_string(),
        })
    }

    #[instrument(name = "update_account", skip(self, req))]
    pub async fn update_account(&self, id: u64, req: &UpdateAccountRequest) -> ServiceResult<Account> {
        let required = || ServiceError::validation("Email and role are required.");
        let email = non_blank(&req.email).ok_or_else(required)?;
        let role = parse_role(non_blank(&req.role).ok_or_else(required)?)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(ServiceError::db("Failed to open transaction"))?;

        let matching: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(ServiceError::db("Failed to look up account"))?;
        if matching == 0 {
            return Err(ServiceError::not_found("Account not found."));
        }

        sqlx::query("UPDATE users SET email = ?, role = ? WHERE id = ?")
            .bind(email)
            .bind(role.as_ref())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    ServiceError::Conflict("Email already exists.".into())
                } else {
                    ServiceError::db("Failed to update account")(e)
                }
            })?;

        tx.commit()
            .await
            .map_err(ServiceError::db("Failed to commit account update"))?;

        Ok(Account {
            id,
            email: email.to_string(),
            role: role.to_string(),
        })
    }

    #[instrument(name = "delete_account", skip(self))]
    pub async fn delete_account(&self, id: u64) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(ServiceError::db("Failed to delete account"))?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("Account not found."));
        }

        Ok(())
    }
}
