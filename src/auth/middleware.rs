use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ServiceError;
use crate::model::role::Role;
use actix_web::http::Method;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

/// Coarse grouping of the API surface used by the role policy.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Area {
    Public,
    RosterRead,
    RosterWrite,
    CheckIn,
    Attendance,
    Reports,
    Accounts,
    /// Anything not listed above; admin only
    Unlisted,
}

impl Area {
    /// `path` is the percent-decoded path relative to the API prefix, e.g. `/attendance/12`.
    pub fn classify(method: &Method, path: &str) -> Area {
        let path = path.trim_end_matches('/');
        let first = path.trim_start_matches('/').split('/').next().unwrap_or_default();

        match first {
            "login" => Area::Public,
            "students" => Area::RosterRead,
            "add-students" => Area::RosterWrite,
            "accounts" => Area::Accounts,
            "stats" | "professors" => Area::Reports,
            "start-attendance" => Area::Attendance,
            "attendance" => {
                let rest = path.trim_start_matches('/').trim_start_matches("attendance");
                if rest.is_empty() && *method == Method::POST {
                    Area::CheckIn
                } else if is_report(rest) {
                    Area::Reports
                } else {
                    Area::Attendance
                }
            }
            _ => Area::Unlisted,
        }
    }
}

fn is_report(rest: &str) -> bool {
    matches!(
        rest.trim_start_matches('/'),
        "daily" | "weekly" | "monthly" | "monthlyreport" | "yearly" | "overview"
    )
}

impl Role {
    pub fn permits(self, area: Area) -> bool {
        match self {
            Role::Admin => true,
            Role::Teacher => !matches!(area, Area::Accounts | Area::Unlisted),
            Role::Guard => matches!(area, Area::Public | Area::RosterRead | Area::CheckIn),
        }
    }
}

fn reject(req: ServiceRequest, err: ServiceError) -> ServiceResponse<BoxBody> {
    req.into_response(err.error_response())
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?
        .clone();

    if !config.auth_required {
        return next.call(req).await;
    }

    // The router matches the decoded path, so the policy must see the same one.
    let decoded = req.match_info().as_str();
    let relative = decoded
        .strip_prefix(config.api_prefix.as_str())
        .unwrap_or(decoded)
        .to_string();
    let area = Area::classify(req.method(), &relative);
    if area == Area::Public {
        return next.call(req).await;
    }

    let header_value = match req.headers().get("Authorization") {
        Some(h) => match h.to_str() {
            Ok(v) => v.to_string(),
            Err(_) => {
                let err = ServiceError::Auth("Invalid Authorization header encoding".into());
                return Ok(reject(req, err));
            }
        },
        None => {
            return Ok(reject(req, ServiceError::Auth("Missing Authorization header".into())));
        }
    };

    let token = match header_value.strip_prefix("Bearer ") {
        Some(t) => t,
        None => {
            let err = ServiceError::Auth("Authorization header must start with Bearer".into());
            return Ok(reject(req, err));
        }
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            return Ok(reject(req, ServiceError::Auth("Invalid or expired token".into())));
        }
    };

    let role = match Role::parse(&claims.role) {
        Some(role) => role,
        None => return Ok(reject(req, ServiceError::Auth("Invalid role".into()))),
    };

    if !role.permits(area) {
        tracing::info!(user_id = claims.user_id, %role, ?area, "Access denied");
        let err = ServiceError::Forbidden(format!("Role {role} may not access this resource"));
        return Ok(reject(req, err));
    }

    req.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
        email: claims.sub,
        role,
    });

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_attendance_routes() {
        assert_eq!(Area::classify(&Method::POST, "/attendance"), Area::CheckIn);
        assert_eq!(Area::classify(&Method::GET, "/attendance"), Area::Attendance);
        assert_eq!(Area::classify(&Method::PUT, "/attendance/4"), Area::Attendance);
        assert_eq!(Area::classify(&Method::GET, "/attendance/weekly"), Area::Reports);
        assert_eq!(Area::classify(&Method::GET, "/attendance/monthlyreport/"), Area::Reports);
        assert_eq!(Area::classify(&Method::POST, "/start-attendance"), Area::Attendance);
    }

    #[test]
    fn classifies_the_rest() {
        assert_eq!(Area::classify(&Method::POST, "/login"), Area::Public);
        assert_eq!(Area::classify(&Method::GET, "/students"), Area::RosterRead);
        assert_eq!(Area::classify(&Method::POST, "/add-students"), Area::RosterWrite);
        assert_eq!(Area::classify(&Method::DELETE, "/accounts/2"), Area::Accounts);
        assert_eq!(Area::classify(&Method::GET, "/stats"), Area::Reports);
        assert_eq!(Area::classify(&Method::GET, "/settings"), Area::Unlisted);
        assert_eq!(Area::classify(&Method::GET, ""), Area::Unlisted);
    }

    #[test]
    fn role_policy() {
        assert!(Role::Admin.permits(Area::Accounts));
        assert!(!Role::Teacher.permits(Area::Accounts));
        assert!(!Role::Teacher.permits(Area::Unlisted));
        assert!(!Role::Guard.permits(Area::Unlisted));
        assert!(Role::Admin.permits(Area::Unlisted));
        assert!(Role::Teacher.permits(Area::RosterWrite));
        assert!(Role::Guard.permits(Area::CheckIn));
        assert!(Role::Guard.permits(Area::RosterRead));
        assert!(!Role::Guard.permits(Area::Attendance));
        assert!(!Role::Guard.permits(Area::Reports));
    }
}
