use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::{
    error::{ServiceError, ServiceResult, is_constraint_violation},
    model::{
        role::Role,
        student::{Classification, Student},
    },
    models::{non_blank, string_or_number},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewStudentRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    #[schema(example = "2021-00123", value_type = String)]
    pub student_id: Option<String>,
    #[schema(example = "Juan Dela Cruz")]
    pub name: Option<String>,
    #[schema(example = "SBIT3I")]
    pub section: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub photo: Option<String>,
    #[schema(example = "regular")]
    pub classification: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub student_id: String,
    pub name: String,
    pub section: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub photo: Option<String>,
    pub classification: Classification,
}

impl NewStudentRequest {
    pub fn validate(&self) -> ServiceResult<NewStudent> {
        let required =
            || ServiceError::validation("Student ID, name, section, and classification are required.");

        let student_id = non_blank(&self.student_id).ok_or_else(required)?;
        let name = non_blank(&self.name).ok_or_else(required)?;
        let section = non_blank(&self.section).ok_or_else(required)?;
        let classification = non_blank(&self.classification)
            .ok_or_else(required)?
            .parse::<Classification>()
            .map_err(|_| ServiceError::validation("Classification must be regular or irregular."))?;

        let optional = |v: &Option<String>| non_blank(v).map(str::to_string);

        Ok(NewStudent {
            student_id: student_id.to_string(),
            name: name.to_string(),
            section: section.to_string(),
            email: optional(&self.email),
            phone: optional(&self.phone),
            address: optional(&self.address),
            photo: optional(&self.photo),
            classification,
        })
    }
}

/// Student roster plus the professor headcount shown on the admin dashboard.
#[derive(Clone)]
pub struct RosterService {
    pool: MySqlPool,
}

impl RosterService {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn list_students(&self) -> ServiceResult<Vec<Student>> {
        sqlx::query_as::<_, Student>(
            r#"
            SELECT id, student_id, name, section, email, phone, address, photo, classification
            FROM students
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ServiceError::db("Failed to fetch students"))
    }

    /// Returns the new surrogate id.
    #[instrument(name = "add_student", skip(self, req), fields(student_id = ?req.student_id))]
    pub async fn add_student(&self, req: &NewStudentRequest) -> ServiceResult<u64> {
        let student = req.validate()?;

        let result = sqlx::query(
            r#"
            INSERT INTO students
            (student_id, name, section, email, phone, address, photo, classification)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&student.student_id)
        .bind(&student.name)
        .bind(&student.section)
        .bind(&student.email)
        .bind(&student.phone)
        .bind(&student.address)
        .bind(&student.photo)
        .bind(student.classification.as_ref())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_constraint_violation(&e) {
                ServiceError::Conflict(format!("Student ID {} already exists.", student.student_id))
            } else {
                ServiceError::db("Failed to add student")(e)
            }
        })?;

        let id = result.last_insert_id();
        info!(id, "Student added");
        Ok(id)
    }

    pub async fn count_professors(&self) -> ServiceResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(Role::Teacher.as_ref())
            .fetch_one(&self.pool)
            .await
            .map_err(ServiceError::db("Failed to count professors"))
    }
}
