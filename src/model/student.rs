use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Classification {
    Regular,
    Irregular,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "student_id": "2021-00123",
        "name": "Juan Dela Cruz",
        "section": "SBIT3I",
        "email": "juan@campus.edu",
        "phone": null,
        "address": null,
        "photo": null,
        "classification": "regular"
    })
)]
pub struct Student {
    pub id: u64,
    pub student_id: String,
    pub name: String,
    pub section: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Opaque encoded image
    pub photo: Option<String>,
    pub classification: String,
}
