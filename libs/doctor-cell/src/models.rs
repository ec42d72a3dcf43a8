use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use shared_database::DbError;
use shared_models::error::AppError;

// ==============================================================================
// DEPARTMENTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDepartmentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

// ==============================================================================
// DOCTORS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: Uuid,
    pub department_id: Uuid,
    pub name: String,
    pub position: Option<String>,
    pub specialty: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    /// Only active doctors are shown on the site and accept reservations.
    pub fn is_bookable(&self) -> bool {
        self.is_active
    }

    pub fn belongs_to(&self, department_id: Uuid) -> bool {
        self.department_id == department_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub department_id: Uuid,
    pub name: String,
    pub position: Option<String>,
    pub specialty: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub department_id: Option<Uuid>,
    pub name: Option<String>,
    pub position: Option<String>,
    pub specialty: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorListQuery {
    pub department_id: Option<Uuid>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Department not found")]
    DepartmentNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Still referenced: {0}")]
    InUse(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DbError> for DoctorError {
    fn from(err: DbError) -> Self {
        DoctorError::DatabaseError(err.to_string())
    }
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::DepartmentNotFound => AppError::NotFound("Department not found".to_string()),
            DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
            DoctorError::InUse(msg) => AppError::Conflict(msg),
            DoctorError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

pub(crate) fn require_name(name: &str, what: &str) -> Result<String, DoctorError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DoctorError::ValidationError(format!("{} name is required", what)));
    }
    Ok(trimmed.to_string())
}
