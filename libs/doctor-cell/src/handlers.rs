use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    CreateDepartmentRequest, CreateDoctorRequest, DoctorListQuery, UpdateDepartmentRequest,
    UpdateDoctorRequest,
};
use crate::services::{department::DepartmentService, doctor::DoctorService};

fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {} ID format", what)))
}

// ==============================================================================
// PUBLIC DEPARTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_departments_public(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = DepartmentService::new(&state);
    let departments = service.list_departments(false, None).await?;

    Ok(Json(json!({
        "departments": departments,
        "total": departments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_department_public(
    State(state): State<Arc<AppConfig>>,
    Path(department_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let department_id = parse_id(&department_id, "department")?;
    let service = DepartmentService::new(&state);

    let department = service.get_department(department_id, None).await?;
    if !department.is_active {
        return Err(AppError::NotFound("Department not found".to_string()));
    }

    Ok(Json(json!(department)))
}

// ==============================================================================
// ADMIN DEPARTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_all_departments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = DepartmentService::new(&state);
    let departments = service.list_departments(true, Some(auth.token())).await?;

    Ok(Json(json!({
        "departments": departments,
        "total": departments.len()
    })))
}

#[axum::debug_handler]
pub async fn create_department(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateDepartmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DepartmentService::new(&state);
    let department = service.create_department(request, auth.token()).await?;

    Ok(Json(json!(department)))
}

#[axum::debug_handler]
pub async fn update_department(
    State(state): State<Arc<AppConfig>>,
    Path(department_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdateDepartmentRequest>,
) -> Result<Json<Value>, AppError> {
    let department_id = parse_id(&department_id, "department")?;
    let service = DepartmentService::new(&state);

    let department = service.update_department(department_id, request, auth.token()).await?;

    Ok(Json(json!(department)))
}

#[axum::debug_handler]
pub async fn delete_department(
    State(state): State<Arc<AppConfig>>,
    Path(department_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let department_id = parse_id(&department_id, "department")?;
    let service = DepartmentService::new(&state);

    service.delete_department(department_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Department deleted"
    })))
}

// ==============================================================================
// PUBLIC DOCTOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors_public(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DoctorListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let doctors = service.list_doctors(query, false, None).await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_public(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = parse_id(&doctor_id, "doctor")?;
    let service = DoctorService::new(&state);

    let doctor = service.get_active_doctor(doctor_id, None).await?;

    Ok(Json(json!(doctor)))
}

// ==============================================================================
// ADMIN DOCTOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_all_doctors(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DoctorListQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let doctors = service.list_doctors(query, true, Some(auth.token())).await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let doctor = service.create_doctor(request, auth.token()).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = parse_id(&doctor_id, "doctor")?;
    let service = DoctorService::new(&state);

    let doctor = service.update_doctor(doctor_id, request, auth.token()).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = parse_id(&doctor_id, "doctor")?;
    let service = DoctorService::new(&state);

    service.delete_doctor(doctor_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor deleted"
    })))
}
