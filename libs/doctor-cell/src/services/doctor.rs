use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    require_name, CreateDoctorRequest, Doctor, DoctorError, DoctorListQuery, UpdateDoctorRequest,
};
use crate::services::department::DepartmentService;

pub struct DoctorService {
    supabase: SupabaseClient,
    departments: DepartmentService,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            departments: DepartmentService::new(config),
        }
    }

    pub async fn list_doctors(
        &self,
        query: DoctorListQuery,
        include_inactive: bool,
        auth_token: Option<&str>,
    ) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Listing doctors with filters: {:?}", query);

        let mut query_parts = vec!["order=sort_order.asc,name.asc".to_string()];
        if !include_inactive {
            query_parts.push("is_active=eq.true".to_string());
        }
        if let Some(department_id) = query.department_id {
            query_parts.push(format!("department_id=eq.{}", department_id));
        }

        let path = format!("/rest/v1/doctors?{}", query_parts.join("&"));
        let doctors: Vec<Doctor> = self.supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        Ok(doctors)
    }

    /// Fetch a doctor regardless of the active flag. Callers decide visibility.
    pub async fn get_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor: {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Doctor> = self.supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        result.into_iter().next().ok_or(DoctorError::NotFound)
    }

    pub async fn get_active_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Doctor, DoctorError> {
        let doctor = self.get_doctor(doctor_id, auth_token).await?;
        if !doctor.is_bookable() {
            debug!("Doctor {} is inactive", doctor_id);
            return Err(DoctorError::NotFound);
        }
        Ok(doctor)
    }

    pub async fn create_doctor(
        &self,
        request: CreateDoctorRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        let name = require_name(&request.name, "Doctor")?;

        // Department must exist before a doctor can be assigned to it.
        self.departments.get_department(request.department_id, Some(auth_token)).await?;

        let now = Utc::now().to_rfc3339();
        let row = json!({
            "department_id": request.department_id,
            "name": name,
            "position": request.position,
            "specialty": request.specialty,
            "bio": request.bio,
            "profile_image_url": request.profile_image_url,
            "sort_order": request.sort_order.unwrap_or(0),
            "is_active": request.is_active.unwrap_or(true),
            "created_at": now,
            "updated_at": now
        });

        let created: Vec<Doctor> = self.supabase
            .insert("doctors", Some(auth_token), row)
            .await?;

        let doctor = created.into_iter().next()
            .ok_or_else(|| DoctorError::DatabaseError("Failed to create doctor".to_string()))?;

        info!("Doctor created: {} in department {}", doctor.id, doctor.department_id);
        Ok(doctor)
    }

    pub async fn update_doctor(
        &self,
        doctor_id: Uuid,
        request: UpdateDoctorRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        let mut changes = serde_json::Map::new();

        if let Some(department_id) = request.department_id {
            self.departments.get_department(department_id, Some(auth_token)).await?;
            changes.insert("department_id".to_string(), json!(department_id));
        }
        if let Some(name) = request.name {
            changes.insert("name".to_string(), json!(require_name(&name, "Doctor")?));
        }
        if let Some(position) = request.position {
            changes.insert("position".to_string(), json!(position));
        }
        if let Some(specialty) = request.specialty {
            changes.insert("specialty".to_string(), json!(specialty));
        }
        if let Some(bio) = request.bio {
            changes.insert("bio".to_string(), json!(bio));
        }
        if let Some(url) = request.profile_image_url {
            changes.insert("profile_image_url".to_string(), json!(url));
        }
        if let Some(sort_order) = request.sort_order {
            changes.insert("sort_order".to_string(), json!(sort_order));
        }
        if let Some(is_active) = request.is_active {
            if !is_active {
                warn!("Doctor {} deactivated; existing reservations are kept", doctor_id);
            }
            changes.insert("is_active".to_string(), json!(is_active));
        }
        changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let filter = format!("id=eq.{}", doctor_id);
        let updated: Vec<Doctor> = self.supabase
            .update("doctors", &filter, Some(auth_token), Value::Object(changes))
            .await?;

        updated.into_iter().next().ok_or(DoctorError::NotFound)
    }

    pub async fn delete_doctor(&self, doctor_id: Uuid, auth_token: &str) -> Result<(), DoctorError> {
        self.get_doctor(doctor_id, Some(auth_token)).await?;

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        self.supabase
            .execute(Method::DELETE, &path, Some(auth_token), None)
            .await
            .map_err(|e| match e {
                e if e.is_foreign_key_violation() => DoctorError::InUse(
                    "Doctor has reservations; deactivate the doctor instead".to_string(),
                ),
                other => DoctorError::from(other),
            })?;

        info!("Doctor deleted: {}", doctor_id);
        Ok(())
    }
}
