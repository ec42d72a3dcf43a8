use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    require_name, CreateDepartmentRequest, Department, DoctorError, UpdateDepartmentRequest,
};

pub struct DepartmentService {
    supabase: SupabaseClient,
}

impl DepartmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// List departments ordered for display; inactive ones only when asked for.
    pub async fn list_departments(
        &self,
        include_inactive: bool,
        auth_token: Option<&str>,
    ) -> Result<Vec<Department>, DoctorError> {
        debug!("Listing departments (include_inactive: {})", include_inactive);

        let mut path = "/rest/v1/departments?order=sort_order.asc,name.asc".to_string();
        if !include_inactive {
            path.push_str("&is_active=eq.true");
        }

        let departments: Vec<Department> = self.supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        Ok(departments)
    }

    pub async fn get_department(
        &self,
        department_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Department, DoctorError> {
        debug!("Fetching department: {}", department_id);

        let path = format!("/rest/v1/departments?id=eq.{}", department_id);
        let result: Vec<Department> = self.supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        result.into_iter().next().ok_or(DoctorError::DepartmentNotFound)
    }

    pub async fn create_department(
        &self,
        request: CreateDepartmentRequest,
        auth_token: &str,
    ) -> Result<Department, DoctorError> {
        let name = require_name(&request.name, "Department")?;
        let now = Utc::now().to_rfc3339();

        let row = json!({
            "name": name,
            "description": request.description,
            "sort_order": request.sort_order.unwrap_or(0),
            "is_active": request.is_active.unwrap_or(true),
            "created_at": now,
            "updated_at": now
        });

        let created: Vec<Department> = self.supabase
            .insert("departments", Some(auth_token), row)
            .await?;

        let department = created.into_iter().next()
            .ok_or_else(|| DoctorError::DatabaseError("Failed to create department".to_string()))?;

        info!("Department created: {} ({})", department.name, department.id);
        Ok(department)
    }

    pub async fn update_department(
        &self,
        department_id: Uuid,
        request: UpdateDepartmentRequest,
        auth_token: &str,
    ) -> Result<Department, DoctorError> {
        let mut changes = serde_json::Map::new();

        if let Some(name) = request.name {
            changes.insert("name".to_string(), json!(require_name(&name, "Department")?));
        }
        if let Some(description) = request.description {
            changes.insert("description".to_string(), json!(description));
        }
        if let Some(sort_order) = request.sort_order {
            changes.insert("sort_order".to_string(), json!(sort_order));
        }
        if let Some(is_active) = request.is_active {
            changes.insert("is_active".to_string(), json!(is_active));
        }
        changes.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let filter = format!("id=eq.{}", department_id);
        let updated: Vec<Department> = self.supabase
            .update("departments", &filter, Some(auth_token), Value::Object(changes))
            .await?;

        updated.into_iter().next().ok_or(DoctorError::DepartmentNotFound)
    }

    pub async fn delete_department(
        &self,
        department_id: Uuid,
        auth_token: &str,
    ) -> Result<(), DoctorError> {
        // Existence check so a missing id answers 404 rather than a silent no-op.
        self.get_department(department_id, Some(auth_token)).await?;

        let path = format!("/rest/v1/departments?id=eq.{}", department_id);
        self.supabase
            .execute(Method::DELETE, &path, Some(auth_token), None)
            .await
            .map_err(|e| match e {
                // doctors.department_id references departments
                e if e.is_foreign_key_violation() => {
                    DoctorError::InUse("Department still has doctors assigned".to_string())
                }
                other => DoctorError::from(other),
            })?;

        info!("Department deleted: {}", department_id);
        Ok(())
    }
}
