use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::identity::Role;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct ApiResponse {
    success: bool,
    message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,

    #[schema(example = 200)]
    code: u16,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: if data.is_null() { None } else { Some(data) },
            code: 200,
        }
    }

    pub fn failure(message: impl Into<String>, code: u16) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            code,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UserDetails {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ScheduleItem {
    pub schedule_id: String,
    pub course_name: String,
    pub start_time: String,
    pub end_time: String,
    pub teacher_name: String,
}
