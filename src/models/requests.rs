use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::models::roster::SessionId;

#[derive(Deserialize, ToSchema)]
pub struct GenerateQrRequest {
    pub schedule_id: SessionId,
}

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendanceRequest {
    pub token: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowAttendanceQuery {
    /// Students with strictly fewer marks than this are listed.
    pub threshold: Option<u32>,
}
