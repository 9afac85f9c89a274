//! Outbound JSON shape for generation callers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PipelineError;

/// `{"success": true, "workoutId": ...}` or
/// `{"success": false, "error": ..., "errorType": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl GenerationResponse {
    pub fn success(workout_id: Uuid) -> Self {
        Self {
            success: true,
            workout_id: Some(workout_id),
            error: None,
            error_type: None,
        }
    }

    pub fn failure(err: &PipelineError) -> Self {
        Self {
            success: false,
            workout_id: None,
            error: Some(err.user_message()),
            error_type: Some(err.error_type().to_owned()),
        }
    }

    pub fn from_result<T>(result: &Result<T, PipelineError>, id: impl Fn(&T) -> Uuid) -> Self {
        match result {
            Ok(value) => Self::success(id(value)),
            Err(err) => Self::failure(err),
        }
    }
}
