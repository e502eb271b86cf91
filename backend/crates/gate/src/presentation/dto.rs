//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request for POST /api/tasks/assign
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTaskRequest {
    pub fingerprint: String,
    pub session_id: Uuid,
}

/// Destination details returned on assignment
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    pub name: String,
    pub domain: String,
    pub url: Option<String>,
    pub search_hint: Option<String>,
    pub instruction: Option<String>,
}

/// Response for POST /api/tasks/assign
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTaskResponse {
    pub task_id: Uuid,
    pub site: SiteInfo,
}

/// Query for GET /api/tasks/check
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTaskQuery {
    pub fingerprint: String,
    pub site_key: String,
}

/// Response for GET /api/tasks/check
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTaskResponse {
    pub has_task: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Request for POST /api/tasks/start-countdown
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCountdownRequest {
    pub task_id: Uuid,
    pub fingerprint: String,
}

/// Response for POST /api/tasks/start-countdown
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCountdownResponse {
    pub dwell_seconds: u64,
}

/// Query for GET /api/tasks/{taskId}/code
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealCodeQuery {
    pub fingerprint: String,
}

/// Response for GET /api/tasks/{taskId}/code
///
/// Either the code, or the remaining wait. The code field never appears
/// alongside `tooEarly`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged, rename_all = "camelCase")]
pub enum RevealCodeResponse {
    #[serde(rename_all = "camelCase")]
    Ready { code: String },
    #[serde(rename_all = "camelCase")]
    TooEarly {
        too_early: bool,
        remaining_seconds: i64,
    },
}

/// Request for POST /api/codes/verify
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeRequest {
    pub fingerprint: String,
    pub code: String,
    pub session_id: Uuid,
}

/// Response for POST /api/codes/verify
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeResponse {
    /// "verified" or "already_verified"
    pub status: String,
    pub unlocked_test_kind: String,
}
