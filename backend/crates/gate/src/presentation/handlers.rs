//! HTTP Handlers

use crate::application::assign_task::AssignTaskUseCase;
use crate::application::begin_countdown::BeginCountdownUseCase;
use crate::application::check_task::CheckTaskUseCase;
use crate::application::config::GateConfig;
use crate::application::reveal_code::{RevealCodeOutput, RevealCodeUseCase};
use crate::application::verify_code::{VerificationStatus, VerifyCodeUseCase};
use crate::domain::repository::{
    RateLimitRepository, SessionRepository, SiteRepository, TaskRepository,
};
use crate::domain::value_objects::{Fingerprint, SiteKey, VerificationCode};
use crate::error::GateResult;
use crate::presentation::dto::{
    AssignTaskRequest, AssignTaskResponse, CheckTaskQuery, CheckTaskResponse, RevealCodeQuery,
    RevealCodeResponse, SiteInfo, StartCountdownRequest, StartCountdownResponse,
    VerifyCodeRequest, VerifyCodeResponse,
};
use axum::Json;
use axum::extract::{Path, Query, State};
use kernel::id::{SessionId, TaskId};
use std::sync::Arc;
use uuid::Uuid;

/// Shared state for gate handlers
#[derive(Clone)]
pub struct GateAppState<R>
where
    R: TaskRepository
        + SiteRepository
        + SessionRepository
        + RateLimitRepository
        + Clone
        + Send
        + Sync
        + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<GateConfig>,
}

/// POST /api/tasks/assign
pub async fn assign_task<R>(
    State(state): State<GateAppState<R>>,
    Json(req): Json<AssignTaskRequest>,
) -> GateResult<Json<AssignTaskResponse>>
where
    R: TaskRepository
        + SiteRepository
        + SessionRepository
        + RateLimitRepository
        + Clone
        + Send
        + Sync
        + 'static,
{
    let fingerprint = Fingerprint::parse(&req.fingerprint)?;

    let use_case = AssignTaskUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(fingerprint, SessionId::from_uuid(req.session_id))
        .await?;

    Ok(Json(AssignTaskResponse {
        task_id: output.task_id.into_uuid(),
        site: SiteInfo {
            name: output.site.name,
            domain: output.site.domain,
            url: output.site.url,
            search_hint: output.site.search_hint,
            instruction: output.site.instruction,
        },
    }))
}

/// GET /api/tasks/check
pub async fn check_task<R>(
    State(state): State<GateAppState<R>>,
    Query(query): Query<CheckTaskQuery>,
) -> GateResult<Json<CheckTaskResponse>>
where
    R: TaskRepository
        + SiteRepository
        + SessionRepository
        + RateLimitRepository
        + Clone
        + Send
        + Sync
        + 'static,
{
    let fingerprint = Fingerprint::parse(&query.fingerprint)?;
    let site_key = SiteKey::parse(&query.site_key)?;

    let use_case = CheckTaskUseCase::new(state.repo.clone(), state.repo.clone());

    let output = use_case.execute(fingerprint, site_key).await?;

    Ok(Json(CheckTaskResponse {
        has_task: output.has_task,
        task_id: output.task_id.map(|id| id.into_uuid()),
        status: output.status.map(|s| s.as_str().to_string()),
        code: output.code,
    }))
}

/// POST /api/tasks/start-countdown
pub async fn start_countdown<R>(
    State(state): State<GateAppState<R>>,
    Json(req): Json<StartCountdownRequest>,
) -> GateResult<Json<StartCountdownResponse>>
where
    R: TaskRepository
        + SiteRepository
        + SessionRepository
        + RateLimitRepository
        + Clone
        + Send
        + Sync
        + 'static,
{
    let fingerprint = Fingerprint::parse(&req.fingerprint)?;

    let use_case = BeginCountdownUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(TaskId::from_uuid(req.task_id), fingerprint)
        .await?;

    Ok(Json(StartCountdownResponse {
        dwell_seconds: output.dwell_seconds,
    }))
}

/// GET /api/tasks/{taskId}/code
pub async fn reveal_code<R>(
    State(state): State<GateAppState<R>>,
    Path(task_id): Path<Uuid>,
    Query(query): Query<RevealCodeQuery>,
) -> GateResult<Json<RevealCodeResponse>>
where
    R: TaskRepository
        + SiteRepository
        + SessionRepository
        + RateLimitRepository
        + Clone
        + Send
        + Sync
        + 'static,
{
    let fingerprint = Fingerprint::parse(&query.fingerprint)?;

    let use_case = RevealCodeUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(TaskId::from_uuid(task_id), fingerprint)
        .await?;

    let response = match output {
        RevealCodeOutput::Ready { code } => RevealCodeResponse::Ready { code },
        RevealCodeOutput::TooEarly { remaining_seconds } => RevealCodeResponse::TooEarly {
            too_early: true,
            remaining_seconds,
        },
    };

    Ok(Json(response))
}

/// POST /api/codes/verify
pub async fn verify_code<R>(
    State(state): State<GateAppState<R>>,
    Json(req): Json<VerifyCodeRequest>,
) -> GateResult<Json<VerifyCodeResponse>>
where
    R: TaskRepository
        + SiteRepository
        + SessionRepository
        + RateLimitRepository
        + Clone
        + Send
        + Sync
        + 'static,
{
    let fingerprint = Fingerprint::parse(&req.fingerprint)?;
    let code = VerificationCode::parse(&req.code)?;

    let use_case = VerifyCodeUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(fingerprint, code, SessionId::from_uuid(req.session_id))
        .await?;

    let status = match output.status {
        VerificationStatus::Verified => "verified",
        VerificationStatus::AlreadyVerified => "already_verified",
    };

    Ok(Json(VerifyCodeResponse {
        status: status.to_string(),
        unlocked_test_kind: output.unlocked_test_kind,
    }))
}
