//! Gate Routers
//!
//! Two routers matching the public surface: task life-cycle endpoints and
//! code verification. The binary nests them under /api/tasks and /api/codes.

use crate::application::config::GateConfig;
use crate::domain::repository::{
    RateLimitRepository, SessionRepository, SiteRepository, TaskRepository,
};
use crate::infra::postgres::PgGateRepository;
use crate::presentation::handlers::{self, GateAppState};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

/// Create the task router with PostgreSQL repository
pub fn tasks_router(repo: PgGateRepository, config: GateConfig) -> Router {
    tasks_router_generic(repo, config)
}

/// Create the verification router with PostgreSQL repository
pub fn codes_router(repo: PgGateRepository, config: GateConfig) -> Router {
    codes_router_generic(repo, config)
}

/// Create a generic task router for any repository implementation
pub fn tasks_router_generic<R>(repo: R, config: GateConfig) -> Router
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
    let state = GateAppState {
        repo: Arc::new(repo),
        config: Arc::new(config),
    };

    Router::new()
        .route("/assign", post(handlers::assign_task::<R>))
        .route("/check", get(handlers::check_task::<R>))
        .route("/start-countdown", post(handlers::start_countdown::<R>))
        .route("/{task_id}/code", get(handlers::reveal_code::<R>))
        .with_state(state)
}

/// Create a generic verification router for any repository implementation
pub fn codes_router_generic<R>(repo: R, config: GateConfig) -> Router
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
    let state = GateAppState {
        repo: Arc::new(repo),
        config: Arc::new(config),
    };

    Router::new()
        .route("/verify", post(handlers::verify_code::<R>))
        .with_state(state)
}
