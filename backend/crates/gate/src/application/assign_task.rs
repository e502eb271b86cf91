//! Assign Task Use Case
//!
//! Routes a finished assessment to a destination site: reuses the device's
//! live task when one exists, otherwise performs a weighted draw over the
//! eligible sites and creates a new pending task. Idempotent per device
//! within the task TTL.

use crate::application::config::GateConfig;
use crate::domain::entities::{Site, Task};
use crate::domain::repository::{RateLimitRepository, SiteRepository, TaskRepository};
use crate::domain::services::pick_weighted;
use crate::domain::value_objects::Fingerprint;
use crate::error::{GateError, GateResult};
use kernel::id::{SessionId, TaskId};
use rand::Rng;
use std::sync::Arc;

/// Site fields exposed to the client on assignment
#[derive(Debug, Clone)]
pub struct AssignedSite {
    pub name: String,
    pub domain: String,
    pub url: Option<String>,
    pub search_hint: Option<String>,
    pub instruction: Option<String>,
}

impl From<&Site> for AssignedSite {
    fn from(site: &Site) -> Self {
        Self {
            name: site.name.clone(),
            domain: site.domain.clone(),
            url: site.url.clone(),
            search_hint: site.search_hint.clone(),
            instruction: site.instruction.clone(),
        }
    }
}

/// Output DTO for assign task
#[derive(Debug, Clone)]
pub struct AssignTaskOutput {
    pub task_id: TaskId,
    pub site: AssignedSite,
}

/// Assign Task Use Case
pub struct AssignTaskUseCase<T, S, R>
where
    T: TaskRepository,
    S: SiteRepository,
    R: RateLimitRepository,
{
    task_repo: Arc<T>,
    site_repo: Arc<S>,
    rate_limit_repo: Arc<R>,
    config: Arc<GateConfig>,
}

impl<T, S, R> AssignTaskUseCase<T, S, R>
where
    T: TaskRepository,
    S: SiteRepository,
    R: RateLimitRepository,
{
    pub fn new(
        task_repo: Arc<T>,
        site_repo: Arc<S>,
        rate_limit_repo: Arc<R>,
        config: Arc<GateConfig>,
    ) -> Self {
        Self {
            task_repo,
            site_repo,
            rate_limit_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        fingerprint: Fingerprint,
        session_id: SessionId,
    ) -> GateResult<AssignTaskOutput> {
        let allowed = self
            .rate_limit_repo
            .check(
                &fingerprint,
                self.config.rate_limit.max_requests,
                self.config.rate_limit.window_ms(),
            )
            .await?;

        if !allowed {
            return Err(GateError::RateLimitExceeded);
        }

        // Stale rows would trip the live-uniqueness guard on insert
        self.task_repo.retire_expired(&fingerprint).await?;

        if let Some(task) = self.task_repo.find_live(&fingerprint).await? {
            return self.reuse(task, session_id).await;
        }

        // Eligibility is re-filtered on every call; quota and active state
        // change between assignments
        let eligible = self.site_repo.eligible().await?;
        if eligible.is_empty() {
            return Err(GateError::NoEligibleDestination);
        }

        let roll = rand::rng().random::<f64>();
        let site = pick_weighted(&eligible, roll).ok_or(GateError::NoEligibleDestination)?;

        let task = Task::new(session_id, site.id, &fingerprint, self.config.task_ttl_ms());

        match self.task_repo.insert_live(&task).await? {
            Some(created) => {
                self.site_repo.record_visit(site.id).await?;

                tracing::info!(
                    task_id = %created.id,
                    site = %site.site_key,
                    "Task created"
                );

                Ok(AssignTaskOutput {
                    task_id: created.id,
                    site: AssignedSite::from(site),
                })
            }
            None => {
                // Lost the insert race; the winner's task is authoritative
                match self.task_repo.find_live(&fingerprint).await? {
                    Some(task) => self.reuse(task, session_id).await,
                    None => Err(GateError::Internal(
                        "live task vanished after insert conflict".to_string(),
                    )),
                }
            }
        }
    }

    async fn reuse(&self, task: Task, session_id: SessionId) -> GateResult<AssignTaskOutput> {
        self.task_repo.rebind_session(task.id, session_id).await?;

        let site = self
            .site_repo
            .find_by_id(task.site_id)
            .await?
            .ok_or_else(|| GateError::Internal("task references a missing site".to_string()))?;

        tracing::info!(task_id = %task.id, site = %site.site_key, "Reusing live task");

        Ok(AssignTaskOutput {
            task_id: task.id,
            site: AssignedSite::from(&site),
        })
    }
}
