//! Check Live Task Use Case
//!
//! Read-only probe used by the destination-side widget to decide whether
//! to show its own UI.

use crate::domain::entities::TaskStatus;
use crate::domain::repository::{SiteRepository, TaskRepository};
use crate::domain::value_objects::{Fingerprint, SiteKey};
use crate::error::GateResult;
use kernel::id::TaskId;
use std::sync::Arc;

/// Output DTO for check task
#[derive(Debug, Clone)]
pub struct CheckTaskOutput {
    pub has_task: bool,
    pub task_id: Option<TaskId>,
    pub status: Option<TaskStatus>,
    /// Only present once the code has already been revealed, so a reloaded
    /// widget can resume displaying it
    pub code: Option<String>,
}

impl CheckTaskOutput {
    fn none() -> Self {
        Self {
            has_task: false,
            task_id: None,
            status: None,
            code: None,
        }
    }
}

/// Check Live Task Use Case
pub struct CheckTaskUseCase<T, S>
where
    T: TaskRepository,
    S: SiteRepository,
{
    task_repo: Arc<T>,
    site_repo: Arc<S>,
}

impl<T, S> CheckTaskUseCase<T, S>
where
    T: TaskRepository,
    S: SiteRepository,
{
    pub fn new(task_repo: Arc<T>, site_repo: Arc<S>) -> Self {
        Self {
            task_repo,
            site_repo,
        }
    }

    pub async fn execute(
        &self,
        fingerprint: Fingerprint,
        site_key: SiteKey,
    ) -> GateResult<CheckTaskOutput> {
        let Some(site) = self.site_repo.find_active_by_key(&site_key).await? else {
            tracing::debug!(site_key = %site_key.as_str(), "Unknown or inactive site key");
            return Ok(CheckTaskOutput::none());
        };

        match self
            .task_repo
            .find_live_for_site(&fingerprint, site.id)
            .await?
        {
            Some(task) => {
                let code = if task.code_revealed_at_ms.is_some() {
                    task.code.clone()
                } else {
                    None
                };
                Ok(CheckTaskOutput {
                    has_task: true,
                    task_id: Some(task.id),
                    status: Some(task.status),
                    code,
                })
            }
            None => Ok(CheckTaskOutput::none()),
        }
    }
}
