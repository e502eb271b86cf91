//! Reveal Code Use Case
//!
//! Releases the code once the dwell interval has elapsed since generation.
//! The wall clock is the only arbiter; nothing server-side counts down.

use crate::application::config::GateConfig;
use crate::domain::entities::TaskStatus;
use crate::domain::repository::TaskRepository;
use crate::domain::value_objects::Fingerprint;
use crate::error::{GateError, GateResult};
use chrono::Utc;
use kernel::id::TaskId;
use std::sync::Arc;

/// Output DTO for reveal code
#[derive(Debug, Clone)]
pub enum RevealCodeOutput {
    /// Dwell elapsed, code released
    Ready { code: String },
    /// Dwell still running; retry after the remaining seconds
    TooEarly { remaining_seconds: i64 },
}

/// Reveal Code Use Case
pub struct RevealCodeUseCase<T>
where
    T: TaskRepository,
{
    task_repo: Arc<T>,
    config: Arc<GateConfig>,
}

impl<T> RevealCodeUseCase<T>
where
    T: TaskRepository,
{
    pub fn new(task_repo: Arc<T>, config: Arc<GateConfig>) -> Self {
        Self { task_repo, config }
    }

    pub async fn execute(
        &self,
        task_id: TaskId,
        fingerprint: Fingerprint,
    ) -> GateResult<RevealCodeOutput> {
        let task = self
            .task_repo
            .find_owned(task_id, &fingerprint)
            .await?
            .ok_or(GateError::TaskNotFound)?;

        if task.status != TaskStatus::InProgress {
            return Err(GateError::TaskNotStarted);
        }

        let generated_at = task.code_generated_at_ms.ok_or_else(|| {
            GateError::Internal("in_progress task without a code clock".to_string())
        })?;

        let elapsed = Utc::now().timestamp_millis() - generated_at;
        let dwell_ms = self.config.dwell_ms();

        if elapsed < dwell_ms {
            let remaining_seconds = (dwell_ms - elapsed + 999) / 1000;
            tracing::debug!(
                task_id = %task.id,
                remaining = remaining_seconds,
                "Code requested too early"
            );
            return Ok(RevealCodeOutput::TooEarly { remaining_seconds });
        }

        let code = task
            .code
            .clone()
            .ok_or_else(|| GateError::Internal("in_progress task without a code".to_string()))?;

        self.task_repo.mark_revealed(task.id).await?;

        tracing::info!(task_id = %task.id, "Code revealed");

        Ok(RevealCodeOutput::Ready { code })
    }
}
