//! Begin Countdown Use Case
//!
//! Transitions a task to in_progress and lazily generates its code. The
//! code and clock are assigned at most once; repeating the call can
//! neither regenerate the code nor restart the timer.

use crate::application::config::GateConfig;
use crate::domain::repository::TaskRepository;
use crate::domain::services::generate_code;
use crate::domain::value_objects::Fingerprint;
use crate::error::{GateError, GateResult};
use kernel::id::TaskId;
use std::sync::Arc;

/// Output DTO for begin countdown
#[derive(Debug, Clone)]
pub struct BeginCountdownOutput {
    pub dwell_seconds: u64,
}

/// Begin Countdown Use Case
pub struct BeginCountdownUseCase<T>
where
    T: TaskRepository,
{
    task_repo: Arc<T>,
    config: Arc<GateConfig>,
}

impl<T> BeginCountdownUseCase<T>
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
    ) -> GateResult<BeginCountdownOutput> {
        // Candidate only; the store keeps an existing code
        let candidate = generate_code(self.config.code_length);

        let task = self
            .task_repo
            .begin(task_id, &fingerprint, &candidate)
            .await?
            .ok_or(GateError::TaskNotFound)?;

        tracing::info!(task_id = %task.id, "Countdown started");

        Ok(BeginCountdownOutput {
            dwell_seconds: self.config.dwell_seconds(),
        })
    }
}
