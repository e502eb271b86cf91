//! Verify Code Use Case
//!
//! Confirms a submitted code against the owning task, completes the task,
//! unlocks the linked session and settles the site's quota and counters.
//! Completion is a conditional transition, so a retried verification can
//! never decrement the quota twice.

use crate::application::config::GateConfig;
use crate::domain::entities::{Task, TaskStatus};
use crate::domain::repository::{
    RateLimitRepository, SessionRepository, SiteRepository, TaskRepository,
};
use crate::domain::value_objects::{Fingerprint, VerificationCode};
use crate::error::{GateError, GateResult};
use kernel::id::SessionId;
use std::sync::Arc;

/// Outcome of a verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    Verified,
    /// Duplicate submission for an already completed task; a success so a
    /// double-click never surfaces as a failure
    AlreadyVerified,
}

/// Output DTO for verify code
#[derive(Debug, Clone)]
pub struct VerifyCodeOutput {
    pub status: VerificationStatus,
    pub unlocked_test_kind: String,
}

/// Verify Code Use Case
pub struct VerifyCodeUseCase<T, S, Se, R>
where
    T: TaskRepository,
    S: SiteRepository,
    Se: SessionRepository,
    R: RateLimitRepository,
{
    task_repo: Arc<T>,
    site_repo: Arc<S>,
    session_repo: Arc<Se>,
    rate_limit_repo: Arc<R>,
    config: Arc<GateConfig>,
}

impl<T, S, Se, R> VerifyCodeUseCase<T, S, Se, R>
where
    T: TaskRepository,
    S: SiteRepository,
    Se: SessionRepository,
    R: RateLimitRepository,
{
    pub fn new(
        task_repo: Arc<T>,
        site_repo: Arc<S>,
        session_repo: Arc<Se>,
        rate_limit_repo: Arc<R>,
        config: Arc<GateConfig>,
    ) -> Self {
        Self {
            task_repo,
            site_repo,
            session_repo,
            rate_limit_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        fingerprint: Fingerprint,
        code: VerificationCode,
        session_id: SessionId,
    ) -> GateResult<VerifyCodeOutput> {
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

        let bypass = self
            .config
            .bypass_code
            .as_deref()
            .is_some_and(|b| b.eq_ignore_ascii_case(code.as_str()));

        let task = if bypass {
            tracing::warn!("Bypass code used");
            match self.task_repo.find_in_progress(&fingerprint).await? {
                Some(task) => task,
                None => {
                    // Keep the outcome shape of the normal path
                    return match self.task_repo.find_live(&fingerprint).await? {
                        Some(t) if t.status == TaskStatus::Pending => Err(GateError::NotReady),
                        _ => Err(GateError::InvalidCode),
                    };
                }
            }
        } else {
            let matches = self.task_repo.find_by_code(&fingerprint, code.as_str()).await?;

            if let Some(task) = matches
                .iter()
                .find(|t| t.status == TaskStatus::InProgress)
            {
                task.clone()
            } else if let Some(done) = matches.iter().find(|t| t.status == TaskStatus::Completed) {
                tracing::info!(task_id = %done.id, "Code already verified");
                return self.already_verified(done).await;
            } else if matches.iter().any(|t| t.status == TaskStatus::Pending) {
                return Err(GateError::NotReady);
            } else {
                return Err(GateError::InvalidCode);
            }
        };

        if !self.task_repo.complete(task.id).await? {
            // A concurrent verification of the same task won the transition
            tracing::info!(task_id = %task.id, "Task completed by a concurrent verification");
            return self.already_verified(&task).await;
        }

        // The task was rebound to the caller's session on assignment, so the
        // submitted reference and the stored one agree; unlock the caller's.
        let kind = self
            .session_repo
            .unlock(session_id)
            .await?
            .unwrap_or_else(|| self.config.default_test_kind.clone());

        self.site_repo.record_completion(task.site_id).await?;

        tracing::info!(
            task_id = %task.id,
            session_id = %session_id,
            "Code verified"
        );

        Ok(VerifyCodeOutput {
            status: VerificationStatus::Verified,
            unlocked_test_kind: kind,
        })
    }

    async fn already_verified(&self, task: &Task) -> GateResult<VerifyCodeOutput> {
        let kind = self
            .session_repo
            .kind_of(task.session_id)
            .await?
            .unwrap_or_else(|| self.config.default_test_kind.clone());

        Ok(VerifyCodeOutput {
            status: VerificationStatus::AlreadyVerified,
            unlocked_test_kind: kind,
        })
    }
}
