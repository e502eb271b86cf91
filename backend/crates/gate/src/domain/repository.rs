//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer and must provide the atomicity each doc comment
//! states; the use cases rely on it instead of in-process locks.

use crate::domain::entities::{Site, Task};
use crate::domain::value_objects::{Fingerprint, SiteKey};
use crate::error::GateResult;
use kernel::id::{SessionId, SiteId, TaskId};

/// Task repository trait
#[trait_variant::make(TaskRepository: Send)]
pub trait LocalTaskRepository {
    /// Flip this fingerprint's stale pending/in-progress rows to expired.
    /// Run before inserting so stale rows cannot trip the live-uniqueness guard.
    async fn retire_expired(&self, fingerprint: &Fingerprint) -> GateResult<u64>;

    /// Find the live task owned by a fingerprint, if any
    async fn find_live(&self, fingerprint: &Fingerprint) -> GateResult<Option<Task>>;

    /// Find the live task a fingerprint holds for a specific site
    async fn find_live_for_site(
        &self,
        fingerprint: &Fingerprint,
        site_id: SiteId,
    ) -> GateResult<Option<Task>>;

    /// Insert a new live task under the one-live-task-per-fingerprint
    /// constraint. Returns `None` when a concurrent insert won the slot.
    async fn insert_live(&self, task: &Task) -> GateResult<Option<Task>>;

    /// Rebind a task to the most recent session reference
    async fn rebind_session(&self, task_id: TaskId, session_id: SessionId) -> GateResult<()>;

    /// Transition to in_progress. The candidate code and clock are only
    /// applied if none are set yet, so repeated calls cannot regenerate the
    /// code or reset the timer. Returns the task as stored, `None` when the
    /// task does not exist, is not owned, or is no longer live.
    async fn begin(
        &self,
        task_id: TaskId,
        fingerprint: &Fingerprint,
        candidate_code: &str,
    ) -> GateResult<Option<Task>>;

    /// Fetch a task by id, only if the fingerprint owns it
    async fn find_owned(&self, task_id: TaskId, fingerprint: &Fingerprint)
        -> GateResult<Option<Task>>;

    /// Stamp the first reveal time
    async fn mark_revealed(&self, task_id: TaskId) -> GateResult<()>;

    /// All tasks of a fingerprint carrying this code, newest first
    async fn find_by_code(&self, fingerprint: &Fingerprint, code: &str) -> GateResult<Vec<Task>>;

    /// Newest in-progress task for a fingerprint
    async fn find_in_progress(&self, fingerprint: &Fingerprint) -> GateResult<Option<Task>>;

    /// Complete a task if it is still in progress. Returns `false` when a
    /// concurrent verification already took it.
    async fn complete(&self, task_id: TaskId) -> GateResult<bool>;
}

/// Site registry trait
#[trait_variant::make(SiteRepository: Send)]
pub trait LocalSiteRepository {
    /// All sites currently eligible for selection (active, under quota).
    /// Re-evaluated on every call; eligibility is never cached.
    async fn eligible(&self) -> GateResult<Vec<Site>>;

    /// Find an active site by its widget key
    async fn find_active_by_key(&self, site_key: &SiteKey) -> GateResult<Option<Site>>;

    /// Find a site by id regardless of eligibility
    async fn find_by_id(&self, site_id: SiteId) -> GateResult<Option<Site>>;

    /// Atomically increment the visit counter
    async fn record_visit(&self, site_id: SiteId) -> GateResult<()>;

    /// Atomically increment the completion counter and decrement the
    /// remaining quota when one is configured, never below zero
    async fn record_completion(&self, site_id: SiteId) -> GateResult<()>;
}

/// Session repository trait
///
/// Sessions are owned by the scoring service; the gate only flips the
/// unlock state and reads the test kind for the redirect.
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Unlock a session and mark it completed. Returns its test kind,
    /// `None` when no such session exists.
    async fn unlock(&self, session_id: SessionId) -> GateResult<Option<String>>;

    /// Read a session's test kind without mutating it
    async fn kind_of(&self, session_id: SessionId) -> GateResult<Option<String>>;
}

/// Rate limit repository trait
#[trait_variant::make(RateLimitRepository: Send)]
pub trait LocalRateLimitRepository {
    /// Check rate limit for a fingerprint.
    /// Returns true if the request is allowed.
    async fn check(
        &self,
        fingerprint: &Fingerprint,
        max_requests: u32,
        window_ms: i64,
    ) -> GateResult<bool>;
}
