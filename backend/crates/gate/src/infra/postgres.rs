//! PostgreSQL Repository Implementations
//!
//! All concurrency-sensitive mutations are single conditional statements:
//! the live-task slot is guarded by a partial unique index, quota and stat
//! counters move via single-field increments, and completion only fires
//! while the row is still in_progress.

use crate::domain::entities::{Site, Task, TaskStatus};
use crate::domain::repository::{
    RateLimitRepository, SessionRepository, SiteRepository, TaskRepository,
};
use crate::domain::value_objects::{Fingerprint, SiteKey};
use crate::error::{GateError, GateResult};
use chrono::Utc;
use kernel::id::{SessionId, SiteId, TaskId};
use sqlx::PgPool;
use uuid::Uuid;

/// Expired task rows are purged this long after their TTL passed
const TASK_PURGE_WINDOW_MS: i64 = 24 * 3600_000;
/// Rate limit windows are purged after this age
const RATE_WINDOW_PURGE_MS: i64 = 3600_000;

const TASK_COLUMNS: &str = r#"
    task_id,
    session_id,
    site_id,
    fingerprint,
    code,
    task_status,
    code_generated_at_ms,
    code_revealed_at_ms,
    verified_at_ms,
    expires_at_ms,
    created_at
"#;

const SITE_COLUMNS: &str = r#"
    site_id,
    site_key,
    site_name,
    domain,
    url,
    search_hint,
    instruction,
    is_active,
    priority,
    quota,
    remaining_quota,
    total_visits,
    total_completed
"#;

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgGateRepository {
    pool: PgPool,
}

impl PgGateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Expiry sweep: flip stale live tasks to expired, purge old rows.
    /// Reads already filter on `expires_at_ms`; this keeps storage tidy.
    pub async fn cleanup_expired(&self) -> GateResult<(u64, u64, u64)> {
        let now_ms = Utc::now().timestamp_millis();

        let tasks_expired = sqlx::query(
            r#"
            UPDATE tasks SET task_status = 'expired'
            WHERE task_status IN ('pending', 'in_progress') AND expires_at_ms < $1
            "#,
        )
        .bind(now_ms)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let tasks_purged = sqlx::query(
            "DELETE FROM tasks WHERE task_status = 'expired' AND expires_at_ms < $1",
        )
        .bind(now_ms - TASK_PURGE_WINDOW_MS)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let rate_windows_purged = sqlx::query("DELETE FROM rate_limits WHERE window_start_ms < $1")
            .bind(now_ms - RATE_WINDOW_PURGE_MS)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(
            tasks_expired = tasks_expired,
            tasks_purged = tasks_purged,
            rate_windows_purged = rate_windows_purged,
            "Expiry sweep completed"
        );

        Ok((tasks_expired, tasks_purged, rate_windows_purged))
    }
}

impl TaskRepository for PgGateRepository {
    async fn retire_expired(&self, fingerprint: &Fingerprint) -> GateResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let retired = sqlx::query(
            r#"
            UPDATE tasks SET task_status = 'expired'
            WHERE fingerprint = $1
              AND task_status IN ('pending', 'in_progress')
              AND expires_at_ms <= $2
            "#,
        )
        .bind(fingerprint.as_str())
        .bind(now_ms)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if retired > 0 {
            tracing::debug!(retired = retired, "Retired stale tasks for fingerprint");
        }

        Ok(retired)
    }

    async fn find_live(&self, fingerprint: &Fingerprint) -> GateResult<Option<Task>> {
        let now_ms = Utc::now().timestamp_millis();

        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE fingerprint = $1
              AND task_status IN ('pending', 'in_progress')
              AND expires_at_ms > $2
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(fingerprint.as_str())
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_task()).transpose()
    }

    async fn find_live_for_site(
        &self,
        fingerprint: &Fingerprint,
        site_id: SiteId,
    ) -> GateResult<Option<Task>> {
        let now_ms = Utc::now().timestamp_millis();

        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE fingerprint = $1
              AND site_id = $2
              AND task_status IN ('pending', 'in_progress')
              AND expires_at_ms > $3
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(fingerprint.as_str())
        .bind(site_id.as_uuid())
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_task()).transpose()
    }

    async fn insert_live(&self, task: &Task) -> GateResult<Option<Task>> {
        // The partial unique index on live tasks turns the read-then-write
        // dedup race into a no-op insert; the caller re-reads the winner
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks (
                task_id,
                session_id,
                site_id,
                fingerprint,
                code,
                task_status,
                expires_at_ms,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (fingerprint) WHERE task_status IN ('pending', 'in_progress')
            DO NOTHING
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task.id.as_uuid())
        .bind(task.session_id.as_uuid())
        .bind(task.site_id.as_uuid())
        .bind(task.fingerprint.as_str())
        .bind(task.code.as_deref())
        .bind(task.status.as_str())
        .bind(task.expires_at_ms)
        .bind(task.created_at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.into_task()?)),
            None => {
                tracing::debug!(task_id = %task.id, "Live task insert lost the slot");
                Ok(None)
            }
        }
    }

    async fn rebind_session(&self, task_id: TaskId, session_id: SessionId) -> GateResult<()> {
        sqlx::query("UPDATE tasks SET session_id = $2 WHERE task_id = $1")
            .bind(task_id.as_uuid())
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn begin(
        &self,
        task_id: TaskId,
        fingerprint: &Fingerprint,
        candidate_code: &str,
    ) -> GateResult<Option<Task>> {
        let now_ms = Utc::now().timestamp_millis();

        // COALESCE keeps an already assigned code and clock, which makes
        // repeated begin calls harmless
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks
            SET task_status = 'in_progress',
                code = COALESCE(code, $3),
                code_generated_at_ms = COALESCE(code_generated_at_ms, $4)
            WHERE task_id = $1
              AND fingerprint = $2
              AND task_status IN ('pending', 'in_progress')
              AND expires_at_ms > $4
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task_id.as_uuid())
        .bind(fingerprint.as_str())
        .bind(candidate_code)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_task()).transpose()
    }

    async fn find_owned(
        &self,
        task_id: TaskId,
        fingerprint: &Fingerprint,
    ) -> GateResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE task_id = $1 AND fingerprint = $2
            "#
        ))
        .bind(task_id.as_uuid())
        .bind(fingerprint.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_task()).transpose()
    }

    async fn mark_revealed(&self, task_id: TaskId) -> GateResult<()> {
        let now_ms = Utc::now().timestamp_millis();

        // Keep the first reveal stamp
        sqlx::query(
            r#"
            UPDATE tasks
            SET code_revealed_at_ms = COALESCE(code_revealed_at_ms, $2)
            WHERE task_id = $1
            "#,
        )
        .bind(task_id.as_uuid())
        .bind(now_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_code(&self, fingerprint: &Fingerprint, code: &str) -> GateResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE fingerprint = $1 AND code = $2
            ORDER BY created_at DESC
            "#
        ))
        .bind(fingerprint.as_str())
        .bind(code)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_task()).collect()
    }

    async fn find_in_progress(&self, fingerprint: &Fingerprint) -> GateResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE fingerprint = $1 AND task_status = 'in_progress'
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(fingerprint.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_task()).transpose()
    }

    async fn complete(&self, task_id: TaskId) -> GateResult<bool> {
        let now_ms = Utc::now().timestamp_millis();

        // Conditional transition: only one concurrent verification wins
        let updated = sqlx::query(
            r#"
            UPDATE tasks
            SET task_status = 'completed', verified_at_ms = $2
            WHERE task_id = $1 AND task_status = 'in_progress'
            "#,
        )
        .bind(task_id.as_uuid())
        .bind(now_ms)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }
}

impl SiteRepository for PgGateRepository {
    async fn eligible(&self) -> GateResult<Vec<Site>> {
        let rows = sqlx::query_as::<_, SiteRow>(&format!(
            r#"
            SELECT {SITE_COLUMNS} FROM sites
            WHERE is_active AND (quota = 0 OR remaining_quota > 0)
            ORDER BY site_key
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_site()).collect())
    }

    async fn find_active_by_key(&self, site_key: &SiteKey) -> GateResult<Option<Site>> {
        let row = sqlx::query_as::<_, SiteRow>(&format!(
            r#"
            SELECT {SITE_COLUMNS} FROM sites
            WHERE site_key = $1 AND is_active
            "#
        ))
        .bind(site_key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_site()))
    }

    async fn find_by_id(&self, site_id: SiteId) -> GateResult<Option<Site>> {
        let row = sqlx::query_as::<_, SiteRow>(&format!(
            r#"
            SELECT {SITE_COLUMNS} FROM sites
            WHERE site_id = $1
            "#
        ))
        .bind(site_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_site()))
    }

    async fn record_visit(&self, site_id: SiteId) -> GateResult<()> {
        sqlx::query("UPDATE sites SET total_visits = total_visits + 1 WHERE site_id = $1")
            .bind(site_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn record_completion(&self, site_id: SiteId) -> GateResult<()> {
        // Single-field conditional decrement; the quota can never go negative
        sqlx::query(
            r#"
            UPDATE sites
            SET total_completed = total_completed + 1,
                remaining_quota = CASE
                    WHEN quota > 0 AND remaining_quota > 0 THEN remaining_quota - 1
                    ELSE remaining_quota
                END
            WHERE site_id = $1
            "#,
        )
        .bind(site_id.as_uuid())
        .execute(&self.pool)
        .await?;

        tracing::info!(site_id = %site_id, "Recorded completion");

        Ok(())
    }
}

impl SessionRepository for PgGateRepository {
    async fn unlock(&self, session_id: SessionId) -> GateResult<Option<String>> {
        let now_ms = Utc::now().timestamp_millis();

        let kind = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE sessions
            SET unlocked = TRUE, session_status = 'completed', completed_at_ms = $2
            WHERE session_id = $1
            RETURNING test_kind
            "#,
        )
        .bind(session_id.as_uuid())
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        match &kind {
            Some(_) => tracing::info!(session_id = %session_id, "Session unlocked"),
            None => tracing::warn!(session_id = %session_id, "Unlock for unknown session"),
        }

        Ok(kind)
    }

    async fn kind_of(&self, session_id: SessionId) -> GateResult<Option<String>> {
        let kind = sqlx::query_scalar::<_, String>(
            "SELECT test_kind FROM sessions WHERE session_id = $1",
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(kind)
    }
}

impl RateLimitRepository for PgGateRepository {
    async fn check(
        &self,
        fingerprint: &Fingerprint,
        max_requests: u32,
        window_ms: i64,
    ) -> GateResult<bool> {
        let now_ms = Utc::now().timestamp_millis();
        let window_start = (now_ms / window_ms) * window_ms;

        let row = sqlx::query_as::<_, (i32,)>(
            r#"
            INSERT INTO rate_limits (fingerprint, window_start_ms, request_count)
            VALUES ($1, $2, 1)
            ON CONFLICT (fingerprint, window_start_ms)
            DO UPDATE SET request_count = rate_limits.request_count + 1
            RETURNING request_count
            "#,
        )
        .bind(fingerprint.as_str())
        .bind(window_start)
        .fetch_one(&self.pool)
        .await?;

        let count = row.0 as u32;
        let allowed = count <= max_requests;

        if !allowed {
            tracing::warn!(count = count, max = max_requests, "Rate limit exceeded");
        }

        Ok(allowed)
    }
}

// Internal row types for sqlx mapping

#[derive(sqlx::FromRow)]
struct TaskRow {
    task_id: Uuid,
    session_id: Uuid,
    site_id: Uuid,
    fingerprint: String,
    code: Option<String>,
    task_status: String,
    code_generated_at_ms: Option<i64>,
    code_revealed_at_ms: Option<i64>,
    verified_at_ms: Option<i64>,
    expires_at_ms: i64,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TaskRow {
    fn into_task(self) -> GateResult<Task> {
        let status = TaskStatus::parse(&self.task_status).ok_or_else(|| {
            GateError::Internal(format!("unknown task status: {}", self.task_status))
        })?;

        Ok(Task {
            id: TaskId::from_uuid(self.task_id),
            session_id: SessionId::from_uuid(self.session_id),
            site_id: SiteId::from_uuid(self.site_id),
            fingerprint: self.fingerprint,
            code: self.code,
            status,
            code_generated_at_ms: self.code_generated_at_ms,
            code_revealed_at_ms: self.code_revealed_at_ms,
            verified_at_ms: self.verified_at_ms,
            expires_at_ms: self.expires_at_ms,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SiteRow {
    site_id: Uuid,
    site_key: String,
    site_name: String,
    domain: String,
    url: Option<String>,
    search_hint: Option<String>,
    instruction: Option<String>,
    is_active: bool,
    priority: i32,
    quota: i32,
    remaining_quota: i32,
    total_visits: i64,
    total_completed: i64,
}

impl SiteRow {
    fn into_site(self) -> Site {
        Site {
            id: SiteId::from_uuid(self.site_id),
            site_key: self.site_key,
            name: self.site_name,
            domain: self.domain,
            url: self.url,
            search_hint: self.search_hint,
            instruction: self.instruction,
            is_active: self.is_active,
            priority: self.priority,
            quota: self.quota,
            remaining_quota: self.remaining_quota,
            total_visits: self.total_visits,
            total_completed: self.total_completed,
        }
    }
}
