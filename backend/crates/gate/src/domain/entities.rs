//! Domain Entities

use chrono::{DateTime, Utc};
use kernel::id::{SessionId, SiteId, TaskId};

use crate::domain::value_objects::Fingerprint;

/// Destination site a verified visitor is routed to
///
/// Created and edited by the admin collaborator; the gate only reads the
/// selection fields and mutates the counters through atomic store updates.
#[derive(Debug, Clone)]
pub struct Site {
    pub id: SiteId,
    /// Stable key the destination-side widget identifies itself with
    pub site_key: String,
    pub name: String,
    pub domain: String,
    pub url: Option<String>,
    /// Search phrase shown to the visitor instead of a direct link
    pub search_hint: Option<String>,
    pub instruction: Option<String>,
    pub is_active: bool,
    /// Selection weight, 0..=100
    pub priority: i32,
    /// Maximum verified completions; 0 = unlimited
    pub quota: i32,
    pub remaining_quota: i32,
    pub total_visits: i64,
    pub total_completed: i64,
}

impl Site {
    /// A site may receive new assignments while active and under quota
    pub fn is_eligible(&self) -> bool {
        self.is_active && (self.quota == 0 || self.remaining_quota > 0)
    }
}

/// Task life-cycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Expired,
}

impl TaskStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            "expired" => Some(TaskStatus::Expired),
            _ => None,
        }
    }

    /// Pending and in-progress tasks still occupy the per-device slot
    pub const fn is_live(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task entity - a time-boxed unit binding a device to a site and a code
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub session_id: SessionId,
    pub site_id: SiteId,
    pub fingerprint: String,
    /// Unset until the countdown is first started
    pub code: Option<String>,
    pub status: TaskStatus,
    pub code_generated_at_ms: Option<i64>,
    pub code_revealed_at_ms: Option<i64>,
    pub verified_at_ms: Option<i64>,
    pub expires_at_ms: i64,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a new pending task with no code yet
    pub fn new(session_id: SessionId, site_id: SiteId, fingerprint: &Fingerprint, ttl_ms: i64) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            session_id,
            site_id,
            fingerprint: fingerprint.as_str().to_string(),
            code: None,
            status: TaskStatus::Pending,
            code_generated_at_ms: None,
            code_revealed_at_ms: None,
            verified_at_ms: None,
            expires_at_ms: now.timestamp_millis() + ttl_ms,
            created_at: now,
        }
    }

    /// Check if the task has passed its TTL
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }

    /// Live = still occupying the per-device slot and within TTL
    pub fn is_live(&self) -> bool {
        self.status.is_live() && !self.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site_with(quota: i32, remaining: i32, active: bool) -> Site {
        Site {
            id: SiteId::new(),
            site_key: "k".into(),
            name: "n".into(),
            domain: "d".into(),
            url: None,
            search_hint: None,
            instruction: None,
            is_active: active,
            priority: 1,
            quota,
            remaining_quota: remaining,
            total_visits: 0,
            total_completed: 0,
        }
    }

    #[test]
    fn test_site_eligibility() {
        assert!(site_with(0, 0, true).is_eligible()); // unlimited
        assert!(site_with(5, 3, true).is_eligible());
        assert!(!site_with(5, 0, true).is_eligible()); // quota exhausted
        assert!(!site_with(0, 0, false).is_eligible()); // inactive
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::Expired,
        ] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("unknown"), None);
    }

    #[test]
    fn test_status_liveness() {
        assert!(TaskStatus::Pending.is_live());
        assert!(TaskStatus::InProgress.is_live());
        assert!(!TaskStatus::Completed.is_live());
        assert!(!TaskStatus::Expired.is_live());
    }

    #[test]
    fn test_new_task() {
        let fp = Fingerprint::parse("device-a").unwrap();
        let task = Task::new(SessionId::new(), SiteId::new(), &fp, 30 * 60_000);

        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.code.is_none());
        assert!(task.code_generated_at_ms.is_none());
        assert!(!task.is_expired());
        assert!(task.is_live());
    }
}
