//! Gate - Task Assignment & Code-Verification Engine
//!
//! Routes each completed assessment to a destination site, forces a timed
//! wait before releasing a one-time verification code, and unlocks the
//! assessment result only once that code is confirmed.
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers
//!
//! ## Security Model
//! - Backend is the sole authority for site selection, code generation,
//!   the dwell interval, and verification
//! - The countdown shown by the client is cosmetic; the server enforces the
//!   dwell interval by timestamp comparison, so restarts lose no state
//! - One live task per device fingerprint, enforced by the store
//! - Completion, quota decrement and session unlock are conditional updates
//!   (no double-spend on retried verifications)

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::GateConfig;
pub use error::{GateError, GateResult};
pub use infra::postgres::PgGateRepository;
pub use presentation::router::{codes_router, tasks_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult, OptionExt, ResultExt},
    kind::ErrorKind,
};
