//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (secure randomness)
//! - Rate limiting infrastructure

pub mod crypto;
pub mod rate_limit;
