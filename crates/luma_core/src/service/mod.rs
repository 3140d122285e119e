//! Core use-case services.
//!
//! # Responsibility
//! - Own the process-wide library and the per-screen sessions.
//! - Keep FFI and CLI layers decoupled from storage and gateway details.

pub mod detail_session;
pub mod library_store;
pub mod record_resolver;
pub mod scan_session;
pub mod session_support;
