//! Persistence contracts and implementations.
//!
//! # Responsibility
//! - Model device-local storage as a string key/value contract.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Values are opaque strings; callers own their serialization format.
//! - A missing key is `Ok(None)`, never an error.

pub mod local_storage;
