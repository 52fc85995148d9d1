//! Worker pool integration tests.
//!
//! Test organization:
//! - keepalive.rs: idle self-termination and revival
//! - scheduling.rs: delayed dispatch under load

mod keepalive;
mod scheduling;
