//! Core infrastructure for eventide.
//!
//! This crate provides the pieces shared by every other eventide crate:
//! - The pager channel: stable numeric codes plus a listener registry for
//!   out-of-band error and warning delivery
//! - The tagged [`Value`] model used for event properties, together with its
//!   JSON encoding rules

pub mod pager;
pub mod value;

pub use pager::{PagerHandle, PagerHub, QualityLevel};
pub use value::Value;
