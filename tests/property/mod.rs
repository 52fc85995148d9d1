//! Property-based invariants.
//!
//! Test organization:
//! - serializer.rs: value encoding round-trips, NaN/Inf rejection
//! - counters.rs: running-average bounded error
//! - names.rs: name pattern acceptance

mod counters;
mod names;
mod serializer;
