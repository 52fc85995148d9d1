//! Event validation, enrichment and canonical encoding.
//!
//! Callers describe what happened ([`Event`]); the [`EventProcessor`] turns
//! that into the canonical wire record the collector expects: reserved meta
//! keys are routed to the record top level, defaults (event time, synthetic
//! id, app id) are injected, names and value types are checked against the
//! schema rules, and the result is serialized to compact JSON.
//!
//! Validation failures surface synchronously: they are the caller's fault
//! and the only errors the pipeline ever raises back across its API.
//!
//! # Example
//!
//! ```
//! use eventide_schema::{Event, EventProcessor, SendType};
//!
//! let processor = EventProcessor::new("app-1", false);
//! let event = Event::builder("purchase")
//!     .dt_id("visitor-1")
//!     .property("price", 15)
//!     .meta("#bundle_id", "com.example")
//!     .build()
//!     .unwrap();
//!
//! let record = processor.process(SendType::Track, &event).unwrap();
//! assert!(record.contains("\"#event_name\":\"purchase\""));
//! ```

mod error;
mod event;
mod preset;
mod processor;

pub use error::SchemaError;
pub use event::{Event, EventBuilder};
pub use processor::{EventProcessor, SendType, DT_ID_SENTINEL};
