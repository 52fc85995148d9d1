//! Caller-supplied event record.

use std::collections::BTreeMap;

use eventide_core::Value;

use crate::error::SchemaError;

/// An event as handed over by the caller.
///
/// `properties` carries the payload; keys starting with `#` or `$` found
/// there are treated as meta keys and routed to the record top level during
/// processing. `meta` is an explicit channel for the same reserved keys and
/// is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Visitor id. At least one of `dt_id`/`acid` must be present.
    pub dt_id: Option<String>,
    /// Account id.
    pub acid: Option<String>,
    pub event_name: String,
    pub properties: BTreeMap<String, Value>,
    pub meta: BTreeMap<String, Value>,
}

impl Event {
    /// Starts building an event with the given name.
    pub fn builder(event_name: impl Into<String>) -> EventBuilder {
        EventBuilder {
            dt_id: None,
            acid: None,
            event_name: event_name.into(),
            properties: BTreeMap::new(),
            meta: BTreeMap::new(),
        }
    }
}

/// Builder for [`Event`].
pub struct EventBuilder {
    dt_id: Option<String>,
    acid: Option<String>,
    event_name: String,
    properties: BTreeMap<String, Value>,
    meta: BTreeMap<String, Value>,
}

impl EventBuilder {
    /// Sets the visitor id.
    pub fn dt_id(mut self, dt_id: impl Into<String>) -> Self {
        self.dt_id = Some(dt_id.into());
        self
    }

    /// Sets the account id.
    pub fn acid(mut self, acid: impl Into<String>) -> Self {
        self.acid = Some(acid.into());
        self
    }

    /// Adds one property.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Replaces the property map.
    pub fn properties(mut self, properties: BTreeMap<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    /// Adds one meta entry.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Replaces the meta map.
    pub fn metas(mut self, meta: BTreeMap<String, Value>) -> Self {
        self.meta = meta;
        self
    }

    /// Builds the event, enforcing that at least one id is present.
    pub fn build(self) -> Result<Event, SchemaError> {
        if self.dt_id.is_none() && self.acid.is_none() {
            return Err(SchemaError::Meta(
                "at least one of dt_id and acid should be provided".to_string(),
            ));
        }
        Ok(Event {
            dt_id: self.dt_id,
            acid: self.acid,
            event_name: self.event_name,
            properties: self.properties,
            meta: self.meta,
        })
    }
}
