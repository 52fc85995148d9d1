//! Canonical record construction.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use eventide_core::Value;
use rand::distr::Alphanumeric;
use rand::Rng;
use regex::Regex;

use crate::error::SchemaError;
use crate::event::Event;
use crate::preset;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[#$a-zA-Z][a-zA-Z0-9_]{0,63}$").expect("name pattern is valid")
});

/// Visitor-id placeholder used when only an account id is present.
pub const DT_ID_SENTINEL: &str = "0000000000000000000000000000000000000000";

const EVENT_SYN_LEN: usize = 16;

/// Whether an event describes an action (`track`) or a user-profile
/// mutation (`user`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendType {
    Track,
    User,
}

impl SendType {
    pub fn as_str(self) -> &'static str {
        match self {
            SendType::Track => "track",
            SendType::User => "user",
        }
    }
}

/// Validates, enriches and encodes caller events into canonical wire
/// records.
///
/// One processor per pipeline; it carries the app id and the debug flag
/// that get stamped onto every record.
#[derive(Debug, Clone)]
pub struct EventProcessor {
    app_id: String,
    debug: bool,
}

impl EventProcessor {
    pub fn new(app_id: impl Into<String>, debug: bool) -> Self {
        Self {
            app_id: app_id.into(),
            debug,
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Produces the canonical compact-JSON record for one event.
    pub fn process(&self, send_type: SendType, event: &Event) -> Result<String, SchemaError> {
        let record = self.build_record(send_type, event)?;
        encode(&record)
    }

    /// Batch form of [`process`](Self::process): all records are validated
    /// before any is returned.
    pub fn process_batch(
        &self,
        send_type: SendType,
        events: &[Event],
    ) -> Result<Vec<String>, SchemaError> {
        events
            .iter()
            .map(|event| self.process(send_type, event))
            .collect()
    }

    fn build_record(
        &self,
        send_type: SendType,
        event: &Event,
    ) -> Result<BTreeMap<String, Value>, SchemaError> {
        if event.dt_id.is_none() && event.acid.is_none() {
            return Err(SchemaError::Meta(
                "dt_id and acid must be set at least one".to_string(),
            ));
        }

        let mut properties = event.properties.clone();
        let mut record: BTreeMap<String, Value> = BTreeMap::new();
        record.insert(
            "#event_type".to_string(),
            Value::from(send_type.as_str()),
        );

        move_meta(&mut properties, &mut record);
        lift_meta(&event.meta, &mut record);

        if !record.contains_key("#event_time") {
            record.insert("#event_time".to_string(), Value::Int(now_ms()));
        }
        match record.get("#event_time") {
            Some(Value::Int(t)) if is_millis_timestamp(*t) => {}
            _ => {
                return Err(SchemaError::Meta(
                    "event_time must be timestamp (ms)".to_string(),
                ))
            }
        }

        if !record.contains_key("#event_syn") {
            record.insert(
                "#event_syn".to_string(),
                Value::String(random_syn(EVENT_SYN_LEN)),
            );
        }

        let dt_id = event.dt_id.clone().unwrap_or_else(|| DT_ID_SENTINEL.to_string());
        record.insert("#dt_id".to_string(), Value::String(dt_id));

        if self.debug {
            record.insert("#debug".to_string(), Value::from("true"));
        }
        record.insert("#app_id".to_string(), Value::String(self.app_id.clone()));
        record.insert(
            "#event_name".to_string(),
            Value::String(event.event_name.clone()),
        );
        if let Some(acid) = &event.acid {
            record.insert("#acid".to_string(), Value::String(acid.clone()));
        }

        verify_record(&record, &properties)?;
        record.insert("properties".to_string(), Value::Map(properties));
        Ok(record)
    }
}

/// Moves recognized meta keys out of `properties` to the record top level.
fn move_meta(properties: &mut BTreeMap<String, Value>, record: &mut BTreeMap<String, Value>) {
    for (key, _) in preset::META_KEYS {
        if let Some(value) = properties.remove(*key) {
            record.insert((*key).to_string(), value);
        }
    }
}

/// Copies recognized meta keys from the caller's meta map without mutating
/// it; unknown keys are ignored.
fn lift_meta(meta: &BTreeMap<String, Value>, record: &mut BTreeMap<String, Value>) {
    for (key, _) in preset::META_KEYS {
        if let Some(value) = meta.get(*key) {
            record.insert((*key).to_string(), value.clone());
        }
    }
}

fn verify_record(
    record: &BTreeMap<String, Value>,
    properties: &BTreeMap<String, Value>,
) -> Result<(), SchemaError> {
    for key in preset::COMPULSORY_META {
        let Some(value) = record.get(*key) else {
            return Err(SchemaError::Meta(format!(
                "required meta property \"{key}\" is missing"
            )));
        };
        if let Some(tag) = preset::meta_tag(key) {
            if !tag.matches(value) {
                return Err(SchemaError::Meta(format!(
                    "meta property \"{key}\" must be {}",
                    tag.name()
                )));
            }
        }
    }

    if record.get("#app_id").and_then(Value::as_str).map_or(true, str::is_empty) {
        return Err(SchemaError::Meta(
            "app_id cannot be missing or empty".to_string(),
        ));
    }

    match record.get("#dt_id") {
        None => return Err(SchemaError::Meta("dt_id should be provided but missing".to_string())),
        Some(Value::String(s)) if !s.is_empty() => {}
        Some(Value::String(_)) => {
            return Err(SchemaError::Meta("dt_id can not be empty".to_string()))
        }
        Some(_) => return Err(SchemaError::Meta("dt_id should be string type".to_string())),
    }
    if let Some(acid) = record.get("#acid") {
        if !acid.is_str() {
            return Err(SchemaError::Meta("acid should be string type".to_string()));
        }
    }

    let event_name = record
        .get("#event_name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if !NAME_PATTERN.is_match(event_name) {
        return Err(SchemaError::Meta(
            "event_name must be a valid variable name".to_string(),
        ));
    }

    let is_track = record.get("#event_type").and_then(Value::as_str) == Some("track");
    if is_track && (event_name.starts_with('#') || event_name.starts_with('$')) {
        if !preset::is_preset_event(event_name) {
            return Err(SchemaError::Meta(format!(
                "event_name (\"{event_name}\") is out of scope"
            )));
        }
        verify_preset_properties(event_name, properties)
    } else {
        verify_properties(event_name, properties)
    }
}

fn verify_preset_properties(
    event_name: &str,
    properties: &BTreeMap<String, Value>,
) -> Result<(), SchemaError> {
    for (key, value) in properties {
        let Some(tag) = preset::preset_prop_tag(event_name, key) else {
            return Err(SchemaError::IllegalData(format!(
                "key of property (\"{key}\") is out of scope for preset event (\"{event_name}\")"
            )));
        };
        if !tag.matches(value) {
            return Err(SchemaError::IllegalData(format!(
                "the type of value for property \"{key}\" is not valid (expect: {})",
                tag.name()
            )));
        }
    }
    Ok(())
}

fn verify_properties(
    event_name: &str,
    properties: &BTreeMap<String, Value>,
) -> Result<(), SchemaError> {
    if event_name.eq_ignore_ascii_case("#user_append")
        || event_name.eq_ignore_ascii_case("#user_uniq_append")
    {
        for value in properties.values() {
            if !value.is_list() {
                return Err(SchemaError::IllegalData(format!(
                    "type of properties for {event_name} should be list"
                )));
            }
        }
        return Ok(());
    }
    if event_name.eq_ignore_ascii_case("#user_add") {
        for value in properties.values() {
            if !value.is_number() {
                return Err(SchemaError::IllegalData(
                    "user_add properties must be number type".to_string(),
                ));
            }
        }
        return Ok(());
    }

    for (key, value) in properties {
        if !NAME_PATTERN.is_match(key) {
            return Err(SchemaError::IllegalData(format!(
                "property key must be a valid variable name [key={key}]"
            )));
        }
        let supported = matches!(
            value,
            Value::Bool(_)
                | Value::Int(_)
                | Value::Float(_)
                | Value::String(_)
                | Value::Date(_)
                | Value::DateTime(_)
                | Value::List(_)
                | Value::Map(_)
        );
        if !supported {
            return Err(SchemaError::IllegalData(format!(
                "type of value is not supported for key ({key})"
            )));
        }
    }
    Ok(())
}

fn encode(record: &BTreeMap<String, Value>) -> Result<String, SchemaError> {
    serde_json::to_string(record).map_err(|err| SchemaError::IllegalData(err.to_string()))
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn is_millis_timestamp(t: i64) -> bool {
    // 13 decimal digits
    (1_000_000_000_000..10_000_000_000_000).contains(&t)
}

fn random_syn(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
