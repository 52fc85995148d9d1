//! Tracking façade.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use eventide_consumer::Consumer;
use eventide_core::{PagerHandle, Value};
use eventide_schema::{Event, EventProcessor, SchemaError, SendType};
use eventide_transport::{SDK_TYPE, SDK_VERSION};

/// Thin, fire-and-forget tracking API over a [`Consumer`].
///
/// `track` and the `user_*` family only build property maps and run
/// validation; delivery is asynchronous and its failures surface through
/// the pager channel, never as return values here.
pub struct Analytics {
    consumer: Arc<dyn Consumer>,
    processor: EventProcessor,
    preset_properties: BTreeMap<String, Value>,
    super_properties: RwLock<BTreeMap<String, Value>>,
}

impl Analytics {
    /// Wraps a consumer. `debug` stamps `#debug: "true"` on every record.
    pub fn new(consumer: Arc<dyn Consumer>, debug: bool) -> Self {
        let processor = EventProcessor::new(consumer.app_id().to_string(), debug);
        let mut preset_properties = BTreeMap::new();
        preset_properties.insert("#sdk_type".to_string(), Value::from(SDK_TYPE));
        preset_properties.insert("#sdk_version_name".to_string(), Value::from(SDK_VERSION));
        Self {
            consumer,
            processor,
            preset_properties,
            super_properties: RwLock::new(BTreeMap::new()),
        }
    }

    /// Properties merged into every tracked event until cleared. Caller
    /// properties win on key collision.
    pub fn set_super_properties(&self, properties: BTreeMap<String, Value>) {
        if let Ok(mut supers) = self.super_properties.write() {
            supers.extend(properties);
        }
    }

    pub fn clear_super_properties(&self) {
        if let Ok(mut supers) = self.super_properties.write() {
            supers.clear();
        }
    }

    /// Records an action event.
    pub fn track(
        &self,
        dt_id: Option<&str>,
        acid: Option<&str>,
        event_name: &str,
        properties: BTreeMap<String, Value>,
        meta: BTreeMap<String, Value>,
    ) -> Result<(), SchemaError> {
        let properties = self.with_ambient_properties(properties);
        self.submit(SendType::Track, dt_id, acid, event_name, properties, meta)
    }

    /// Batch form of [`track`](Self::track): every event is validated and
    /// encoded up front, then the whole batch is enqueued at once.
    pub fn track_batch(&self, events: Vec<Event>) -> Result<(), SchemaError> {
        let enriched: Vec<Event> = events
            .into_iter()
            .map(|mut event| {
                event.properties = self.with_ambient_properties(event.properties);
                event
            })
            .collect();
        let records = self.processor.process_batch(SendType::Track, &enriched)?;
        tracing::debug!(len = records.len(), "collected event batch");
        self.consumer.add(Box::new(move || records));
        Ok(())
    }

    /// Sets user properties, overwriting existing values.
    pub fn user_set(
        &self,
        dt_id: Option<&str>,
        acid: Option<&str>,
        properties: BTreeMap<String, Value>,
        meta: BTreeMap<String, Value>,
    ) -> Result<(), SchemaError> {
        self.submit(SendType::User, dt_id, acid, "#user_set", properties, meta)
    }

    /// Sets user properties only where no value exists yet.
    pub fn user_set_once(
        &self,
        dt_id: Option<&str>,
        acid: Option<&str>,
        properties: BTreeMap<String, Value>,
        meta: BTreeMap<String, Value>,
    ) -> Result<(), SchemaError> {
        self.submit(SendType::User, dt_id, acid, "#user_set_once", properties, meta)
    }

    /// Removes the named user properties.
    pub fn user_unset(
        &self,
        dt_id: Option<&str>,
        acid: Option<&str>,
        keys: &[&str],
        meta: BTreeMap<String, Value>,
    ) -> Result<(), SchemaError> {
        let properties = keys
            .iter()
            .map(|key| ((*key).to_string(), Value::Int(0)))
            .collect();
        self.submit(SendType::User, dt_id, acid, "#user_unset", properties, meta)
    }

    /// Adds deltas to numeric user properties.
    pub fn user_add(
        &self,
        dt_id: Option<&str>,
        acid: Option<&str>,
        properties: BTreeMap<String, Value>,
        meta: BTreeMap<String, Value>,
    ) -> Result<(), SchemaError> {
        self.submit(SendType::User, dt_id, acid, "#user_add", properties, meta)
    }

    /// Appends to list-typed user properties. List items are stringified.
    pub fn user_append(
        &self,
        dt_id: Option<&str>,
        acid: Option<&str>,
        mut properties: BTreeMap<String, Value>,
        meta: BTreeMap<String, Value>,
    ) -> Result<(), SchemaError> {
        stringify_list_items("#user_append", &mut properties)?;
        self.submit(SendType::User, dt_id, acid, "#user_append", properties, meta)
    }

    /// Appends to list-typed user properties with server-side dedup.
    /// List items are stringified.
    pub fn user_uniq_append(
        &self,
        dt_id: Option<&str>,
        acid: Option<&str>,
        mut properties: BTreeMap<String, Value>,
        meta: BTreeMap<String, Value>,
    ) -> Result<(), SchemaError> {
        stringify_list_items("#user_uniq_append", &mut properties)?;
        self.submit(SendType::User, dt_id, acid, "#user_uniq_append", properties, meta)
    }

    /// Triggers a best-effort upload.
    pub fn flush(&self) {
        self.consumer.flush();
    }

    /// Drains and shuts down the underlying consumer.
    pub async fn close(&self) {
        self.consumer.close().await;
    }

    /// Registers a pager listener on the underlying consumer.
    pub fn register_pager<F>(&self, listener: F) -> PagerHandle
    where
        F: Fn(u32, &str) + Send + Sync + 'static,
    {
        self.consumer.pager().register(listener)
    }

    /// Removes a previously registered pager listener.
    pub fn unregister_pager(&self, handle: PagerHandle) {
        self.consumer.pager().unregister(handle);
    }

    fn with_ambient_properties(
        &self,
        properties: BTreeMap<String, Value>,
    ) -> BTreeMap<String, Value> {
        let mut all = self.preset_properties.clone();
        if let Ok(supers) = self.super_properties.read() {
            all.extend(supers.clone());
        }
        all.extend(properties);
        all
    }

    fn submit(
        &self,
        send_type: SendType,
        dt_id: Option<&str>,
        acid: Option<&str>,
        event_name: &str,
        properties: BTreeMap<String, Value>,
        meta: BTreeMap<String, Value>,
    ) -> Result<(), SchemaError> {
        let mut builder = Event::builder(event_name).properties(properties).metas(meta);
        if let Some(dt_id) = dt_id {
            builder = builder.dt_id(dt_id);
        }
        if let Some(acid) = acid {
            builder = builder.acid(acid);
        }
        let event = builder.build()?;
        let record = self.processor.process(send_type, &event)?;
        tracing::debug!(event_name, "collected event");
        self.consumer.add(Box::new(move || vec![record]));
        Ok(())
    }
}

/// Converts every list item to its string form, rejecting non-list values
/// and non-scalar items.
fn stringify_list_items(
    event_name: &str,
    properties: &mut BTreeMap<String, Value>,
) -> Result<(), SchemaError> {
    for (key, value) in properties.iter_mut() {
        let Value::List(items) = value else {
            return Err(SchemaError::IllegalData(format!(
                "{event_name} properties must be list type [key={key}]"
            )));
        };
        for item in items.iter_mut() {
            *item = Value::String(scalar_to_string(item)?);
        }
    }
    Ok(())
}

fn scalar_to_string(value: &Value) -> Result<String, SchemaError> {
    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        _ => {
            return Err(SchemaError::IllegalData(
                "list items must be scalar values".to_string(),
            ))
        }
    })
}
