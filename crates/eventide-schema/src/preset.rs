//! Closed preset-event and preset-property tables.
//!
//! Preset events (names starting with `#` or `$`, sent as `track`) form a
//! closed vocabulary: the event must be listed here and its properties must
//! be drawn from the event's own list or the common preset list, with the
//! declared value shape.

use eventide_core::Value;

/// Expected shape for a preset property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tag {
    Str,
    Int,
    Float,
    Bool,
}

impl Tag {
    pub(crate) fn matches(self, value: &Value) -> bool {
        match self {
            Tag::Str => matches!(value, Value::String(_)),
            Tag::Int => matches!(value, Value::Int(_)),
            Tag::Float => matches!(value, Value::Float(_)),
            Tag::Bool => matches!(value, Value::Bool(_)),
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Tag::Str => "string",
            Tag::Int => "int",
            Tag::Float => "float",
            Tag::Bool => "bool",
        }
    }
}

/// Reserved meta keys routed from property/meta maps to the record top
/// level, with their expected shapes.
pub(crate) const META_KEYS: &[(&str, Tag)] = &[
    ("#app_id", Tag::Str),
    ("#bundle_id", Tag::Str),
    ("#android_id", Tag::Str),
    ("#gaid", Tag::Str),
    ("#dt_id", Tag::Str),
    ("#acid", Tag::Str),
    ("#event_time", Tag::Int),
    ("#event_syn", Tag::Str),
];

/// Meta keys every canonical record must carry.
pub(crate) const COMPULSORY_META: &[&str] = &[
    "#app_id",
    "#bundle_id",
    "#event_time",
    "#event_name",
    "#event_type",
    "#event_syn",
];

const PRESET_PROPS_COMMON: &[(&str, Tag)] = &[
    ("$uid", Tag::Str),
    ("#dt_id", Tag::Str),
    ("#acid", Tag::Str),
    ("#event_syn", Tag::Str),
    ("#session_id", Tag::Str),
    ("#device_manufacturer", Tag::Str),
    ("#event_name", Tag::Str),
    ("#is_foreground", Tag::Bool),
    ("#android_id", Tag::Str),
    ("#gaid", Tag::Str),
    ("#mcc", Tag::Str),
    ("#mnc", Tag::Str),
    ("#os_country_code", Tag::Str),
    ("#os_lang_code", Tag::Str),
    ("#event_time", Tag::Int),
    ("#bundle_id", Tag::Str),
    ("#app_version_code", Tag::Int),
    ("#app_version_name", Tag::Str),
    ("#sdk_type", Tag::Str),
    ("#sdk_version_name", Tag::Str),
    ("#os", Tag::Str),
    ("#os_version_name", Tag::Str),
    ("#os_version_code", Tag::Int),
    ("#device_brand", Tag::Str),
    ("#device_model", Tag::Str),
    ("#build_device", Tag::Str),
    ("#screen_height", Tag::Int),
    ("#screen_width", Tag::Int),
    ("#memory_used", Tag::Str),
    ("#storage_used", Tag::Str),
    ("#network_type", Tag::Str),
    ("#simulator", Tag::Bool),
    ("#fps", Tag::Int),
    ("$ip", Tag::Str),
    ("$country_code", Tag::Str),
    ("$server_time", Tag::Int),
];

const PRESET_PROPS_AD: &[(&str, Tag)] = &[
    ("#ad_seq", Tag::Str),
    ("#ad_id", Tag::Str),
    ("#ad_type_code", Tag::Str),
    ("#ad_platform_code", Tag::Str),
    ("#ad_entrance", Tag::Str),
    ("#ad_result", Tag::Bool),
    ("#ad_duration", Tag::Int),
    ("#ad_location", Tag::Str),
    ("#errorCode", Tag::Int),
    ("#errorMessage", Tag::Str),
    ("#ad_value", Tag::Str),
    ("#ad_currency", Tag::Str),
    ("#ad_precision", Tag::Str),
    ("#ad_country_code", Tag::Str),
    ("#ad_mediation_code", Tag::Str),
    ("#ad_mediation_id", Tag::Str),
    ("#ad_conversion_source", Tag::Str),
    ("#ad_click_gap", Tag::Str),
    ("#ad_return_gap", Tag::Str),
    ("#error_code", Tag::Str),
    ("#error_message", Tag::Str),
    ("#load_result", Tag::Str),
    ("#load_duration", Tag::Str),
];

const PRESET_PROPS_IAS: &[(&str, Tag)] = &[
    ("#ias_seq", Tag::Str),
    ("#ias_original_order", Tag::Str),
    ("#ias_order", Tag::Str),
    ("#ias_sku", Tag::Str),
    ("#ias_price", Tag::Float),
    ("#ias_currency", Tag::Str),
    ("$ias_price_exchange", Tag::Float),
];

const APP_INSTALL_PROPS: &[(&str, Tag)] = &[
    ("#referrer_url", Tag::Str),
    ("#referrer_click_time", Tag::Int),
    ("#app_install_time", Tag::Int),
    ("#instant_experience_launched", Tag::Bool),
    ("#failed_reason", Tag::Str),
    ("#cnl", Tag::Str),
];

const SESSION_START_PROPS: &[(&str, Tag)] = &[
    ("#is_first_time", Tag::Bool),
    ("#resume_from_background", Tag::Bool),
    ("#start_reason", Tag::Str),
];

const ATTRIBUTION_INSTALL_PROPS: &[(&str, Tag)] = &[
    ("$network_id", Tag::Str),
    ("$network_name", Tag::Str),
    ("$tracker_id", Tag::Str),
    ("$tracker_name", Tag::Str),
    ("$channel_id", Tag::Str),
    ("$channel_sub_id", Tag::Str),
    ("$channel_ssub_id", Tag::Str),
    ("$channel_name", Tag::Str),
    ("$channel_sub_name", Tag::Str),
    ("$channel_ssub_name", Tag::Str),
    ("$channel_platform_id", Tag::Int),
    ("$channel_platform_name", Tag::Str),
    ("$attribution_source", Tag::Str),
    ("$fraud_network_id", Tag::Str),
    ("$original_tracker_id", Tag::Str),
    ("$original_tracker_name", Tag::Str),
    ("$original_network_id", Tag::Str),
    ("$original_network_name", Tag::Str),
];

const SESSION_END_PROPS: &[(&str, Tag)] = &[("#session_duration", Tag::Int)];

const AD_CONVERSION_EXTRA: &[(&str, Tag)] = &[("$earnings", Tag::Float)];

const IAP_PURCHASE_PROPS: &[(&str, Tag)] = &[
    ("#iap_order", Tag::Str),
    ("#iap_sku", Tag::Str),
    ("#iap_price", Tag::Float),
    ("#iap_currency", Tag::Str),
    ("$iap_price_exchange", Tag::Float),
];

const IAS_NOTIFY_EXTRA: &[(&str, Tag)] = &[("$original_ios_notification_type", Tag::Str)];

/// Closed preset-event table: event name to its allowed property slices.
const PRESET_EVENTS: &[(&str, &[&[(&str, Tag)]])] = &[
    ("#app_install", &[APP_INSTALL_PROPS]),
    ("#session_start", &[SESSION_START_PROPS]),
    ("$app_install", &[ATTRIBUTION_INSTALL_PROPS]),
    ("#session_end", &[SESSION_END_PROPS]),
    ("#ad_load_begin", &[PRESET_PROPS_AD]),
    ("#ad_load_end", &[PRESET_PROPS_AD]),
    ("#ad_to_show", &[PRESET_PROPS_AD]),
    ("#ad_show", &[PRESET_PROPS_AD]),
    ("#ad_show_failed", &[PRESET_PROPS_AD]),
    ("#ad_close", &[PRESET_PROPS_AD]),
    ("#ad_click", &[PRESET_PROPS_AD]),
    ("#ad_left_app", &[PRESET_PROPS_AD]),
    ("#ad_return_app", &[PRESET_PROPS_AD]),
    ("#ad_rewarded", &[PRESET_PROPS_AD]),
    ("#ad_conversion", &[PRESET_PROPS_AD, AD_CONVERSION_EXTRA]),
    ("#ad_paid", &[PRESET_PROPS_AD]),
    ("#iap_purchase_success", &[IAP_PURCHASE_PROPS]),
    ("#ias_subscribe_success", &[PRESET_PROPS_IAS]),
    ("#ias_subscribe_notify", &[PRESET_PROPS_IAS, IAS_NOTIFY_EXTRA]),
];

pub(crate) fn is_preset_event(event_name: &str) -> bool {
    PRESET_EVENTS.iter().any(|(name, _)| *name == event_name)
}

/// Looks up the expected shape of `prop` for `event_name`, falling back to
/// the common preset-property table.
pub(crate) fn preset_prop_tag(event_name: &str, prop: &str) -> Option<Tag> {
    let slices = PRESET_EVENTS
        .iter()
        .find(|(name, _)| *name == event_name)
        .map(|(_, slices)| *slices)?;
    for slice in slices {
        if let Some((_, tag)) = slice.iter().find(|(key, _)| *key == prop) {
            return Some(*tag);
        }
    }
    PRESET_PROPS_COMMON
        .iter()
        .find(|(key, _)| *key == prop)
        .map(|(_, tag)| *tag)
}

pub(crate) fn meta_tag(key: &str) -> Option<Tag> {
    META_KEYS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, tag)| *tag)
}
