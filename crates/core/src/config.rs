//! Inbox configuration: built-in defaults, deep merge, and the process-wide
//! cached registry of message groups and backend selection.
//!
//! Deployments supply a JSON override document; [`InboxConfig::resolve`]
//! deep-merges it over the built-in defaults and fills every message group
//! with a fixed skeleton so each group has a complete, typed shape no matter
//! how minimally it was declared. The resolved configuration is cached
//! process-wide behind [`get`] and must be explicitly invalidated with
//! [`reset`] (or replaced with [`install`]) when configuration changes at
//! runtime.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Backend identifiers
// ---------------------------------------------------------------------------

/// In-process observable outbox; used by tests and dry runs.
pub const BACKEND_LOCMEM: &str = "locmem";

/// Firebase Cloud Messaging HTTP v1.
pub const BACKEND_FCM: &str = "fcm";

/// App push backend identifiers accepted by the delivery registry.
pub const KNOWN_APP_PUSH_BACKENDS: [&str; 2] = [BACKEND_LOCMEM, BACKEND_FCM];

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Skeleton merged under every declared message group before the group's own
/// declaration is merged on top. Guarantees every group carries the full
/// `{is_preference, use_preference, preference_defaults, message_keys}` shape.
fn message_group_fill() -> Value {
    json!({
        "is_preference": true,
        "use_preference": null,
        "preference_defaults": {
            "app_push": true,
            "email": true,
            "sms": null,
            "web_push": null
        },
        "message_keys": []
    })
}

/// Built-in configuration the deployment override document is merged over.
fn config_defaults() -> Value {
    json!({
        "message_groups": [
            {
                "id": "default",
                "label": "News and Updates",
                "description": "General news and updates.",
                "message_keys": ["default"]
            }
        ],
        "backends": {
            "app_push": BACKEND_LOCMEM
        },
        "message_create_fail_silently": true
    })
}

// ---------------------------------------------------------------------------
// Deep merge
// ---------------------------------------------------------------------------

/// Merge two JSON documents recursively.
///
/// Where both sides carry an object at the same key the objects are merged
/// key-by-key; everywhere else (scalars, arrays, mismatched types) the value
/// from `b` wins.
pub fn deep_merge(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Object(a_map), Value::Object(b_map)) => {
            let mut merged = a_map.clone();
            for (key, b_value) in b_map {
                let entry = match a_map.get(key) {
                    Some(a_value) => deep_merge(a_value, b_value),
                    None => b_value.clone(),
                };
                merged.insert(key.clone(), entry);
            }
            Value::Object(merged)
        }
        (_, b_value) => b_value.clone(),
    }
}

// ---------------------------------------------------------------------------
// Typed configuration
// ---------------------------------------------------------------------------

/// A configuration-defined message category.
///
/// Groups organize messages (by `key` membership) and carry the preference
/// defaults that govern which mediums a message in the group fans out to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageGroup {
    pub id: String,

    /// Display label; never persisted per-user, always read from live config.
    #[serde(default)]
    pub label: String,

    /// Display description; same sourcing rule as `label`.
    #[serde(default)]
    pub description: String,

    /// Whether the group is user-overridable (display concern; carried
    /// through but not enforced by the engine).
    pub is_preference: bool,

    /// When set, this group resolves preferences against the named group's
    /// stored override instead of its own id, so both share one record.
    pub use_preference: Option<String>,

    /// Default enabled state per medium. `None` means the medium is not
    /// supported for this group at all.
    pub preference_defaults: BTreeMap<String, Option<bool>>,

    /// Message `key`s that belong to this group.
    pub message_keys: Vec<String>,
}

/// Backend selection per medium.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSelection {
    /// App push backend identifier, one of [`KNOWN_APP_PUSH_BACKENDS`].
    pub app_push: String,
}

/// The resolved, validated inbox configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxConfig {
    /// Message groups in their authoritative display order.
    pub message_groups: Vec<MessageGroup>,

    pub backends: BackendSelection,

    /// When `false`, a synchronous email delivery failure propagates as a
    /// hard error instead of only being recorded on the message log.
    pub message_create_fail_silently: bool,
}

impl InboxConfig {
    /// Resolve a deployment override document over the built-in defaults.
    ///
    /// Every message group is filled with the skeleton shape before its own
    /// declaration is merged on top. Duplicate group ids, dangling
    /// `use_preference` targets, and unknown backend identifiers are
    /// rejected here, at startup, not per call.
    pub fn resolve(overrides: &Value) -> Result<Self, CoreError> {
        let mut merged = deep_merge(&config_defaults(), overrides);

        if let Some(groups) = merged
            .get_mut("message_groups")
            .and_then(Value::as_array_mut)
        {
            for group in groups.iter_mut() {
                *group = deep_merge(&message_group_fill(), group);
            }
        }

        let config: InboxConfig = serde_json::from_value(merged)
            .map_err(|e| CoreError::Validation(format!("Invalid inbox configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), CoreError> {
        let mut seen = std::collections::HashSet::new();
        for group in &self.message_groups {
            if !seen.insert(group.id.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate message group id: {}",
                    group.id
                )));
            }
        }
        for group in &self.message_groups {
            if let Some(target) = &group.use_preference {
                if !seen.contains(target.as_str()) {
                    return Err(CoreError::Validation(format!(
                        "Message group '{}' aliases unknown group '{target}'",
                        group.id
                    )));
                }
            }
        }
        if !KNOWN_APP_PUSH_BACKENDS.contains(&self.backends.app_push.as_str()) {
            return Err(CoreError::Validation(format!(
                "Unknown app push backend: {}",
                self.backends.app_push
            )));
        }
        Ok(())
    }

    /// Look up a group by id.
    pub fn group(&self, id: &str) -> Option<&MessageGroup> {
        self.message_groups.iter().find(|g| g.id == id)
    }

    /// Resolve the group a message `key` belongs to (first group whose
    /// `message_keys` contains the key).
    pub fn group_for_key(&self, key: &str) -> Option<&MessageGroup> {
        self.message_groups
            .iter()
            .find(|g| g.message_keys.iter().any(|k| k == key))
    }
}

// ---------------------------------------------------------------------------
// Process-wide cache
// ---------------------------------------------------------------------------

static CONFIG: RwLock<Option<Arc<InboxConfig>>> = RwLock::new(None);

/// Install a resolved configuration as the process-wide instance.
pub fn install(config: InboxConfig) {
    *CONFIG.write().expect("config lock poisoned") = Some(Arc::new(config));
}

/// Get the process-wide configuration.
///
/// The first call after startup (or after [`reset`]) resolves the built-in
/// defaults with no overrides; deployments that carry overrides are expected
/// to [`install`] their resolved configuration during boot.
pub fn get() -> Arc<InboxConfig> {
    if let Some(config) = CONFIG.read().expect("config lock poisoned").as_ref() {
        return config.clone();
    }
    let config = Arc::new(
        InboxConfig::resolve(&json!({})).expect("built-in configuration defaults must resolve"),
    );
    *CONFIG.write().expect("config lock poisoned") = Some(config.clone());
    config
}

/// Drop the cached configuration so the next [`get`] re-resolves.
///
/// Invalidation hook for runtime configuration changes and for tests.
pub fn reset() {
    *CONFIG.write().expect("config lock poisoned") = None;
}

/// Resolve configuration from the deployment environment.
///
/// `INBOX_CONFIG` holds the override document inline; `INBOX_CONFIG_PATH`
/// points at a JSON file. With neither set, the built-in defaults apply.
pub fn load_from_env() -> Result<InboxConfig, CoreError> {
    let overrides = if let Ok(inline) = std::env::var("INBOX_CONFIG") {
        serde_json::from_str(&inline)
            .map_err(|e| CoreError::Validation(format!("INBOX_CONFIG is not valid JSON: {e}")))?
    } else if let Ok(path) = std::env::var("INBOX_CONFIG_PATH") {
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| CoreError::Validation(format!("Failed to read {path}: {e}")))?;
        serde_json::from_str(&contents)
            .map_err(|e| CoreError::Validation(format!("{path} is not valid JSON: {e}")))?
    } else {
        json!({})
    };

    InboxConfig::resolve(&overrides)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mediums::{MEDIUM_APP_PUSH, MEDIUM_EMAIL, MEDIUM_SMS, MEDIUM_WEB_PUSH};

    // -- deep_merge ----------------------------------------------------------

    #[test]
    fn deep_merge_nested_objects() {
        let a = json!({"x": {"a": 1, "b": 2}, "y": 1});
        let b = json!({"x": {"b": 3, "c": 4}});
        let merged = deep_merge(&a, &b);
        assert_eq!(merged, json!({"x": {"a": 1, "b": 3, "c": 4}, "y": 1}));
    }

    #[test]
    fn deep_merge_override_wins_on_scalars() {
        let merged = deep_merge(&json!({"k": 1}), &json!({"k": 2}));
        assert_eq!(merged["k"], 2);
    }

    #[test]
    fn deep_merge_arrays_are_replaced_not_merged() {
        let merged = deep_merge(&json!({"k": [1, 2]}), &json!({"k": [3]}));
        assert_eq!(merged["k"], json!([3]));
    }

    #[test]
    fn deep_merge_type_mismatch_takes_override() {
        let merged = deep_merge(&json!({"k": {"a": 1}}), &json!({"k": 5}));
        assert_eq!(merged["k"], 5);
    }

    // -- resolve -------------------------------------------------------------

    #[test]
    fn defaults_resolve_with_default_group() {
        let config = InboxConfig::resolve(&json!({})).unwrap();
        assert_eq!(config.message_groups.len(), 1);
        assert_eq!(config.message_groups[0].id, "default");
        assert_eq!(config.backends.app_push, BACKEND_LOCMEM);
        assert!(config.message_create_fail_silently);
    }

    #[test]
    fn minimal_group_declaration_gets_full_skeleton() {
        let config = InboxConfig::resolve(&json!({
            "message_groups": [{"id": "friend_requests", "message_keys": ["friend_request"]}]
        }))
        .unwrap();

        let group = config.group("friend_requests").unwrap();
        assert!(group.is_preference);
        assert!(group.use_preference.is_none());
        assert_eq!(group.preference_defaults[MEDIUM_APP_PUSH], Some(true));
        assert_eq!(group.preference_defaults[MEDIUM_EMAIL], Some(true));
        assert_eq!(group.preference_defaults[MEDIUM_SMS], None);
        assert_eq!(group.preference_defaults[MEDIUM_WEB_PUSH], None);
    }

    #[test]
    fn group_overrides_merge_over_skeleton() {
        let config = InboxConfig::resolve(&json!({
            "message_groups": [{
                "id": "account_updated",
                "message_keys": ["account_updated"],
                "preference_defaults": {"email": false}
            }]
        }))
        .unwrap();

        let group = config.group("account_updated").unwrap();
        // Overridden medium changes, skeleton mediums survive.
        assert_eq!(group.preference_defaults[MEDIUM_EMAIL], Some(false));
        assert_eq!(group.preference_defaults[MEDIUM_APP_PUSH], Some(true));
        assert_eq!(group.preference_defaults[MEDIUM_SMS], None);
    }

    #[test]
    fn declared_groups_replace_default_group_list() {
        let config = InboxConfig::resolve(&json!({
            "message_groups": [{"id": "only_one", "message_keys": ["k"]}]
        }))
        .unwrap();
        assert_eq!(config.message_groups.len(), 1);
        assert!(config.group("default").is_none());
    }

    #[test]
    fn duplicate_group_id_rejected() {
        let result = InboxConfig::resolve(&json!({
            "message_groups": [{"id": "dup"}, {"id": "dup"}]
        }));
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn dangling_use_preference_rejected() {
        let result = InboxConfig::resolve(&json!({
            "message_groups": [{"id": "a", "use_preference": "missing"}]
        }));
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn unknown_backend_rejected_at_resolve_time() {
        let result = InboxConfig::resolve(&json!({
            "backends": {"app_push": "carrier_pigeon"}
        }));
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn group_for_key_membership_lookup() {
        let config = InboxConfig::resolve(&json!({
            "message_groups": [
                {"id": "a", "message_keys": ["x", "y"]},
                {"id": "b", "message_keys": ["z"]}
            ]
        }))
        .unwrap();
        assert_eq!(config.group_for_key("y").unwrap().id, "a");
        assert_eq!(config.group_for_key("z").unwrap().id, "b");
        assert!(config.group_for_key("nope").is_none());
    }

    // -- process-wide cache --------------------------------------------------

    #[test]
    fn install_get_reset_cycle() {
        let custom = InboxConfig::resolve(&json!({
            "message_groups": [{"id": "installed", "message_keys": ["installed"]}]
        }))
        .unwrap();

        install(custom);
        assert!(get().group("installed").is_some());

        reset();
        // After reset the next get() falls back to built-in defaults.
        assert!(get().group("default").is_some());
        reset();
    }
}
