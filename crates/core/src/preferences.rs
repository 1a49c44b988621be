//! The layered, per-user message preference model.
//!
//! A user's stored preferences are a sparse, ordered sequence of override
//! records — each carries a group id and only the mediums the user
//! explicitly set. Reads reconcile that storage against the *current live
//! configuration* in two passes: the configuration's group list defines the
//! output order and membership (always), and stored overrides are overlaid
//! by id. Stored order and stored group metadata are never trusted.
//!
//! Overrides for groups that are no longer configured are preserved in
//! storage but excluded from output, so a group that is later re-added
//! returns the user's original choice rather than a fresh default.

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{InboxConfig, MessageGroup};
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A sparse stored override: the group id plus only the mediums the user
/// explicitly set. This is the persistence shape; `label`/`description` are
/// deliberately absent (live configuration owns them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGroup {
    pub id: String,

    /// Explicitly-set mediums only; serialized inline next to `id`.
    #[serde(flatten)]
    pub mediums: BTreeMap<String, bool>,
}

/// One resolved entry of the effective preference list, as surfaced to
/// callers: configuration metadata plus the merged per-medium values.
/// `Some(bool)` is an enabled/disabled state, `None` means the medium is not
/// supported for this group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveGroup {
    pub id: String,
    pub label: String,
    pub description: String,

    #[serde(flatten)]
    pub mediums: BTreeMap<String, Option<bool>>,
}

/// The stored record a group reads and writes: its own id, unless it aliases
/// another group via `use_preference`.
fn storage_id(group: &MessageGroup) -> &str {
    group.use_preference.as_deref().unwrap_or(&group.id)
}

// ---------------------------------------------------------------------------
// Read path
// ---------------------------------------------------------------------------

/// Resolve the effective preference list for a user.
///
/// Iterates the live configuration's groups in their defined order; for each
/// group, merges the stored override (looked up by id, honoring
/// `use_preference` aliasing) over the group's `preference_defaults`. Groups
/// absent from configuration never appear in the output, stored or not.
pub fn effective_groups(config: &InboxConfig, stored: &[StoredGroup]) -> Vec<EffectiveGroup> {
    let by_id: HashMap<&str, &StoredGroup> =
        stored.iter().map(|g| (g.id.as_str(), g)).collect();

    config
        .message_groups
        .iter()
        .map(|group| {
            let override_ = by_id.get(storage_id(group)).copied();
            let mediums = group
                .preference_defaults
                .iter()
                .map(|(medium, default)| {
                    let value = match override_.and_then(|o| o.mediums.get(medium)) {
                        Some(explicit) => Some(*explicit),
                        None => *default,
                    };
                    (medium.clone(), value)
                })
                .collect();

            EffectiveGroup {
                id: group.id.clone(),
                label: group.label.clone(),
                description: group.description.clone(),
                mediums,
            }
        })
        .collect()
}

/// Resolve a single effective value for (group, medium).
///
/// Fails with a validation error on an unknown group id or a medium not
/// present in that group's defaults.
pub fn effective_value(
    config: &InboxConfig,
    stored: &[StoredGroup],
    group_id: &str,
    medium: &str,
) -> Result<Option<bool>, CoreError> {
    let group = config
        .group(group_id)
        .ok_or_else(|| CoreError::Validation(format!("Unknown message group: {group_id}")))?;
    let default = group.preference_defaults.get(medium).ok_or_else(|| {
        CoreError::Validation(format!("Unknown medium '{medium}' for group '{group_id}'"))
    })?;

    let sid = storage_id(group);
    let explicit = stored
        .iter()
        .find(|g| g.id == sid)
        .and_then(|g| g.mediums.get(medium).copied());
    Ok(explicit.map(Some).unwrap_or(*default))
}

// ---------------------------------------------------------------------------
// Write path
// ---------------------------------------------------------------------------

/// Apply a bulk preference update to the stored override sequence.
///
/// Each incoming entry is a JSON object carrying an `id` and per-medium
/// booleans. Entries whose id is not currently configured are ignored
/// outright (no error), and medium keys that do not exist in the target
/// group's defaults are dropped. Supplied mediums overwrite the stored
/// value; stored mediums not re-supplied are left untouched, as are stored
/// groups the payload never mentions — including overrides for groups that
/// are no longer configured.
pub fn apply_groups_update(config: &InboxConfig, stored: &mut Vec<StoredGroup>, incoming: &[Value]) {
    for entry in incoming {
        let Some(obj) = entry.as_object() else { continue };
        let Some(id) = obj.get("id").and_then(Value::as_str) else {
            continue;
        };
        let Some(group) = config.group(id) else {
            // Unknown group ids fail silently in bulk mode.
            continue;
        };

        let filtered: Vec<(String, bool)> = obj
            .iter()
            .filter(|(key, _)| group.preference_defaults.contains_key(key.as_str()))
            .filter_map(|(key, value)| value.as_bool().map(|b| (key.clone(), b)))
            .collect();
        if filtered.is_empty() {
            continue;
        }

        let sid = storage_id(group);
        match stored.iter_mut().find(|g| g.id == sid) {
            Some(existing) => existing.mediums.extend(filtered),
            None => stored.push(StoredGroup {
                id: sid.to_string(),
                mediums: filtered.into_iter().collect(),
            }),
        }
    }
}

/// Apply a targeted single (group, medium) update.
///
/// Unlike bulk mode this path *errors* on an unknown group id or medium —
/// a targeted request naming something that does not exist is a client
/// mistake, not noise to drop.
pub fn apply_single_update(
    config: &InboxConfig,
    stored: &mut Vec<StoredGroup>,
    group_id: &str,
    medium: &str,
    value: bool,
) -> Result<(), CoreError> {
    let group = config
        .group(group_id)
        .ok_or_else(|| CoreError::Validation(format!("Unknown message group: {group_id}")))?;
    if !group.preference_defaults.contains_key(medium) {
        return Err(CoreError::Validation(format!(
            "Unknown medium '{medium}' for group '{group_id}'"
        )));
    }

    let sid = storage_id(group);
    match stored.iter_mut().find(|g| g.id == sid) {
        Some(existing) => {
            existing.mediums.insert(medium.to_string(), value);
        }
        None => stored.push(StoredGroup {
            id: sid.to_string(),
            mediums: BTreeMap::from([(medium.to_string(), value)]),
        }),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
