use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chatfix_types::IndexEntry;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};

/// Scheme marking a chat-session resource in the auxiliary caches. Entries
/// with other schemes belong to other providers and round-trip untouched.
pub const RESOURCE_SCHEME: &str = "chat-session://";
const LOCAL_RESOURCE_PREFIX: &str = "chat-session://local/";

/// Resource identifier the host expects for a local session: the session id,
/// base64url-encoded without padding so it is safe in a URI path segment.
pub fn resource_for(session_id: &str) -> String {
    format!(
        "{}{}",
        LOCAL_RESOURCE_PREFIX,
        URL_SAFE_NO_PAD.encode(session_id.as_bytes())
    )
}

/// All chat-session resources present in a cache list.
pub fn chat_session_resources(cache: &[Value]) -> BTreeSet<String> {
    cache
        .iter()
        .filter_map(|item| item.get("resource").and_then(Value::as_str))
        .filter(|r| r.starts_with(RESOURCE_SCHEME))
        .map(str::to_string)
        .collect()
}

/// Add cache entries for index entries that have none yet. Returns the
/// number of sessions added to the resource-list cache.
///
/// Empty sessions are never added: the host discards them from these caches
/// on load, and adding them makes the visible session count jump then fall.
pub fn add_missing_entries(
    model_cache: &mut Vec<Value>,
    state_cache: &mut Vec<Value>,
    entries: &BTreeMap<String, IndexEntry>,
) -> usize {
    let model_have = chat_session_resources(model_cache);
    let state_have = chat_session_resources(state_cache);

    let mut added = 0;
    for (session_id, entry) in entries {
        if entry.is_empty {
            continue;
        }
        let resource = resource_for(session_id);

        if !model_have.contains(&resource) {
            model_cache.push(json!({
                "providerType": "local",
                "providerLabel": "Local",
                "resource": resource,
                "icon": "vm",
                "label": entry.title,
                "status": 1,
                "timing": { "created": entry.last_message_date },
            }));
            added += 1;
        }

        if !state_have.contains(&resource) {
            state_cache.push(json!({
                "resource": resource,
                "archived": false,
                "read": entry.last_message_date,
            }));
        }
    }

    added
}

/// Fold donor cache items into the active cache, keyed by resource.
///
/// Missing keys are appended; for keys present on both sides the donor item
/// wins only when both carry an embedded timestamp and the donor's is
/// strictly newer. Items without a resource key cannot be deduplicated and
/// are left out. Returns the number of items appended or replaced.
pub fn merge_keyed_lww(active: &mut Vec<Value>, donor: &[Value]) -> usize {
    let mut changed = 0;
    for item in donor {
        let Some(key) = item.get("resource").and_then(Value::as_str) else {
            continue;
        };

        let existing = active
            .iter_mut()
            .find(|a| a.get("resource").and_then(Value::as_str) == Some(key));

        match existing {
            None => {
                active.push(item.clone());
                changed += 1;
            }
            Some(existing) => {
                if let (Some(donor_ts), Some(active_ts)) =
                    (embedded_timestamp(item), embedded_timestamp(existing))
                    && donor_ts > active_ts
                {
                    *existing = item.clone();
                    changed += 1;
                }
            }
        }
    }
    changed
}

/// Probe the timestamp fields the host is known to embed in cache items.
fn embedded_timestamp(item: &Value) -> Option<i64> {
    const CANDIDATES: &[&str] = &[
        "/read",
        "/timestamp",
        "/timing/lastRequestEnded",
        "/timing/created",
        "/lastMessageDate",
    ];
    CANDIDATES
        .iter()
        .find_map(|pointer| item.pointer(pointer).and_then(Value::as_i64))
}
