use serde_json::Value;
use tracing::debug;

use super::loose::loose_int;
use super::normalize::{LEGACY_LIST_KEY, LIST_KEY};

/// Entries of a manifest in either shape, legacy `components` first
fn entries(manifest: &Value) -> Option<&Vec<Value>> {
    let data = manifest.get("data")?;
    data.get(LEGACY_LIST_KEY)
        .or_else(|| data.get(LIST_KEY))
        .and_then(Value::as_array)
}

/// Find the component whose `id` equals `id` once both sides are read as integers
pub fn find_component(manifest: &Value, id: i64) -> Option<&Value> {
    entries(manifest)?.iter().find(|component| {
        let Some(raw) = component.get("id") else {
            return false;
        };
        let matched = loose_int(raw) == Some(id);
        if matched && raw.is_string() {
            debug!(id, "Component matched on a string id");
        }
        matched
    })
}

/// Search manifests in order and stop at the first one holding `id`.
///
/// Absent manifests (failed or malformed fetches) are skipped.
pub fn first_match(manifests: &[Option<Value>], id: i64) -> Option<&Value> {
    manifests
        .iter()
        .flatten()
        .find_map(|manifest| find_component(manifest, id))
}
