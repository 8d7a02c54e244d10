use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::frontmatter::types::{scalar_to_string, Frontmatter};

/// Which notes count as book notes: `property` in the frontmatter must hold `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFilter {
    pub property: String,
    pub value: String,
}

impl NoteFilter {
    pub fn new(property: &str, value: &str) -> Self {
        Self {
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    /// An empty property or value disables filtering.
    pub fn is_active(&self) -> bool {
        !self.property.trim().is_empty() && !self.value.trim().is_empty()
    }
}

/// Check whether a note's frontmatter satisfies the filter.
///
/// Lists (and strings holding a JSON array) match when any element equals the target.
/// Never fails: unreadable values simply don't match.
pub fn matches_filter(frontmatter: &Frontmatter, filter: &NoteFilter) -> bool {
    if !filter.is_active() {
        return true;
    }

    let property = filter.property.trim();
    let target = filter.value.trim();

    let value = match frontmatter.get(property) {
        Some(v) => v,
        None => return false,
    };

    match value {
        Value::Array(items) => any_element_matches(items, target),
        Value::String(s) => match parse_json_list(s) {
            Some(items) => any_element_matches(&items, target),
            None => s.trim() == target,
        },
        Value::Null | Value::Object(_) => {
            log::debug!("Filter property {:?} holds a non-scalar value, skipping", property);
            false
        }
        other => scalar_to_string(other)
            .map(|s| s.trim() == target)
            .unwrap_or(false),
    }
}

fn any_element_matches(items: &[Value], target: &str) -> bool {
    items
        .iter()
        .filter_map(element_to_string)
        .any(|s| s.trim() == target)
}

/// Elements are compared by their string form; nested lists and maps use their JSON text.
fn element_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
        other => scalar_to_string(other),
    }
}

/// A string property like `"[\"Book Highlights\"]"` written by tools that flatten lists.
fn parse_json_list(s: &str) -> Option<Vec<Value>> {
    let trimmed = s.trim();
    if !trimmed.starts_with('[') {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => Some(items),
        Ok(_) => None,
        Err(e) => {
            log::debug!("Filter value {:?} looks like a list but is not JSON: {}", trimmed, e);
            None
        }
    }
}
