use serde_json::{Map, Value};

/// Decoded frontmatter block (YAML decoded into JSON-capable values).
pub type Frontmatter = Map<String, Value>;

/// Stringify a scalar frontmatter value the way it reads in YAML.
/// `null`, sequences and mappings have no scalar form.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read a display field such as `title` or `author`.
///
/// Strings, numbers and bools are used as-is; a list of scalars is joined with `", "`
/// (multi-author books). Blank results count as absent.
pub fn display_field(frontmatter: &Frontmatter, key: &str) -> Option<String> {
    let value = frontmatter.get(key)?;

    let text = match value {
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(scalar_to_string)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            parts.join(", ")
        }
        other => scalar_to_string(other)?.trim().to_string(),
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
