pub mod types;

use serde_json::Value;
use types::Frontmatter;

const DELIMITER: &str = "---";

pub struct FrontmatterParser;

impl FrontmatterParser {
    /// Split a markdown file into its raw frontmatter YAML and body.
    ///
    /// The opening `---` must be the very first line. Without a closing `---` line the
    /// whole content is treated as body.
    pub fn split(content: &str) -> (Option<&str>, &str) {
        let mut lines = content.split_inclusive('\n');

        let first = match lines.next() {
            Some(line) => line,
            None => return (None, content),
        };
        if !is_delimiter(first) {
            return (None, content);
        }

        let yaml_start = first.len();
        let mut offset = yaml_start;
        for line in lines {
            if is_delimiter(line) {
                let yaml = &content[yaml_start..offset];
                let body = &content[offset + line.len()..];
                return (Some(yaml), body);
            }
            offset += line.len();
        }

        (None, content)
    }

    /// Extract the frontmatter mapping of a note.
    ///
    /// Returns `None` when the note has no delimited block or when the block does not
    /// decode to a mapping. An empty block yields an empty mapping.
    pub fn extract(content: &str) -> Option<Frontmatter> {
        let (yaml, _) = Self::split(content);
        match Self::parse_yaml(yaml?) {
            Ok(frontmatter) => Some(frontmatter),
            Err(e) => {
                log::warn!("Ignoring frontmatter: {}", e);
                None
            }
        }
    }

    /// Parse a frontmatter YAML string into a mapping
    pub fn parse_yaml(yaml_str: &str) -> Result<Frontmatter, String> {
        if yaml_str.trim().is_empty() {
            return Ok(Frontmatter::new());
        }

        let value: Value = serde_yaml::from_str(yaml_str)
            .map_err(|e| format!("Failed to parse YAML: {}", e))?;

        match value {
            Value::Object(map) => Ok(map),
            // A block holding only comments
            Value::Null => Ok(Frontmatter::new()),
            other => Err(format!("Frontmatter is not a mapping: {}", other)),
        }
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}
