use regex::Regex;

const TITLE_PLACEHOLDER: &str = "{{title}}";
const AUTHOR_PLACEHOLDER: &str = "{{author}}";
const NOTE_EXTENSIONS: [&str; 3] = [".md", ".markdown", ".txt"];

/// Title and author recovered from a note's filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    pub title: String,
    pub author: Option<String>,
}

impl ParsedFilename {
    fn title_only(title: &str) -> Self {
        Self {
            title: title.to_string(),
            author: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Title,
    Author,
}

/// Strip a `.md`, `.markdown` or `.txt` extension (any case)
pub fn strip_note_extension(file_name: &str) -> &str {
    let lower = file_name.to_ascii_lowercase();
    for ext in NOTE_EXTENSIONS {
        if lower.ends_with(ext) && file_name.len() > ext.len() {
            return &file_name[..file_name.len() - ext.len()];
        }
    }
    file_name
}

/// Parse a filename such as `Dune by Frank Herbert.md` against a template like
/// `{{title}} by {{author}}`.
///
/// Falls back to the whole base name as the title when the template does not match.
pub fn parse_filename(file_name: &str, format: &str) -> ParsedFilename {
    let base = strip_note_extension(file_name);

    let (pattern, order) = build_pattern(format);
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            log::debug!("Invalid filename format {:?}: {}", format, e);
            return ParsedFilename::title_only(base);
        }
    };

    let caps = match re.captures(base) {
        Some(caps) => caps,
        None => {
            log::debug!("Filename {:?} does not match format {:?}", base, format);
            return ParsedFilename::title_only(base);
        }
    };

    let mut title = None;
    let mut author = None;
    for (i, placeholder) in order.iter().enumerate() {
        let value = caps.get(i + 1).map(|m| m.as_str().trim().to_string());
        match placeholder {
            Placeholder::Title => title = value,
            Placeholder::Author => author = value,
        }
    }

    ParsedFilename {
        title: title.filter(|t| !t.is_empty()).unwrap_or_else(|| base.to_string()),
        author: author.filter(|a| !a.is_empty()),
    }
}

/// Escape the literal parts of the template and turn each placeholder into a greedy
/// capture group. Returns the anchored pattern and the placeholders in group order.
fn build_pattern(format: &str) -> (String, Vec<Placeholder>) {
    let mut pattern = String::from("^");
    let mut order = Vec::new();
    let mut rest = format;

    loop {
        let next_title = rest.find(TITLE_PLACEHOLDER).map(|i| (i, Placeholder::Title));
        let next_author = rest.find(AUTHOR_PLACEHOLDER).map(|i| (i, Placeholder::Author));

        let next = match (next_title, next_author) {
            (Some(t), Some(a)) => Some(if t.0 <= a.0 { t } else { a }),
            (t, a) => t.or(a),
        };

        match next {
            Some((idx, placeholder)) => {
                pattern.push_str(&regex::escape(&rest[..idx]));
                pattern.push_str("(.+)");
                order.push(placeholder);
                let len = match placeholder {
                    Placeholder::Title => TITLE_PLACEHOLDER.len(),
                    Placeholder::Author => AUTHOR_PLACEHOLDER.len(),
                };
                rest = &rest[idx + len..];
            }
            None => {
                pattern.push_str(&regex::escape(rest));
                break;
            }
        }
    }

    pattern.push('$');
    (pattern, order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_by_author() {
        let parsed = parse_filename("Dune by Frank Herbert.md", "{{title}} by {{author}}");
        assert_eq!(parsed.title, "Dune");
        assert_eq!(parsed.author.as_deref(), Some("Frank Herbert"));
    }

    #[test]
    fn test_author_first_template() {
        let parsed = parse_filename("Frank Herbert - Dune.md", "{{author}} - {{title}}");
        assert_eq!(parsed.title, "Dune");
        assert_eq!(parsed.author.as_deref(), Some("Frank Herbert"));
    }

    #[test]
    fn test_title_only_template() {
        let parsed = parse_filename("Notes.md", "{{title}}");
        assert_eq!(parsed.title, "Notes");
        assert_eq!(parsed.author, None);
    }

    #[test]
    fn test_author_only_template_assigns_author() {
        let parsed = parse_filename("Ursula K. Le Guin.md", "{{author}}");
        assert_eq!(parsed.author.as_deref(), Some("Ursula K. Le Guin"));
        assert_eq!(parsed.title, "Ursula K. Le Guin");
    }

    #[test]
    fn test_non_matching_falls_back_to_base_name() {
        let parsed = parse_filename("Reading List.md", "{{title}} by {{author}}");
        assert_eq!(parsed.title, "Reading List");
        assert_eq!(parsed.author, None);
    }

    #[test]
    fn test_metacharacters_in_template_are_literal() {
        let parsed = parse_filename("(Dune) [Frank Herbert].md", "({{title}}) [{{author}}]");
        assert_eq!(parsed.title, "Dune");
        assert_eq!(parsed.author.as_deref(), Some("Frank Herbert"));

        // `.` must not act as a wildcard
        let parsed = parse_filename("Dune x Frank Herbert.md", "{{title}}.{{author}}");
        assert_eq!(parsed.title, "Dune x Frank Herbert");
        assert_eq!(parsed.author, None);
    }

    #[test]
    fn test_strip_note_extension_case_insensitive() {
        assert_eq!(strip_note_extension("Dune.md"), "Dune");
        assert_eq!(strip_note_extension("Dune.MD"), "Dune");
        assert_eq!(strip_note_extension("Dune.Markdown"), "Dune");
        assert_eq!(strip_note_extension("Dune.txt"), "Dune");
        assert_eq!(strip_note_extension("Dune.pdf"), "Dune.pdf");
        assert_eq!(strip_note_extension(".md"), ".md");
    }

    #[test]
    fn test_greedy_capture_with_repeated_separator() {
        // Greedy title group takes everything up to the last separator
        let parsed = parse_filename("Stand by Me by Stephen King.md", "{{title}} by {{author}}");
        assert_eq!(parsed.title, "Stand by Me");
        assert_eq!(parsed.author.as_deref(), Some("Stephen King"));
    }
}
