use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use super::filename::parse_filename;
use super::Highlight;
use crate::frontmatter::types::{display_field, Frontmatter};

pub const UNKNOWN_BOOK: &str = "Unknown Book";

/// Callout introducer: `> [!quote]`, `> [!note]-`, ... (any tag)
static INTRODUCER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*>\s*\[![^\]]*\][+-]?").unwrap());

/// One leading block-quote marker
static QUOTE_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*> ?").unwrap());

static REF_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\^ref-\d+\s*$").unwrap());

const LINK_PREFIX: &str = "Link: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Date,
    Page,
    Location,
    Comment,
}

struct FieldRule {
    field: Field,
    pattern: Regex,
}

/// Sub-field rules in precedence order. Each match is cut out of the working text
/// before the next rule runs.
static FIELD_RULES: Lazy<Vec<FieldRule>> = Lazy::new(|| {
    vec![
        FieldRule {
            field: Field::Date,
            pattern: Regex::new(r"Highlighted:[ \t]*([^\r\n]*)").unwrap(),
        },
        FieldRule {
            field: Field::Page,
            pattern: Regex::new(r"\bPage(?: Number)?:[ \t]*(\d+)\b").unwrap(),
        },
        FieldRule {
            field: Field::Location,
            pattern: Regex::new(r"\bLocation:[ \t]*(\d+)\b").unwrap(),
        },
        FieldRule {
            field: Field::Comment,
            // Runs until the next `Word:` line; the terminator itself is left in place
            pattern: Regex::new(r"(?s)My Comments:[ \t]*(.*?)(?:\n[ \t]*\w+:|\z)").unwrap(),
        },
    ]
});

#[derive(Debug, Default)]
struct BlockFields {
    date: String,
    page: String,
    location: String,
    comment: String,
    text: String,
}

impl BlockFields {
    fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Date => self.date = value,
            Field::Page => self.page = value,
            Field::Location => self.location = value,
            Field::Comment => self.comment = value,
        }
    }
}

/// Extract every highlight callout from a note, in document order.
///
/// `source_file` is the vault-relative path; its file name feeds the filename template
/// when the frontmatter carries no title or author.
pub fn extract_highlights(
    content: &str,
    source_file: &str,
    frontmatter: &Frontmatter,
    filename_format: &str,
) -> Vec<Highlight> {
    let blocks = find_blocks(content);
    if blocks.is_empty() {
        return Vec::new();
    }

    let file_name = Path::new(source_file)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let parsed = parse_filename(&file_name, filename_format);

    let book_title = display_field(frontmatter, "title")
        .or_else(|| Some(parsed.title.clone()).filter(|t| !t.trim().is_empty()))
        .unwrap_or_else(|| UNKNOWN_BOOK.to_string());
    let author = display_field(frontmatter, "author").or(parsed.author);

    blocks
        .iter()
        .filter_map(|block| parse_block(block))
        .map(|fields| Highlight {
            book_title: book_title.clone(),
            author: author.clone(),
            date: fields.date,
            page: fields.page,
            location: fields.location,
            text: fields.text,
            comment: fields.comment,
            source_file: source_file.to_string(),
        })
        .collect()
}

/// Split the note into callout blocks with their quote markers already stripped.
///
/// A block ends at a blank line, the next introducer, or end of text.
fn find_blocks(content: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in content.lines() {
        if let Some(m) = INTRODUCER_RE.find(line) {
            if let Some(lines) = current.take() {
                blocks.push(lines.join("\n"));
            }
            current = Some(vec![line[m.end()..].trim_start()]);
            continue;
        }

        if line.trim().is_empty() {
            if let Some(lines) = current.take() {
                blocks.push(lines.join("\n"));
            }
            continue;
        }

        if let Some(lines) = current.as_mut() {
            let stripped = match QUOTE_MARKER_RE.find(line) {
                Some(m) => &line[m.end()..],
                None => line,
            };
            lines.push(stripped);
        }
    }

    if let Some(lines) = current.take() {
        blocks.push(lines.join("\n"));
    }

    blocks
}

/// Fold the field rules over a block. `None` when nothing but metadata is left.
fn parse_block(block: &str) -> Option<BlockFields> {
    let mut fields = BlockFields::default();
    let mut working = block.to_string();

    for rule in FIELD_RULES.iter() {
        let Some(caps) = rule.pattern.captures(&working) else {
            continue;
        };
        let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let span = whole.start()..value.end();
        fields.set(rule.field, value.as_str().trim().to_string());
        working.replace_range(span, "");
    }

    let remaining = working
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let remaining = remaining.strip_prefix(LINK_PREFIX).unwrap_or(&remaining);
    let text = REF_SUFFIX_RE.replace(remaining, "").trim().to_string();

    if text.is_empty() {
        return None;
    }

    fields.text = text;
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_frontmatter() -> Frontmatter {
        Frontmatter::new()
    }

    // =========================================================================
    // Block scanning
    // =========================================================================

    #[test]
    fn test_full_block_fields() {
        let content = "\
> [!quote] Link: Some text ^ref-1234
> Highlighted: 2023-01-01
> Page: 42
> My Comments: great quote
";
        let highlights = extract_highlights(content, "Dune.md", &no_frontmatter(), "{{title}}");
        assert_eq!(highlights.len(), 1);

        let h = &highlights[0];
        assert_eq!(h.date, "2023-01-01");
        assert_eq!(h.page, "42");
        assert_eq!(h.location, "");
        assert_eq!(h.comment, "great quote");
        assert_eq!(h.text, "Some text");
        assert_eq!(h.source_file, "Dune.md");
    }

    #[test]
    fn test_metadata_before_text() {
        let content = "\
> [!quote]
> Highlighted: March 3, 2024
> Page Number: 118
> Location: 1804
> He who controls the spice controls the universe.
";
        let highlights = extract_highlights(content, "Dune.md", &no_frontmatter(), "{{title}}");
        assert_eq!(highlights.len(), 1);
        let h = &highlights[0];
        assert_eq!(h.date, "March 3, 2024");
        assert_eq!(h.page, "118");
        assert_eq!(h.location, "1804");
        assert_eq!(h.text, "He who controls the spice controls the universe.");
        assert_eq!(h.comment, "");
    }

    #[test]
    fn test_multiple_blocks_in_document_order() {
        let content = "\
# Dune

> [!quote] First passage
> Page: 1

Some prose between callouts.

> [!note] Second passage
> [!quote] Third passage
> Location: 33
";
        let highlights = extract_highlights(content, "Dune.md", &no_frontmatter(), "{{title}}");
        let texts: Vec<&str> = highlights.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["First passage", "Second passage", "Third passage"]);
        assert_eq!(highlights[0].page, "1");
        assert_eq!(highlights[2].location, "33");
    }

    #[test]
    fn test_block_with_only_metadata_is_discarded() {
        let content = "\
> [!quote]
> Highlighted: 2023-01-01
> Page: 42
> My Comments: nothing quoted here
";
        let highlights = extract_highlights(content, "Dune.md", &no_frontmatter(), "{{title}}");
        assert!(highlights.is_empty());
    }

    #[test]
    fn test_link_and_ref_only_is_discarded() {
        let content = "> [!quote] Link: ^ref-99\n";
        let highlights = extract_highlights(content, "Dune.md", &no_frontmatter(), "{{title}}");
        assert!(highlights.is_empty());
    }

    #[test]
    fn test_block_ends_at_blank_line() {
        let content = "\
> [!quote] Inside the callout

Outside the callout.
";
        let highlights = extract_highlights(content, "Dune.md", &no_frontmatter(), "{{title}}");
        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].text, "Inside the callout");
    }

    #[test]
    fn test_plain_blockquote_is_not_a_block() {
        let content = "> Just a quote without a tag\n";
        let highlights = extract_highlights(content, "Dune.md", &no_frontmatter(), "{{title}}");
        assert!(highlights.is_empty());
    }

    #[test]
    fn test_no_blocks() {
        let highlights =
            extract_highlights("Nothing to see.", "Dune.md", &no_frontmatter(), "{{title}}");
        assert!(highlights.is_empty());
    }

    // =========================================================================
    // Field rules
    // =========================================================================

    #[test]
    fn test_non_numeric_page_stays_in_text() {
        let content = "> [!quote] A passage\n> Page: forty-two\n";
        let highlights = extract_highlights(content, "Dune.md", &no_frontmatter(), "{{title}}");
        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].page, "");
        assert_eq!(highlights[0].text, "A passage\nPage: forty-two");
    }

    #[test]
    fn test_comment_stops_at_next_label() {
        let content = "\
> [!quote] The passage
> My Comments: first line
> continues here
> Location: 77
";
        let highlights = extract_highlights(content, "Dune.md", &no_frontmatter(), "{{title}}");
        assert_eq!(highlights.len(), 1);
        let h = &highlights[0];
        assert_eq!(h.location, "77");
        assert_eq!(h.comment, "first line\ncontinues here");
        assert_eq!(h.text, "The passage");
    }

    #[test]
    fn test_comment_is_removed_from_text() {
        let content = "\
> [!quote] The passage
> My Comments: my thoughts
";
        let highlights = extract_highlights(content, "Dune.md", &no_frontmatter(), "{{title}}");
        assert_eq!(highlights[0].text, "The passage");
        assert_eq!(highlights[0].comment, "my thoughts");
    }

    #[test]
    fn test_date_rule_takes_precedence_over_page() {
        // Date consumes the rest of its line before the page rule runs
        let content = "> [!quote] Text\n> Highlighted: 2023-01-01 Page: 9\n";
        let highlights = extract_highlights(content, "Dune.md", &no_frontmatter(), "{{title}}");
        assert_eq!(highlights[0].date, "2023-01-01 Page: 9");
        assert_eq!(highlights[0].page, "");
    }

    // =========================================================================
    // Title / author resolution
    // =========================================================================

    #[test]
    fn test_frontmatter_title_and_author_win() {
        let fm = json!({ "title": "Dune", "author": "Frank Herbert" })
            .as_object()
            .cloned()
            .unwrap();
        let content = "> [!quote] Text\n";
        let highlights = extract_highlights(
            content,
            "Books/Something else by Someone.md",
            &fm,
            "{{title}} by {{author}}",
        );
        assert_eq!(highlights[0].book_title, "Dune");
        assert_eq!(highlights[0].author.as_deref(), Some("Frank Herbert"));
    }

    #[test]
    fn test_filename_fallback() {
        let content = "> [!quote] Text\n";
        let highlights = extract_highlights(
            content,
            "Books/Dune by Frank Herbert.md",
            &no_frontmatter(),
            "{{title}} by {{author}}",
        );
        assert_eq!(highlights[0].book_title, "Dune");
        assert_eq!(highlights[0].author.as_deref(), Some("Frank Herbert"));
        assert_eq!(highlights[0].source_file, "Books/Dune by Frank Herbert.md");
    }

    #[test]
    fn test_unknown_book_when_no_name() {
        let content = "> [!quote] Text\n";
        let highlights = extract_highlights(content, "", &no_frontmatter(), "{{title}}");
        assert_eq!(highlights[0].book_title, UNKNOWN_BOOK);
        assert_eq!(highlights[0].author, None);
    }
}
