pub mod extractor;
pub mod filename;
pub mod filter;
pub mod sampler;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::frontmatter::types::Frontmatter;
use crate::frontmatter::FrontmatterParser;
use crate::vault::DocumentSource;

pub use extractor::extract_highlights;
pub use filter::{matches_filter, NoteFilter};

/// One quoted passage from a book note, with its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub book_title: String,
    pub author: Option<String>,
    pub date: String,
    pub page: String,
    pub location: String,
    pub text: String,
    pub comment: String,
    /// Vault-relative path of the note, used for navigation
    pub source_file: String,
}

/// Scan the vault and gather highlights from every note that passes the filter.
///
/// Notes are visited in listing order and scanning stops once `max_highlights` (if non-zero)
/// is reached. A note that cannot be read is logged and skipped; only a failure to list the
/// vault fails the pass.
pub fn collect_highlights(
    source: &dyn DocumentSource,
    settings: &Settings,
) -> Result<Vec<Highlight>, String> {
    let documents = source.list_documents(settings.folder_prefix())?;
    let filter = settings.note_filter();
    let cap = settings.max_highlights;

    let mut pool: Vec<Highlight> = Vec::new();
    let mut matched_notes = 0usize;

    for path in &documents {
        let content = match source.read_document(path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Skipping {}: {}", path, e);
                continue;
            }
        };

        let frontmatter = match FrontmatterParser::extract(&content) {
            Some(fm) => fm,
            None if filter.is_active() => continue,
            None => Frontmatter::new(),
        };

        if !matches_filter(&frontmatter, &filter) {
            continue;
        }
        matched_notes += 1;

        let found = extract_highlights(&content, path, &frontmatter, &settings.filename_format);
        if found.is_empty() {
            log::debug!("No highlights in {}", path);
            continue;
        }
        pool.extend(found);

        if cap > 0 && pool.len() >= cap {
            pool.truncate(cap);
            log::debug!("Highlight cap of {} reached at {}", cap, path);
            break;
        }
    }

    log::info!(
        "Collected {} highlights from {} of {} notes",
        pool.len(),
        matched_notes,
        documents.len()
    );

    Ok(pool)
}
