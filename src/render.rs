use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Mutex;

use crate::highlights::Highlight;

const META_SEPARATOR: &str = " • ";

/// Which parts of a highlight the view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    pub show_title: bool,
    pub show_author: bool,
    pub show_comments: bool,
    pub show_metadata: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_title: true,
            show_author: true,
            show_comments: true,
            show_metadata: true,
        }
    }
}

/// A highlight reduced to the pieces a view should draw. Hidden or empty parts are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedHighlight {
    pub title: Option<String>,
    /// Note to open when the title is clicked
    pub link_target: Option<String>,
    pub author: Option<String>,
    pub body: String,
    pub comment: Option<String>,
    pub metadata: Option<String>,
}

/// Receives the output of each refresh pass
pub trait DisplaySurface: Send + Sync {
    fn show_highlights(&self, highlights: &[Highlight], options: &DisplayOptions);
    fn show_error(&self, message: &str);
}

pub fn render_highlight(highlight: &Highlight, options: &DisplayOptions) -> RenderedHighlight {
    let title = Some(highlight.book_title.clone()).filter(|t| options.show_title && !t.is_empty());
    let link_target = if title.is_some() && !highlight.source_file.is_empty() {
        Some(highlight.source_file.clone())
    } else {
        None
    };

    RenderedHighlight {
        title,
        link_target,
        author: highlight
            .author
            .clone()
            .filter(|a| options.show_author && !a.is_empty()),
        body: highlight.text.clone(),
        comment: Some(highlight.comment.clone())
            .filter(|c| options.show_comments && !c.is_empty()),
        metadata: if options.show_metadata {
            metadata_line(highlight)
        } else {
            None
        },
    }
}

/// `Page 42 • Location 1804 • 2023-01-01`
pub fn metadata_line(highlight: &Highlight) -> Option<String> {
    let mut parts = Vec::new();
    if !highlight.page.is_empty() {
        parts.push(format!("Page {}", highlight.page));
    }
    if !highlight.location.is_empty() {
        parts.push(format!("Location {}", highlight.location));
    }
    if !highlight.date.is_empty() {
        parts.push(highlight.date.clone());
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(META_SEPARATOR))
    }
}

/// Plain-text surface, e.g. over stdout
pub struct TextSurface<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> TextSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_highlights(
        out: &mut W,
        highlights: &[Highlight],
        options: &DisplayOptions,
    ) -> std::io::Result<()> {
        if highlights.is_empty() {
            writeln!(out, "No highlights found.")?;
        }
        for (i, highlight) in highlights.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            Self::write_block(out, &render_highlight(highlight, options))?;
        }
        out.flush()
    }

    fn write_block(out: &mut W, rendered: &RenderedHighlight) -> std::io::Result<()> {
        match (&rendered.title, &rendered.link_target) {
            (Some(title), Some(target)) => writeln!(out, "{} ({})", title, target)?,
            (Some(title), None) => writeln!(out, "{}", title)?,
            _ => {}
        }
        if let Some(author) = &rendered.author {
            writeln!(out, "by {}", author)?;
        }
        for line in rendered.body.lines() {
            writeln!(out, "> {}", line)?;
        }
        if let Some(comment) = &rendered.comment {
            writeln!(out, "Comment: {}", comment)?;
        }
        if let Some(metadata) = &rendered.metadata {
            writeln!(out, "{}", metadata)?;
        }
        Ok(())
    }
}

impl<W: Write + Send> DisplaySurface for TextSurface<W> {
    fn show_highlights(&self, highlights: &[Highlight], options: &DisplayOptions) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = Self::write_highlights(&mut out, highlights, options) {
            log::warn!("Failed to write highlights: {}", e);
        }
    }

    fn show_error(&self, message: &str) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(out, "Error loading highlights: {}", message) {
            log::warn!("Failed to write error: {}", e);
        }
    }
}
