//! Persisted view settings
//!
//! Stored as pretty JSON in `<vault>/.booklights/settings.json`. Every field has a default so
//! older or partial files keep loading.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::highlights::filter::NoteFilter;
use crate::render::DisplayOptions;

fn default_true() -> bool {
    true
}

fn default_max_highlights() -> usize {
    100
}

fn default_random_count() -> usize {
    3
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_filter_property() -> String {
    "subtopic".to_string()
}

fn default_filter_value() -> String {
    "Book Highlights".to_string()
}

fn default_filename_format() -> String {
    "{{title}} by {{author}}".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub auto_refresh: bool,
    #[serde(default = "default_true")]
    pub show_title: bool,
    #[serde(default = "default_true")]
    pub show_author: bool,
    #[serde(default = "default_true")]
    pub show_comments: bool,
    #[serde(default = "default_true")]
    pub show_metadata: bool,
    /// Cap on highlights gathered per pass (0 = unlimited)
    #[serde(default = "default_max_highlights")]
    pub max_highlights: usize,
    /// How many highlights to display
    #[serde(default = "default_random_count")]
    pub random_count: usize,
    /// 0 disables the timer
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
    #[serde(default = "default_filter_property")]
    pub filter_property: String,
    #[serde(default = "default_filter_value")]
    pub filter_value: String,
    #[serde(default = "default_filename_format")]
    pub filename_format: String,
    /// Folder to scan, relative to the vault (empty = whole vault)
    #[serde(default)]
    pub highlights_folder: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            show_title: true,
            show_author: true,
            show_comments: true,
            show_metadata: true,
            max_highlights: default_max_highlights(),
            random_count: default_random_count(),
            refresh_interval_seconds: default_refresh_interval(),
            filter_property: default_filter_property(),
            filter_value: default_filter_value(),
            filename_format: default_filename_format(),
            highlights_folder: String::new(),
        }
    }
}

impl Settings {
    /// Default settings location inside a vault
    pub fn default_path(vault_path: &Path) -> PathBuf {
        vault_path.join(".booklights").join("settings.json")
    }

    /// Load settings; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            log::info!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings {:?}: {}", path, e))?;
        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse settings {:?}: {}", path, e))?;

        Ok(settings.normalized())
    }

    /// Write settings atomically (temp file, then rename)
    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings dir {:?}: {}", parent, e))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        let file_name = path.file_name().unwrap_or_default().to_string_lossy();
        let temp_path = path.with_file_name(format!("{}.booklights-tmp", file_name));

        let mut file = fs::File::create(&temp_path)
            .map_err(|e| format!("Failed to create temp file {:?}: {}", temp_path, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| format!("Failed to write temp file {:?}: {}", temp_path, e))?;
        file.sync_all()
            .map_err(|e| format!("Failed to sync temp file {:?}: {}", temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, path)
            .map_err(|e| format!("Failed to rename {:?} -> {:?}: {}", temp_path, path, e))?;

        Ok(())
    }

    /// Clamp values that would make a pass meaningless
    pub fn normalized(mut self) -> Self {
        if self.random_count == 0 {
            log::warn!("random_count must be at least 1, using 1");
            self.random_count = 1;
        }
        self
    }

    pub fn note_filter(&self) -> NoteFilter {
        NoteFilter::new(&self.filter_property, &self.filter_value)
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            show_title: self.show_title,
            show_author: self.show_author,
            show_comments: self.show_comments,
            show_metadata: self.show_metadata,
        }
    }

    /// Folder prefix for the document source, if one is configured
    pub fn folder_prefix(&self) -> Option<&str> {
        let folder = self.highlights_folder.trim();
        if folder.is_empty() {
            None
        } else {
            Some(folder)
        }
    }
}
