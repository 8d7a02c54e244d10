use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Where notes come from. Paths are vault-relative and `/`-separated.
pub trait DocumentSource: Send + Sync {
    /// List every note, optionally restricted to a folder prefix.
    fn list_documents(&self, prefix: Option<&str>) -> Result<Vec<String>, String>;

    /// Read the full text of one note.
    fn read_document(&self, path: &str) -> Result<String, String>;
}

/// Markdown vault on the local filesystem
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, String> {
        let root = root.into();
        if !root.is_dir() {
            return Err(format!("Not a valid vault directory: {}", root.display()));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory that holds every note `list_documents(prefix)` can return: the prefix
    /// folder when it exists, otherwise the vault root.
    pub fn folder_path(&self, prefix: Option<&str>) -> PathBuf {
        match normalize_prefix(prefix) {
            Some(folder) => {
                let path = folder
                    .split('/')
                    .fold(self.root.clone(), |path, part| path.join(part));
                if path.is_dir() {
                    path
                } else {
                    self.root.clone()
                }
            }
            None => self.root.clone(),
        }
    }

    fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        Some(parts.join("/"))
    }
}

/// Skip hidden files and folders (`.obsidian`, `.booklights`, ...) but never the vault root
fn is_visible(entry: &DirEntry) -> bool {
    entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
}

fn is_markdown(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("md"))
            .unwrap_or(false)
}

/// `Books/` and `/Books` both mean the `Books` folder; empty means everything.
fn normalize_prefix(prefix: Option<&str>) -> Option<String> {
    let trimmed = prefix?.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.replace('\\', "/"))
    }
}

fn in_folder(relative: &str, folder: &str) -> bool {
    relative == folder
        || relative
            .strip_prefix(folder)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
}

impl DocumentSource for FsVault {
    fn list_documents(&self, prefix: Option<&str>) -> Result<Vec<String>, String> {
        if !self.root.is_dir() {
            return Err(format!("Vault directory is missing: {}", self.root.display()));
        }

        let folder = normalize_prefix(prefix);

        let mut paths: Vec<String> = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(is_visible)
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    log::warn!("Skipping unreadable vault entry: {}", e);
                    None
                }
            })
            .filter(is_markdown)
            .filter_map(|entry| self.relative_path(entry.path()))
            .filter(|relative| match &folder {
                Some(folder) => in_folder(relative, folder),
                None => true,
            })
            .collect();

        paths.sort();
        Ok(paths)
    }

    fn read_document(&self, path: &str) -> Result<String, String> {
        let full_path = self.root.join(path);
        fs::read_to_string(&full_path)
            .map_err(|e| format!("Failed to read {}: {}", full_path.display(), e))
    }
}
