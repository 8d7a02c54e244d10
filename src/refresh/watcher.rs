use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Watches a vault and reports changed notes once they have settled.
///
/// Dropping the watcher stops the background thread.
pub struct NoteWatcher {
    _watcher: RecommendedWatcher,
}

impl NoteWatcher {
    /// Start watching `vault_path`. `on_change` receives each batch of stable note paths
    /// (created, modified or removed `.md` files outside hidden folders).
    pub fn start<F>(vault_path: &Path, on_change: F) -> Result<Self, String>
    where
        F: Fn(Vec<PathBuf>) + Send + 'static,
    {
        let vault = vault_path.to_path_buf();
        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            tx,
            Config::default().with_poll_interval(Duration::from_millis(300)),
        )
        .map_err(|e| format!("Failed to create watcher: {}", e))?;

        watcher
            .watch(vault.as_path(), RecursiveMode::Recursive)
            .map_err(|e| format!("Failed to watch {}: {}", vault.display(), e))?;

        thread::spawn(move || {
            // Editors save in bursts; wait until a path has been quiet before reporting it
            let poll = Duration::from_millis(250);
            let settle = Duration::from_millis(500);
            let mut pending_paths: HashMap<PathBuf, Instant> = HashMap::new();

            loop {
                match rx.recv_timeout(poll) {
                    Ok(Ok(event)) => {
                        let now = Instant::now();
                        for path in event.paths {
                            if should_process_path(&path, &vault) {
                                pending_paths.insert(path, now);
                            }
                        }
                    }
                    Ok(Err(e)) => {
                        log::warn!("File watcher error: {}", e);
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        let now = Instant::now();
                        let mut stable = Vec::new();
                        pending_paths.retain(|path, last_event| {
                            if now.duration_since(*last_event) >= settle {
                                stable.push(path.clone());
                                false
                            } else {
                                true
                            }
                        });

                        if !stable.is_empty() {
                            stable.sort();
                            log::debug!("[Watcher] {} note(s) changed", stable.len());
                            on_change(stable);
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        break;
                    }
                }
            }

            log::debug!("[Watcher] stopped");
        });

        log::info!("Watching {} for note changes", vault_path.display());
        Ok(NoteWatcher { _watcher: watcher })
    }
}

/// Only `.md` notes count; hidden folders (`.obsidian`, `.booklights`) and temp files are
/// ignored.
pub fn should_process_path(path: &Path, vault_path: &Path) -> bool {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

    if file_name.ends_with("-tmp") || file_name.ends_with('~') {
        return false;
    }

    let is_markdown = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("md"))
        .unwrap_or(false);
    if !is_markdown {
        return false;
    }

    let relative = path.strip_prefix(vault_path).unwrap_or(path);
    for component in relative.components() {
        if let std::path::Component::Normal(name) = component {
            if name.to_string_lossy().starts_with('.') {
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processes_md_files() {
        let vault = PathBuf::from("/vault");
        assert!(should_process_path(&PathBuf::from("/vault/note.md"), &vault));
        assert!(should_process_path(&PathBuf::from("/vault/Books/Dune.MD"), &vault));
    }

    #[test]
    fn test_skips_tmp_files() {
        let vault = PathBuf::from("/vault");
        assert!(!should_process_path(&PathBuf::from("/vault/note.md.booklights-tmp"), &vault));
        assert!(!should_process_path(&PathBuf::from("/vault/note.md~"), &vault));
    }

    #[test]
    fn test_skips_hidden_directory() {
        let vault = PathBuf::from("/vault");
        assert!(!should_process_path(&PathBuf::from("/vault/.obsidian/cache.md"), &vault));
        assert!(!should_process_path(&PathBuf::from("/vault/.booklights/notes.md"), &vault));
    }

    #[test]
    fn test_hidden_vault_root_is_allowed() {
        let vault = PathBuf::from("/tmp/.vault");
        assert!(should_process_path(&PathBuf::from("/tmp/.vault/Dune.md"), &vault));
    }

    #[test]
    fn test_skips_non_md_files() {
        let vault = PathBuf::from("/vault");
        assert!(!should_process_path(&PathBuf::from("/vault/image.png"), &vault));
        assert!(!should_process_path(&PathBuf::from("/vault/.booklights/settings.json"), &vault));
        assert!(!should_process_path(&PathBuf::from("/vault/notes.txt"), &vault));
    }
}
