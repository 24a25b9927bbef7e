//! Session discovery
//!
//! Finds every backbone document `<data_root>/<term>/<sitting>/<date>_0.<ext>`
//! and returns one [`SessionLocation`] per backbone, sorted by
//! (term, sitting, date).

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::error::{IngestError, IngestResult};
use crate::services::segmenter::backbone_path;
use crate::types::SessionKey;

/// Backbone suffix before the extension
const BACKBONE_SUFFIX: &str = "_0";

/// One discovered session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLocation {
    pub key: SessionKey,
    /// Sitting directory holding the backbone and its speaker documents
    pub dir: PathBuf,
    /// Date stem exactly as written in the file name
    pub stem: String,
    pub extension: String,
}

impl SessionLocation {
    pub fn backbone_path(&self) -> PathBuf {
        backbone_path(&self.dir, &self.stem, &self.extension)
    }

    /// `<date>.json` next to the backbone
    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.stem))
    }
}

/// Backbone discovery over a transcript tree
pub struct SessionScanner {
    extension: String,
    ignore_patterns: Vec<String>,
}

impl SessionScanner {
    /// Scanner for backbones with the given extension (without dot)
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into().trim_start_matches('.').to_string(),
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
                ".svn".to_string(),
            ],
        }
    }

    /// Discover all sessions below `data_root`
    pub fn scan(&self, data_root: &Path) -> IngestResult<Vec<SessionLocation>> {
        if !data_root.is_dir() {
            return Err(IngestError::NotADirectory(data_root.to_path_buf()));
        }

        let mut sessions = Vec::new();
        let walker = WalkDir::new(data_root)
            .follow_links(false)
            .max_depth(3)
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    continue;
                }
            };
            // Only backbones directly inside a sitting directory
            if entry.depth() != 3 || !entry.file_type().is_file() {
                continue;
            }
            if let Some(location) = self.location_of(entry.path()) {
                sessions.push(location);
            }
        }

        sessions.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.stem.cmp(&b.stem)));
        tracing::info!(
            root = %data_root.display(),
            sessions = sessions.len(),
            "Session discovery complete"
        );
        Ok(sessions)
    }

    /// Build a location from a backbone path, `None` if it is not a backbone
    fn location_of(&self, path: &Path) -> Option<SessionLocation> {
        let extension = path.extension()?.to_string_lossy().to_string();
        if !extension.eq_ignore_ascii_case(&self.extension) {
            return None;
        }
        let stem = path
            .file_stem()?
            .to_string_lossy()
            .strip_suffix(BACKBONE_SUFFIX)?
            .to_string();

        let date = match NaiveDate::parse_from_str(&stem, "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Backbone name is not a date, skipping"
                );
                return None;
            }
        };

        let dir = path.parent()?;
        let sitting = dir.file_name()?.to_string_lossy().to_string();
        let term = dir.parent()?.file_name()?.to_string_lossy().to_string();

        Some(SessionLocation {
            key: SessionKey::new(term, sitting, date),
            dir: dir.to_path_buf(),
            stem,
            extension,
        })
    }

    fn should_process_entry(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        if entry.depth() > 0 && name.starts_with('.') {
            return false;
        }
        !self.ignore_patterns.iter().any(|p| name == p.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<html></html>").unwrap();
    }

    #[test]
    fn test_scan_finds_backbones_sorted() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "10/2/2023-11-21_0.html");
        touch(temp.path(), "10/1/2023-11-14_0.html");
        touch(temp.path(), "10/1/2023-11-13_0.html");
        touch(temp.path(), "10/1/2023-11-13_1.html");
        touch(temp.path(), "10/1/2023-11-13.json");

        let sessions = SessionScanner::new("html").scan(temp.path()).unwrap();
        let ids: Vec<_> = sessions.iter().map(|s| s.key.prefix()).collect();
        assert_eq!(ids, vec!["10_1_2023-11-13", "10_1_2023-11-14", "10_2_2023-11-21"]);
        assert_eq!(
            sessions[0].metadata_path(),
            temp.path().join("10/1/2023-11-13.json")
        );
    }

    #[test]
    fn test_scan_skips_bad_dates_and_hidden_dirs() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "10/1/notadate_0.html");
        touch(temp.path(), "10/.git/2023-11-13_0.html");
        touch(temp.path(), "10/1/2023-11-13_0.htm");

        let sessions = SessionScanner::new("html").scan(temp.path()).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_scan_ignores_hidden_terms_and_shallow_backbones() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), ".cache/1/2023-11-13_0.html");
        touch(temp.path(), "10/2023-11-13_0.html");
        touch(temp.path(), "10/.svn/2023-11-14_0.html");
        touch(temp.path(), "10/2/2023-11-15_0.html");

        let sessions = SessionScanner::new("html").scan(temp.path()).unwrap();
        let ids: Vec<String> = sessions.iter().map(|s| s.key.to_string()).collect();
        assert_eq!(ids, vec!["10_2_2023-11-15".to_string()]);
    }

    #[test]
    fn test_scan_missing_root() {
        let temp = TempDir::new().unwrap();
        let result = SessionScanner::new("html").scan(&temp.path().join("missing"));
        assert!(matches!(result, Err(IngestError::NotADirectory(_))));
    }
}
