//! Labeled dataset loading
//!
//! A dataset directory holds `merged_all.txt` (`id<TAB>text`), metadata as
//! `merged_all.json` or a `.tsv` table, and `merged_labels.txt` (one `0`/`1`
//! per line). The three record counts must be equal; any difference is a hard
//! stop reporting all three.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::corpus::combine::{MERGED_JSON, MERGED_TXT};
use crate::error::{IngestError, IngestResult};
use crate::services::roster::split_record;

pub const LABELS_FILE: &str = "merged_labels.txt";

/// One joined training record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledRecord {
    pub id: String,
    pub text: String,
    /// Lower-cased, whitespace-normalized text
    pub processed_text: String,
    pub metadata: serde_json::Value,
    pub label: u8,
}

/// Lower-case and collapse whitespace
pub fn preprocess(text: &str) -> String {
    parla_common::text::normalize_whitespace(&text.to_lowercase())
}

fn read_transcripts(path: &Path) -> IngestResult<Vec<(String, String)>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.split_once('\t') {
            Some((id, text)) => (id.to_string(), text.to_string()),
            None => (line.to_string(), String::new()),
        })
        .collect())
}

fn read_labels(path: &Path) -> IngestResult<Vec<u8>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter_map(|line| match line.trim() {
            "0" => Some(0),
            "1" => Some(1),
            _ => None,
        })
        .collect())
}

/// Metadata TSV candidate: any `.tsv` except the transcript and label files,
/// preferring names containing `meta`
pub fn find_metadata_table(dir: &Path) -> IngestResult<Option<PathBuf>> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            name.to_lowercase().ends_with(".tsv") && name != MERGED_TXT && name != LABELS_FILE
        })
        .collect();
    candidates.sort();

    let preferred = candidates.iter().position(|path| {
        path.file_name()
            .is_some_and(|n| n.to_string_lossy().to_lowercase().contains("meta"))
    });
    Ok(match preferred {
        Some(idx) => Some(candidates.swap_remove(idx)),
        None => candidates.into_iter().next(),
    })
}

fn read_metadata_table(path: &Path) -> IngestResult<Vec<serde_json::Value>> {
    let content = std::fs::read_to_string(path)?;
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let Some(header_line) = lines.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<String> = split_record(header_line, '\t')
        .into_iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    Ok(lines
        .map(|line| {
            let cells = split_record(line, '\t');
            let object: serde_json::Map<String, serde_json::Value> = header
                .iter()
                .enumerate()
                .map(|(i, column)| {
                    let value = cells
                        .get(i)
                        .map(|v| v.trim())
                        .filter(|v| !v.is_empty())
                        .map(|v| serde_json::Value::String(v.to_string()))
                        .unwrap_or(serde_json::Value::Null);
                    (column.clone(), value)
                })
                .collect();
            serde_json::Value::Object(object)
        })
        .collect())
}

fn read_metadata(dir: &Path) -> IngestResult<Vec<serde_json::Value>> {
    let json_path = dir.join(MERGED_JSON);
    if json_path.is_file() {
        let content = std::fs::read_to_string(&json_path)?;
        return Ok(serde_json::from_str(&content)?);
    }
    match find_metadata_table(dir)? {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Using metadata table");
            read_metadata_table(&path)
        }
        None => {
            tracing::warn!(dir = %dir.display(), "No metadata found in dataset directory");
            Ok(Vec::new())
        }
    }
}

/// Load and validate a dataset directory
pub fn load_dataset(dir: &Path) -> IngestResult<Vec<LabeledRecord>> {
    if !dir.is_dir() {
        return Err(IngestError::NotADirectory(dir.to_path_buf()));
    }
    let transcripts = read_transcripts(&dir.join(MERGED_TXT))?;
    let metadata = read_metadata(dir)?;
    let labels = read_labels(&dir.join(LABELS_FILE))?;

    if transcripts.len() != metadata.len() || metadata.len() != labels.len() {
        return Err(IngestError::SchemaViolation {
            transcripts: transcripts.len(),
            metadata: metadata.len(),
            labels: labels.len(),
        });
    }

    let records: Vec<LabeledRecord> = transcripts
        .into_iter()
        .zip(metadata)
        .zip(labels)
        .map(|(((id, text), metadata), label)| LabeledRecord {
            processed_text: preprocess(&text),
            id,
            text,
            metadata,
            label,
        })
        .collect();

    tracing::info!(dir = %dir.display(), records = records.len(), "Dataset loaded");
    Ok(records)
}
