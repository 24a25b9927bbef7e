//! Shard combining
//!
//! Concatenates the per-session shards under `<output_dir>/<year>/` into one
//! `merged_all.txt` and one `merged_all.json`.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{IngestError, IngestResult};

pub const COMBINED_SUFFIX: &str = "_combined.txt";
pub const METADATA_SUFFIX: &str = "_metadata.json";
pub const MERGED_TXT: &str = "merged_all.txt";
pub const MERGED_JSON: &str = "merged_all.json";

/// Combine statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombineReport {
    pub transcript_shards: usize,
    pub metadata_shards: usize,
    pub metadata_entries: usize,
    /// Unreadable or malformed shards
    pub skipped: usize,
}

/// Shard files of one kind, sorted by year directory then file name
fn shard_files(output_dir: &Path, suffix: &str) -> Vec<PathBuf> {
    WalkDir::new(output_dir)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(suffix))
        .map(|e| e.into_path())
        .collect()
}

/// Combine every shard below `output_dir` into `txt_path` and `json_path`
pub fn combine_shards(output_dir: &Path, txt_path: &Path, json_path: &Path) -> IngestResult<CombineReport> {
    if !output_dir.is_dir() {
        return Err(IngestError::NotADirectory(output_dir.to_path_buf()));
    }
    let mut report = CombineReport::default();

    let mut texts = Vec::new();
    for path in shard_files(output_dir, COMBINED_SUFFIX) {
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                report.transcript_shards += 1;
                texts.push(content.trim().to_string());
            }
            Err(e) => {
                report.skipped += 1;
                tracing::warn!(path = %path.display(), error = %e, "Unreadable shard, skipping");
            }
        }
    }

    let mut entries: Vec<serde_json::Value> = Vec::new();
    for path in shard_files(output_dir, METADATA_SUFFIX) {
        let parsed = std::fs::read_to_string(&path)
            .map_err(IngestError::from)
            .and_then(|content| Ok(serde_json::from_str::<Vec<serde_json::Value>>(&content)?));
        match parsed {
            Ok(shard) => {
                report.metadata_shards += 1;
                entries.extend(shard);
            }
            Err(e) => {
                report.skipped += 1;
                tracing::warn!(path = %path.display(), "Malformed metadata shard, skipping: {}", e);
            }
        }
    }
    report.metadata_entries = entries.len();

    for path in [txt_path, json_path] {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(txt_path, texts.join("\n"))?;
    std::fs::write(json_path, serde_json::to_string_pretty(&entries)?)?;

    tracing::info!(
        transcript_shards = report.transcript_shards,
        metadata_shards = report.metadata_shards,
        entries = report.metadata_entries,
        txt = %txt_path.display(),
        json = %json_path.display(),
        "Shards combined"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_combine_in_sorted_order() {
        let temp = TempDir::new().unwrap();
        let out = temp.path();
        fs::create_dir_all(out.join("2023")).unwrap();
        fs::create_dir_all(out.join("2024")).unwrap();
        fs::write(out.join("2024/10_5_2024-01-10_combined.txt"), "c\tTrzy\n").unwrap();
        fs::write(out.join("2023/10_1_2023-11-14_combined.txt"), "b\tDwa\n").unwrap();
        fs::write(out.join("2023/10_1_2023-11-13_combined.txt"), "a\tJeden\n").unwrap();
        fs::write(
            out.join("2023/10_1_2023-11-13_metadata.json"),
            r#"[{"id": "a", "speaker": null, "metadata": []}]"#,
        )
        .unwrap();
        fs::write(out.join("2023/10_1_2023-11-14_metadata.json"), "not json").unwrap();

        let txt = out.join(MERGED_TXT);
        let json = out.join(MERGED_JSON);
        let report = combine_shards(out, &txt, &json).unwrap();

        assert_eq!(fs::read_to_string(&txt).unwrap(), "a\tJeden\nb\tDwa\nc\tTrzy");
        let merged: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(report.transcript_shards, 3);
        assert_eq!(report.skipped, 1);
    }
}
