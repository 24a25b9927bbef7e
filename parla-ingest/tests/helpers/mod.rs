//! Test helper utilities for parla-ingest integration tests
//!
//! - SessionTree: temporary transcript/roster/output tree
//! - markup builders for legacy and new-convention documents

#![allow(dead_code)]

pub mod markup;

pub use markup::{legacy_backbone, new_backbone, speaker_document, Para};

use chrono::NaiveDate;
use parla_common::config::ResolvedConfig;
use parla_ingest::services::SessionLocation;
use parla_ingest::SessionKey;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary `data/transcripts`, `data/deputies` and `output` tree
pub struct SessionTree {
    pub temp: TempDir,
}

impl SessionTree {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().expect("temp dir"),
        }
    }

    pub fn data_root(&self) -> PathBuf {
        self.temp.path().join("data").join("transcripts")
    }

    pub fn roster_root(&self) -> PathBuf {
        self.temp.path().join("data").join("deputies")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.temp.path().join("output")
    }

    pub fn sitting_dir(&self, term: &str, sitting: &str) -> PathBuf {
        self.data_root().join(term).join(sitting)
    }

    /// Write `<date>_<index>.html` into a sitting directory
    pub fn write_document(&self, term: &str, sitting: &str, date: &str, index: u32, html: &str) {
        let dir = self.sitting_dir(term, sitting);
        fs::create_dir_all(&dir).expect("create sitting dir");
        fs::write(dir.join(format!("{}_{}.html", date, index)), html).expect("write document");
    }

    /// Write `<date>.json` session metadata
    pub fn write_session_metadata(&self, term: &str, sitting: &str, date: &str, json: &str) {
        let dir = self.sitting_dir(term, sitting);
        fs::create_dir_all(&dir).expect("create sitting dir");
        fs::write(dir.join(format!("{}.json", date)), json).expect("write metadata");
    }

    /// Write `<term>/deputies.csv`
    pub fn write_roster(&self, term: &str, csv: &str) {
        let dir = self.roster_root().join(term);
        fs::create_dir_all(&dir).expect("create roster dir");
        fs::write(dir.join("deputies.csv"), csv).expect("write roster");
    }

    pub fn config(&self) -> ResolvedConfig {
        ResolvedConfig {
            data_root: self.data_root(),
            roster_root: self.roster_root(),
            output_dir: self.output_dir(),
            ..ResolvedConfig::default()
        }
    }

    pub fn location(&self, term: &str, sitting: &str, date: &str) -> SessionLocation {
        SessionLocation {
            key: SessionKey::new(
                term,
                sitting,
                NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("date"),
            ),
            dir: self.sitting_dir(term, sitting),
            stem: date.to_string(),
            extension: "html".to_string(),
        }
    }

    /// Lines of a combined shard
    pub fn combined_lines(&self, year: &str, prefix: &str) -> Vec<String> {
        let path = self
            .output_dir()
            .join(year)
            .join(format!("{}_combined.txt", prefix));
        read_lines(&path)
    }

    /// Parsed metadata shard
    pub fn metadata_shard(&self, year: &str, prefix: &str) -> Vec<serde_json::Value> {
        let path = self
            .output_dir()
            .join(year)
            .join(format!("{}_metadata.json", prefix));
        let content = fs::read_to_string(&path).expect("read metadata shard");
        serde_json::from_str(&content).expect("parse metadata shard")
    }
}

pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("read file")
        .lines()
        .map(str::to_string)
        .collect()
}

pub const ROSTER_CSV: &str = "\
name,club,birthDate
Jan Kowalski,KO,1970-01-01
Anna Nowak,PiS,
Ewa Lis,Lewica,1985-05-05
";
