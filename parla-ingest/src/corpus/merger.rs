//! Cross-directory corpus merger
//!
//! Walks an arbitrary tree of transcript and metadata shards and folds every
//! file into one [`MergedCorpus`]. The fold state is an explicit
//! [`CorpusAccumulator`] value; the walk is sorted by file name so the same
//! tree always yields the same corpus.
//!
//! Merge rules:
//! - transcripts: first occurrence of an id wins, later ones are counted as
//!   duplicates
//! - metadata: first occurrence stores the full row; later occurrences only
//!   fill fields that are still empty

use parla_common::Language;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::corpus::classifier::{find_id_column, FileClass, FileClassifier};
use crate::error::{IngestError, IngestResult, Severity};
use crate::services::roster::split_record;

/// Canonical column name → trimmed value
pub type MetadataRow = HashMap<String, String>;

/// Transcript rows in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptTable {
    rows: Vec<(String, String)>,
    seen: HashSet<String>,
}

impl TranscriptTable {
    /// Insert a row; false if the id was already present
    pub fn insert(&mut self, id: String, text: String) -> bool {
        if self.seen.contains(&id) {
            return false;
        }
        self.seen.insert(id.clone());
        self.rows.push((id, text));
        true
    }

    pub fn rows(&self) -> &[(String, String)] {
        &self.rows
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Metadata rows of one language
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataTable {
    order: Vec<String>,
    rows: HashMap<String, MetadataRow>,
    columns: BTreeSet<String>,
    /// Canonical header of the first file of this language
    header_preference: Option<Vec<String>>,
    display_names: HashMap<String, String>,
}

impl MetadataTable {
    /// Register a file header: union of columns, first display name wins
    pub fn observe_header(&mut self, canonical: &[String], display: &[String]) {
        if self.header_preference.is_none() {
            self.header_preference = Some(canonical.to_vec());
        }
        for (column, shown) in canonical.iter().zip(display) {
            self.columns.insert(column.clone());
            self.display_names
                .entry(column.clone())
                .or_insert_with(|| shown.clone());
        }
    }

    /// Store a new row or fill empty fields of an existing one.
    ///
    /// Returns false when the id was already present.
    pub fn upsert(&mut self, id: String, row: MetadataRow) -> bool {
        match self.rows.get_mut(&id) {
            Some(existing) => {
                for (column, value) in row {
                    if value.is_empty() {
                        continue;
                    }
                    let slot = existing.entry(column).or_default();
                    if slot.is_empty() {
                        *slot = value;
                    }
                }
                false
            }
            None => {
                self.order.push(id.clone());
                self.rows.insert(id, row);
                true
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&MetadataRow> {
        self.rows.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    /// Rows in id insertion order
    pub fn rows(&self) -> impl Iterator<Item = (&str, &MetadataRow)> {
        self.order
            .iter()
            .filter_map(|id| self.rows.get(id).map(|row| (id.as_str(), row)))
    }

    /// First header's columns, then the rest of the union alphabetically
    pub fn output_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::with_capacity(self.columns.len());
        if let Some(preferred) = &self.header_preference {
            for column in preferred {
                if self.columns.contains(column) && !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }
        for column in &self.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        columns
    }

    /// Original capitalization of a canonical column
    pub fn display_name<'a>(&'a self, column: &'a str) -> &'a str {
        self.display_names
            .get(column)
            .map(String::as_str)
            .unwrap_or(column)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Result of a merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedCorpus {
    pub transcripts: TranscriptTable,
    pub metadata_pl: MetadataTable,
    pub metadata_en: MetadataTable,
}

impl MergedCorpus {
    pub fn metadata(&self, language: Language) -> &MetadataTable {
        match language {
            Language::Pl => &self.metadata_pl,
            Language::En => &self.metadata_en,
        }
    }

    pub fn metadata_mut(&mut self, language: Language) -> &mut MetadataTable {
        match language {
            Language::Pl => &mut self.metadata_pl,
            Language::En => &mut self.metadata_en,
        }
    }
}

/// Merge statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub files_seen: usize,
    pub transcript_files: usize,
    pub metadata_files: usize,
    /// Unclassified or unreadable files
    pub skipped_files: usize,
    pub duplicate_transcript_ids: usize,
    pub duplicate_metadata_ids: usize,
    /// Transcript ids with no metadata row in either language
    pub transcripts_without_metadata: usize,
    /// Metadata ids with no transcript
    pub metadata_without_transcript: usize,
}

/// Fold state threaded through the directory walk
#[derive(Debug)]
pub struct CorpusAccumulator {
    classifier: FileClassifier,
    corpus: MergedCorpus,
    report: MergeReport,
}

impl CorpusAccumulator {
    pub fn new(classifier: FileClassifier) -> Self {
        Self {
            classifier,
            corpus: MergedCorpus::default(),
            report: MergeReport::default(),
        }
    }

    /// Classify and fold one file; problems are logged and counted
    pub fn ingest(mut self, path: &Path) -> Self {
        self.report.files_seen += 1;
        if let Err(e) = self.try_ingest(path) {
            self.report.skipped_files += 1;
            match e.severity() {
                Severity::Skipped => tracing::warn!(path = %path.display(), "{}", e),
                _ => tracing::warn!(path = %path.display(), "Failed to read shard: {}", e),
            }
        }
        self
    }

    fn try_ingest(&mut self, path: &Path) -> IngestResult<()> {
        match self.classifier.classify(path)? {
            FileClass::Transcript => {
                self.report.transcript_files += 1;
                let text = read_lossy(path)?;
                self.fold_transcripts(&text);
            }
            FileClass::Metadata { language, forced } => {
                self.report.metadata_files += 1;
                tracing::debug!(
                    path = %path.display(),
                    language = %language,
                    forced,
                    "Metadata shard"
                );
                let text = read_lossy(path)?;
                self.fold_metadata(language, &text);
            }
            FileClass::Unclassified => {
                return Err(IngestError::ClassificationAmbiguity(path.to_path_buf()));
            }
        }
        Ok(())
    }

    /// `id<TAB>text` lines; lines without a tab or id are ignored
    pub fn fold_transcripts(&mut self, content: &str) {
        for line in content.lines() {
            let mut cols = line.split('\t');
            let (Some(id), Some(text)) = (cols.next(), cols.next()) else {
                continue;
            };
            let id = id.trim();
            if id.is_empty() {
                continue;
            }
            if !self.corpus.transcripts.insert(id.to_string(), text.trim().to_string()) {
                self.report.duplicate_transcript_ids += 1;
            }
        }
    }

    /// Header line plus rows; rows are keyed by the resolved id column
    pub fn fold_metadata(&mut self, language: Language, content: &str) {
        let mut lines = content.lines();
        let Some(header_line) = lines.next() else {
            return;
        };
        let header: Vec<String> = split_record(header_line, '\t')
            .into_iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let canonical: Vec<String> = header.iter().map(|h| h.to_lowercase()).collect();
        let display: Vec<String> = header
            .iter()
            .zip(&canonical)
            .map(|(h, c)| if h.is_empty() { c.clone() } else { h.clone() })
            .collect();
        let id_column = find_id_column(&header);

        let table = self.corpus.metadata_mut(language);
        table.observe_header(&canonical, &display);

        for line in lines {
            if line.is_empty() {
                continue;
            }
            let mut cells = split_record(line, '\t');
            cells.resize(header.len().max(cells.len()), String::new());

            let id = cells[id_column].trim().to_string();
            if id.is_empty() {
                continue;
            }
            let row: MetadataRow = canonical
                .iter()
                .zip(&cells)
                .map(|(column, value)| (column.clone(), value.trim().to_string()))
                .collect();
            if !table.upsert(id, row) {
                self.report.duplicate_metadata_ids += 1;
            }
        }
    }

    /// Close the fold and compute cross-table statistics
    pub fn finish(mut self) -> (MergedCorpus, MergeReport) {
        let corpus = &self.corpus;
        self.report.transcripts_without_metadata = corpus
            .transcripts
            .rows()
            .iter()
            .filter(|(id, _)| !corpus.metadata_pl.contains(id) && !corpus.metadata_en.contains(id))
            .count();

        let metadata_ids: HashSet<&str> = corpus
            .metadata_pl
            .rows()
            .chain(corpus.metadata_en.rows())
            .map(|(id, _)| id)
            .collect();
        self.report.metadata_without_transcript = metadata_ids
            .iter()
            .filter(|id| !corpus.transcripts.contains(id))
            .count();

        (self.corpus, self.report)
    }
}

fn read_lossy(path: &Path) -> IngestResult<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Directory-walking merge driver
#[derive(Debug, Clone)]
pub struct CorpusMerger {
    classifier: FileClassifier,
    exclude: Vec<PathBuf>,
}

impl CorpusMerger {
    pub fn new(max_sample_lines: usize) -> Self {
        Self {
            classifier: FileClassifier::new(max_sample_lines),
            exclude: Vec::new(),
        }
    }

    /// Never read these files (the merge outputs, when written inside the root)
    pub fn with_excluded(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.exclude.extend(paths.into_iter().map(|p| p.canonicalize().unwrap_or(p)));
        self
    }

    pub fn merge(&self, root: &Path) -> IngestResult<(MergedCorpus, MergeReport)> {
        if !root.is_dir() {
            return Err(IngestError::NotADirectory(root.to_path_buf()));
        }

        let accumulator = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| !self.is_excluded(path))
            .fold(CorpusAccumulator::new(self.classifier), |acc, path| acc.ingest(&path));

        let (corpus, report) = accumulator.finish();
        tracing::info!(
            root = %root.display(),
            files = report.files_seen,
            transcripts = corpus.transcripts.len(),
            metadata_pl = corpus.metadata_pl.len(),
            metadata_en = corpus.metadata_en.len(),
            skipped = report.skipped_files,
            "Corpus merged"
        );
        if report.transcripts_without_metadata > 0 || report.metadata_without_transcript > 0 {
            tracing::warn!(
                transcripts_without_metadata = report.transcripts_without_metadata,
                metadata_without_transcript = report.metadata_without_transcript,
                "Transcript and metadata ids do not line up"
            );
        }
        Ok((corpus, report))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.exclude.contains(&path)
    }
}
