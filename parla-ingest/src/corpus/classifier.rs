//! Shard classification for the corpus merger
//!
//! Precedence per file:
//! 1. File-name suffix (`-meta-en.tsv` → English metadata, `-meta.tsv` →
//!    Polish metadata), no content sniffing
//! 2. Content sniffing over the first lines: transcript, then metadata
//! 3. `.txt`/`.tsv` files still unclassified get one retry with a looser
//!    transcript test
//!
//! Everything else is unclassified and skipped by the merger.

use parla_common::text::has_polish_diacritics;
use parla_common::Language;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::IngestResult;

/// Suffix forcing English metadata
pub const EXPLICIT_EN_SUFFIX: &str = "-meta-en.tsv";
/// Suffix forcing Polish metadata
pub const EXPLICIT_PL_SUFFIX: &str = "-meta.tsv";

/// Header tokens of Polish metadata; checked before the English set, so `id` resolves to Polish
pub const POLISH_KEYWORDS: &[&str] = &["mówca", "mowca", "partia", "wiek", "płeć", "plec", "id", "data"];
/// Header tokens of English metadata
pub const ENGLISH_KEYWORDS: &[&str] = &["speaker", "party", "age", "gender", "role", "id", "date"];

/// Identifier column names, case-insensitive, in priority order
pub const ID_COLUMN_ALIASES: &[&str] = &["id", "speech_id", "speechid", "utterance_id", "utteranceid"];

/// Minimum prose length of a transcript text column
const TRANSCRIPT_MIN_TEXT_CHARS: usize = 10;

/// Extensions eligible for the loose transcript retry
const RETRY_EXTENSIONS: &[&str] = &["txt", "tsv"];

/// How the merger treats one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Transcript,
    Metadata {
        language: Language,
        /// Decided by file-name suffix
        forced: bool,
    },
    Unclassified,
}

/// Language forced by the file name, if any
pub fn explicit_language(file_name: &str) -> Option<Language> {
    let lower = file_name.to_lowercase();
    if lower.ends_with(EXPLICIT_EN_SUFFIX) {
        Some(Language::En)
    } else if lower.ends_with(EXPLICIT_PL_SUFFIX) {
        Some(Language::Pl)
    } else {
        None
    }
}

/// Read up to `max_lines` lines; invalid UTF-8 is replaced, not rejected
pub fn read_sample_lines(path: &Path, max_lines: usize) -> IngestResult<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::with_capacity(max_lines);
    for raw in reader.split(b'\n').take(max_lines) {
        let raw = raw?;
        let line = String::from_utf8_lossy(&raw);
        lines.push(line.trim_end_matches(|c: char| c == '\n' || c == '\r').to_string());
    }
    Ok(lines)
}

fn transcript_text_column(line: &str) -> Option<&str> {
    let mut cols = line.split('\t');
    cols.next()?;
    cols.next().map(str::trim)
}

/// At least a third of the sampled lines carry prose in the second tab column
pub fn looks_like_transcript(sample: &[String]) -> bool {
    if sample.is_empty() {
        return false;
    }
    let candidates = sample
        .iter()
        .filter_map(|line| transcript_text_column(line))
        .filter(|text| text.contains(' ') && text.chars().count() >= TRANSCRIPT_MIN_TEXT_CHARS)
        .count();
    candidates >= std::cmp::max(1, sample.len() / 3)
}

/// Retry test: any sampled line with a non-empty id and whitespace in the
/// second tab column
pub fn looks_like_transcript_loose(sample: &[String]) -> bool {
    sample.iter().any(|line| {
        let id = line.split('\t').next().map(str::trim).unwrap_or_default();
        !id.is_empty()
            && transcript_text_column(line).is_some_and(|text| text.contains(char::is_whitespace))
    })
}

fn header_tokens(header: &str) -> Vec<String> {
    header
        .split('\t')
        .map(|t| t.trim().trim_start_matches('\u{feff}').to_lowercase())
        .collect()
}

fn is_keyword(token: &str) -> bool {
    POLISH_KEYWORDS.contains(&token) || ENGLISH_KEYWORDS.contains(&token)
}

/// Tab-delimited first line with keyword, diacritic or at least two tokens
pub fn looks_like_metadata(header: &str) -> bool {
    if !header.contains('\t') {
        return false;
    }
    let tokens: Vec<String> = header_tokens(header).into_iter().filter(|t| !t.is_empty()).collect();
    tokens.iter().any(|t| is_keyword(t)) || has_polish_diacritics(header) || tokens.len() >= 2
}

/// Language of a metadata header not forced by file name
pub fn detect_language(header: &str) -> Language {
    let tokens = header_tokens(header);
    let polish = tokens
        .iter()
        .any(|t| has_polish_diacritics(t) || POLISH_KEYWORDS.contains(&t.as_str()));
    if polish {
        return Language::Pl;
    }
    if tokens.iter().any(|t| ENGLISH_KEYWORDS.contains(&t.as_str())) {
        return Language::En;
    }
    if header.is_ascii() {
        Language::En
    } else {
        Language::Pl
    }
}

/// Index of the identifier column; first column when no alias matches
pub fn find_id_column<S: AsRef<str>>(header: &[S]) -> usize {
    let lower: Vec<String> = header.iter().map(|h| h.as_ref().trim().to_lowercase()).collect();
    ID_COLUMN_ALIASES
        .iter()
        .find_map(|alias| lower.iter().position(|h| h == alias))
        .unwrap_or(0)
}

/// Classify from file name and sampled lines
pub fn classify_sample(file_name: &str, sample: &[String]) -> FileClass {
    if let Some(language) = explicit_language(file_name) {
        return FileClass::Metadata { language, forced: true };
    }

    if looks_like_transcript(sample) {
        return FileClass::Transcript;
    }
    if let Some(header) = sample.first() {
        if looks_like_metadata(header) {
            return FileClass::Metadata {
                language: detect_language(header),
                forced: false,
            };
        }
    }

    let retry = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| RETRY_EXTENSIONS.contains(&e.as_str()));
    if retry && looks_like_transcript_loose(sample) {
        return FileClass::Transcript;
    }
    FileClass::Unclassified
}

/// File classifier with a configured sample size
#[derive(Debug, Clone, Copy)]
pub struct FileClassifier {
    max_sample_lines: usize,
}

impl FileClassifier {
    pub fn new(max_sample_lines: usize) -> Self {
        Self {
            max_sample_lines: max_sample_lines.max(1),
        }
    }

    pub fn classify(&self, path: &Path) -> IngestResult<FileClass> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if let Some(language) = explicit_language(&file_name) {
            return Ok(FileClass::Metadata { language, forced: true });
        }
        let sample = read_sample_lines(path, self.max_sample_lines)?;
        let class = classify_sample(&file_name, &sample);
        tracing::debug!(path = %path.display(), class = ?class, "File classified");
        Ok(class)
    }
}
