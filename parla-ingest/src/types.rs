//! Core types for session processing
//!
//! - [`SpeechBlock`]: intermediate segmenter output, never persisted
//! - [`SessionKey`]: term × sitting × date identity of one session

use chrono::NaiveDate;
use parla_common::text::join_fragments;
use std::fmt;

/// Block classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Speaker + text
    Attributed,
    /// Narration without speaker
    Contextual,
}

/// One raw block produced while scanning a backbone document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechBlock {
    pub speaker_label: Option<String>,
    pub text_fragments: Vec<String>,
    pub kind: BlockKind,
}

impl SpeechBlock {
    pub fn attributed(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker_label: Some(speaker.into()),
            text_fragments: vec![text.into()],
            kind: BlockKind::Attributed,
        }
    }

    pub fn contextual(text: impl Into<String>) -> Self {
        Self {
            speaker_label: None,
            text_fragments: vec![text.into()],
            kind: BlockKind::Contextual,
        }
    }

    /// Fragments joined with single spaces and whitespace-normalized
    pub fn text(&self) -> String {
        join_fragments(&self.text_fragments)
    }
}

/// Identity of one session (one backbone document)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub term: String,
    pub sitting: String,
    pub date: NaiveDate,
}

impl SessionKey {
    pub fn new(term: impl Into<String>, sitting: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            term: term.into(),
            sitting: sitting.into(),
            date,
        }
    }

    /// `YYYY-MM-DD`, the file stem shared by all of the session's documents
    pub fn date_stem(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Prefix shared by utterance ids and shard file names
    pub fn prefix(&self) -> String {
        format!("{}_{}_{}", self.term, self.sitting, self.date_stem())
    }

    /// Utterance id for a 1-based sequence index
    pub fn utterance_id(&self, sequence_index: u32) -> String {
        format!("{}_{}", self.prefix(), sequence_index)
    }

    /// Statement id used by the statement export
    pub fn statement_id(&self, num: u32) -> String {
        format!("{}_{}_{}", self.term, self.sitting, num)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_ids() {
        let key = SessionKey::new("10", "1", NaiveDate::from_ymd_opt(2023, 11, 13).unwrap());
        assert_eq!(key.prefix(), "10_1_2023-11-13");
        assert_eq!(key.utterance_id(7), "10_1_2023-11-13_7");
        assert_eq!(key.statement_id(3), "10_1_3");
    }

    #[test]
    fn test_block_text_joins_fragments() {
        let block = SpeechBlock {
            speaker_label: Some("Marszałek".to_string()),
            text_fragments: vec!["Dzień dobry.".to_string(), " Otwieram\u{a0}posiedzenie. ".to_string()],
            kind: BlockKind::Attributed,
        };
        assert_eq!(block.text(), "Dzień dobry. Otwieram posiedzenie.");
    }
}
