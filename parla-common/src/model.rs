//! Corpus data model shared by session processing and corpus merging

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// One speaker-attributed (or narration) unit of a session transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// `<term>_<sitting>_<date>_<sequence_index>`
    pub id: String,
    /// 1-based, contiguous within a session
    pub sequence_index: u32,
    /// `None` marks narration/context
    pub speaker: Option<String>,
    /// Whitespace-normalized text
    pub text: String,
}

impl Utterance {
    /// Text as written to a combined shard line: `"<speaker>: <text>"` for
    /// attributed utterances, bare text for narration.
    pub fn line_text(&self) -> String {
        match &self.speaker {
            Some(speaker) => format!("{}: {}", speaker, self.text),
            None => self.text.clone(),
        }
    }

    /// True for narration/context utterances
    pub fn is_contextual(&self) -> bool {
        self.speaker.is_none()
    }
}

/// One roster row: an ordered open mapping of column name to optional value.
///
/// Column order follows the roster header and is preserved on serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerRecord {
    fields: Vec<(String, Option<String>)>,
}

impl SpeakerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append or replace a column value
    pub fn insert(&mut self, column: impl Into<String>, value: Option<String>) {
        let column = column.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Value of a column; `None` both for absent columns and null cells
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.fields.iter().any(|(c, _)| c == column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for SpeakerRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Per-utterance roster attachment written to the session metadata shard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtteranceMetadata {
    pub id: String,
    pub speaker: Option<String>,
    /// Roster rows whose name occurs in the speaker label, in roster order
    #[serde(rename = "metadata")]
    pub matched_records: Vec<SpeakerRecord>,
}

/// Metadata table language variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Pl,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Pl => "pl",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One statement entry of a session metadata document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementDescriptor {
    #[serde(default)]
    pub num: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub start_date_time: Option<String>,
    #[serde(default)]
    pub end_date_time: Option<String>,
}

/// Session metadata document (`<date>.json` next to the backbone)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    #[serde(default)]
    pub statements: Vec<StatementDescriptor>,
}

impl SessionMetadata {
    /// Statement descriptor with the given number, if listed
    pub fn statement(&self, num: u32) -> Option<&StatementDescriptor> {
        self.statements.iter().find(|s| s.num == Some(num))
    }
}
