//! Speaker roster loading
//!
//! Reads a delimited roster table (deputies list) into ordered
//! [`SpeakerRecord`]s. The delimiter comes from the extension (`.tsv`) or is
//! sniffed from the header line. Empty cells become `None`; rows are never
//! dropped.

use parla_common::SpeakerRecord;
use std::path::Path;

use crate::error::{IngestError, IngestResult};

/// Canonical name column
pub const NAME_COLUMN: &str = "name";

/// Columns accepted as the name column when `name` is absent, in priority order
pub const NAME_COLUMN_ALIASES: &[&str] = &["firstLastName", "Speaker_name", "speaker"];

/// Read-only roster shared by every matcher call for a term
#[derive(Debug, Clone, Default)]
pub struct Roster {
    columns: Vec<String>,
    records: Vec<SpeakerRecord>,
}

impl Roster {
    /// Load a roster file
    pub fn load(path: &Path) -> IngestResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let is_tsv = path
            .extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case("tsv"))
            .unwrap_or(false);

        let delimiter = if is_tsv {
            '\t'
        } else {
            sniff_delimiter(text.lines().next().unwrap_or_default())
        };

        let roster = Self::parse(&text, delimiter)?;
        tracing::debug!(
            path = %path.display(),
            rows = roster.len(),
            "Roster loaded"
        );
        Ok(roster)
    }

    /// Parse roster text with a known delimiter
    pub fn parse(text: &str, delimiter: char) -> IngestResult<Self> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header = match lines.next() {
            Some(line) => split_record(line.trim_start_matches('\u{feff}'), delimiter),
            None => return Err(IngestError::MissingNameColumn { available: Vec::new() }),
        };
        let mut columns: Vec<String> = header.into_iter().map(|h| h.trim().to_string()).collect();

        // `name` is materialized from the first available alias
        let alias_index = if columns.iter().any(|c| c == NAME_COLUMN) {
            None
        } else {
            let found = NAME_COLUMN_ALIASES
                .iter()
                .find_map(|alias| columns.iter().position(|c| c == alias));
            match found {
                Some(idx) => Some(idx),
                None => {
                    return Err(IngestError::MissingNameColumn { available: columns });
                }
            }
        };

        let records = lines
            .map(|line| {
                let cells = split_record(line, delimiter);
                let mut record = SpeakerRecord::new();
                for (i, column) in columns.iter().enumerate() {
                    let value = cells
                        .get(i)
                        .map(|v| v.trim())
                        .filter(|v| !v.is_empty())
                        .map(str::to_string);
                    record.insert(column.clone(), value);
                }
                if let Some(idx) = alias_index {
                    let value = record.get(&columns[idx]).map(str::to_string);
                    record.insert(NAME_COLUMN, value);
                }
                record
            })
            .collect();

        if alias_index.is_some() {
            columns.push(NAME_COLUMN.to_string());
        }

        Ok(Self { columns, records })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[SpeakerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Tab if present in the header, then semicolon, then comma
pub fn sniff_delimiter(header: &str) -> char {
    if header.contains('\t') {
        '\t'
    } else if header.contains(';') {
        ';'
    } else {
        ','
    }
}

/// Split one delimited line, honoring double-quoted fields and `""` escapes
pub fn split_record(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' if in_quotes => in_quotes = false,
            '"' if current.is_empty() => in_quotes = true,
            c if c == delimiter && !in_quotes => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_record_with_quotes() {
        assert_eq!(
            split_record(r#"12,"Kowalski, Jan","PiS ""Klub""",,"#, ','),
            vec!["12", "Kowalski, Jan", r#"PiS "Klub""#, "", ""]
        );
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("id\tname"), '\t');
        assert_eq!(sniff_delimiter("id;name"), ';');
        assert_eq!(sniff_delimiter("id,name"), ',');
    }

    #[test]
    fn test_parse_keeps_empty_rows_as_null() {
        let roster = Roster::parse("name,club\nJan Kowalski,KO\n,\n", ',').unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.records()[0].get("club"), Some("KO"));
        assert!(roster.records()[1].iter().all(|(_, v)| v.is_none()));
    }

    #[test]
    fn test_alias_column_becomes_name() {
        let roster = Roster::parse("id,firstLastName\n1,Anna Nowak\n", ',').unwrap();
        assert_eq!(roster.columns().last().map(String::as_str), Some("name"));
        assert_eq!(roster.records()[0].get("name"), Some("Anna Nowak"));
        assert_eq!(roster.records()[0].get("firstLastName"), Some("Anna Nowak"));
    }

    #[test]
    fn test_missing_name_column_lists_available() {
        match Roster::parse("id,club\n1,KO\n", ',') {
            Err(IngestError::MissingNameColumn { available }) => {
                assert_eq!(available, vec!["id", "club"]);
            }
            other => panic!("Expected MissingNameColumn, got {:?}", other),
        }
    }
}
