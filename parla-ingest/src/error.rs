//! Error types for parla-ingest
//!
//! Four recovery classes:
//! - Fatal for one session (skip it, continue the batch)
//! - Degraded extraction (empty or partial output for one unit)
//! - Skipped file (cannot be classified, counted and logged)
//! - Hard stop (row-count mismatch at dataset load, surfaced to the caller)

use std::path::PathBuf;
use thiserror::Error;

/// How a batch driver should react to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Skip the session, log, continue
    Fatal,
    /// Keep going with empty/partial output for the unit
    Degraded,
    /// Skip the file with a warning
    Skipped,
    /// Abort and report to the caller
    HardStop,
}

/// Ingest pipeline error type
#[derive(Debug, Error)]
pub enum IngestError {
    /// Backbone or session metadata document missing/unreadable
    #[error("Session {session} skipped: {reason}")]
    FatalSession { session: String, reason: String },

    /// A referenced partial document or sub-block could not be extracted
    #[error("Degraded extraction for {}: {reason}", path.display())]
    DegradedExtraction { path: PathBuf, reason: String },

    /// File is neither a transcript nor a metadata table
    #[error("Could not classify {}", .0.display())]
    ClassificationAmbiguity(PathBuf),

    /// Dataset record counts differ
    #[error(
        "Record counts differ (transcripts, metadata, labels) = ({transcripts}, {metadata}, {labels})"
    )]
    SchemaViolation {
        transcripts: usize,
        metadata: usize,
        labels: usize,
    },

    /// Roster has no name-bearing column
    #[error("Roster has no name column. Available columns: {}", available.join(", "))]
    MissingNameColumn { available: Vec<String> },

    /// Input root is not a usable directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// parla-common error
    #[error("Common error: {0}")]
    Common(#[from] parla_common::Error),
}

impl IngestError {
    pub fn fatal_session(session: impl Into<String>, reason: impl Into<String>) -> Self {
        IngestError::FatalSession {
            session: session.into(),
            reason: reason.into(),
        }
    }

    pub fn degraded(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        IngestError::DegradedExtraction {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            IngestError::FatalSession { .. } | IngestError::MissingNameColumn { .. } => {
                Severity::Fatal
            }
            IngestError::DegradedExtraction { .. } => Severity::Degraded,
            IngestError::ClassificationAmbiguity(_) => Severity::Skipped,
            IngestError::SchemaViolation { .. } | IngestError::NotADirectory(_) => {
                Severity::HardStop
            }
            IngestError::Io(_) | IngestError::Json(_) | IngestError::Common(_) => Severity::Fatal,
        }
    }
}

/// Result type for ingest operations
pub type IngestResult<T> = Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_violation_reports_counts() {
        let err = IngestError::SchemaViolation {
            transcripts: 10,
            metadata: 10,
            labels: 9,
        };
        assert!(err.to_string().contains("(10, 10, 9)"));
        assert_eq!(err.severity(), Severity::HardStop);
    }

    #[test]
    fn test_severity_classes() {
        assert_eq!(
            IngestError::fatal_session("10_1_2023-11-13", "missing backbone").severity(),
            Severity::Fatal
        );
        assert_eq!(
            IngestError::degraded("/tmp/x_3.html", "missing").severity(),
            Severity::Degraded
        );
        assert_eq!(
            IngestError::ClassificationAmbiguity(PathBuf::from("notes.bin")).severity(),
            Severity::Skipped
        );
    }
}
