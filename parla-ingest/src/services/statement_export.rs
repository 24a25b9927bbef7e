//! Statement export
//!
//! Emits one record per statement descriptor of a session. Statement 0 is the
//! sitting preamble taken from the backbone; every other statement is the body
//! of its speaker document. Outputs a JSON-lines text file and a TSV of the
//! descriptor fields.

use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::error::{IngestError, IngestResult};
use crate::markup::MarkupDocument;
use crate::services::segmenter::{backbone_preamble, DirectoryPartials, PartialDocumentSource, SpeakerDocument};
use crate::services::session_processor::load_session_metadata;
use crate::services::session_scanner::SessionLocation;

/// TSV header of the statement table
pub const STATEMENT_COLUMNS: &[&str] = &["id", "num", "name", "function", "startDateTime", "endDateTime"];

/// One exported statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRecord {
    pub id: String,
    pub num: u32,
    pub name: Option<String>,
    pub function: Option<String>,
    pub start_date_time: Option<String>,
    pub end_date_time: Option<String>,
    pub text: String,
}

#[derive(Serialize)]
struct StatementLine<'a> {
    id: &'a str,
    text: &'a str,
}

/// Build statement records for one session
pub fn collect_statements(location: &SessionLocation) -> IngestResult<Vec<StatementRecord>> {
    let session = location.key.to_string();
    let metadata = load_session_metadata(&location.metadata_path())
        .map_err(|e| IngestError::fatal_session(&session, format!("metadata: {}", e)))?;
    let backbone = MarkupDocument::load(&location.backbone_path())
        .map_err(|e| IngestError::fatal_session(&session, format!("backbone: {}", e)))?;
    let partials = DirectoryPartials::new(&location.dir, &location.stem, &location.extension);

    let mut records = Vec::with_capacity(metadata.statements.len());
    for statement in &metadata.statements {
        let Some(num) = statement.num else {
            continue;
        };
        let text = if num == 0 {
            backbone_preamble(&backbone)
        } else {
            statement_body(&partials, num)
        };
        records.push(StatementRecord {
            id: location.key.statement_id(num),
            num,
            name: statement.name.clone(),
            function: statement.function.clone(),
            start_date_time: statement.start_date_time.clone(),
            end_date_time: statement.end_date_time.clone(),
            text,
        });
    }

    tracing::debug!(session = %session, statements = records.len(), "Statements collected");
    Ok(records)
}

/// Paragraphs after the speaker heading, newline-joined; empty on failure
fn statement_body(partials: &dyn PartialDocumentSource, num: u32) -> String {
    let path = partials.partial_path(num);
    match partials.load_partial(num) {
        Ok(Some(doc)) => match SpeakerDocument::extract(&doc) {
            Some(speaker_doc) => speaker_doc.paragraphs.join("\n"),
            None => {
                tracing::warn!(path = %path.display(), "Speaker document has no speaker heading");
                String::new()
            }
        },
        Ok(None) => {
            tracing::warn!(path = %path.display(), "Speaker document missing");
            String::new()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "Speaker document unreadable: {}", e);
            String::new()
        }
    }
}

/// Write `statements.jsonl`-style text lines and the descriptor TSV
pub fn write_statements(records: &[StatementRecord], jsonl_path: &Path, tsv_path: &Path) -> IngestResult<()> {
    for path in [jsonl_path, tsv_path] {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut jsonl = std::io::BufWriter::new(std::fs::File::create(jsonl_path)?);
    for record in records {
        let line = serde_json::to_string(&StatementLine {
            id: &record.id,
            text: &record.text,
        })?;
        writeln!(jsonl, "{}", line)?;
    }
    jsonl.flush()?;

    let mut tsv = std::io::BufWriter::new(std::fs::File::create(tsv_path)?);
    writeln!(tsv, "{}", STATEMENT_COLUMNS.join("\t"))?;
    for record in records {
        let num = record.num.to_string();
        let row = [
            record.id.as_str(),
            num.as_str(),
            tsv_cell(&record.name),
            tsv_cell(&record.function),
            tsv_cell(&record.start_date_time),
            tsv_cell(&record.end_date_time),
        ];
        writeln!(tsv, "{}", row.join("\t"))?;
    }
    tsv.flush()?;

    tracing::info!(
        statements = records.len(),
        jsonl = %jsonl_path.display(),
        tsv = %tsv_path.display(),
        "Statements exported"
    );
    Ok(())
}

fn tsv_cell(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}
