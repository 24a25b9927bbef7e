//! Canonical corpus output
//!
//! Transcripts as `id<TAB>text` lines in first-seen order. Metadata as one
//! tab-separated table per language: display-name header, one row per id,
//! missing cells written as empty strings. A language without columns gets an
//! empty file.

use parla_common::Language;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::corpus::merger::{MergedCorpus, MetadataTable, TranscriptTable};
use crate::error::IngestResult;

fn create(path: &Path) -> IngestResult<BufWriter<std::fs::File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(std::fs::File::create(path)?))
}

pub fn write_transcripts(table: &TranscriptTable, path: &Path) -> IngestResult<()> {
    let mut out = create(path)?;
    for (id, text) in table.rows() {
        writeln!(out, "{}\t{}", id, text)?;
    }
    out.flush()?;
    tracing::info!(path = %path.display(), records = table.len(), "Transcripts written");
    Ok(())
}

pub fn write_metadata(table: &MetadataTable, path: &Path) -> IngestResult<()> {
    let mut out = create(path)?;
    let columns = table.output_columns();
    if !columns.is_empty() {
        let header: Vec<&str> = columns.iter().map(|c| table.display_name(c)).collect();
        writeln!(out, "{}", header.join("\t"))?;
        for (_, row) in table.rows() {
            let cells: Vec<&str> = columns
                .iter()
                .map(|c| row.get(c).map(String::as_str).unwrap_or(""))
                .collect();
            writeln!(out, "{}", cells.join("\t"))?;
        }
    }
    out.flush()?;
    tracing::info!(path = %path.display(), records = table.len(), "Metadata written");
    Ok(())
}

/// Write all three canonical outputs
pub fn write_corpus(
    corpus: &MergedCorpus,
    transcripts_path: &Path,
    metadata_pl_path: &Path,
    metadata_en_path: &Path,
) -> IngestResult<()> {
    write_transcripts(&corpus.transcripts, transcripts_path)?;
    write_metadata(corpus.metadata(Language::Pl), metadata_pl_path)?;
    write_metadata(corpus.metadata(Language::En), metadata_en_path)?;
    Ok(())
}
