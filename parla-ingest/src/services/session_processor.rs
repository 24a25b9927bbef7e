//! Per-session processing and shard writing
//!
//! One session = one backbone document plus its speaker documents and
//! `<date>.json`. Processing segments the backbone, numbers the resulting
//! utterances, matches speakers against the term roster and writes two shards
//! into `<output_dir>/<year>/`:
//!
//! - `<prefix>_combined.txt`: `id<TAB>line` per utterance
//! - `<prefix>_metadata.json`: `[{id, speaker, metadata: [record…]}]`
//!
//! The combined shard is written last and marks the session complete.

use parla_common::config::ResolvedConfig;
use parla_common::{SessionMetadata, Utterance, UtteranceMetadata};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{IngestError, IngestResult, Severity};
use crate::markup::MarkupDocument;
use crate::services::roster::Roster;
use crate::services::segmenter::{DirectoryPartials, DocumentSegmenter};
use crate::services::session_scanner::SessionLocation;
use crate::services::speaker_matcher::SpeakerMatcher;
use crate::services::subspeech_splitter::SubSpeechSplitter;
use crate::types::{BlockKind, SessionKey, SpeechBlock};

/// Roster file names tried per term, in order
pub const ROSTER_FILE_NAMES: &[&str] = &["deputies.csv", "deputies.tsv"];

/// Result of processing one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Shards written
    Processed { utterances: usize, degraded: usize },
    /// Combined shard already present
    SkippedExisting,
}

/// Totals for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped_existing: usize,
    /// Sessions whose term has no usable roster
    pub skipped_no_roster: usize,
    pub failed: usize,
    pub utterances: usize,
    pub degraded: usize,
}

impl BatchReport {
    fn record(&mut self, result: &IngestResult<SessionOutcome>) {
        match result {
            Ok(SessionOutcome::Processed { utterances, degraded }) => {
                self.processed += 1;
                self.utterances += utterances;
                self.degraded += degraded;
            }
            Ok(SessionOutcome::SkippedExisting) => self.skipped_existing += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Load session metadata from `<date>.json`
pub fn load_session_metadata(path: &Path) -> IngestResult<SessionMetadata> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Number blocks into utterances, 1-based and contiguous
pub fn build_utterances(key: &SessionKey, blocks: &[SpeechBlock]) -> Vec<Utterance> {
    blocks
        .iter()
        .filter_map(|block| {
            let text = block.text();
            if text.is_empty() {
                return None;
            }
            let speaker = match block.kind {
                BlockKind::Attributed => block.speaker_label.clone(),
                BlockKind::Contextual => None,
            };
            Some((speaker, text))
        })
        .enumerate()
        .map(|(i, (speaker, text))| {
            let sequence_index = (i + 1) as u32;
            Utterance {
                id: key.utterance_id(sequence_index),
                sequence_index,
                speaker,
                text,
            }
        })
        .collect()
}

/// `(combined, metadata)` shard paths for a session
pub fn shard_paths(output_dir: &Path, key: &SessionKey) -> (PathBuf, PathBuf) {
    let year_dir = output_dir.join(key.date.format("%Y").to_string());
    let prefix = key.prefix();
    (
        year_dir.join(format!("{}_combined.txt", prefix)),
        year_dir.join(format!("{}_metadata.json", prefix)),
    )
}

/// First existing roster file for a term
pub fn roster_path(roster_root: &Path, term: &str) -> Option<PathBuf> {
    ROSTER_FILE_NAMES
        .iter()
        .map(|name| roster_root.join(term).join(name))
        .find(|path| path.is_file())
}

/// Session pipeline driver
pub struct SessionProcessor {
    segmenter: DocumentSegmenter,
    output_dir: PathBuf,
    roster_root: PathBuf,
    force: bool,
    jobs: Option<usize>,
}

impl SessionProcessor {
    pub fn new(config: &ResolvedConfig) -> Self {
        Self {
            segmenter: DocumentSegmenter::new(SubSpeechSplitter::new(config.splitter)),
            output_dir: config.output_dir.clone(),
            roster_root: config.roster_root.clone(),
            force: false,
            jobs: None,
        }
    }

    /// Rewrite shards even when the session is already complete
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Worker threads for batch runs (`None` = rayon default)
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Segment one session into utterances plus recovered warnings
    pub fn extract(&self, location: &SessionLocation) -> IngestResult<(Vec<Utterance>, Vec<IngestError>)> {
        let session = location.key.to_string();

        let backbone_path = location.backbone_path();
        let backbone = MarkupDocument::load(&backbone_path).map_err(|e| {
            IngestError::fatal_session(&session, format!("backbone {}: {}", backbone_path.display(), e))
        })?;

        let metadata_path = location.metadata_path();
        let metadata = load_session_metadata(&metadata_path).map_err(|e| {
            IngestError::fatal_session(&session, format!("metadata {}: {}", metadata_path.display(), e))
        })?;

        let partials = DirectoryPartials::new(&location.dir, &location.stem, &location.extension);
        let (format, segmentation) = self.segmenter.segment(&backbone, &partials, Some(&metadata));
        for warning in &segmentation.warnings {
            tracing::warn!(session = %session, "{}", warning);
        }

        let utterances = build_utterances(&location.key, &segmentation.blocks);
        tracing::debug!(
            session = %session,
            format = ?format,
            utterances = utterances.len(),
            "Session segmented"
        );
        Ok((utterances, segmentation.warnings))
    }

    /// Process one session against its term roster
    pub fn process_session(
        &self,
        location: &SessionLocation,
        roster: &Roster,
    ) -> IngestResult<SessionOutcome> {
        let (combined_path, metadata_path) = shard_paths(&self.output_dir, &location.key);
        if combined_path.exists() && !self.force {
            tracing::debug!(
                session = %location.key,
                path = %combined_path.display(),
                "Session already processed, skipping"
            );
            return Ok(SessionOutcome::SkippedExisting);
        }

        let (utterances, warnings) = self.extract(location)?;
        let matcher = SpeakerMatcher::new(roster);
        let metadata: Vec<UtteranceMetadata> = utterances.iter().map(|u| matcher.attach(u)).collect();

        write_shards(&combined_path, &metadata_path, &utterances, &metadata)?;
        tracing::info!(
            session = %location.key,
            utterances = utterances.len(),
            path = %combined_path.display(),
            "Shards written"
        );

        Ok(SessionOutcome::Processed {
            utterances: utterances.len(),
            degraded: warnings.len(),
        })
    }

    /// Process many sessions in parallel; failures are logged and counted
    pub fn run_batch(&self, sessions: &[SessionLocation]) -> IngestResult<BatchReport> {
        let rosters = self.load_rosters(sessions);
        let mut report = BatchReport::default();

        let runnable: Vec<(&SessionLocation, &Roster)> = sessions
            .iter()
            .filter_map(|location| match rosters.get(&location.key.term) {
                Some(roster) => Some((location, roster)),
                None => {
                    report.skipped_no_roster += 1;
                    None
                }
            })
            .collect();

        let run = || -> Vec<IngestResult<SessionOutcome>> {
            runnable
                .par_iter()
                .map(|(location, roster)| {
                    let result = self.process_session(location, roster);
                    if let Err(e) = &result {
                        match e.severity() {
                            Severity::Degraded | Severity::Skipped => {
                                tracing::warn!(session = %location.key, "{}", e)
                            }
                            _ => tracing::error!(session = %location.key, "{}", e),
                        }
                    }
                    result
                })
                .collect()
        };

        let results = match self.jobs {
            Some(jobs) => rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|e| parla_common::Error::Internal(format!("Thread pool: {}", e)))?
                .install(run),
            None => run(),
        };

        for result in &results {
            report.record(result);
        }

        tracing::info!(
            processed = report.processed,
            skipped_existing = report.skipped_existing,
            skipped_no_roster = report.skipped_no_roster,
            failed = report.failed,
            utterances = report.utterances,
            degraded = report.degraded,
            "Batch complete"
        );
        Ok(report)
    }

    /// One roster per distinct term; terms without a usable roster are left out
    fn load_rosters(&self, sessions: &[SessionLocation]) -> HashMap<String, Roster> {
        let mut rosters = HashMap::new();
        let mut missing: Vec<&str> = Vec::new();

        for location in sessions {
            let term = location.key.term.as_str();
            if rosters.contains_key(term) || missing.contains(&term) {
                continue;
            }
            let loaded = match roster_path(&self.roster_root, term) {
                Some(path) => match Roster::load(&path) {
                    Ok(roster) => Some(roster),
                    Err(e) => {
                        tracing::warn!(term = %term, path = %path.display(), "Roster unusable: {}", e);
                        None
                    }
                },
                None => {
                    tracing::warn!(
                        term = %term,
                        root = %self.roster_root.display(),
                        "No roster for term, skipping its sessions"
                    );
                    None
                }
            };
            match loaded {
                Some(roster) => {
                    rosters.insert(term.to_string(), roster);
                }
                None => missing.push(term),
            }
        }
        rosters
    }
}

fn write_shards(
    combined_path: &Path,
    metadata_path: &Path,
    utterances: &[Utterance],
    metadata: &[UtteranceMetadata],
) -> IngestResult<()> {
    if let Some(parent) = combined_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(metadata)?;
    std::fs::write(metadata_path, json)?;

    let mut combined = String::new();
    for utterance in utterances {
        combined.push_str(&utterance.id);
        combined.push('\t');
        combined.push_str(&utterance.line_text());
        combined.push('\n');
    }
    std::fs::write(combined_path, combined)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn key() -> SessionKey {
        SessionKey::new("10", "1", NaiveDate::from_ymd_opt(2023, 11, 13).unwrap())
    }

    #[test]
    fn test_build_utterances_contiguous() {
        let blocks = vec![
            SpeechBlock::contextual("(Początek posiedzenia)"),
            SpeechBlock::attributed("Marszałek", "Otwieram posiedzenie."),
            SpeechBlock::contextual("   "),
            SpeechBlock::attributed("Poseł Jan Kowalski", "Dziękuję."),
        ];
        let utterances = build_utterances(&key(), &blocks);

        let seq: Vec<_> = utterances.iter().map(|u| u.sequence_index).collect();
        assert_eq!(seq, vec![1, 2, 3]);
        assert_eq!(utterances[0].id, "10_1_2023-11-13_1");
        assert!(utterances[0].speaker.is_none());
        assert_eq!(utterances[2].speaker.as_deref(), Some("Poseł Jan Kowalski"));
    }

    #[test]
    fn test_shard_paths_use_year_dir() {
        let (combined, metadata) = shard_paths(Path::new("out"), &key());
        assert_eq!(combined, Path::new("out/2023/10_1_2023-11-13_combined.txt"));
        assert_eq!(metadata, Path::new("out/2023/10_1_2023-11-13_metadata.json"));
    }

    #[test]
    fn test_batch_report_counts() {
        let mut report = BatchReport::default();
        report.record(&Ok(SessionOutcome::Processed { utterances: 4, degraded: 1 }));
        report.record(&Ok(SessionOutcome::SkippedExisting));
        report.record(&Err(IngestError::fatal_session("10_1_2023-11-13", "missing")));

        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped_existing, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.utterances, 4);
        assert_eq!(report.degraded, 1);
    }
}
