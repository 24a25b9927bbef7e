//! Speaker–roster matching
//!
//! A roster row matches when its `name` value is a case-sensitive substring of
//! the speaker label (labels carry titles such as "Poseł" or "Marszałek Sejmu"
//! in front of the bare name). No match and several matches are both valid
//! outcomes; matches keep roster order and are never deduplicated.

use parla_common::{SpeakerRecord, Utterance, UtteranceMetadata};

use crate::services::roster::{Roster, NAME_COLUMN};

/// Matcher bound to one roster
#[derive(Debug, Clone, Copy)]
pub struct SpeakerMatcher<'a> {
    roster: &'a Roster,
}

impl<'a> SpeakerMatcher<'a> {
    pub fn new(roster: &'a Roster) -> Self {
        Self { roster }
    }

    /// Roster rows whose name occurs in `label`, in roster order
    pub fn match_label(&self, label: &str) -> Vec<SpeakerRecord> {
        self.roster
            .records()
            .iter()
            .filter(|record| {
                record
                    .get(NAME_COLUMN)
                    .is_some_and(|name| !name.is_empty() && label.contains(name))
            })
            .cloned()
            .collect()
    }

    /// Metadata entry for one utterance; narration gets no records
    pub fn attach(&self, utterance: &Utterance) -> UtteranceMetadata {
        let matched_records = match &utterance.speaker {
            Some(label) => self.match_label(label),
            None => Vec::new(),
        };
        if utterance.speaker.is_some() && matched_records.is_empty() {
            tracing::trace!(id = %utterance.id, "Speaker not found in roster");
        }

        UtteranceMetadata {
            id: utterance.id.clone(),
            speaker: utterance.speaker.clone(),
            matched_records,
        }
    }
}
