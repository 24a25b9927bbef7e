//! Sub-speech splitting for roll-call blocks
//!
//! A speaker document normally holds one deliberative speech. Roll calls and
//! oath sections instead pack dozens of one-line attributions
//! (`Poseł Jan Kowalski: Ślubuję.`) into a single document. When enough short
//! role-prefixed matches are found the document is split into one attributed
//! block per match; otherwise it stays one block under the outer speaker.

use once_cell::sync::Lazy;
use parla_common::config::SplitterConfig;
use parla_common::text::normalize_whitespace;
use regex::Regex;

use crate::types::SpeechBlock;

/// Role prefixes that open an embedded attribution
pub const ROLL_CALL_PREFIXES: &[&str] = &["Posłanka", "Poseł"];

static SUB_SPEAKER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let prefixes = ROLL_CALL_PREFIXES.join("|");
    Regex::new(&format!(r"\b(?P<prefix>{})\s+(?P<name>[^:]{{1,100}}?)\s*:", prefixes))
        .expect("static sub-speaker pattern")
});

/// One embedded attribution found in a speaker document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubSpeech {
    pub speaker: String,
    pub text: String,
}

/// Outcome of inspecting one speaker document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitDecision {
    /// Keep the document as a single block
    Single,
    /// Replace the document with these attributions
    Compound(Vec<SubSpeech>),
}

/// Roll-call detector
#[derive(Debug, Clone, Copy, Default)]
pub struct SubSpeechSplitter {
    config: SplitterConfig,
}

impl SubSpeechSplitter {
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    /// All non-overlapping `<prefix> <name>: <text>` matches, in order.
    ///
    /// Each match's text runs until the next match or the end of the document.
    /// Matches with an empty body are kept; they still count toward the threshold.
    pub fn extract(&self, text: &str) -> Vec<SubSpeech> {
        let markers: Vec<_> = SUB_SPEAKER_PATTERN.captures_iter(text).collect();
        let mut speeches = Vec::with_capacity(markers.len());

        for (i, caps) in markers.iter().enumerate() {
            let (Some(whole), Some(prefix), Some(name)) =
                (caps.get(0), caps.name("prefix"), caps.name("name"))
            else {
                continue;
            };
            let end = markers
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(text.len());

            speeches.push(SubSpeech {
                speaker: normalize_whitespace(&format!("{} {}", prefix.as_str(), name.as_str())),
                text: normalize_whitespace(&text[whole.end()..end]),
            });
        }

        speeches
    }

    /// Decide between single and compound handling
    pub fn decide(&self, text: &str) -> SplitDecision {
        let speeches = self.extract(text);
        if speeches.len() < self.config.min_matches {
            return SplitDecision::Single;
        }

        let total_chars: usize = speeches.iter().map(|s| s.text.chars().count()).sum();
        let mean = total_chars as f64 / speeches.len() as f64;
        if mean < self.config.max_mean_chars as f64 {
            tracing::debug!(
                matches = speeches.len(),
                mean_chars = mean,
                "Roll-call block detected, splitting"
            );
            SplitDecision::Compound(speeches)
        } else {
            SplitDecision::Single
        }
    }

    /// Turn one speaker document's text into attributed blocks
    pub fn split(&self, outer_speaker: &str, text: &str) -> Vec<SpeechBlock> {
        match self.decide(text) {
            SplitDecision::Compound(speeches) => speeches
                .into_iter()
                .filter(|s| !s.text.is_empty())
                .map(|s| SpeechBlock::attributed(s.speaker, s.text))
                .collect(),
            SplitDecision::Single => vec![SpeechBlock::attributed(outer_speaker, text)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roll_call(n: usize) -> String {
        (1..=n)
            .map(|i| format!("Poseł Jan Kowalski{}: Ślubuję.", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_extract_runs_until_next_match() {
        let splitter = SubSpeechSplitter::default();
        let speeches =
            splitter.extract("Poseł Anna Nowak: Ślubuję, tak mi dopomóż Bóg. Posłanka Ewa Lis: Ślubuję.");

        assert_eq!(speeches.len(), 2);
        assert_eq!(speeches[0].speaker, "Poseł Anna Nowak");
        assert_eq!(speeches[0].text, "Ślubuję, tak mi dopomóż Bóg.");
        assert_eq!(speeches[1].speaker, "Posłanka Ewa Lis");
        assert_eq!(speeches[1].text, "Ślubuję.");
    }

    #[test]
    fn test_five_short_matches_split() {
        let splitter = SubSpeechSplitter::default();
        let blocks = splitter.split("Marszałek", &roll_call(5));

        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[0].speaker_label.as_deref(), Some("Poseł Jan Kowalski1"));
        assert_eq!(blocks[4].text(), "Ślubuję.");
    }

    #[test]
    fn test_four_matches_stay_single() {
        let splitter = SubSpeechSplitter::default();
        let text = roll_call(4);
        let blocks = splitter.split("Marszałek Sejmu", &text);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].speaker_label.as_deref(), Some("Marszałek Sejmu"));
        assert_eq!(blocks[0].text_fragments, vec![text]);
    }

    #[test]
    fn test_long_matches_stay_single() {
        let splitter = SubSpeechSplitter::default();
        let long_reply = "Panie Marszałku! Wysoka Izbo! Chciałbym odnieść się do projektu ustawy budżetowej.";
        let text = (1..=6)
            .map(|i| format!("Poseł Osoba{}: {}", i, long_reply))
            .collect::<Vec<_>>()
            .join(" ");

        assert_eq!(splitter.extract(&text).len(), 6);
        assert_eq!(splitter.decide(&text), SplitDecision::Single);
    }

    #[test]
    fn test_mean_exactly_at_threshold_stays_single() {
        let splitter = SubSpeechSplitter::default();
        let fifty = "a".repeat(50);
        let text = (1..=5)
            .map(|i| format!("Poseł X{}: {}", i, fifty))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(splitter.decide(&text), SplitDecision::Single);
    }

    #[test]
    fn test_empty_matches_count_toward_threshold() {
        let splitter = SubSpeechSplitter::default();
        let text = "Poseł A1: Poseł A2: Poseł A3: Ślubuję. Poseł A4: Ślubuję. Poseł A5: Ślubuję.";

        assert_eq!(splitter.extract(text).len(), 5);
        assert!(matches!(splitter.decide(text), SplitDecision::Compound(_)));

        let blocks = splitter.split("Marszałek", text);
        let labels: Vec<_> = blocks.iter().map(|b| b.speaker_label.as_deref()).collect();
        assert_eq!(labels, vec![Some("Poseł A3"), Some("Poseł A4"), Some("Poseł A5")]);
    }

    #[test]
    fn test_custom_thresholds() {
        let splitter = SubSpeechSplitter::new(SplitterConfig {
            min_matches: 2,
            max_mean_chars: 50,
        });
        assert!(matches!(splitter.decide(&roll_call(2)), SplitDecision::Compound(_)));
    }
}
