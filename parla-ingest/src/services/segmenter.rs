//! Document segmentation
//!
//! Turns a backbone document (plus its sibling speaker documents) into an
//! ordered list of [`SpeechBlock`]s. Two markup conventions exist:
//!
//! - **New:** the backbone holds narration paragraphs and speaker-link
//!   paragraphs (`p.mowca-link`) whose named anchor points at a per-statement
//!   speaker document `<date>_<n>.html`.
//! - **Legacy:** the backbone alone holds everything; a speaker change is an
//!   emphasized paragraph (`<b>` + `<font>`) that ends with a colon or opens
//!   with a role title.
//!
//! Detection runs once per backbone before scanning and is never revisited.

use parla_common::text::{join_fragments, strip_label_colon};
use parla_common::SessionMetadata;
use std::path::{Path, PathBuf};

use crate::error::{IngestError, IngestResult};
use crate::markup::{MarkupDocument, MarkupElement};
use crate::services::context_coalescer::ContextCoalescer;
use crate::services::subspeech_splitter::SubSpeechSplitter;
use crate::types::{BlockKind, SpeechBlock};

/// Paragraph classes that select the new convention during detection
pub const SPEAKER_LINK_CLASSES: &[&str] = &["mowca-link", "mowca-link1"];

/// Paragraph class resolved to a speaker document while scanning
pub const SPEAKER_LINK_CLASS: &str = "mowca-link";

/// Heading class opening the speech in a speaker document
pub const SPEAKER_HEADING_CLASS: &str = "mowca";

/// Role titles that make an emphasized legacy paragraph a speaker marker
pub const LEGACY_ROLE_PREFIXES: &[&str] = &[
    "Marszałek",
    "Wicemarszałek",
    "Poseł",
    "Sekretarz",
    "Minister",
    "Podsekretarz",
    "Sekretarz Stanu",
    "Prezydent",
    "Prezes",
    "Główny",
    "Wiceprezes",
    "Sprawozdawca",
];

/// Markup convention of one backbone document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupFormat {
    Legacy,
    New,
}

/// Access to the speaker documents that belong to one backbone
pub trait PartialDocumentSource {
    /// True if a speaker document with a non-zero index exists
    fn has_nonzero_partials(&self) -> bool;

    /// Load speaker document `index`; `Ok(None)` when it does not exist
    fn load_partial(&self, index: u32) -> IngestResult<Option<MarkupDocument>>;

    /// Location used in diagnostics
    fn partial_path(&self, index: u32) -> PathBuf;
}

/// Speaker documents stored next to the backbone as `<stem>_<n>.<ext>`
#[derive(Debug, Clone)]
pub struct DirectoryPartials {
    dir: PathBuf,
    stem: String,
    extension: String,
}

impl DirectoryPartials {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
            extension: extension.into(),
        }
    }

    /// Index encoded in a file name, if it belongs to this backbone
    fn index_of(&self, file_name: &str) -> Option<String> {
        let lower = file_name.to_lowercase();
        let prefix = format!("{}_", self.stem.to_lowercase());
        let suffix = format!(".{}", self.extension.to_lowercase());
        let index = lower.strip_prefix(&prefix)?.strip_suffix(&suffix)?;
        if !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()) {
            Some(index.to_string())
        } else {
            None
        }
    }
}

impl PartialDocumentSource for DirectoryPartials {
    fn has_nonzero_partials(&self) -> bool {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return false;
        };
        entries.flatten().any(|entry| {
            self.index_of(&entry.file_name().to_string_lossy())
                .is_some_and(|idx| idx != "0")
        })
    }

    fn load_partial(&self, index: u32) -> IngestResult<Option<MarkupDocument>> {
        let path = self.partial_path(index);
        if !path.is_file() {
            return Ok(None);
        }
        MarkupDocument::load(&path).map(Some)
    }

    fn partial_path(&self, index: u32) -> PathBuf {
        self.dir
            .join(format!("{}_{}.{}", self.stem, index, self.extension))
    }
}

/// Speech content of one speaker document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerDocument {
    /// Heading text without trailing colon
    pub label: String,
    /// Paragraph texts after the heading, up to the next heading
    pub paragraphs: Vec<String>,
}

impl SpeakerDocument {
    /// Extract the speech under the first `h2.mowca` heading
    pub fn extract(doc: &MarkupDocument) -> Option<Self> {
        let start = doc
            .elements
            .iter()
            .position(|e| e.is("h2") && e.has_class(SPEAKER_HEADING_CLASS))?;

        let paragraphs = doc.elements[start + 1..]
            .iter()
            .take_while(|e| !e.is("h2"))
            .filter(|e| e.is("p") && !e.text.is_empty())
            .map(|e| e.text.clone())
            .collect();

        Some(Self {
            label: strip_label_colon(&doc.elements[start].text),
            paragraphs,
        })
    }

    /// Paragraphs joined into one normalized text
    pub fn text(&self) -> String {
        join_fragments(&self.paragraphs)
    }
}

/// Segmenter output for one backbone
#[derive(Debug, Default)]
pub struct Segmentation {
    pub blocks: Vec<SpeechBlock>,
    /// Recovered problems (missing speaker documents and the like)
    pub warnings: Vec<IngestError>,
}

/// Backbone scanner
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentSegmenter {
    splitter: SubSpeechSplitter,
}

impl DocumentSegmenter {
    pub fn new(splitter: SubSpeechSplitter) -> Self {
        Self { splitter }
    }

    /// Pick the markup convention for a backbone.
    ///
    /// New if any non-zero speaker document exists or the backbone contains a
    /// speaker-link paragraph; legacy otherwise.
    pub fn detect_format(
        &self,
        backbone: &MarkupDocument,
        partials: &dyn PartialDocumentSource,
    ) -> MarkupFormat {
        if partials.has_nonzero_partials() || backbone.any_paragraph_with_class(SPEAKER_LINK_CLASSES) {
            MarkupFormat::New
        } else {
            MarkupFormat::Legacy
        }
    }

    /// Detect the convention, then scan
    pub fn segment(
        &self,
        backbone: &MarkupDocument,
        partials: &dyn PartialDocumentSource,
        session_metadata: Option<&SessionMetadata>,
    ) -> (MarkupFormat, Segmentation) {
        let format = self.detect_format(backbone, partials);
        tracing::debug!(format = ?format, "Backbone markup convention detected");

        let segmentation = match format {
            MarkupFormat::Legacy => Segmentation {
                blocks: scan_legacy(backbone),
                warnings: Vec::new(),
            },
            MarkupFormat::New => self.scan_new(backbone, partials, session_metadata),
        };
        (format, segmentation)
    }

    /// New convention: narration buffered, speaker links resolved to speaker documents
    pub fn scan_new(
        &self,
        backbone: &MarkupDocument,
        partials: &dyn PartialDocumentSource,
        session_metadata: Option<&SessionMetadata>,
    ) -> Segmentation {
        let mut out = Segmentation::default();
        let mut context = ContextCoalescer::new();

        for paragraph in backbone.paragraphs() {
            if !paragraph.has_class(SPEAKER_LINK_CLASS) {
                context.push(paragraph.text.as_str());
                continue;
            }

            // Links that yield no speech leave the pending narration in place
            let Some(anchor) = &paragraph.anchor else {
                out.warnings.push(IngestError::degraded(
                    partials.partial_path(0),
                    "speaker link without an anchor",
                ));
                continue;
            };
            let Ok(index) = anchor.name.parse::<u32>() else {
                out.warnings.push(IngestError::degraded(
                    partials.partial_path(0),
                    format!("speaker link with non-numeric anchor '{}'", anchor.name),
                ));
                continue;
            };

            let path = partials.partial_path(index);
            let speaker_doc = match partials.load_partial(index) {
                Ok(Some(doc)) => SpeakerDocument::extract(&doc),
                Ok(None) => {
                    out.warnings
                        .push(IngestError::degraded(&path, "speaker document missing"));
                    continue;
                }
                Err(e) => {
                    out.warnings.push(IngestError::degraded(&path, e.to_string()));
                    continue;
                }
            };
            let Some(speaker_doc) = speaker_doc else {
                out.warnings
                    .push(IngestError::degraded(&path, "no speaker heading"));
                continue;
            };

            let text = speaker_doc.text();
            if text.is_empty() {
                continue;
            }

            let label = resolve_label(&speaker_doc.label, &anchor.text, index, session_metadata);
            if label.is_empty() {
                // Unattributable speech reads as narration
                out.warnings
                    .push(IngestError::degraded(&path, "no speaker label could be resolved"));
                context.push(text);
                continue;
            }

            context.flush_into(&mut out.blocks);
            out.blocks.extend(self.splitter.split(&label, &text));
        }

        context.flush_into(&mut out.blocks);
        out
    }
}

/// Speaker label for a linked statement: document heading, then link text,
/// then the session metadata entry.
fn resolve_label(
    heading: &str,
    link_text: &str,
    index: u32,
    session_metadata: Option<&SessionMetadata>,
) -> String {
    if !heading.is_empty() {
        return heading.to_string();
    }
    let link = strip_label_colon(link_text);
    if !link.is_empty() {
        return link;
    }
    session_metadata
        .and_then(|m| m.statement(index))
        .and_then(|s| s.name.as_deref())
        .map(strip_label_colon)
        .unwrap_or_default()
}

/// Legacy marker heuristic: emphasized AND (colon-terminated OR role-prefixed)
pub fn is_legacy_speaker_marker(paragraph: &MarkupElement) -> bool {
    if !paragraph.emphasized {
        return false;
    }
    let text = paragraph.text.as_str();
    text.ends_with(':') || LEGACY_ROLE_PREFIXES.iter().any(|p| text.starts_with(p))
}

/// Legacy convention: speaker markers open blocks that run to the next marker
pub fn scan_legacy(backbone: &MarkupDocument) -> Vec<SpeechBlock> {
    let mut blocks = Vec::new();
    let mut context = ContextCoalescer::new();
    let mut current: Option<SpeechBlock> = None;

    for paragraph in backbone.paragraphs() {
        if paragraph.text.is_empty() {
            continue;
        }

        let label = strip_label_colon(&paragraph.text);
        if is_legacy_speaker_marker(paragraph) && !label.is_empty() {
            match current.take() {
                Some(block) => push_speech(&mut blocks, block),
                None => context.flush_into(&mut blocks),
            }
            current = Some(SpeechBlock {
                speaker_label: Some(label),
                text_fragments: Vec::new(),
                kind: BlockKind::Attributed,
            });
        } else if let Some(block) = current.as_mut() {
            block.text_fragments.push(paragraph.text.clone());
        } else {
            context.push(paragraph.text.as_str());
        }
    }

    match current.take() {
        Some(block) => push_speech(&mut blocks, block),
        None => context.flush_into(&mut blocks),
    }
    blocks
}

/// Speeches whose text normalizes to nothing are dropped
fn push_speech(blocks: &mut Vec<SpeechBlock>, block: SpeechBlock) {
    let text = block.text();
    if text.is_empty() {
        return;
    }
    blocks.push(SpeechBlock {
        text_fragments: vec![text],
        ..block
    });
}

/// Backbone text before the first speaker link, one element per line.
///
/// Used for statement 0 by the statement export.
pub fn backbone_preamble(backbone: &MarkupDocument) -> String {
    backbone
        .elements
        .iter()
        .take_while(|e| !(e.is("p") && e.anchor.is_some()))
        .filter(|e| matches!(e.tag.as_str(), "p" | "h1" | "h2" | "blockquote"))
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Path of a backbone document for a date stem
pub fn backbone_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}_0.{}", stem, extension))
}
