//! Context coalescing
//!
//! Accumulates narration fragments between attributed blocks. Any attributed
//! block or end of document flushes the buffer into at most one contextual
//! block, so two attributed blocks are never separated by more than one
//! contextual block.

use parla_common::text::join_fragments;

use crate::types::SpeechBlock;

/// Single-pass narration buffer owned by one document scan
#[derive(Debug, Default)]
pub struct ContextCoalescer {
    fragments: Vec<String>,
}

impl ContextCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer one narration fragment (blank fragments are ignored)
    pub fn push(&mut self, fragment: impl Into<String>) {
        let fragment = fragment.into();
        if !fragment.trim().is_empty() {
            self.fragments.push(fragment);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Drain the buffer into one contextual block, or `None` if it normalizes to nothing
    pub fn flush(&mut self) -> Option<SpeechBlock> {
        if self.fragments.is_empty() {
            return None;
        }
        let text = join_fragments(&self.fragments);
        self.fragments.clear();
        if text.is_empty() {
            None
        } else {
            Some(SpeechBlock::contextual(text))
        }
    }

    /// Flush into `out` if anything is buffered
    pub fn flush_into(&mut self, out: &mut Vec<SpeechBlock>) {
        if let Some(block) = self.flush() {
            out.push(block);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockKind;

    #[test]
    fn test_flush_merges_fragments() {
        let mut coalescer = ContextCoalescer::new();
        coalescer.push("Posiedzenie otwiera");
        coalescer.push("  marszałek\u{a0}Sejmu. ");

        let block = coalescer.flush().unwrap();
        assert_eq!(block.kind, BlockKind::Contextual);
        assert_eq!(block.text(), "Posiedzenie otwiera marszałek Sejmu.");
        assert!(coalescer.is_empty());
    }

    #[test]
    fn test_empty_flush_emits_nothing() {
        let mut coalescer = ContextCoalescer::new();
        coalescer.push("   ");
        assert!(coalescer.flush().is_none());

        let mut out = Vec::new();
        coalescer.flush_into(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_second_flush_is_empty() {
        let mut coalescer = ContextCoalescer::new();
        coalescer.push("(Oklaski)");
        assert!(coalescer.flush().is_some());
        assert!(coalescer.flush().is_none());
    }
}
