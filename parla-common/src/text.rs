//! Text normalization helpers shared by the segmenter and the corpus merger

/// Polish letters carrying diacritics, both cases
pub const POLISH_DIACRITICS: &[char] = &[
    'ą', 'ć', 'ę', 'ł', 'ń', 'ó', 'ś', 'ż', 'ź', 'Ą', 'Ć', 'Ę', 'Ł', 'Ń', 'Ó', 'Ś', 'Ż', 'Ź',
];

/// Collapse every whitespace run (including non-breaking spaces) into a single
/// ASCII space and trim both ends.
pub fn normalize_whitespace(input: &str) -> String {
    // char::is_whitespace covers U+00A0
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Join fragments with single spaces, skipping blank ones, then normalize.
pub fn join_fragments<S: AsRef<str>>(fragments: &[S]) -> String {
    let joined = fragments
        .iter()
        .map(AsRef::as_ref)
        .filter(|f| !f.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    normalize_whitespace(&joined)
}

/// True when the text contains at least one Polish diacritic letter
pub fn has_polish_diacritics(text: &str) -> bool {
    text.chars().any(|c| POLISH_DIACRITICS.contains(&c))
}

/// Strip trailing colons (and the whitespace around them) from a speaker label
pub fn strip_label_colon(label: &str) -> String {
    label
        .trim_end_matches(|c: char| c == ':' || c.is_whitespace())
        .trim_start()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_nbsp_and_runs() {
        assert_eq!(
            normalize_whitespace("  Dzień\u{a0}\u{a0}dobry.\n\t Otwieram  "),
            "Dzień dobry. Otwieram"
        );
    }

    #[test]
    fn test_join_fragments_skips_blank() {
        let parts = vec!["Dzień dobry.", "   ", "Otwieram posiedzenie."];
        assert_eq!(join_fragments(&parts), "Dzień dobry. Otwieram posiedzenie.");
    }

    #[test]
    fn test_diacritics() {
        assert!(has_polish_diacritics("płeć"));
        assert!(!has_polish_diacritics("gender"));
    }

    #[test]
    fn test_strip_label_colon() {
        assert_eq!(strip_label_colon("Marszałek Jan Kowalski: "), "Marszałek Jan Kowalski");
        assert_eq!(strip_label_colon("Poseł Anna Nowak"), "Poseł Anna Nowak");
        assert_eq!(strip_label_colon(" Sekretarz: :"), "Sekretarz");
    }
}
