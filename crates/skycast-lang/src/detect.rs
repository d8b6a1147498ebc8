//! Shallow lexical language detection.
//!
//! Each language owns a fixed list of signals: diacritic classes, common
//! function words, and self-references. Candidates are tried in the order the
//! caller supplies and the first language with any matching signal wins.
//! Languages with no table entry never match.

use std::sync::LazyLock;

use regex::RegexSet;
use tracing::error;

use crate::error::{LangError, Result};

/// Built-in signals, keyed by language code.
pub const BUILTIN_SIGNALS: &[(&str, &[&str])] = &[
    (
        "vi",
        &[
            r"[ăâđêôơưàảãạáằắẳẵặầấẩẫậèéẻẽẹềếểễệòóỏõọồốổỗộờớởỡợùúủũụừứửữựìíỉĩịỳýỷỹỵ]",
            r"tieng\s*viet",
            r"việt\s*nam",
        ],
    ),
    ("es", &[r"ñ", r"[áéíóúü]", r"\b(el|la|los|las|una|un)\b"]),
    (
        "fr",
        &[r"ç", r"[àâæçéèêëîïôœùûüÿ]", r"\b(le|la|les|une|un|des)\b"],
    ),
    ("en", &[r"\b(the|and|you|for|with)\b", r"english"]),
];

static BUILTIN: LazyLock<Detector> = LazyLock::new(|| {
    Detector::from_table(BUILTIN_SIGNALS).unwrap_or_else(|e| {
        error!(error = %e, "built-in detection table failed to compile, detection disabled");
        Detector::default()
    })
});

/// Compiled signal table.
#[derive(Debug, Default)]
pub struct Detector {
    entries: Vec<(String, RegexSet)>,
}

impl Detector {
    pub fn from_table(table: &[(&str, &[&str])]) -> Result<Self> {
        let entries = table
            .iter()
            .map(|(lang, patterns)| {
                RegexSet::new(patterns.iter())
                    .map(|set| ((*lang).to_owned(), set))
                    .map_err(|e| LangError::InvalidPattern {
                        lang: (*lang).to_owned(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// The built-in table, compiled once.
    pub fn builtin() -> &'static Detector {
        &BUILTIN
    }

    /// First code in `candidates` whose signals match the lowercased `text`.
    pub fn detect<'a, S: AsRef<str>>(&self, text: &str, candidates: &'a [S]) -> Option<&'a str> {
        let text = text.to_lowercase();
        candidates
            .iter()
            .map(|lang| lang.as_ref())
            .find(|lang| self.signals(lang).is_some_and(|set| set.is_match(&text)))
    }

    fn signals(&self, lang: &str) -> Option<&RegexSet> {
        self.entries
            .iter()
            .find(|(code, _)| code == lang)
            .map(|(_, set)| set)
    }
}

/// Run the built-in detector over `candidates` in order.
pub fn detect<'a, S: AsRef<str>>(text: &str, candidates: &'a [S]) -> Option<&'a str> {
    Detector::builtin().detect(text, candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vietnamese_diacritics_detected() {
        assert_eq!(detect("Xin chào bạn hôm nay thế nào", &["en", "vi"]), Some("vi"));
    }

    #[test]
    fn unaccented_vietnamese_self_reference() {
        assert_eq!(detect("toi noi TIENG VIET", &["en", "vi"]), Some("vi"));
    }

    #[test]
    fn english_function_words() {
        assert_eq!(detect("What is the weather like?", &["vi", "en"]), Some("en"));
    }

    #[test]
    fn word_boundaries_respected() {
        // "there" contains "the" but is not the word "the".
        assert_eq!(detect("there", &["en"]), None);
    }

    #[test]
    fn first_candidate_wins_on_overlap() {
        // "la" is a signal for both Spanish and French.
        let sample = "la casa";
        assert_eq!(detect(sample, &["es", "fr"]), Some("es"));
        assert_eq!(detect(sample, &["fr", "es"]), Some("fr"));
    }

    #[test]
    fn only_candidates_are_considered() {
        assert_eq!(detect("Xin chào bạn", &["en"]), None);
    }

    #[test]
    fn unknown_language_never_matches() {
        assert_eq!(detect("guten tag", &["de"]), None);
    }

    #[test]
    fn no_signal_yields_none() {
        assert_eq!(detect("qwertyuiopasdfghjkl", &["en", "vi"]), None);
    }

    #[test]
    fn custom_table_rejects_bad_pattern() {
        const BAD: &[(&str, &[&str])] = &[("xx", &["("])];
        let err = Detector::from_table(BAD).unwrap_err();
        assert!(matches!(err, LangError::InvalidPattern { ref lang, .. } if lang == "xx"));
    }

    #[test]
    fn custom_table_is_used() {
        const GERMAN: &[(&str, &[&str])] = &[("de", &[r"\bguten\b"])];
        let detector = Detector::from_table(GERMAN).unwrap();
        let candidates = vec!["en".to_owned(), "de".to_owned()];
        assert_eq!(detector.detect("Guten Tag", &candidates), Some("de"));
    }
}
