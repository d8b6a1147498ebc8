//! Language configuration, fixed for the lifetime of the process.

use tracing::warn;

const FALLBACK_DEFAULT_LANG: &str = "en";
const FALLBACK_MIN_DETECT_CHARS: usize = 8;

/// Default language, supported set, and detection gating.
///
/// Invariants established by every constructor:
/// - all codes are trimmed and lowercase,
/// - `supported` has no duplicates and keeps first-seen order,
/// - `default_lang` is a member of `supported` (prepended when missing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    default_lang: String,
    supported: Vec<String>,
    enable_detect: bool,
    min_detect_chars: usize,
}

impl LanguageConfig {
    pub fn new<I, S>(
        default_lang: &str,
        supported: I,
        enable_detect: bool,
        min_detect_chars: usize,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut default_lang = normalize(default_lang);
        if default_lang.is_empty() {
            default_lang = FALLBACK_DEFAULT_LANG.to_owned();
        }

        let mut list: Vec<String> = Vec::new();
        for code in supported {
            let code = normalize(code.as_ref());
            if !code.is_empty() && !list.contains(&code) {
                list.push(code);
            }
        }
        if !list.contains(&default_lang) {
            list.insert(0, default_lang.clone());
        }

        Self {
            default_lang,
            supported: list,
            enable_detect,
            min_detect_chars,
        }
    }

    /// Read `DEFAULT_LANG`, `SUPPORTED_LANGS`, `ENABLE_LANG_DETECTION` and
    /// `LANG_MIN_DETECT_CHARS` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`LanguageConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let default_lang = var("DEFAULT_LANG")
            .map(|v| normalize(&v))
            .unwrap_or_else(|| FALLBACK_DEFAULT_LANG.to_owned());
        let supported_raw =
            var("SUPPORTED_LANGS").unwrap_or_else(|| format!("{default_lang},vi"));
        let enable_detect = lookup("ENABLE_LANG_DETECTION").as_deref() == Some("1");

        let min_detect_chars = match var("LANG_MIN_DETECT_CHARS") {
            None => FALLBACK_MIN_DETECT_CHARS,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(
                    value = %raw,
                    fallback = FALLBACK_MIN_DETECT_CHARS,
                    "LANG_MIN_DETECT_CHARS is not a non-negative integer, using fallback"
                );
                FALLBACK_MIN_DETECT_CHARS
            }),
        };

        Self::new(
            &default_lang,
            supported_raw.split(','),
            enable_detect,
            min_detect_chars,
        )
    }

    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    /// Supported codes in detection priority order.
    pub fn supported(&self) -> &[String] {
        &self.supported
    }

    pub fn enable_detect(&self) -> bool {
        self.enable_detect
    }

    pub fn min_detect_chars(&self) -> usize {
        self.min_detect_chars
    }

    pub fn is_supported(&self, lang: &str) -> bool {
        self.supported.iter().any(|s| s == lang)
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self::new(
            FALLBACK_DEFAULT_LANG,
            [FALLBACK_DEFAULT_LANG, "vi"],
            false,
            FALLBACK_MIN_DETECT_CHARS,
        )
    }
}

/// Trim and lowercase a language code.
pub fn normalize(lang: &str) -> String {
    lang.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = LanguageConfig::from_lookup(|_| None);
        assert_eq!(cfg.default_lang(), "en");
        assert_eq!(cfg.supported(), ["en", "vi"]);
        assert!(!cfg.enable_detect());
        assert_eq!(cfg.min_detect_chars(), 8);
        assert_eq!(cfg, LanguageConfig::default());
    }

    #[test]
    fn supported_list_is_normalized_and_deduplicated() {
        let cfg = LanguageConfig::from_lookup(lookup_from(&[
            ("DEFAULT_LANG", " VI "),
            ("SUPPORTED_LANGS", "en, ES ,en,,fr"),
        ]));
        assert_eq!(cfg.default_lang(), "vi");
        assert_eq!(cfg.supported(), ["vi", "en", "es", "fr"]);
    }

    #[test]
    fn default_not_duplicated_when_listed() {
        let cfg = LanguageConfig::new("en", ["vi", "EN"], true, 3);
        assert_eq!(cfg.supported(), ["vi", "en"]);
    }

    #[test]
    fn supported_defaults_to_default_plus_vi() {
        let cfg = LanguageConfig::from_lookup(lookup_from(&[("DEFAULT_LANG", "es")]));
        assert_eq!(cfg.supported(), ["es", "vi"]);
    }

    #[test]
    fn detection_flag_requires_exact_one() {
        for (raw, expected) in [("1", true), ("true", false), ("0", false), (" 1", false)] {
            let cfg = LanguageConfig::from_lookup(lookup_from(&[("ENABLE_LANG_DETECTION", raw)]));
            assert_eq!(cfg.enable_detect(), expected, "value {raw:?}");
        }
    }

    #[test]
    fn min_detect_chars_parses_or_falls_back() {
        let cfg = LanguageConfig::from_lookup(lookup_from(&[("LANG_MIN_DETECT_CHARS", "20")]));
        assert_eq!(cfg.min_detect_chars(), 20);

        for bad in ["abc", "-3", "1.5"] {
            let cfg = LanguageConfig::from_lookup(lookup_from(&[("LANG_MIN_DETECT_CHARS", bad)]));
            assert_eq!(cfg.min_detect_chars(), 8, "value {bad:?}");
        }
    }

    #[test]
    fn blank_default_falls_back_to_en() {
        let cfg = LanguageConfig::new("  ", ["vi"], false, 0);
        assert_eq!(cfg.default_lang(), "en");
        assert_eq!(cfg.supported(), ["en", "vi"]);
    }
}
