//! Language resolution service.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use skycast_store::LanguageStore;
use tracing::{debug, info, warn};

use crate::config::{LanguageConfig, normalize};
use crate::detect::detect;
use crate::error::{LangError, Result};

/// Why a particular language was chosen for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageSource {
    /// A preference was already recorded for the user.
    Stored,
    /// The sample text matched a supported language, now recorded.
    Detected,
    /// Nothing else applied.
    Default,
    /// Set explicitly by the caller.
    Forced,
}

impl LanguageSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::Detected => "detected",
            Self::Default => "default",
            Self::Forced => "forced",
        }
    }
}

impl fmt::Display for LanguageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a resolution: the language to use and its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub lang: String,
    pub source: LanguageSource,
}

/// Manages per-user language preferences and resolves the language for a turn.
///
/// Cloning is cheap; clones share the same store.
#[derive(Clone)]
pub struct LanguageService {
    store: Arc<dyn LanguageStore>,
    config: LanguageConfig,
}

impl LanguageService {
    pub fn new(store: Arc<dyn LanguageStore>, config: LanguageConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &LanguageConfig {
        &self.config
    }

    pub fn list_supported(&self) -> &[String] {
        self.config.supported()
    }

    /// Exact membership test; callers normalise first.
    pub fn is_supported(&self, lang: &str) -> bool {
        self.config.is_supported(lang)
    }

    /// The stored preference, if any.
    pub async fn get_language(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.store.get(user_id).await?)
    }

    /// Validate and persist `lang` for `user_id`. Returns the normalised code.
    pub async fn set_language(&self, user_id: &str, lang: &str) -> Result<String> {
        let norm = self.validate(lang)?;
        self.store.set(user_id, &norm).await?;
        debug!(component = "language", %user_id, lang = %norm, "language preference set");
        Ok(norm)
    }

    /// Like [`set_language`](Self::set_language) but reports the outcome as a
    /// resolution with source `forced`.
    pub async fn force_language(&self, user_id: &str, lang: &str) -> Result<Resolution> {
        let lang = self.set_language(user_id, lang).await?;
        Ok(Resolution {
            lang,
            source: LanguageSource::Forced,
        })
    }

    /// Remove any stored preference for `user_id`.
    pub async fn clear_language(&self, user_id: &str) -> Result<()> {
        Ok(self.store.clear(user_id).await?)
    }

    /// Resolve the language for this turn: stored, then detected, then default.
    ///
    /// Never fails. Store errors are logged; a failed read is treated as no
    /// record and a failed write still returns the detected language.
    pub async fn ensure_language(&self, user_id: &str, sample_text: Option<&str>) -> Resolution {
        let stored = match self.store.get(user_id).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(
                    component = "language",
                    %user_id,
                    error = %e,
                    "preference read failed, treating as absent"
                );
                None
            }
        };
        if let Some(lang) = stored {
            return Resolution {
                lang,
                source: LanguageSource::Stored,
            };
        }

        if let Some(resolution) = self.try_detect(user_id, sample_text).await {
            return resolution;
        }

        info!(
            component = "language",
            event = "fallback_default",
            %user_id,
            default_lang = %self.config.default_lang()
        );
        Resolution {
            lang: self.config.default_lang().to_owned(),
            source: LanguageSource::Default,
        }
    }

    /// Heuristic detection over the supported set, in priority order.
    pub fn detect(&self, text: &str) -> Option<String> {
        detect(text, self.config.supported()).map(str::to_owned)
    }

    // -- internals ------------------------------------------------------------

    fn validate(&self, lang: &str) -> Result<String> {
        let norm = normalize(lang);
        if self.is_supported(&norm) {
            Ok(norm)
        } else {
            Err(LangError::UnsupportedLanguage {
                lang: lang.to_owned(),
                supported: self.config.supported().to_vec(),
            })
        }
    }

    async fn try_detect(&self, user_id: &str, sample_text: Option<&str>) -> Option<Resolution> {
        if !self.config.enable_detect() {
            return None;
        }
        let sample = sample_text.filter(|s| !s.is_empty())?;
        if sample.chars().count() < self.config.min_detect_chars() {
            debug!(component = "language", %user_id, "sample below detection threshold");
            return None;
        }

        match self.detect(sample) {
            Some(lang) if self.is_supported(&lang) => {
                if let Err(e) = self.store.set(user_id, &lang).await {
                    warn!(
                        component = "language",
                        %user_id,
                        %lang,
                        error = %e,
                        "failed to persist detected language"
                    );
                }
                info!(
                    component = "language",
                    event = "detected",
                    %user_id,
                    %lang,
                    source = "detected"
                );
                Some(Resolution {
                    lang,
                    source: LanguageSource::Detected,
                })
            }
            detected => {
                let reason = if detected.is_some() {
                    "unsupported_detected"
                } else {
                    "no_match"
                };
                info!(component = "language", event = "detect_miss", %user_id, reason);
                None
            }
        }
    }
}
