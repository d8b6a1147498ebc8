use skycast_store::StoreError;

/// Errors raised by explicit language changes.
///
/// Resolution itself (`ensure_language`) never returns one of these.
#[derive(Debug, thiserror::Error)]
pub enum LangError {
    /// The requested code is not in the configured supported set.
    #[error("Unsupported language: {lang} (supported: {})", supported.join(", "))]
    UnsupportedLanguage { lang: String, supported: Vec<String> },

    /// A detection pattern failed to compile.
    #[error("invalid detection pattern for `{lang}`: {reason}")]
    InvalidPattern { lang: String, reason: String },

    /// The preference store rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, LangError>;
