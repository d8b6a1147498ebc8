//! # skycast-lang
//!
//! Decides, per user turn, which language the agent must reply in.
//!
//! Resolution order is fixed: a stored preference always wins; otherwise a
//! sample of the user's text may be run through a shallow lexical detector;
//! otherwise the configured default applies. The service never fails to
//! produce an answer, and the answer is always one of the supported codes.

pub mod config;
pub mod detect;
pub mod error;
pub mod service;

pub use config::LanguageConfig;
pub use detect::{Detector, detect};
pub use error::{LangError, Result};
pub use service::{LanguageService, LanguageSource, Resolution};
