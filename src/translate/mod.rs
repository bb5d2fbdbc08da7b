//! Translation dispatch: direction detection, two-tier caching, offline
//! engine calls with output validation and one-shot model reinstall.

pub mod cache;
pub mod detect;
pub mod direction;
pub mod engine;
pub mod service;
pub mod sqlite_store;
pub mod stage;
pub mod store;
pub mod validate;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::language::SupportedLanguage;

pub use cache::{CacheStats, TranslationCache};
pub use direction::{Direction, LanguagePair};
pub use service::TranslationService;

/// One translation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    pub source: SupportedLanguage,
    pub target: SupportedLanguage,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, source: SupportedLanguage, target: SupportedLanguage) -> Self {
        Self {
            text: text.into(),
            source,
            target,
        }
    }

    /// Same-language or blank requests return the input untouched.
    pub fn is_noop(&self) -> bool {
        self.source == self.target || self.text.trim().is_empty()
    }
}

/// Failures surfaced to callers. Cache and detection problems never appear
/// here; they degrade to a miss or the default language.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("translation failed: engine timed out")]
    Timeout,
    #[error("language model not installed: {}", join_codes(.languages))]
    ModelNotInstalled { languages: Vec<SupportedLanguage> },
    #[error("language model download failed")]
    ModelDownloadFailed,
    #[error("model reinstall failed, restart the app")]
    ReinstallFailed,
    #[error("translation failed: {0}")]
    Engine(String),
}

fn join_codes(languages: &[SupportedLanguage]) -> String {
    languages
        .iter()
        .map(|l| l.code())
        .collect::<Vec<_>>()
        .join(", ")
}
