//! Offline engine and model lifecycle collaborators.
//! The engine hands out one client per (source, target) pair; the model
//! lifecycle manages per-language downloadable models. Both are black boxes
//! with fallible, potentially slow operations.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by an engine or model-lifecycle collaborator.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("engine call timed out")]
    Timeout,
    #[error("model not available: {0}")]
    ModelMissing(String),
    #[error("model download did not complete")]
    DownloadIncomplete,
    #[error("{0}")]
    Failed(String),
}

impl EngineError {
    /// Underlying error text, matched against corruption signatures.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Translator bound to one language pair. Stateless after construction,
/// so one handle may serve concurrent calls.
#[async_trait]
pub trait EngineClient: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, EngineError>;

    /// Make sure the pair's models are present, downloading if needed.
    async fn ensure_model_ready(&self, require_wifi: bool) -> Result<bool, EngineError>;
}

pub trait TranslationEngine: Send + Sync {
    fn client(
        &self,
        source_id: &str,
        target_id: &str,
    ) -> Result<Arc<dyn EngineClient>, EngineError>;
}

#[async_trait]
pub trait ModelLifecycle: Send + Sync {
    async fn is_installed(&self, language_id: &str) -> Result<bool, EngineError>;

    async fn download(&self, language_id: &str, require_wifi: bool) -> Result<bool, EngineError>;

    async fn delete(&self, language_id: &str) -> Result<bool, EngineError>;

    async fn list_installed(&self) -> Result<Vec<String>, EngineError>;
}

/// How a failed engine call should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    /// Installed model is unusable; reinstall and retry once.
    Corruption,
    ModelMissing,
    DownloadFailed,
    Other,
}

/// Maps collaborator errors onto `FailureKind` using a configurable list
/// of corruption signatures (plain substrings of the error text).
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    signatures: Vec<String>,
}

impl ErrorClassifier {
    pub fn new(signatures: Vec<String>) -> Self {
        Self { signatures }
    }

    pub fn is_corruption(&self, message: &str) -> bool {
        self.signatures.iter().any(|s| message.contains(s.as_str()))
    }

    pub fn classify(&self, error: &EngineError) -> FailureKind {
        match error {
            EngineError::Timeout => FailureKind::Timeout,
            EngineError::ModelMissing(msg) if self.is_corruption(msg) => FailureKind::Corruption,
            EngineError::ModelMissing(_) => FailureKind::ModelMissing,
            EngineError::DownloadIncomplete => FailureKind::DownloadFailed,
            EngineError::Failed(msg) if self.is_corruption(msg) => FailureKind::Corruption,
            EngineError::Failed(_) => FailureKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatchConfig;

    fn classifier() -> ErrorClassifier {
        ErrorClassifier::new(DispatchConfig::default().corruption_signatures)
    }

    #[test]
    fn known_signatures_are_corruption() {
        let c = classifier();
        for msg in [
            "Failed to run ICU translit for ja",
            "transliteration rules missing",
            "RET_CHECK failure (third_party/translate.cc:42)",
        ] {
            assert_eq!(c.classify(&EngineError::Failed(msg.into())), FailureKind::Corruption);
        }
    }

    #[test]
    fn other_failures_are_not_retried() {
        let c = classifier();
        assert_eq!(c.classify(&EngineError::Failed("network down".into())), FailureKind::Other);
        assert_eq!(c.classify(&EngineError::Timeout), FailureKind::Timeout);
        assert_eq!(c.classify(&EngineError::DownloadIncomplete), FailureKind::DownloadFailed);
        assert_eq!(
            c.classify(&EngineError::ModelMissing("ja".into())),
            FailureKind::ModelMissing
        );
    }

    #[test]
    fn signatures_are_configuration() {
        let c = ErrorClassifier::new(vec!["model checksum".into()]);
        assert!(c.is_corruption("bad model checksum"));
        assert!(!c.is_corruption("ICU translit"));
    }
}
