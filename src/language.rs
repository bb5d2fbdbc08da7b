//! Supported languages and their engine identifiers.
//! The set is fixed at compile time; cache keys use `code()`, the engine
//! collaborators use `engine_id()`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportedLanguage {
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "zh")]
    Chinese,
}

impl SupportedLanguage {
    pub const ALL: [SupportedLanguage; 4] = [
        SupportedLanguage::Korean,
        SupportedLanguage::English,
        SupportedLanguage::Japanese,
        SupportedLanguage::Chinese,
    ];

    /// Short code used in cache keys and configuration.
    pub fn code(self) -> &'static str {
        match self {
            SupportedLanguage::Korean => "ko",
            SupportedLanguage::English => "en",
            SupportedLanguage::Japanese => "ja",
            SupportedLanguage::Chinese => "zh",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SupportedLanguage::Korean => "한국어",
            SupportedLanguage::English => "English",
            SupportedLanguage::Japanese => "日本語",
            SupportedLanguage::Chinese => "中文",
        }
    }

    /// Identifier understood by the offline engine and model lifecycle.
    pub fn engine_id(self) -> &'static str {
        match self {
            SupportedLanguage::Korean => "ko",
            SupportedLanguage::English => "en",
            SupportedLanguage::Japanese => "ja",
            SupportedLanguage::Chinese => "zh",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }

    pub fn from_engine_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.engine_id() == id)
    }
}

impl std::fmt::Display for SupportedLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_and_engine_ids_are_unique() {
        let codes: HashSet<_> = SupportedLanguage::ALL.iter().map(|l| l.code()).collect();
        let ids: HashSet<_> = SupportedLanguage::ALL.iter().map(|l| l.engine_id()).collect();
        assert_eq!(codes.len(), SupportedLanguage::ALL.len());
        assert_eq!(ids.len(), SupportedLanguage::ALL.len());
    }

    #[test]
    fn lookup_by_code_and_engine_id() {
        for lang in SupportedLanguage::ALL {
            assert_eq!(SupportedLanguage::from_code(lang.code()), Some(lang));
            assert_eq!(SupportedLanguage::from_engine_id(lang.engine_id()), Some(lang));
        }
        assert_eq!(SupportedLanguage::from_code("fr"), None);
    }

    #[test]
    fn serializes_as_code() {
        let json = serde_json::to_string(&SupportedLanguage::Japanese).unwrap();
        assert_eq!(json, "\"ja\"");
        let back: SupportedLanguage = serde_json::from_str("\"zh\"").unwrap();
        assert_eq!(back, SupportedLanguage::Chinese);
    }
}
