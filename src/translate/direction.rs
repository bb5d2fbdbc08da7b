//! Translation direction for a chat's configured language pair.
//! Classify first; when the guess matches neither configured language, fall
//! back to raw script presence so mixed or short text still respects the pair.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::detect::{Classifier, ScriptPresence};
use crate::config::DispatchConfig;
use crate::language::SupportedLanguage;

/// Languages configured for one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    pub native: SupportedLanguage,
    pub translate: SupportedLanguage,
}

impl LanguagePair {
    pub fn new(native: SupportedLanguage, translate: SupportedLanguage) -> Self {
        Self { native, translate }
    }

    fn forward(self) -> Direction {
        Direction {
            source: self.native,
            target: self.translate,
        }
    }

    fn reversed(self) -> Direction {
        Direction {
            source: self.translate,
            target: self.native,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Direction {
    pub source: SupportedLanguage,
    pub target: SupportedLanguage,
}

#[derive(Debug, Clone, Copy)]
pub struct DirectionResolver {
    classifier: Classifier,
    min_detection_len: usize,
}

impl Default for DirectionResolver {
    fn default() -> Self {
        Self {
            classifier: Classifier::default(),
            min_detection_len: 2,
        }
    }
}

impl DirectionResolver {
    pub fn new(classifier: Classifier, min_detection_len: usize) -> Self {
        Self {
            classifier,
            min_detection_len,
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(Classifier::from_config(config), config.min_detection_len)
    }

    fn long_enough(&self, text: &str) -> bool {
        text.trim().chars().count() >= self.min_detection_len
    }

    pub fn resolve(&self, text: &str, pair: LanguagePair) -> Direction {
        if !self.long_enough(text) {
            return pair.forward();
        }

        let detected = self.classifier.classify(text);
        if detected == pair.native {
            return pair.forward();
        }
        if detected == pair.translate {
            return pair.reversed();
        }

        // Third language: first present family that belongs to the pair decides.
        let presence = ScriptPresence::of(text);
        let direction = presence
            .languages()
            .find_map(|lang| {
                if lang == pair.native {
                    Some(pair.forward())
                } else if lang == pair.translate {
                    Some(pair.reversed())
                } else {
                    None
                }
            })
            .unwrap_or_else(|| pair.forward());

        debug!(
            detected = detected.code(),
            source = direction.source.code(),
            target = direction.target.code(),
            "direction resolved by script presence"
        );
        direction
    }

    /// Suggest a new native language when the text is clearly written in a
    /// language outside the configured pair.
    pub fn suggest_language_change(
        &self,
        text: &str,
        pair: LanguagePair,
    ) -> Option<SupportedLanguage> {
        if !self.long_enough(text) {
            return None;
        }
        let detected = self.classifier.classify(text);
        if detected == pair.native || detected == pair.translate {
            return None;
        }
        ScriptPresence::of(text)
            .languages()
            .next()
            .filter(|lang| *lang != pair.native)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::SupportedLanguage::*;

    fn resolver() -> DirectionResolver {
        DirectionResolver::default()
    }

    #[test]
    fn short_text_uses_configured_direction() {
        let pair = LanguagePair::new(Korean, English);
        let d = resolver().resolve("a", pair);
        assert_eq!((d.source, d.target), (Korean, English));
        let d = resolver().resolve("  ", pair);
        assert_eq!((d.source, d.target), (Korean, English));
    }

    #[test]
    fn native_text_goes_forward() {
        let d = resolver().resolve("안녕하세요", LanguagePair::new(Korean, English));
        assert_eq!((d.source, d.target), (Korean, English));
    }

    #[test]
    fn translate_language_text_is_reversed() {
        let d = resolver().resolve("Hello there", LanguagePair::new(Korean, English));
        assert_eq!((d.source, d.target), (English, Korean));
    }

    #[test]
    fn third_language_falls_back_to_presence() {
        // classified Chinese, but ideographs also count as Japanese presence
        let pair = LanguagePair::new(English, Japanese);
        let d = resolver().resolve("我们今天晚上一起去吃饭吧好不好", pair);
        assert_eq!((d.source, d.target), (Japanese, English));

        // classified Korean, the Latin part matches the pair's native language
        let pair = LanguagePair::new(English, Japanese);
        let d = resolver().resolve("hello 세계", pair);
        assert_eq!((d.source, d.target), (English, Japanese));
    }

    #[test]
    fn no_family_match_defaults_forward() {
        let pair = LanguagePair::new(Japanese, Chinese);
        let d = resolver().resolve("Bonjour", pair);
        assert_eq!((d.source, d.target), (Japanese, Chinese));
    }

    #[test]
    fn language_change_suggestion() {
        let pair = LanguagePair::new(English, Japanese);
        assert_eq!(resolver().suggest_language_change("안녕하세요", pair), Some(Korean));
        assert_eq!(resolver().suggest_language_change("Hello", pair), None);
        assert_eq!(resolver().suggest_language_change("안", pair), None);
    }
}
