//! Script-based language detection.
//! Deterministic Unicode-range heuristics: Hangul wins, then Kana, then
//! Latin-only; bare ideographs are split between Chinese and Japanese by
//! Latin mixing, ideograph density and length.

use serde::Serialize;

use crate::config::DispatchConfig;
use crate::language::SupportedLanguage;

/// Ideograph share above which a short string is taken as Japanese.
const SHORT_KANJI_RATIO: f32 = 0.7;
/// Max length (chars) for the short-kanji rule.
const SHORT_KANJI_MAX_LEN: usize = 10;

/// Syllables plus conjoining and compatibility Jamo.
#[inline]
pub fn is_hangul(c: char) -> bool {
    is_hangul_syllable(c) || matches!(c, '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}')
}

/// Precomposed syllables only. Script presence and ratios count these, so
/// jamo shorthand ("ㅎㅇ") does not share a family with written Korean.
#[inline]
pub fn is_hangul_syllable(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7AF}')
}

/// Hiragana, Katakana and half-width Katakana.
#[inline]
pub fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' | '\u{FF66}'..='\u{FF9F}')
}

/// CJK unified ideographs (kanji / hanzi).
#[inline]
pub fn is_ideograph(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FAF}')
}

#[inline]
pub fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Raw per-family presence, no best guess involved.
/// Japanese presence includes ideographs since kanji are part of written Japanese.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptPresence {
    pub korean: bool,
    pub japanese: bool,
    pub english: bool,
    pub chinese: bool,
}

impl ScriptPresence {
    pub fn of(text: &str) -> Self {
        let mut p = ScriptPresence::default();
        for c in text.chars() {
            if is_hangul_syllable(c) {
                p.korean = true;
            } else if is_kana(c) {
                p.japanese = true;
            } else if is_ideograph(c) {
                p.japanese = true;
                p.chinese = true;
            } else if is_latin(c) {
                p.english = true;
            }
        }
        p
    }

    pub fn contains(&self, lang: SupportedLanguage) -> bool {
        match lang {
            SupportedLanguage::Korean => self.korean,
            SupportedLanguage::Japanese => self.japanese,
            SupportedLanguage::English => self.english,
            SupportedLanguage::Chinese => self.chinese,
        }
    }

    /// Present languages in fallback priority order.
    pub fn languages(&self) -> impl Iterator<Item = SupportedLanguage> + '_ {
        [
            SupportedLanguage::Korean,
            SupportedLanguage::Japanese,
            SupportedLanguage::English,
            SupportedLanguage::Chinese,
        ]
        .into_iter()
        .filter(|l| self.contains(*l))
    }
}

/// Share of characters per script family, over the total character count.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScriptRatios {
    pub korean: f32,
    pub japanese: f32,
    pub chinese: f32,
    pub english: f32,
}

pub fn character_ratios(text: &str) -> ScriptRatios {
    let total = text.chars().count();
    if total == 0 {
        return ScriptRatios::default();
    }

    let (mut ko, mut ja, mut zh, mut en) = (0usize, 0usize, 0usize, 0usize);
    for c in text.chars() {
        if is_hangul_syllable(c) {
            ko += 1;
        } else if is_kana(c) {
            ja += 1;
        } else if is_ideograph(c) {
            zh += 1;
        } else if is_latin(c) {
            en += 1;
        }
    }

    let total = total as f32;
    ScriptRatios {
        korean: ko as f32 / total,
        japanese: ja as f32 / total,
        chinese: zh as f32 / total,
        english: en as f32 / total,
    }
}

/// Language classifier carrying the fallback language and the dominance threshold.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    default_language: SupportedLanguage,
    ratio_threshold: f32,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            default_language: SupportedLanguage::Korean,
            ratio_threshold: 0.3,
        }
    }
}

impl Classifier {
    pub fn new(default_language: SupportedLanguage, ratio_threshold: f32) -> Self {
        Self {
            default_language,
            ratio_threshold,
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.default_language, config.ratio_threshold)
    }

    /// Classify `text`. Never fails; empty or unrecognized input yields the default.
    pub fn classify(&self, text: &str) -> SupportedLanguage {
        let text = text.trim();
        if text.is_empty() {
            return self.default_language;
        }

        let mut has_hangul = false;
        let mut has_kana = false;
        let mut has_latin = false;
        let mut ideographs = 0usize;
        let mut total = 0usize;

        for c in text.chars() {
            total += 1;
            if is_hangul(c) {
                has_hangul = true;
            } else if is_kana(c) {
                has_kana = true;
            } else if is_ideograph(c) {
                ideographs += 1;
            } else if is_latin(c) {
                has_latin = true;
            }
        }

        if has_hangul {
            return SupportedLanguage::Korean;
        }
        if has_kana {
            return SupportedLanguage::Japanese;
        }
        if ideographs == 0 {
            return if has_latin {
                SupportedLanguage::English
            } else {
                self.default_language
            };
        }

        // Bare ideographs: kanji mixed with Latin reads as Japanese
        if has_latin {
            return SupportedLanguage::Japanese;
        }
        let ratio = ideographs as f32 / total as f32;
        if ratio > SHORT_KANJI_RATIO && total <= SHORT_KANJI_MAX_LEN {
            SupportedLanguage::Japanese
        } else {
            SupportedLanguage::Chinese
        }
    }

    /// Dominant family of mixed text, or `classify` when no family
    /// clears the ratio threshold.
    pub fn extract_primary_language(&self, text: &str) -> SupportedLanguage {
        let r = character_ratios(text);
        let t = self.ratio_threshold;
        if r.korean > t {
            SupportedLanguage::Korean
        } else if r.japanese > t {
            SupportedLanguage::Japanese
        } else if r.chinese > t {
            SupportedLanguage::Chinese
        } else if r.english > t {
            SupportedLanguage::English
        } else {
            self.classify(text)
        }
    }
}

/// Classify with the default classifier (Korean fallback).
pub fn classify(text: &str) -> SupportedLanguage {
    Classifier::default().classify(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use crate::language::SupportedLanguage::*;

    #[test]
    fn hangul_is_korean() {
        assert_eq!(classify("안녕하세요"), Korean);
        assert_eq!(classify("ㅋㅋㅋ"), Korean);
        assert_eq!(classify("hello 세계"), Korean);
    }

    #[test]
    fn kana_is_japanese() {
        assert_eq!(classify("こんにちは"), Japanese);
        assert_eq!(classify("カタカナ"), Japanese);
        assert_eq!(classify("ｶﾀｶﾅ"), Japanese);
        assert_eq!(classify("日本語です"), Japanese);
    }

    #[test]
    fn latin_only_is_english() {
        assert_eq!(classify("Hello, world!"), English);
        assert_eq!(classify("  ok  "), English);
    }

    #[test]
    fn ideographs_split_between_chinese_and_japanese() {
        // kanji + Latin
        assert_eq!(classify("東京 Tower"), Japanese);
        // short and dense
        assert_eq!(classify("東京"), Japanese);
        // long ideograph run
        assert_eq!(classify("我们今天晚上一起去吃饭吧好不好"), Chinese);
        // short but diluted by punctuation and digits: 2 of 6 chars
        assert_eq!(classify("中文 123"), Chinese);
    }

    #[test]
    fn unrecognized_or_empty_falls_back_to_default() {
        assert_eq!(classify(""), Korean);
        assert_eq!(classify("   "), Korean);
        assert_eq!(classify("12345 !?"), Korean);
        assert_eq!(classify("Привет"), Korean);

        let english_default = Classifier::new(English, 0.3);
        assert_eq!(english_default.classify("..."), English);
    }

    #[test]
    fn ratios_cover_each_family() {
        let r = character_ratios("ab가나");
        assert!((r.english - 0.5).abs() < f32::EPSILON);
        assert!((r.korean - 0.5).abs() < f32::EPSILON);
        assert_eq!(r.chinese, 0.0);
        assert_eq!(character_ratios(""), ScriptRatios::default());
    }

    #[test]
    fn primary_language_uses_ratio_threshold() {
        let c = Classifier::default();
        // 1 of 13 chars is Hangul: below 30%, English dominates
        assert_eq!(c.extract_primary_language("hello there 네"), English);
        assert_eq!(c.extract_primary_language("안녕 hi"), Korean);
        // nothing dominates, plain classification decides
        assert_eq!(c.extract_primary_language("1234567 a"), English);
    }

    #[test]
    fn jamo_classify_as_korean_but_are_not_syllables() {
        assert_eq!(classify("ㅎㅇ"), Korean);
        assert_eq!(ScriptPresence::of("ㅎㅇ"), ScriptPresence::default());
        assert!(ScriptPresence::of("하이").korean);
        assert_eq!(character_ratios("ㅋㅋ하").korean, 1.0 / 3.0);
    }

    #[test]
    fn presence_reports_raw_families() {
        let p = ScriptPresence::of("漢字 abc");
        assert!(p.chinese && p.japanese && p.english);
        assert!(!p.korean);
        let order: Vec<_> = p.languages().collect();
        assert_eq!(order, vec![Japanese, English, Chinese]);
    }

    proptest! {
        #[test]
        fn prop_hangul_only_is_korean(s in "[가-힣]{1,40}") {
            prop_assert_eq!(classify(&s), Korean);
        }

        #[test]
        fn prop_any_kana_is_japanese(
            prefix in "[a-z一-龥 ]{0,12}",
            kana in "[ぁ-ゖァ-ヺ]",
            suffix in "[a-z一-龥 ]{0,12}",
        ) {
            let text = format!("{prefix}{kana}{suffix}");
            prop_assert_eq!(classify(&text), Japanese);
        }

        #[test]
        fn prop_classify_never_panics(s in "\\PC{0,64}") {
            let _ = classify(&s);
            let _ = character_ratios(&s);
        }
    }
}
