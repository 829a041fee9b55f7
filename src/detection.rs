//! Language detection used to score OCR transcriptions.

use crate::models::Language;

/// Detects the language of a text with a confidence in `[0, 1]`.
///
/// Implementations are shared process-wide and must not keep per-call state.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Option<(Language, f64)>;
}

/// [`LanguageDetector`] backed by whatlang, restricted to a set of languages.
pub struct WhatlangDetector {
    detector: whatlang::Detector,
}

impl WhatlangDetector {
    pub fn new(languages: &[Language]) -> Self {
        let allowlist = languages.iter().map(|l| l.to_whatlang()).collect();
        Self {
            detector: whatlang::Detector::with_allowlist(allowlist),
        }
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<(Language, f64)> {
        if text.trim().is_empty() {
            return None;
        }
        let info = self.detector.detect(text)?;
        let language = Language::from_whatlang(info.lang())?;
        Some((language, info.confidence().clamp(0.0, 1.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_english() {
        let detector = WhatlangDetector::new(&Language::ALL);
        let (lang, confidence) = detector
            .detect("The quick brown fox jumps over the lazy dog and runs away into the forest")
            .unwrap();
        assert_eq!(lang, Language::English);
        assert!(confidence > 0.0 && confidence <= 1.0);
    }

    #[test]
    fn test_empty_text_has_no_language() {
        let detector = WhatlangDetector::new(&Language::ALL);
        assert!(detector.detect("   ").is_none());
    }

    #[test]
    fn test_allowlist_restricts_result() {
        let detector = WhatlangDetector::new(&[Language::German]);
        let result = detector.detect("Dies ist ein ganz normaler deutscher Satz über das Wetter");
        assert_eq!(result.map(|(l, _)| l), Some(Language::German));
    }
}
