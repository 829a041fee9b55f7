//! Confidence-based arbitration between OCR engines.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::{select_engine, EngineChoice, ImagePreprocessor, OcrEngine, OcrError, PreparedImage};
use crate::detection::LanguageDetector;
use crate::models::Language;
use crate::text::{letters_only, normalize_ocr_text};

/// One engine's normalized output with its detected language.
///
/// A language outside the supported set is recorded as `None` with
/// confidence 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcription {
    pub engine: String,
    pub text: String,
    pub language: Option<Language>,
    pub confidence: f64,
}

/// Final text and language for an image.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    pub text: String,
    pub language: Language,
    pub choice: EngineChoice,
    pub engine: String,
}

/// Runs both OCR engines on an image and keeps the more trustworthy output.
///
/// Engines and detector are shared, stateless executors; one arbiter serves
/// every image concurrently.
pub struct OcrArbiter {
    primary: Arc<dyn ImagePreprocessor>,
    secondary: Arc<dyn OcrEngine>,
    fallback: Arc<dyn OcrEngine>,
    detector: Arc<dyn LanguageDetector>,
    supported: Vec<Language>,
    default_languages: Vec<Language>,
}

impl OcrArbiter {
    pub fn new(
        primary: Arc<dyn ImagePreprocessor>,
        secondary: Arc<dyn OcrEngine>,
        fallback: Arc<dyn OcrEngine>,
        detector: Arc<dyn LanguageDetector>,
        supported: Vec<Language>,
        default_languages: Vec<Language>,
    ) -> Self {
        Self {
            primary,
            secondary,
            fallback,
            detector,
            supported,
            default_languages,
        }
    }

    /// Produce `(text, language)` for an image.
    pub async fn run(&self, image: &Path) -> Result<OcrOutput, OcrError> {
        let label = format!("File({})", image.display());

        info!("{}: Running {} preprocessing", label, self.primary.name());
        let prepared = match self.primary.preprocess(image).await {
            Ok(prepared) => prepared,
            Err(e) => {
                error!("{}: {} failed: {}", label, self.primary.name(), e);
                PreparedImage::original(image, "")
            }
        };
        let primary = self.assess(self.primary.name(), &prepared.text);

        info!("{}: Running {}", label, self.secondary.name());
        let hints = self.secondary_hints(primary.language);
        let secondary_text = match self.secondary.transcribe(&prepared.path, &hints).await {
            Ok(text) => text,
            Err(e) => {
                error!("{}: {} failed: {}", label, self.secondary.name(), e);
                String::new()
            }
        };
        drop(prepared);
        let secondary = self.assess(self.secondary.name(), &secondary_text);

        debug!(
            "{}: confidence {}={:.3} {}={:.3}",
            label, primary.engine, primary.confidence, secondary.engine, secondary.confidence
        );

        let choice = select_engine(primary.confidence, secondary.confidence);
        let chosen = match choice {
            EngineChoice::Primary => primary,
            EngineChoice::Secondary => secondary,
            EngineChoice::Fallback => {
                warn!(
                    "{}: OCR failed to obtain meaningful text, using {} as fallback",
                    label,
                    self.fallback.name()
                );
                self.run_fallback(&label, image).await?
            }
        };

        let Some(language) = chosen.language else {
            return Err(OcrError::Unresolvable);
        };
        info!(
            "{}: Using {} transcription ({})",
            label,
            chosen.engine,
            language.iso_639_1()
        );
        Ok(OcrOutput {
            text: chosen.text,
            language,
            choice,
            engine: chosen.engine,
        })
    }

    async fn run_fallback(&self, label: &str, image: &Path) -> Result<Transcription, OcrError> {
        let text = self
            .fallback
            .transcribe(image, &self.default_languages)
            .await
            .map_err(|e| {
                error!("{}: {} failed: {}", label, self.fallback.name(), e);
                OcrError::Unresolvable
            })?;
        Ok(self.assess(self.fallback.name(), &text))
    }

    /// Normalize an engine's output and score it by language detection.
    fn assess(&self, engine: &str, raw: &str) -> Transcription {
        let text = normalize_ocr_text(raw);
        let (language, confidence) = match self.detector.detect(&letters_only(&text)) {
            Some((language, confidence)) if self.supported.contains(&language) => {
                (Some(language), confidence)
            }
            _ => (None, 0.0),
        };
        Transcription {
            engine: engine.to_string(),
            text,
            language,
            confidence,
        }
    }

    /// The primary's language plus English, which mixes into most documents.
    fn secondary_hints(&self, detected: Option<Language>) -> Vec<Language> {
        match detected {
            Some(Language::English) => vec![Language::English],
            Some(language) => vec![language, Language::English],
            None => self.default_languages.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakePreprocessor(Option<&'static str>);

    #[async_trait]
    impl ImagePreprocessor for FakePreprocessor {
        fn name(&self) -> &str {
            "tesseract"
        }

        async fn preprocess(&self, image: &Path) -> Result<PreparedImage, OcrError> {
            match self.0 {
                Some(text) => Ok(PreparedImage::original(image, text)),
                None => Err(OcrError::Engine {
                    engine: "tesseract",
                    message: "crashed".to_string(),
                }),
            }
        }
    }

    struct FakeEngine {
        name: &'static str,
        text: Option<&'static str>,
        hints: Mutex<Vec<Vec<Language>>>,
    }

    impl FakeEngine {
        fn new(name: &'static str, text: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                name,
                text,
                hints: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl OcrEngine for FakeEngine {
        fn name(&self) -> &str {
            self.name
        }

        async fn transcribe(&self, _image: &Path, languages: &[Language]) -> Result<String, OcrError> {
            self.hints.lock().unwrap().push(languages.to_vec());
            self.text.map(String::from).ok_or(OcrError::Status {
                service: "fake",
                status: 503,
            })
        }
    }

    /// Scores known letter-only texts, everything else is undetected.
    struct FakeDetector(HashMap<&'static str, (Language, f64)>);

    impl LanguageDetector for FakeDetector {
        fn detect(&self, text: &str) -> Option<(Language, f64)> {
            self.0.get(text).copied()
        }
    }

    fn detector() -> Arc<FakeDetector> {
        Arc::new(FakeDetector(HashMap::from([
            ("primary text", (Language::Czech, 1.0)),
            ("primary weak", (Language::Czech, 0.4)),
            ("secondary text", (Language::Czech, 0.8)),
            ("secondary weak", (Language::Czech, 0.3)),
            ("tika text", (Language::English, 0.2)),
            ("tika german", (Language::German, 0.99)),
        ])))
    }

    fn arbiter(
        primary: Option<&'static str>,
        secondary: Arc<FakeEngine>,
        fallback: Arc<FakeEngine>,
    ) -> OcrArbiter {
        OcrArbiter::new(
            Arc::new(FakePreprocessor(primary)),
            secondary,
            fallback,
            detector(),
            vec![Language::English, Language::Czech],
            vec![Language::English, Language::Czech],
        )
    }

    #[tokio::test]
    async fn test_perfect_primary_wins() {
        let secondary = FakeEngine::new("easyocr", Some("Secondary  TEXT"));
        let fallback = FakeEngine::new("tika", Some("tika text"));
        let output = arbiter(Some("Primary\nText 123"), secondary.clone(), fallback.clone())
            .run(Path::new("/scan.png"))
            .await
            .unwrap();

        assert_eq!(output.choice, EngineChoice::Primary);
        assert_eq!(output.text, "primary text 123");
        assert_eq!(output.language, Language::Czech);
        assert_eq!(
            secondary.hints.lock().unwrap()[0],
            vec![Language::Czech, Language::English]
        );
        assert!(fallback.hints.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_secondary_failure_counts_as_zero() {
        let secondary = FakeEngine::new("easyocr", None);
        let fallback = FakeEngine::new("tika", Some("tika text"));
        let output = arbiter(Some("primary text"), secondary, fallback)
            .run(Path::new("/scan.png"))
            .await
            .unwrap();
        assert_eq!(output.choice, EngineChoice::Primary);
        assert_eq!(output.engine, "tesseract");
    }

    #[tokio::test]
    async fn test_primary_failure_still_runs_secondary() {
        let secondary = FakeEngine::new("easyocr", Some("secondary text"));
        let fallback = FakeEngine::new("tika", Some("tika text"));
        let output = arbiter(None, secondary.clone(), fallback)
            .run(Path::new("/scan.png"))
            .await
            .unwrap();

        assert_eq!(output.choice, EngineChoice::Secondary);
        assert_eq!(output.text, "secondary text");
        assert_eq!(
            secondary.hints.lock().unwrap()[0],
            vec![Language::English, Language::Czech]
        );
    }

    #[tokio::test]
    async fn test_low_confidence_uses_fallback_unconditionally() {
        let secondary = FakeEngine::new("easyocr", Some("secondary weak"));
        let fallback = FakeEngine::new("tika", Some("Tika text"));
        let output = arbiter(Some("primary weak"), secondary, fallback)
            .run(Path::new("/scan.png"))
            .await
            .unwrap();

        assert_eq!(output.choice, EngineChoice::Fallback);
        assert_eq!(output.text, "tika text");
        assert_eq!(output.language, Language::English);
    }

    #[tokio::test]
    async fn test_unsupported_fallback_language_is_unresolvable() {
        let secondary = FakeEngine::new("easyocr", Some("secondary weak"));
        let fallback = FakeEngine::new("tika", Some("tika german"));
        let result = arbiter(Some("primary weak"), secondary, fallback)
            .run(Path::new("/scan.png"))
            .await;
        assert!(matches!(result, Err(OcrError::Unresolvable)));
    }

    #[tokio::test]
    async fn test_fallback_failure_is_unresolvable() {
        let secondary = FakeEngine::new("easyocr", None);
        let fallback = FakeEngine::new("tika", None);
        let result = arbiter(None, secondary, fallback)
            .run(Path::new("/scan.png"))
            .await;
        assert!(matches!(result, Err(OcrError::Unresolvable)));
    }
}
