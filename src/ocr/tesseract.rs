//! Tesseract as the primary OCR engine and image preprocessor.

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use tokio::process::Command;
use tracing::debug;

use super::{ImagePreprocessor, OcrError, PreparedImage};

/// Runs the `tesseract` binary found on `PATH`.
///
/// Preprocessing asks Tesseract's orientation detection (`--psm 0`) how far
/// the page is rotated, rotates it upright, converts to grayscale and
/// transcribes the result.
pub struct TesseractPreprocessor {
    binary: PathBuf,
    languages: String,
    args: Vec<String>,
}

impl TesseractPreprocessor {
    pub fn new(languages: impl Into<String>, config: &str) -> Result<Self, OcrError> {
        let binary = which::which("tesseract").map_err(|e| OcrError::EngineUnavailable {
            engine: "tesseract",
            message: e.to_string(),
        })?;
        Ok(Self::with_binary(binary, languages, config))
    }

    pub fn with_binary(binary: impl Into<PathBuf>, languages: impl Into<String>, config: &str) -> Self {
        Self {
            binary: binary.into(),
            languages: languages.into(),
            args: config.split_whitespace().map(String::from).collect(),
        }
    }

    async fn run(&self, image: &Path, extra: &[&str]) -> Result<Output, OcrError> {
        let output = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .args(extra)
            .output()
            .await?;
        Ok(output)
    }

    /// Clockwise rotation that makes the page upright, 0 when unknown.
    async fn detect_rotation(&self, image: &Path) -> u32 {
        match self.run(image, &["--psm", "0"]).await {
            Ok(output) if output.status.success() => {
                parse_osd_rotation(&String::from_utf8_lossy(&output.stdout)).unwrap_or(0)
            }
            Ok(output) => {
                // OSD fails on pages with too little text; keep orientation
                debug!(
                    "tesseract: orientation detection failed for {}: {}",
                    image.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                0
            }
            Err(e) => {
                debug!("tesseract: orientation detection failed: {}", e);
                0
            }
        }
    }

    async fn transcribe(&self, image: &Path) -> Result<String, OcrError> {
        let mut args = vec!["-l", self.languages.as_str()];
        args.extend(self.args.iter().map(String::as_str));

        let output = self.run(image, &args).await?;
        if !output.status.success() {
            return Err(OcrError::Engine {
                engine: "tesseract",
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ImagePreprocessor for TesseractPreprocessor {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn preprocess(&self, path: &Path) -> Result<PreparedImage, OcrError> {
        let rotation = self.detect_rotation(path).await;
        if rotation != 0 {
            debug!("tesseract: rotating {} by {} degrees", path.display(), rotation);
        }

        let source = path.to_path_buf();
        let prepared = tokio::task::spawn_blocking(move || -> Result<_, OcrError> {
            let img = image::open(&source)?;
            let gray = DynamicImage::ImageLuma8(rotate(img, rotation).to_luma8());
            let file = tempfile::Builder::new()
                .prefix("foia-ner-ocr-")
                .suffix(".png")
                .tempfile()?;
            gray.save_with_format(file.path(), ImageFormat::Png)?;
            Ok(file.into_temp_path())
        })
        .await??;

        let text = self.transcribe(&prepared).await?;
        Ok(PreparedImage::temporary(prepared, text))
    }
}

fn rotate(img: DynamicImage, degrees: u32) -> DynamicImage {
    match degrees % 360 {
        90 => img.rotate90(),
        180 => img.rotate180(),
        270 => img.rotate270(),
        _ => img,
    }
}

/// Extract the `Rotate:` value from Tesseract OSD output.
pub fn parse_osd_rotation(output: &str) -> Option<u32> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("Rotate:"))
        .and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    #[test]
    fn test_parse_osd_rotation() {
        let osd = "Page number: 0\nOrientation in degrees: 270\nRotate: 90\n\
                   Orientation confidence: 5.12\nScript: Latin\n";
        assert_eq!(parse_osd_rotation(osd), Some(90));
        assert_eq!(parse_osd_rotation("Script: Latin"), None);
        assert_eq!(parse_osd_rotation("Rotate: sideways"), None);
    }

    #[test]
    fn test_rotate_swaps_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, Rgb([255, 255, 255])));
        assert_eq!(rotate(img.clone(), 90).dimensions(), (2, 4));
        assert_eq!(rotate(img.clone(), 180).dimensions(), (4, 2));
        assert_eq!(rotate(img, 0).dimensions(), (4, 2));
    }

    #[test]
    fn test_config_split_into_args() {
        let engine = TesseractPreprocessor::with_binary("tesseract", "eng+ces", "--oem 3  --psm 6");
        assert_eq!(engine.args, vec!["--oem", "3", "--psm", "6"]);
        assert_eq!(engine.languages, "eng+ces");
    }
}
