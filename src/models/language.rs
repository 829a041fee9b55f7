//! Languages the recognition pipeline can route.

use serde::{Deserialize, Serialize};

/// A document language, identified on the wire by its ISO 639-1 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "cs")]
    Czech,
    #[serde(rename = "sk")]
    Slovak,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "nl")]
    Dutch,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "uk")]
    Ukrainian,
    #[serde(rename = "pl")]
    Polish,
    #[serde(rename = "ru")]
    Russian,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "it")]
    Italian,
    #[serde(rename = "da")]
    Danish,
    #[serde(rename = "pt")]
    Portuguese,
    #[serde(rename = "sv")]
    Swedish,
    #[serde(rename = "ro")]
    Romanian,
}

impl Language {
    pub const ALL: [Language; 15] = [
        Language::Czech,
        Language::Slovak,
        Language::English,
        Language::Dutch,
        Language::German,
        Language::Spanish,
        Language::Ukrainian,
        Language::Polish,
        Language::Russian,
        Language::French,
        Language::Italian,
        Language::Danish,
        Language::Portuguese,
        Language::Swedish,
        Language::Romanian,
    ];

    /// ISO 639-1 code, as used in index documents and by the OCR service.
    pub fn iso_639_1(&self) -> &'static str {
        match self {
            Language::Czech => "cs",
            Language::Slovak => "sk",
            Language::English => "en",
            Language::Dutch => "nl",
            Language::German => "de",
            Language::Spanish => "es",
            Language::Ukrainian => "uk",
            Language::Polish => "pl",
            Language::Russian => "ru",
            Language::French => "fr",
            Language::Italian => "it",
            Language::Danish => "da",
            Language::Portuguese => "pt",
            Language::Swedish => "sv",
            Language::Romanian => "ro",
        }
    }

    /// ISO 639-3 code, as used by Tesseract language packs.
    pub fn iso_639_3(&self) -> &'static str {
        match self {
            Language::Czech => "ces",
            Language::Slovak => "slk",
            Language::English => "eng",
            Language::Dutch => "nld",
            Language::German => "deu",
            Language::Spanish => "spa",
            Language::Ukrainian => "ukr",
            Language::Polish => "pol",
            Language::Russian => "rus",
            Language::French => "fra",
            Language::Italian => "ita",
            Language::Danish => "dan",
            Language::Portuguese => "por",
            Language::Swedish => "swe",
            Language::Romanian => "ron",
        }
    }

    /// Parse a two- or three-letter code, case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|l| l.iso_639_1() == code || l.iso_639_3() == code)
    }

    pub fn from_whatlang(lang: whatlang::Lang) -> Option<Self> {
        use whatlang::Lang;
        match lang {
            Lang::Ces => Some(Language::Czech),
            Lang::Slk => Some(Language::Slovak),
            Lang::Eng => Some(Language::English),
            Lang::Nld => Some(Language::Dutch),
            Lang::Deu => Some(Language::German),
            Lang::Spa => Some(Language::Spanish),
            Lang::Ukr => Some(Language::Ukrainian),
            Lang::Pol => Some(Language::Polish),
            Lang::Rus => Some(Language::Russian),
            Lang::Fra => Some(Language::French),
            Lang::Ita => Some(Language::Italian),
            Lang::Dan => Some(Language::Danish),
            Lang::Por => Some(Language::Portuguese),
            Lang::Swe => Some(Language::Swedish),
            Lang::Ron => Some(Language::Romanian),
            _ => None,
        }
    }

    pub fn to_whatlang(self) -> whatlang::Lang {
        use whatlang::Lang;
        match self {
            Language::Czech => Lang::Ces,
            Language::Slovak => Lang::Slk,
            Language::English => Lang::Eng,
            Language::Dutch => Lang::Nld,
            Language::German => Lang::Deu,
            Language::Spanish => Lang::Spa,
            Language::Ukrainian => Lang::Ukr,
            Language::Polish => Lang::Pol,
            Language::Russian => Lang::Rus,
            Language::French => Lang::Fra,
            Language::Italian => Lang::Ita,
            Language::Danish => Lang::Dan,
            Language::Portuguese => Lang::Por,
            Language::Swedish => Lang::Swe,
            Language::Romanian => Lang::Ron,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.iso_639_1())
    }
}
