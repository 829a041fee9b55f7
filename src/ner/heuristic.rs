//! Heuristic in-process NER model.
//!
//! Tags capitalized spans using high-precision structural cues (honorifics,
//! legal-form suffixes, locative prepositions) and numeric date layouts. It
//! emits spaCy-style labels so it shares the local label table with any
//! statistical model plugged in behind [`LocalModel`].

use std::sync::OnceLock;

use regex::Regex;

use super::{AdapterError, LocalModel, RawEntity};
use crate::models::Language;

// Honorifics and titles preceding a person's name
const PERSON_PREFIX: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "ing", "mgr", "judr", "mudr", "pan", "paní", "pani", "herr",
    "frau", "monsieur", "mme", "m", "señor", "señora", "sr", "sra", "signor", "signora", "sig",
    "senhor", "senhora", "hr", "fru", "domnul", "doamna", "господин", "госпожа",
];

// Legal-form suffixes closing an organization name
const ORG_SUFFIX: &[&str] = &[
    "inc", "corp", "ltd", "llc", "plc", "gmbh", "ag", "kg", "sa", "sarl", "srl", "spa", "bv", "nv",
    "ab", "as", "aps", "oy", "s.r.o", "a.s", "sp", "o.o", "lda", "ооо", "зао", "bank", "group",
    "holding", "holdings", "foundation", "university", "institute", "agency", "ministry",
];

// Prepositions that typically introduce a place name
const LOC_PREPOSITION: &[&str] = &[
    "in", "from", "near", "v", "ve", "z", "ze", "do", "w", "we", "en", "dans", "à", "a", "da",
    "em", "na", "i", "från", "fra", "în", "din", "в", "из", "во",
];

// Lowercase words allowed inside a capitalized span
const CONNECTORS: &[&str] = &["of", "de", "del", "della", "von", "van", "der", "la", "du", "y"];

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:\d{1,2}[./-]\s?\d{1,2}[./-]\s?\d{4}|\d{4}-\d{2}-\d{2})\b")
            .expect("valid date regex")
    })
}

/// A whitespace-delimited word with surrounding punctuation trimmed.
#[derive(Debug, Clone, Copy)]
struct Word<'a> {
    core: &'a str,
    start: usize,
    end: usize,
    /// The raw word ended a sentence.
    closes_sentence: bool,
}

impl Word<'_> {
    fn is_capitalized(&self) -> bool {
        self.core.chars().next().is_some_and(|c| c.is_uppercase())
    }

    fn lower(&self) -> String {
        self.core.to_lowercase()
    }
}

fn words(text: &str) -> Vec<Word<'_>> {
    let mut out = Vec::new();
    let mut offset = 0;
    for raw in text.split_inclusive(char::is_whitespace) {
        let token = raw.trim_end();
        let lead = token.len() - token.trim_start_matches(|c: char| !c.is_alphanumeric()).len();
        let core = token
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .trim_end_matches(|c: char| !c.is_alphanumeric());
        if !core.is_empty() {
            out.push(Word {
                core,
                start: offset + lead,
                end: offset + lead + core.len(),
                closes_sentence: token.ends_with(&['.', '!', '?'][..]) && !is_abbreviation(core),
            });
        }
        offset += raw.len();
    }
    out
}

fn is_abbreviation(core: &str) -> bool {
    let lower = core.to_lowercase();
    PERSON_PREFIX.contains(&lower.as_str()) || ORG_SUFFIX.contains(&lower.as_str())
}

/// Model tagging PERSON, ORG, GPE and DATE spans without external resources.
#[derive(Debug, Clone, Default)]
pub struct HeuristicModel;

impl HeuristicModel {
    pub fn new() -> Self {
        Self
    }

    fn tag_spans(&self, text: &str, out: &mut Vec<RawEntity>) {
        let words = words(text);
        let mut i = 0;
        while i < words.len() {
            if !words[i].is_capitalized() || is_abbreviation(words[i].core) {
                i += 1;
                continue;
            }

            let first = i;
            let mut last = i;
            let mut j = i + 1;
            while j < words.len() && !words[j - 1].closes_sentence {
                if words[j].is_capitalized() {
                    last = j;
                } else if !CONNECTORS.contains(&words[j].core) {
                    break;
                }
                j += 1;
            }
            i = last + 1;

            let prev = first.checked_sub(1).map(|p| words[p]);
            let at_sentence_start = prev.map_or(true, |p| p.closes_sentence);
            let prev_lower = prev.map(|p| p.lower()).unwrap_or_default();
            let last_lower = words[last].lower();
            let span_len = last - first + 1;

            let label = if prev.is_some() && PERSON_PREFIX.contains(&prev_lower.as_str()) {
                "PERSON"
            } else if span_len > 1 && ORG_SUFFIX.contains(&last_lower.as_str()) {
                "ORG"
            } else if prev.is_some() && LOC_PREPOSITION.contains(&prev_lower.as_str()) {
                "GPE"
            } else if (2..=3).contains(&span_len) && !at_sentence_start {
                "PERSON"
            } else {
                continue;
            };

            let (start, end) = (words[first].start, words[last].end);
            out.push(RawEntity::new(label, &text[start..end], start, end));
        }
    }
}

impl LocalModel for HeuristicModel {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn predict(
        &self,
        text: &str,
        _language: Language,
        _model: &str,
    ) -> Result<Vec<RawEntity>, AdapterError> {
        let mut out = Vec::new();
        self.tag_spans(text, &mut out);
        out.extend(
            date_regex()
                .find_iter(text)
                .map(|m| RawEntity::new("DATE", m.as_str(), m.start(), m.end())),
        );
        Ok(out)
    }
}
