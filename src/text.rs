//! Text utilities: batch splitting, context windows and OCR text cleanup.

use tracing::warn;

/// A contiguous piece of a document submitted as one inference unit.
///
/// `offset` is the byte position of `text` in the source document. Chunks
/// returned by [`split_text`] tile the source exactly, so concatenating their
/// `text` in `index` order reproduces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub index: usize,
    pub offset: usize,
    pub text: &'a str,
}

/// Split `text` into near-equal chunks of at most `max_chars` characters.
///
/// Chunks end right after a whitespace character, so words are never cut.
/// Each cut lands on the whitespace nearest the even split point, looking
/// both back and ahead up to the limit. A whitespace-free run longer than `max_chars` is the only exception and is
/// cut at the limit. Text within the limit comes back as a single chunk.
pub fn split_text(text: &str, max_chars: usize) -> Vec<Chunk<'_>> {
    let max_chars = max_chars.max(1);
    let total = text.chars().count();
    if total <= max_chars {
        return vec![Chunk {
            index: 0,
            offset: 0,
            text,
        }];
    }

    let mut chunks = Vec::with_capacity(total.div_ceil(max_chars));
    let mut start = 0;
    let mut remaining = total;

    while remaining > max_chars {
        let rest = &text[start..];
        let pieces = remaining.div_ceil(max_chars);
        let target = remaining.div_ceil(pieces);
        let ideal = byte_offset(rest, target);
        let limit = byte_offset(rest, max_chars);

        let before = rest[..ideal]
            .rfind(char::is_whitespace)
            .map(|pos| pos + char_len_at(rest, pos));
        let after = rest[ideal..limit]
            .find(char::is_whitespace)
            .map(|pos| ideal + pos + char_len_at(rest, ideal + pos));

        let end = match (before, after) {
            (Some(back), Some(ahead)) => {
                let short_by = target - rest[..back].chars().count();
                let long_by = rest[..ahead].chars().count() - target;
                if long_by < short_by {
                    ahead
                } else {
                    back
                }
            }
            (Some(back), None) => back,
            (None, Some(ahead)) => ahead,
            (None, None) => {
                warn!(
                    "No whitespace within {} characters at byte {}, cutting mid-token",
                    max_chars, start
                );
                limit
            }
        };

        let piece = &rest[..end];
        chunks.push(Chunk {
            index: chunks.len(),
            offset: start,
            text: piece,
        });
        remaining -= piece.chars().count();
        start += end;
    }

    if start < text.len() {
        chunks.push(Chunk {
            index: chunks.len(),
            offset: start,
            text: &text[start..],
        });
    }

    chunks
}

/// Byte offset of the `n`th character, or the string length past the end.
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

fn char_len_at(s: &str, pos: usize) -> usize {
    s[pos..].chars().next().map(char::len_utf8).unwrap_or(0)
}

/// Excerpt of `text` around the byte range `start..end`, extending
/// `length / 2` characters to each side, with whitespace collapsed.
/// An invalid range yields an empty excerpt.
pub fn context_window(text: &str, start: usize, end: usize, length: usize) -> String {
    if start > end || text.get(start..end).is_none() {
        return String::new();
    }
    let radius = length / 2;
    let from = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());

    collapse_whitespace(&text[from..to])
}

/// Find `value` in `text` at or after byte `from`, falling back to a search
/// from the start. Returns the byte range of the match.
pub fn locate(text: &str, value: &str, from: usize) -> Option<(usize, usize)> {
    if value.is_empty() {
        return None;
    }
    let from = if text.is_char_boundary(from) { from } else { 0 };
    text[from..]
        .find(value)
        .map(|pos| from + pos)
        .or_else(|| text.find(value))
        .map(|pos| (pos, pos + value.len()))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean raw OCR output: drop control characters, collapse whitespace and
/// lowercase.
pub fn normalize_ocr_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();
    collapse_whitespace(&cleaned).to_lowercase()
}

/// Letters-only view of `text` for language detection. Digits and
/// punctuation are OCR noise that skews detection confidence.
pub fn letters_only(text: &str) -> String {
    let letters: String = text
        .chars()
        .map(|c| if c.is_alphabetic() { c } else { ' ' })
        .collect();
    collapse_whitespace(&letters)
}
