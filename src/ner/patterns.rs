//! Deterministic pattern recognizers.
//!
//! These run on every batch regardless of the NER backend, never fail and
//! make no external calls.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{Entity, EntityType};
use crate::text::context_window;

/// Bank account numbers in IBAN layout: country code, check digits, then
/// 4-20 digits with optional spacing.
fn bank_account_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Z]{2}\s*\d{2}\s*(?:\d\s*){4,20}\b").expect("valid bank account regex")
    })
}

/// Legacy and P2SH bitcoin addresses: base58 alphabet (no 0, O, I, l),
/// 26-35 characters.
fn crypto_address_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[13][a-km-zA-HJ-NP-Z1-9]{25,34}\b").expect("valid crypto address regex")
    })
}

pub fn find_bank_accounts(text: &str, source_file: &str, context_length: usize) -> Vec<Entity> {
    bank_account_regex()
        .find_iter(text)
        .map(|m| {
            let value = m.as_str().trim_end();
            let normalized: String = value.chars().filter(|c| !c.is_whitespace()).collect();
            Entity::new(
                EntityType::FinancialAccount,
                value,
                Some(normalized),
                context_window(text, m.start(), m.start() + value.len(), context_length),
                source_file,
            )
        })
        .collect()
}

pub fn find_crypto_addresses(text: &str, source_file: &str, context_length: usize) -> Vec<Entity> {
    crypto_address_regex()
        .find_iter(text)
        .map(|m| {
            Entity::new(
                EntityType::CryptoAddress,
                m.as_str(),
                Some(m.as_str().to_string()),
                context_window(text, m.start(), m.end(), context_length),
                source_file,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_spaced_iban() {
        let text = "Platba na účet CZ65 0800 0000 1920 0014 5399 proběhla.";
        let found = find_bank_accounts(text, "memo.txt", 40);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value(), "CZ65 0800 0000 1920 0014 5399");
        assert_eq!(found[0].normalized_value(), Some("CZ6508000000192000145399"));
        assert_eq!(found[0].entity_type(), EntityType::FinancialAccount);
        assert!(found[0].context().contains("účet"));
    }

    #[test]
    fn test_bank_account_requires_country_code() {
        assert!(find_bank_accounts("call 0800 0000 1920", "a", 40).is_empty());
        assert!(find_bank_accounts("cz65 0800 0000 1920", "a", 40).is_empty());
    }

    #[test]
    fn test_finds_bitcoin_address() {
        let text = "send to 1BoatSLRHtKNngkdXEeobR76b53LETtpyT now";
        let found = find_crypto_addresses(text, "chat.txt", 200);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value(), "1BoatSLRHtKNngkdXEeobR76b53LETtpyT");
        assert_eq!(found[0].context(), text);
    }

    #[test]
    fn test_crypto_address_rejects_ambiguous_characters() {
        // 'O' and 'l' are outside the base58 alphabet
        assert!(find_crypto_addresses("1BOatSLRHtKNngkdXEeobR76b53LETtpyT", "a", 10).is_empty());
        assert!(find_crypto_addresses("1BoatSLRHtKNngkdXEeobR76b53LETtpyl", "a", 10).is_empty());
    }

    #[test]
    fn test_crypto_address_length_bounds() {
        let short = format!("1{}", "A".repeat(24));
        let long = format!("1{}", "A".repeat(35));
        assert!(find_crypto_addresses(&short, "a", 10).is_empty());
        assert!(find_crypto_addresses(&long, "a", 10).is_empty());
        assert_eq!(find_crypto_addresses(&format!("3{}", "A".repeat(25)), "a", 10).len(), 1);
    }
}
