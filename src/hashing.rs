use crate::config::Locale;
use itertools::Itertools;
use sha2::{Digest, Sha256};

/// Count whitespace-separated words in a name
pub fn count_words(name: &str) -> u32 {
    name.split_whitespace().count() as u32
}

/// Trim, collapse inner whitespace and lower-case using the rules of `lang`.
pub fn normalize_name(name: &str, lang: &str) -> String {
    let collapsed = name.split_whitespace().join(" ");

    match lang {
        // dotted and dotless i fold differently in Turkic languages
        "tr" | "az" => collapsed
            .chars()
            .map(|c| match c {
                'I' => 'ı',
                'İ' => 'i',
                _ => c,
            })
            .collect::<String>()
            .to_lowercase(),
        _ => collapsed.to_lowercase(),
    }
}

/// Deterministic hash of a normalized name within a locale.
pub fn name_hash(name: &str, locale: &Locale) -> String {
    let normalized = normalize_name(name, locale.lang());
    let mut hasher = Sha256::new();
    hasher.update(locale.lang().as_bytes());
    hasher.update(b"_");
    hasher.update(locale.country().as_bytes());
    hasher.update(b"_");
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}
