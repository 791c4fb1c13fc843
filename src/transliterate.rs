//! Approximate Devanagari → Latin transliteration.
//!
//! This is a character substitution heuristic, not a phonetic standard: each
//! known grapheme is replaced by a fixed romanization and one cleanup pass
//! shortens doubled "aa". Results are deterministic but not reversible and
//! not linguistically validated. Characters outside the table (Latin text,
//! digits, punctuation, whitespace, the virama) pass through unchanged.

use crate::config::DisplayConfig;

/// Transforms a lyric token before it is rendered.
pub trait Transliterator: Send + Sync {
    fn apply(&self, text: &str) -> String;

    /// Name for logging/diagnostics.
    fn name(&self) -> &'static str;
}

/// Devanagari table lookup plus "aa" cleanup.
#[derive(Debug, Clone, Copy, Default)]
pub struct Devanagari;

impl Transliterator for Devanagari {
    fn apply(&self, text: &str) -> String {
        transliterate(text)
    }

    fn name(&self) -> &'static str {
        "devanagari"
    }
}

/// Leaves tokens untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Transliterator for Passthrough {
    fn apply(&self, text: &str) -> String {
        text.to_string()
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}

/// Pick the transliterator for the display settings.
pub fn from_config(config: &DisplayConfig) -> Box<dyn Transliterator> {
    if config.transliterate {
        Box::new(Devanagari)
    } else {
        Box::new(Passthrough)
    }
}

/// Romanization for a single Devanagari character, if it has one.
pub fn romanize(ch: char) -> Option<&'static str> {
    let mapped = match ch {
        // Independent vowels
        'अ' => "a",
        'आ' => "aa",
        'इ' => "i",
        'ई' => "ee",
        'उ' => "u",
        'ऊ' => "oo",
        'ऋ' => "ri",
        'ए' => "e",
        'ऐ' => "ai",
        'ओ' => "o",
        'औ' => "au",
        // Consonants
        'क' => "ka",
        'ख' => "kha",
        'ग' => "ga",
        'घ' => "gha",
        'ङ' => "nga",
        'च' => "cha",
        'छ' => "chha",
        'ज' => "ja",
        'झ' => "jha",
        'ञ' => "nya",
        'ट' => "ta",
        'ठ' => "tha",
        'ड' => "da",
        'ढ' => "dha",
        'ण' => "na",
        'त' => "ta",
        'थ' => "tha",
        'द' => "da",
        'ध' => "dha",
        'न' => "na",
        'प' => "pa",
        'फ' => "pha",
        'ब' => "ba",
        'भ' => "bha",
        'म' => "ma",
        'य' => "ya",
        'र' => "ra",
        'ल' => "la",
        'व' => "va",
        'श' => "sha",
        'ष' => "sha",
        'स' => "sa",
        'ह' => "ha",
        // Dependent vowel signs
        'ा' => "a",
        'ि' => "i",
        'ी' => "ee",
        'ु' => "u",
        'ू' => "oo",
        'ृ' => "ri",
        'े' => "e",
        'ै' => "ai",
        'ो' => "o",
        'ौ' => "au",
        // Nasalization and visarga
        'ं' => "n",
        'ः' => "h",
        'ँ' => "n",
        // Digits
        '०' => "0",
        '१' => "1",
        '२' => "2",
        '३' => "3",
        '४' => "4",
        '५' => "5",
        '६' => "6",
        '७' => "7",
        '८' => "8",
        '९' => "9",
        // Danda
        '।' => ".",
        '॥' => "..",
        _ => return None,
    };
    Some(mapped)
}

/// Transliterate a token. See the module docs for the caveats.
pub fn transliterate(text: &str) -> String {
    let mut substituted = String::with_capacity(text.len());
    for ch in text.chars() {
        match romanize(ch) {
            Some(roman) => substituted.push_str(roman),
            None => substituted.push(ch),
        }
    }
    collapse_double_a(&substituted)
}

/// Shorten "aa" to "a" unless it ends the string.
///
/// Single left-to-right pass over non-overlapping pairs; output is not
/// rescanned, so "aaa" becomes "aa" and "aaaa" becomes "aaa".
fn collapse_double_a(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let pair = chars[i] == 'a' && chars.get(i + 1) == Some(&'a');
        if pair && i + 2 < chars.len() {
            out.push('a');
            i += 2;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}
