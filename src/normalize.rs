//! Message normalization and cache-key hashing.
//!
//! Two messages that normalize to the same text are cache-equivalent,
//! regardless of punctuation, case or whitespace.

/// Canonicalize a message for equality comparison.
///
/// Trims, lowercases, strips everything that is not alphanumeric, `_`
/// or whitespace, then collapses whitespace runs to a single space.
/// Total: empty input yields an empty key.
pub fn normalize(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 32-bit rolling string hash (`h = h * 31 + c`, wrapping).
///
/// Stable across processes and platforms, which matters because keys are
/// persisted to durable storage. Collisions are tolerated: a collision
/// only produces an occasional wrong cache hit.
pub fn string_hash(text: &str) -> u32 {
    text.encode_utf16()
        .fold(0i32, |hash, unit| {
            hash.wrapping_shl(5)
                .wrapping_sub(hash)
                .wrapping_add(i32::from(unit))
        })
        .unsigned_abs()
}

/// Cache key for a raw message: `msg_<hex hash of normalized text>`.
pub fn cache_key(message: &str) -> String {
    format!("msg_{:x}", string_hash(&normalize(message)))
}

/// Informal Indonesian words and their standard forms. An empty target drops
/// the word.
const SLANG: &[(&str, &str)] = &[
    ("gw", "saya"),
    ("gue", "saya"),
    ("aku", "saya"),
    ("sy", "saya"),
    ("lu", "kamu"),
    ("loe", "kamu"),
    ("elu", "kamu"),
    ("kmrn", "kemarin"),
    ("kmaren", "kemarin"),
    ("skrg", "sekarang"),
    ("skr", "sekarang"),
    ("gak", "tidak"),
    ("nggak", "tidak"),
    ("ga", "tidak"),
    ("tdk", "tidak"),
    ("bs", "bisa"),
    ("mw", "ingin"),
    ("pingin", "ingin"),
    ("banget", "sekali"),
    ("bgt", "sekali"),
    ("keren", "bagus"),
    ("mantap", "bagus"),
    ("sip", "ya"),
    ("yoi", "ya"),
    ("nih", ""),
    ("dong", ""),
    ("gimana", "bagaimana"),
    ("gmn", "bagaimana"),
    ("dimana", "di mana"),
    ("dmn", "di mana"),
    ("kpn", "kapan"),
    ("ngapa", "mengapa"),
    ("knp", "mengapa"),
    ("kenapa", "mengapa"),
    ("makasih", "terima kasih"),
    ("thanks", "terima kasih"),
    ("plis", "tolong"),
    ("hai", "halo"),
    ("hey", "halo"),
];

/// [`normalize`], then replace informal Indonesian words with standard ones.
///
/// Replacement is per whole word, so "bgt" becomes "sekali" but "bgtu" is
/// left alone.
pub fn normalize_slang(text: &str) -> String {
    normalize(text)
        .split(' ')
        .map(|word| {
            SLANG
                .iter()
                .find(|(slang, _)| *slang == word)
                .map_or(word, |(_, formal)| *formal)
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
