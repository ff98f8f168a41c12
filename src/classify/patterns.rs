//! Keyword patterns for the classification rules.
//!
//! All patterns run against the trimmed, lowercased message. Keyword sets
//! overlap (e.g. "siapa" is both a wh-word and an ownership keyword); rule
//! order in [`Classifier`](super::Classifier) decides the outcome.

use std::sync::LazyLock;

use regex::Regex;

use super::Language;

/// Greeting tokens that must open the message, per language.
pub(crate) const GREETINGS: &[(&str, Language)] = &[
    ("halo", Language::Indonesian),
    ("hai", Language::Indonesian),
    ("helo", Language::Indonesian),
    ("hey", Language::Indonesian),
    ("salam", Language::Indonesian),
    ("selamat pagi", Language::Indonesian),
    ("selamat siang", Language::Indonesian),
    ("selamat sore", Language::Indonesian),
    ("selamat malam", Language::Indonesian),
    ("hi", Language::English),
    ("hello", Language::English),
    ("good morning", Language::English),
    ("good afternoon", Language::English),
    ("good evening", Language::English),
    ("good night", Language::English),
];

fn compile(pattern: &str) -> Regex {
    // Patterns are literals in this file; a failure here is a programming error.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

pub(crate) static SIMPLE_MATH: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[\d\s+\-*/%.,()]+$"));

pub(crate) static TIME_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"jam|waktu|tanggal|hari|bulan|tahun|time|what time|date|what day|clock")
});

pub(crate) static OWNERSHIP: LazyLock<Regex> = LazyLock::new(|| {
    compile(concat!(
        r"siapa yang membuat|siapa pembuat|siapa creator|siapa developer|siapa owner|",
        r"siapa pendiri|bagaimana dibuat|bagaiamana dibuat|siapa dibalik|siapa team|",
        r"who made|who created|who developed|who is the owner|who is the creator|",
        r"who built you|your creator|your developer|your owner|your team"
    ))
});

pub(crate) static PERSONAL: LazyLock<Regex> = LazyLock::new(|| {
    compile(concat!(
        r"siapa kamu|who are you|what are you|kenalkan|perkenalkan|describe yourself|",
        r"tentang kamu|about you|your name|namamu"
    ))
});

pub(crate) static CODING: LazyLock<Regex> = LazyLock::new(|| {
    compile(concat!(
        r"code|kode|program|script|function|variable|api|database|server|frontend|",
        r"backend|debug|error|bug|compile|deploy|github|git|terminal|command|linux|",
        r"python|javascript|java|c\+\+|ruby|php|html|css|react|vue|angular|node|",
        r"express|mongodb|sql|rust"
    ))
});

pub(crate) static CREATIVE: LazyLock<Regex> = LazyLock::new(|| {
    compile(concat!(
        r"cerita|puisi|lagu|syair|novel|fiksi|cerita pendek|story|poem|song|lyrics|",
        r"fiction|creative"
    ))
});

pub(crate) static SIMPLE_QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^(siapa|apa|dimana|kapan|mengapa|bagaimana|who|what|where|when|why|how)\s")
});

pub(crate) static COMPLEX_QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    compile(concat!(
        r"jelaskan|terangkan|analisis|bandingkan|evaluasi|rangkum|ringkas|bahas|tulis|",
        r"buat|ciptakan|invent|explain|analyze|compare|evaluate|summarize|write|create|",
        r"design|develop|build|code|program|debug|review|discuss|argumen|opinion|",
        r"thoughts|views"
    ))
});

pub(crate) static CURRENT_INFO: LazyLock<Regex> = LazyLock::new(|| {
    compile(concat!(
        r"berita|news|terkini|terbaru|hari ini|minggu ini|bulan ini|tahun ini|",
        r"covid|pandemi|election|pemilu|presiden|government|pemerintah|\b20\d\d\b"
    ))
});

/// Find the greeting token that opens `cleaned`, if any.
///
/// A token matches when it is the whole message or is followed by
/// whitespace or sentence punctuation. "halo, apa kabar" is a greeting;
/// "hiking", "hi-tech" and "hello_world" are not.
pub(crate) fn leading_greeting(cleaned: &str) -> Option<(&'static str, Language)> {
    GREETINGS.iter().copied().find(|(token, _)| {
        cleaned
            .strip_prefix(token)
            .is_some_and(|rest| rest.chars().next().is_none_or(ends_greeting))
    })
}

fn ends_greeting(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '.' | '!' | '?' | ';')
}
