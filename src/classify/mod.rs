//! Rule-based message classification.
//!
//! [`Classifier::classify`] runs a fixed, ordered list of rules over the
//! trimmed, lowercased message. The first matching rule wins:
//!
//! ```text
//! greeting → math → time → faq → ownership          (answered locally)
//! personal → coding → creative → simple → complex
//!          → current → general                      (sent to the backend)
//! ```
//!
//! Classification is total: every message gets exactly one [`Category`].
//! Arithmetic that fails to evaluate is not an error, the math rule is
//! simply skipped and evaluation falls through to the next rule.

pub mod arith;
pub mod faq;
pub(crate) mod patterns;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::respond::LocalResponder;
use crate::telemetry;

pub use arith::{EvalError, evaluate, format_result};
pub use faq::FaqTable;

/// Longest trimmed message (in characters, exclusive) the math rule considers.
const MATH_MAX_CHARS: usize = 20;

/// The closed set of message categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Greeting,
    Math,
    Time,
    Faq,
    Ownership,
    Personal,
    Coding,
    Creative,
    Simple,
    Complex,
    Current,
    General,
}

impl Category {
    /// Every category, in rule evaluation order.
    pub const ALL: [Category; 12] = [
        Category::Greeting,
        Category::Math,
        Category::Time,
        Category::Faq,
        Category::Ownership,
        Category::Personal,
        Category::Coding,
        Category::Creative,
        Category::Simple,
        Category::Complex,
        Category::Current,
        Category::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Greeting => "greeting",
            Category::Math => "math",
            Category::Time => "time",
            Category::Faq => "faq",
            Category::Ownership => "ownership",
            Category::Personal => "personal",
            Category::Coding => "coding",
            Category::Creative => "creative",
            Category::Simple => "simple",
            Category::Complex => "complex",
            Category::Current => "current",
            Category::General => "general",
        }
    }

    /// Whether messages in this category are answered by the remote backend.
    pub fn needs_remote(self) -> bool {
        match self {
            Category::Greeting
            | Category::Math
            | Category::Time
            | Category::Faq
            | Category::Ownership => false,
            Category::Personal
            | Category::Coding
            | Category::Creative
            | Category::Simple
            | Category::Complex
            | Category::Current
            | Category::General => true,
        }
    }

    /// Informational confidence for this category. Never used for branching.
    pub fn confidence(self) -> f32 {
        match self {
            Category::Greeting | Category::Ownership => 0.95,
            Category::Math | Category::Faq | Category::Current => 0.9,
            Category::Time | Category::Coding | Category::Creative => 0.85,
            Category::Complex => 0.8,
            Category::Personal => 0.75,
            Category::Simple => 0.6,
            Category::General => 0.5,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language of a recognised greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Indonesian,
    English,
}

/// Outcome of classifying one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub category: Category,
    pub needs_remote: bool,
    /// 0.0–1.0, informational only.
    pub confidence: f32,
    /// Precomputed reply (or raw arithmetic result for `Math`) when the
    /// message can be answered without the backend.
    pub local_result: Option<String>,
}

impl Classification {
    fn local(category: Category, result: String) -> Self {
        Self {
            category,
            needs_remote: false,
            confidence: category.confidence(),
            local_result: Some(result),
        }
    }

    fn remote(category: Category) -> Self {
        Self {
            category,
            needs_remote: true,
            confidence: category.confidence(),
            local_result: None,
        }
    }
}

/// Ordered rule classifier.
///
/// Deterministic for a given message, except that `Time` replies embed the
/// responder's current clock reading.
pub struct Classifier {
    faq: FaqTable,
    responder: LocalResponder,
}

impl Classifier {
    pub fn new(faq: FaqTable, responder: LocalResponder) -> Self {
        Self { faq, responder }
    }

    pub fn faq(&self) -> &FaqTable {
        &self.faq
    }

    pub fn responder(&self) -> &LocalResponder {
        &self.responder
    }

    /// Classify a message. Never fails.
    pub fn classify(&self, message: &str) -> Classification {
        let result = self.run_rules(message);
        debug!(
            category = %result.category,
            needs_remote = result.needs_remote,
            confidence = result.confidence,
            "classified message"
        );
        metrics::counter!(telemetry::CLASSIFICATIONS_TOTAL, "category" => result.category.as_str())
            .increment(1);
        result
    }

    fn run_rules(&self, message: &str) -> Classification {
        let trimmed = message.trim();
        let cleaned = trimmed.to_lowercase();

        if let Some((_, language)) = patterns::leading_greeting(&cleaned) {
            let reply = self.responder.greeting(message, language);
            return Classification::local(Category::Greeting, reply);
        }

        if let Some(result) = simple_math(trimmed) {
            return Classification::local(Category::Math, result);
        }

        if patterns::TIME_QUERY.is_match(&cleaned) {
            let reply = self.responder.time_reply(&cleaned);
            return Classification::local(Category::Time, reply);
        }

        if let Some(answer) = self.faq.lookup(&cleaned) {
            return Classification::local(Category::Faq, answer.to_string());
        }

        if patterns::OWNERSHIP.is_match(&cleaned) {
            let reply = self.responder.ownership_reply(&cleaned);
            return Classification::local(Category::Ownership, reply);
        }

        if patterns::PERSONAL.is_match(&cleaned) {
            return Classification::remote(Category::Personal);
        }

        if patterns::CODING.is_match(&cleaned) {
            return Classification::remote(Category::Coding);
        }

        if patterns::CREATIVE.is_match(&cleaned) {
            return Classification::remote(Category::Creative);
        }

        let complex = patterns::COMPLEX_QUESTION.is_match(&cleaned);
        if patterns::SIMPLE_QUESTION.is_match(&cleaned) && !complex {
            return Classification::remote(Category::Simple);
        }

        if complex {
            return Classification::remote(Category::Complex);
        }

        if patterns::CURRENT_INFO.is_match(&cleaned) {
            return Classification::remote(Category::Current);
        }

        Classification::remote(Category::General)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(FaqTable::default(), LocalResponder::default())
    }
}

/// Evaluate `trimmed` if it looks like a short arithmetic expression.
///
/// Returns the formatted result, or `None` when the message is not purely
/// arithmetic, too long, or does not evaluate to a finite number.
fn simple_math(trimmed: &str) -> Option<String> {
    if trimmed.chars().count() >= MATH_MAX_CHARS
        || !trimmed.chars().any(|c| c.is_ascii_digit())
        || !patterns::SIMPLE_MATH.is_match(trimmed)
    {
        return None;
    }

    match evaluate(trimmed) {
        Ok(value) => Some(format_result(value)),
        Err(e) => {
            debug!(expression = trimmed, error = %e, "math rule skipped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_remote_split() {
        let local: Vec<_> = Category::ALL
            .iter()
            .filter(|c| !c.needs_remote())
            .collect();
        assert_eq!(
            local,
            vec![
                &Category::Greeting,
                &Category::Math,
                &Category::Time,
                &Category::Faq,
                &Category::Ownership
            ]
        );
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Ownership).unwrap();
        assert_eq!(json, "\"ownership\"");
    }

    #[test]
    fn simple_math_bounds() {
        assert_eq!(simple_math("2+2"), Some("4".to_string()));
        assert_eq!(simple_math("7/2"), Some("3.50".to_string()));
        assert_eq!(simple_math("10/0"), None);
        assert_eq!(simple_math("((1)"), None);
        assert_eq!(simple_math("+-*/"), None);
        // 19 characters is still short enough, 20 is not
        assert_eq!(simple_math("1+1+1+1+1+1+1+1+1+1"), Some("10".to_string()));
        assert_eq!(simple_math("1+1+1+1+1+1+1+1+1+10"), None);
    }
}
