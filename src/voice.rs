//! Speech transcripts as consumed by the orchestrator.
//!
//! Audio capture and recognition live elsewhere; only finished text with a
//! confidence score crosses into this crate.

use serde::{Deserialize, Serialize};

/// Default minimum recognizer confidence for a transcript to be processed.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    /// Recognizer confidence, 0.0 to 1.0.
    pub confidence: f32,
    /// `false` for interim results that may still change.
    pub is_final: bool,
}

impl Transcript {
    pub fn new(text: impl Into<String>, confidence: f32, is_final: bool) -> Self {
        Self {
            text: text.into(),
            confidence,
            is_final,
        }
    }

    /// Final, confident enough and non-blank.
    pub fn is_actionable(&self, min_confidence: f32) -> bool {
        self.is_final && self.confidence >= min_confidence && !self.text.trim().is_empty()
    }
}
