//! The recognition provider abstraction and the block structure
//! recognizers report text in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::parse::patterns;
use crate::preprocess::PreparedImage;
use crate::scan::RecognitionMethod;

/// Location of a text block within the source image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One recognized run of text with its recognizer confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    /// Recognizer confidence in the 0.0 to 1.0 range.
    pub confidence: f32,
    pub bounding_box: Option<BoundingBox>,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
            bounding_box: None,
        }
    }

    /// Fraction of the block's characters that belong to date notation.
    pub fn date_char_ratio(&self) -> f32 {
        let total = self.text.chars().filter(|c| !c.is_whitespace()).count();
        if total == 0 {
            return 0.0;
        }
        let datey = self
            .text
            .chars()
            .filter(|c| c.is_ascii_digit() || matches!(c, '/' | '.' | '-'))
            .count();
        datey as f32 / total as f32
    }
}

/// Full recognizer output: the joined text plus per-block detail where the
/// recognizer provides it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedText {
    pub text: String,
    pub blocks: Vec<TextBlock>,
}

impl RecognizedText {
    /// Wrap plain text from a recognizer that reports no block structure.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            blocks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Mean block confidence, when block detail is available.
    pub fn average_confidence(&self) -> Option<f32> {
        if self.blocks.is_empty() {
            return None;
        }
        let sum: f32 = self.blocks.iter().map(|b| b.confidence).sum();
        Some(sum / self.blocks.len() as f32)
    }

    /// Blocks that are mostly date characters.
    pub fn digit_blocks(&self) -> Vec<&TextBlock> {
        self.blocks
            .iter()
            .filter(|b| b.date_char_ratio() >= 0.5)
            .collect()
    }

    /// The digit-heavy block the recognizer was most confident about.
    pub fn most_likely_date_block(&self) -> Option<&TextBlock> {
        self.digit_blocks()
            .into_iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
    }
}

/// Quick check that text contains anything worth running the extractor on.
pub fn looks_like_date(text: &str) -> bool {
    patterns::DATE_HINT.is_match(text)
}

/// A text recognizer the pipeline can call.
///
/// Providers are tried in registration order; [`Self::is_available`] lets a
/// provider bow out without counting as a failed attempt.
#[async_trait]
pub trait RecognitionProvider: Send + Sync {
    fn method(&self) -> RecognitionMethod;

    async fn is_available(&self) -> bool;

    async fn recognize(&self, image: &PreparedImage) -> Result<RecognizedText, ProviderError>;
}
