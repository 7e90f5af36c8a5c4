//! Scan orchestration: recognizer providers and the pipeline that runs
//! capture through preprocessing, recognition, and date extraction.

pub mod cloud;
pub mod orchestrator;
pub mod provider;

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::correct::CorrectionSuggestion;

pub use cloud::CloudOcrProvider;
pub use orchestrator::{ScanOptions, ScanPipeline, ScanPipelineBuilder};
pub use provider::{BoundingBox, RecognitionProvider, RecognizedText, TextBlock};

/// Which recognizer produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionMethod {
    /// On-device text recognition.
    Native,
    /// Hosted OCR service.
    Cloud,
}

impl fmt::Display for RecognitionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Cloud => write!(f, "cloud"),
        }
    }
}

/// A completed scan: the recognized text and the expiry date chosen from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Normalized text the date was extracted from.
    pub text: String,
    /// The selected expiry date.
    pub date: NaiveDate,
    /// Combined extraction confidence, 0 to 100.
    pub confidence: u8,
    /// Recognizer that produced the text.
    pub method: RecognitionMethod,
    /// Character repairs applied while decoding the date.
    pub corrections: Vec<CorrectionSuggestion>,
}

impl ScanReport {
    /// Placeholder report for degraded operation: a conservative shelf-life
    /// guess of 90 days out, clearly below real-scan confidence.
    pub fn synthetic(today: NaiveDate) -> Self {
        let date = today
            .checked_add_days(Days::new(90))
            .unwrap_or(today);
        Self {
            text: format!("BEST BEFORE {}", date.format("%d %b %Y")).to_uppercase(),
            date,
            confidence: 75,
            method: RecognitionMethod::Cloud,
            corrections: Vec::new(),
        }
    }
}

/// Why a scan produced no date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No provider returned any text.
    NoTextDetected,
    /// Text was recognized but no usable future date was found in it.
    NoDateFound,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTextDetected => write!(f, "no text detected"),
            Self::NoDateFound => write!(f, "no date found"),
        }
    }
}

/// Terminal failure details for a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Number of recognition attempts made across providers.
    pub attempts: usize,
}

/// Outcome of running the scan pipeline on one capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// A date was read from the label.
    Resolved(ScanReport),
    /// Every recognizer was unreachable; the report is a synthetic
    /// placeholder the caller should present as an estimate.
    Degraded { report: ScanReport, reason: String },
    /// The capture yielded no usable date.
    Failed(ScanFailure),
}

impl ScanOutcome {
    /// True when the report reflects text actually read from the label.
    pub fn is_authoritative(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// The report, if any, whether resolved or degraded.
    pub fn report(&self) -> Option<&ScanReport> {
        match self {
            Self::Resolved(report) | Self::Degraded { report, .. } => Some(report),
            Self::Failed(_) => None,
        }
    }
}
