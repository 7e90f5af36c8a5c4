//! Expiry-date reading core for label scans.
//!
//! This crate provides:
//! - OCR text normalization that undoes common glyph confusions
//! - Date extraction from noisy label text with per-format confidence
//! - Component-level correction of implausible day, month, and year values
//! - Image preparation (crop, downscale, contrast, sharpen) for recognizers
//! - An async scan pipeline with ordered recognizer fallback and a hosted
//!   OCR provider
//!
//! The typical flow is [`ScanPipeline`]: prepare a capture, run it through
//! the registered [`RecognitionProvider`]s in order, normalize whatever
//! text comes back, and pick the best future date. The text-side pieces
//! ([`normalize`], [`extract`], [`select_best`]) are plain functions and
//! can be used on their own.

pub mod correct;
pub mod error;
pub mod normalize;
pub mod parse;
pub mod preprocess;
pub mod scan;

pub use correct::{CorrectionSuggestion, DateField, YEAR_MAX, YEAR_MIN};
pub use error::{PreprocessError, ProviderError};
pub use normalize::normalize;
pub use parse::{DateCandidate, extract, select_best};
pub use preprocess::{
    CropRegion, PreparedImage, PreprocessOptions, Preprocessor, ScanImage, ScreenRect,
    StandardPreprocessor,
};
pub use scan::{
    BoundingBox, CloudOcrProvider, FailureKind, RecognitionMethod, RecognitionProvider,
    RecognizedText, ScanFailure, ScanOptions, ScanOutcome, ScanPipeline, ScanPipelineBuilder,
    ScanReport, TextBlock,
};
