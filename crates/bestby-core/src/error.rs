//! Error types for the bestby-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a recognition provider during one attempt.
///
/// These never cross the scan boundary directly: the orchestrator maps them
/// to the next provider, a degraded outcome, or a structured failure.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider cannot run on this platform. Always non-fatal; the
    /// orchestrator moves on to the next provider.
    #[error("recognition is not available on this platform")]
    PlatformUnsupported,

    /// The recognizer ran but produced empty or whitespace-only text.
    #[error("no text detected in image")]
    NoText,

    /// The recognizer failed outright.
    #[error("recognition failed: {0}")]
    Recognition(String),

    /// The remote service is unreachable, throttled, or returned a
    /// processing error. Recoverable via the degraded fallback.
    #[error("recognition service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The attempt exceeded the configured time budget.
    #[error("recognition attempt timed out after {0} ms")]
    Timeout(u64),
}

/// Errors raised while preparing an image for recognition.
#[derive(Error, Debug)]
pub enum PreprocessError {
    /// Failed to open or decode the source image.
    #[error("failed to load image {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// The requested crop region does not fit inside the image.
    #[error("invalid crop region: {0}")]
    InvalidCrop(String),

    /// Failed to re-encode the processed image.
    #[error("failed to encode image: {0}")]
    Encode(String),

    /// The background processing task failed.
    #[error("preprocessing task failed: {0}")]
    Task(String),
}
