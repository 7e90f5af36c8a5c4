//! The scan pipeline: preprocess, recognize with ordered provider
//! fallback, normalize, extract, select.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::normalize::normalize;
use crate::parse::select_best;
use crate::preprocess::{PreparedImage, Preprocessor, ScanImage, StandardPreprocessor};
use crate::scan::provider::{RecognitionProvider, looks_like_date};
use crate::scan::{FailureKind, RecognitionMethod, ScanFailure, ScanOutcome, ScanReport};

/// Pipeline tuning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Upper bound on a single provider call; `None` waits indefinitely.
    pub attempt_timeout: Option<Duration>,
    /// Minimum average block confidence (0 to 100) to accept a
    /// recognizer's text when block detail is reported.
    pub min_text_confidence: f32,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            attempt_timeout: None,
            min_text_confidence: 60.0,
        }
    }
}

/// Runs captures through preprocessing and an ordered list of recognizers
/// until one yields a usable future date.
pub struct ScanPipeline {
    preprocessor: Arc<dyn Preprocessor>,
    providers: Vec<Arc<dyn RecognitionProvider>>,
    options: ScanOptions,
}

/// Builder for [`ScanPipeline`].
#[derive(Default)]
pub struct ScanPipelineBuilder {
    preprocessor: Option<Arc<dyn Preprocessor>>,
    providers: Vec<Arc<dyn RecognitionProvider>>,
    options: ScanOptions,
}

impl ScanPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn Preprocessor>) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    /// Register a recognizer. Providers are tried in registration order.
    pub fn with_provider(mut self, provider: Arc<dyn RecognitionProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.options.attempt_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ScanPipeline {
        ScanPipeline {
            preprocessor: self
                .preprocessor
                .unwrap_or_else(|| Arc::new(StandardPreprocessor::default())),
            providers: self.providers,
            options: self.options,
        }
    }
}

impl ScanPipeline {
    pub fn builder() -> ScanPipelineBuilder {
        ScanPipelineBuilder::new()
    }

    /// Scan a capture, judging date validity against today's local date.
    pub async fn scan(&self, image: &ScanImage) -> ScanOutcome {
        self.scan_at(image, Local::now().date_naive()).await
    }

    /// Scan with an explicit reference date. Dates on or before `today`
    /// are rejected as already expired.
    pub async fn scan_at(&self, image: &ScanImage, today: NaiveDate) -> ScanOutcome {
        let started = Instant::now();

        let prepared = match self.preprocessor.prepare(image).await {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(error = %e, "preprocessing failed, recognizing the raw capture");
                PreparedImage::raw(&image.path)
            }
        };

        let mut attempts = 0usize;
        let mut saw_text = false;
        let mut last_unavailable: Option<String> = None;

        for provider in &self.providers {
            let method = provider.method();

            if !provider.is_available().await {
                debug!(%method, "provider unavailable, skipping");
                continue;
            }

            attempts += 1;
            let recognized = match self.recognize_with_timeout(provider.as_ref(), &prepared).await
            {
                Ok(recognized) => recognized,
                Err(ProviderError::NoText) => {
                    debug!(%method, "provider found no text");
                    continue;
                }
                Err(e @ (ProviderError::ServiceUnavailable(_) | ProviderError::Timeout(_))) => {
                    warn!(%method, error = %e, "provider unreachable");
                    if method == RecognitionMethod::Cloud {
                        last_unavailable = Some(e.to_string());
                    }
                    continue;
                }
                Err(e) => {
                    warn!(%method, error = %e, "recognition failed");
                    continue;
                }
            };

            if recognized.is_empty() {
                debug!(%method, "provider returned empty text");
                continue;
            }
            saw_text = true;

            if let Some(avg) = recognized.average_confidence() {
                if avg * 100.0 < self.options.min_text_confidence {
                    debug!(
                        %method,
                        average = avg * 100.0,
                        "text confidence below threshold, trying next provider"
                    );
                    continue;
                }
            }

            let text = normalize(&recognized.text);
            if !looks_like_date(&text) {
                debug!(%method, "recognized text carries no date notation");
                continue;
            }

            if let Some(candidate) = select_best(&text, today) {
                info!(
                    %method,
                    date = %candidate.date,
                    confidence = candidate.confidence,
                    rule = candidate.rule,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "scan resolved"
                );
                return ScanOutcome::Resolved(ScanReport {
                    text,
                    date: candidate.date,
                    confidence: candidate.confidence,
                    method,
                    corrections: candidate.corrections,
                });
            }
            debug!(%method, "no usable future date in recognized text");
        }

        if let Some(reason) = last_unavailable {
            warn!(%reason, "all recognizers exhausted, degrading to a synthetic estimate");
            return ScanOutcome::Degraded {
                report: ScanReport::synthetic(today),
                reason,
            };
        }

        let kind = if saw_text {
            FailureKind::NoDateFound
        } else {
            FailureKind::NoTextDetected
        };
        info!(%kind, attempts, "scan failed");
        ScanOutcome::Failed(ScanFailure {
            message: format!("{kind} after {attempts} recognition attempt(s)"),
            kind,
            attempts,
        })
    }

    async fn recognize_with_timeout(
        &self,
        provider: &dyn RecognitionProvider,
        image: &PreparedImage,
    ) -> Result<crate::scan::provider::RecognizedText, ProviderError> {
        match self.options.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, provider.recognize(image))
                .await
                .unwrap_or(Err(ProviderError::Timeout(limit.as_millis() as u64))),
            None => provider.recognize(image).await,
        }
    }
}
