//! Hosted OCR provider speaking the OCR.space form API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::preprocess::PreparedImage;
use crate::scan::RecognitionMethod;
use crate::scan::provider::{RecognitionProvider, RecognizedText};

const DEFAULT_ENDPOINT: &str = "https://api.ocr.space/parse/image";
const DEFAULT_API_KEY: &str = "helloworld";

/// Recognizer backed by the OCR.space HTTP service.
#[derive(Debug, Clone)]
pub struct CloudOcrProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    engine: u8,
}

impl Default for CloudOcrProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CloudOcrProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.into(),
            api_key: DEFAULT_API_KEY.into(),
            engine: 2,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_engine(mut self, engine: u8) -> Self {
        self.engine = engine;
        self
    }
}

#[async_trait]
impl RecognitionProvider for CloudOcrProvider {
    fn method(&self) -> RecognitionMethod {
        RecognitionMethod::Cloud
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn recognize(&self, image: &PreparedImage) -> Result<RecognizedText, ProviderError> {
        let payload = image
            .jpeg_base64()
            .map_err(|e| ProviderError::Recognition(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .text("base64Image", format!("data:image/jpeg;base64,{payload}"))
            .text("language", "eng")
            .text("isOverlayRequired", "false")
            .text("detectOrientation", "true")
            .text("scale", "true")
            .text("OCREngine", self.engine.to_string())
            .text("apikey", self.api_key.clone());

        debug!(endpoint = %self.endpoint, engine = self.engine, "submitting image for recognition");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::ServiceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "recognition service rejected the request");
            return Err(ProviderError::ServiceUnavailable(format!(
                "unexpected status {status}"
            )));
        }

        let parsed: ParseResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ServiceUnavailable(e.to_string()))?;

        if parsed.is_errored_on_processing {
            let message = parsed
                .first_error()
                .unwrap_or_else(|| "processing error".into());
            return Err(ProviderError::ServiceUnavailable(message));
        }

        let text: String = parsed
            .parsed_results
            .iter()
            .map(|r| r.parsed_text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(ProviderError::NoText);
        }

        Ok(RecognizedText::from_text(text))
    }
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    #[serde(rename = "IsErroredOnProcessing", default)]
    is_errored_on_processing: bool,
    #[serde(rename = "ErrorMessage", default)]
    error_message: Option<serde_json::Value>,
    #[serde(rename = "ParsedResults", default)]
    parsed_results: Vec<ParsedResult>,
}

impl ParseResponse {
    /// The service reports errors as either a string or an array of strings.
    fn first_error(&self) -> Option<String> {
        match &self.error_message {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .find_map(|v| v.as_str())
                .map(|s| s.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ParsedResult {
    #[serde(rename = "ParsedText", default)]
    parsed_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_successful_response() {
        let json = r#"{
            "ParsedResults": [
                {"ParsedText": "BEST BEFORE 30NOV25\r\n"}
            ],
            "IsErroredOnProcessing": false,
            "OCRExitCode": 1
        }"#;
        let parsed: ParseResponse = serde_json::from_str(json).unwrap();
        assert!(!parsed.is_errored_on_processing);
        assert_eq!(parsed.parsed_results.len(), 1);
        assert_eq!(parsed.parsed_results[0].parsed_text, "BEST BEFORE 30NOV25\r\n");
    }

    #[test]
    fn error_message_can_be_an_array() {
        let json = r#"{
            "IsErroredOnProcessing": true,
            "ErrorMessage": ["Timed out waiting for results", "E101"]
        }"#;
        let parsed: ParseResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.is_errored_on_processing);
        assert_eq!(
            parsed.first_error().as_deref(),
            Some("Timed out waiting for results")
        );
    }

    #[test]
    fn error_message_can_be_a_string() {
        let json = r#"{"IsErroredOnProcessing": true, "ErrorMessage": "Invalid API key"}"#;
        let parsed: ParseResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.first_error().as_deref(), Some("Invalid API key"));
    }

    #[test]
    fn missing_fields_default_cleanly() {
        let parsed: ParseResponse = serde_json::from_str("{}").unwrap();
        assert!(!parsed.is_errored_on_processing);
        assert!(parsed.parsed_results.is_empty());
        assert!(parsed.first_error().is_none());
    }
}
