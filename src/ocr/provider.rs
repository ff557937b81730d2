//! OCR Providers
//!
//! Defines the provider trait and the Tesseract and Ollama backends. No
//! language hint is passed to either; each recognizes whatever its default
//! model covers.

use std::io::Write;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use tokio::process::Command;

use super::types::{OcrError, OcrProvider, OcrResult};
use crate::config::OcrConfig;

/// OCR provider trait
#[async_trait]
pub trait OcrProviderTrait: Send + Sync {
    /// Get the provider type
    fn provider_type(&self) -> OcrProvider;

    /// Check if the provider is available
    async fn is_available(&self) -> bool;

    /// Recognize the text in a PNG image
    async fn recognize(&self, image_data: &[u8]) -> Result<OcrResult, OcrError>;
}

/// Build the provider selected by configuration
pub fn build_provider(config: &OcrConfig) -> Arc<dyn OcrProviderTrait> {
    match config.provider {
        OcrProvider::Tesseract => Arc::new(TesseractProvider::new(&config.tesseract_path)),
        OcrProvider::Ollama => Arc::new(OllamaProvider::new(&config.ollama_url, &config.ollama_model)),
    }
}

/// Tesseract CLI provider
pub struct TesseractProvider {
    binary: String,
}

impl TesseractProvider {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

#[async_trait]
impl OcrProviderTrait for TesseractProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Tesseract
    }

    async fn is_available(&self) -> bool {
        let result = Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        matches!(result, Ok(status) if status.success())
    }

    async fn recognize(&self, image_data: &[u8]) -> Result<OcrResult, OcrError> {
        // Removed on drop, including every error path below
        let mut input = tempfile::Builder::new()
            .prefix("ocr_input_")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::ProcessingError(format!("Failed to create temp file: {}", e)))?;
        input
            .write_all(image_data)
            .and_then(|_| input.flush())
            .map_err(|e| OcrError::ProcessingError(format!("Failed to write temp file: {}", e)))?;

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| OcrError::ProviderNotAvailable(format!("Failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        Ok(OcrResult {
            text: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            provider: OcrProvider::Tesseract,
        })
    }
}

/// Ollama vision model provider
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    /// Model name (e.g., "llava", "bakllava")
    model: String,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl OcrProviderTrait for OllamaProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Ollama
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn recognize(&self, image_data: &[u8]) -> Result<OcrResult, OcrError> {
        let url = format!("{}/api/generate", self.base_url);

        let request = serde_json::json!({
            "model": self.model,
            "prompt": "Extract all text from this image exactly as written. Return only the extracted text, nothing else.",
            "images": [base64::engine::general_purpose::STANDARD.encode(image_data)],
            "stream": false
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to call Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(OcrResult {
            text: result["response"].as_str().unwrap_or("").trim().to_string(),
            provider: OcrProvider::Ollama,
        })
    }
}

/// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    /// Text returned for each call, in call order
    pub responses: std::sync::Mutex<std::collections::VecDeque<Result<String, String>>>,
}

#[cfg(test)]
impl MockProvider {
    pub fn new(responses: Vec<Result<&str, &str>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(
                responses
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl OcrProviderTrait for MockProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Tesseract
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn recognize(&self, _image_data: &[u8]) -> Result<OcrResult, OcrError> {
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(OcrResult {
                text,
                provider: OcrProvider::Tesseract,
            }),
            Some(Err(reason)) => Err(OcrError::ProcessingError(reason)),
            None => Err(OcrError::ProcessingError("no scripted response".to_string())),
        }
    }
}
