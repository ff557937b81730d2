//! Configuration management for Markcheck Server

use std::env;
use std::path::PathBuf;

use crate::ocr::{OcrPageFailure, OcrProvider};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base used to build `file_url`; derived from the request `Host` header when unset
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub result_dir: PathBuf,
    pub keep_uploads: bool,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub provider: OcrProvider,
    pub tesseract_path: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub on_page_failure: OcrPageFailure,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                public_base_url: None,
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from("uploads"),
                result_dir: PathBuf::from("results"),
                keep_uploads: false,
            },
            ocr: OcrConfig::default(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        OcrConfig {
            provider: OcrProvider::Tesseract,
            tesseract_path: "tesseract".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llava".to_string(),
            on_page_failure: OcrPageFailure::Empty,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or(defaults.server.host),
                port: parse_var("PORT", defaults.server.port, |v| v.parse().ok())?,
                public_base_url: env::var("PUBLIC_BASE_URL")
                    .ok()
                    .filter(|v| !v.trim().is_empty()),
            },
            storage: StorageConfig {
                upload_dir: env::var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.upload_dir),
                result_dir: env::var("RESULT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.result_dir),
                keep_uploads: parse_var("KEEP_UPLOADS", false, parse_bool)?,
            },
            ocr: OcrConfig {
                provider: parse_var("OCR_PROVIDER", defaults.ocr.provider, |v| {
                    match v.to_ascii_lowercase().as_str() {
                        "tesseract" => Some(OcrProvider::Tesseract),
                        "ollama" => Some(OcrProvider::Ollama),
                        _ => None,
                    }
                })?,
                tesseract_path: env::var("TESSERACT_PATH").unwrap_or(defaults.ocr.tesseract_path),
                ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.ocr.ollama_url),
                ollama_model: env::var("OLLAMA_MODEL").unwrap_or(defaults.ocr.ollama_model),
                on_page_failure: parse_var("OCR_PAGE_FAILURE", defaults.ocr.on_page_failure, |v| {
                    match v.to_ascii_lowercase().as_str() {
                        "empty" => Some(OcrPageFailure::Empty),
                        "fail" => Some(OcrPageFailure::Fail),
                        _ => None,
                    }
                })?,
            },
        })
    }
}

fn parse_var<T>(
    name: &'static str,
    default: T,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(default),
        Ok(value) => parse(value.trim()).ok_or(ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.storage.result_dir, PathBuf::from("results"));
        assert_eq!(config.ocr.provider, OcrProvider::Tesseract);
        assert_eq!(config.ocr.on_page_failure, OcrPageFailure::Empty);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        // Unique name so parallel tests never race on it
        env::set_var("MARKCHECK_TEST_PORT", "not-a-port");
        let result = parse_var("MARKCHECK_TEST_PORT", 5000u16, |v| v.parse().ok());
        env::remove_var("MARKCHECK_TEST_PORT");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "MARKCHECK_TEST_PORT", .. })
        ));
    }

    #[test]
    fn test_parse_var_falls_back_when_unset() {
        let port = parse_var("MARKCHECK_TEST_UNSET_PORT", 5000u16, |v| v.parse().ok()).unwrap();
        assert_eq!(port, 5000);
    }
}
