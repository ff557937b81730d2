//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::download::Downloader;
use crate::ocr::{build_provider, TextExtractor};
use crate::pdf::MupdfRasterizer;
use crate::pipeline::CheckPipeline;
use crate::storage::{Storage, StorageError};

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize storage: {0}")]
    Storage(#[from] StorageError),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    pipeline: CheckPipeline,
}

impl AppState {
    /// Wire up storage, downloader, MuPDF rasterizer and the configured OCR
    /// backend
    pub fn from_config(config: Config) -> Result<Self, StateError> {
        let storage = Storage::init(&config.storage)?;
        let extractor = TextExtractor::new(
            Arc::new(MupdfRasterizer::new()),
            build_provider(&config.ocr),
            config.ocr.on_page_failure,
        );
        let pipeline = CheckPipeline::new(storage, Downloader::default(), extractor);

        Ok(Self::new(config, pipeline))
    }

    pub fn new(config: Config, pipeline: CheckPipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pipeline }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the check pipeline
    pub fn pipeline(&self) -> &CheckPipeline {
        &self.inner.pipeline
    }

    /// Get the storage directories
    pub fn storage(&self) -> &Storage {
        self.inner.pipeline.storage()
    }
}
