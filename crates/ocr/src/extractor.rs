use async_trait::async_trait;
use regex::Regex;
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;

use imgtext_core::RemoteConfig;

use crate::recognizer::{OcrBackend, OcrError};

/// Placeholder written in place of text when extraction fails and the caller
/// asked for a value rather than an error.
pub const EXTRACTION_FAILED_TEXT: &str = "Error extracting text.";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("OCR data directory not found: {0}")]
    DataDirNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Text extraction API returned {status}: {body}")]
    Remote { status: u16, body: String },
    #[error("OCR task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Produces the text contained in an image file.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, image_path: &Path) -> Result<String, ExtractError>;

    fn name(&self) -> &str;
}

#[async_trait]
impl<T: TextExtractor + ?Sized> TextExtractor for Box<T> {
    async fn extract_text(&self, image_path: &Path) -> Result<String, ExtractError> {
        (**self).extract_text(image_path).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Run `extractor`, turning every failure except a missing OCR data directory
/// into [`EXTRACTION_FAILED_TEXT`].
pub async fn extract_or_sentinel<E: TextExtractor + ?Sized>(
    extractor: &E,
    image_path: &Path,
) -> Result<String, ExtractError> {
    match extractor.extract_text(image_path).await {
        Ok(text) => Ok(text),
        Err(e @ ExtractError::DataDirNotFound(_)) => Err(e),
        Err(e) => {
            tracing::warn!("{} error on {}: {e}", extractor.name(), image_path.display());
            Ok(EXTRACTION_FAILED_TEXT.to_string())
        }
    }
}

fn re_whitespace() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\s+").expect("invalid regex"))
}

/// Collapse every whitespace run (including newlines) to one space and trim.
pub fn clean_text(text: &str) -> String {
    re_whitespace().replace_all(text, " ").trim().to_string()
}

// ── Local OCR engine ──────────────────────────────────────────────────────────

/// Runs an [`OcrBackend`] against image files on tokio's blocking pool.
pub struct LocalOcrExtractor<R: OcrBackend> {
    backend: Arc<R>,
    data_dir: PathBuf,
}

impl<R: OcrBackend + 'static> LocalOcrExtractor<R> {
    /// `data_dir` is the engine's language data folder (tessdata); it is
    /// checked on every call.
    pub fn new(backend: R, data_dir: impl Into<PathBuf>) -> Self {
        Self { backend: Arc::new(backend), data_dir: data_dir.into() }
    }
}

#[async_trait]
impl<R: OcrBackend + 'static> TextExtractor for LocalOcrExtractor<R> {
    async fn extract_text(&self, image_path: &Path) -> Result<String, ExtractError> {
        if !self.data_dir.is_dir() {
            return Err(ExtractError::DataDirNotFound(self.data_dir.clone()));
        }

        let bytes = tokio::fs::read(image_path).await?;
        let backend = Arc::clone(&self.backend);
        let recognition = tokio::task::spawn_blocking(move || backend.recognize(&bytes)).await??;

        tracing::info!(
            "Text extracted with confidence: {:.2}%",
            recognition.confidence * 100.0
        );
        Ok(clean_text(&recognition.text))
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

// ── Remote API ────────────────────────────────────────────────────────────────

/// Uploads the image as `multipart/form-data` and takes a 2xx response body
/// as the extracted text.
pub struct RemoteExtractor {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    field_name: String,
}

impl RemoteExtractor {
    pub fn new(config: &RemoteConfig) -> Result<Self, ExtractError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            field_name: config.field_name.clone(),
        })
    }
}

fn mime_for(path: &Path) -> &'static str {
    image::ImageFormat::from_path(path)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
}

#[async_trait]
impl TextExtractor for RemoteExtractor {
    async fn extract_text(&self, image_path: &Path) -> Result<String, ExtractError> {
        let bytes = tokio::fs::read(image_path).await?;
        let file_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let part = Part::bytes(bytes).file_name(file_name).mime_str(mime_for(image_path))?;
        let form = Form::new().part(self.field_name.clone(), part);

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ExtractError::Remote { status: status.as_u16(), body });
        }
        Ok(body)
    }

    fn name(&self) -> &str {
        "remote"
    }
}
