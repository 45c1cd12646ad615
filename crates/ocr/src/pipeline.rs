use std::path::{Path, PathBuf};
use thiserror::Error;

use imgtext_core::{list_images, text_output_path};

use crate::extractor::TextExtractor;
use crate::processor::ImageProcessor;
use crate::types::{BatchReport, FileOutcome, FileStatus, Stage};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Input folder does not exist: {0}")]
    InputNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Listing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Orchestrates, per image and strictly in order: process → extract → persist.
/// A failure at any stage skips that image and the batch moves on.
pub struct BatchProcessor<P: ImageProcessor, E: TextExtractor> {
    processor: P,
    extractor: E,
}

impl<P: ImageProcessor, E: TextExtractor> BatchProcessor<P, E> {
    pub fn new(processor: P, extractor: E) -> Self {
        Self { processor, extractor }
    }

    pub async fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        text_dir: &Path,
    ) -> Result<BatchReport, BatchError> {
        if !input_dir.is_dir() {
            return Err(BatchError::InputNotFound(input_dir.to_path_buf()));
        }
        tokio::fs::create_dir_all(output_dir).await?;
        tokio::fs::create_dir_all(text_dir).await?;

        let dir = input_dir.to_path_buf();
        let images = tokio::task::spawn_blocking(move || list_images(&dir)).await??;
        let total = images.len();
        tracing::info!(
            "Found {total} images to process ({} → {})",
            self.processor.name(),
            self.extractor.name()
        );

        let mut report = BatchReport::default();
        for (i, image) in images.into_iter().enumerate() {
            let display_name = image
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            tracing::info!("Processing image {}/{total}: {display_name}", i + 1);

            let status = match self.process_one(&image, output_dir, text_dir).await {
                Ok(text_path) => {
                    tracing::info!("Text extracted and saved to: {}", text_path.display());
                    FileStatus::Persisted { text_path }
                }
                Err((stage, message)) => {
                    tracing::warn!("Error processing {display_name} ({stage}): {message}");
                    FileStatus::Skipped { stage, message }
                }
            };
            report.outcomes.push(FileOutcome { image, status });
        }

        tracing::info!(
            "Successfully processed {} out of {} images",
            report.succeeded(),
            report.discovered()
        );
        Ok(report)
    }

    async fn process_one(
        &self,
        image: &Path,
        output_dir: &Path,
        text_dir: &Path,
    ) -> Result<PathBuf, (Stage, String)> {
        let processed = self
            .processor
            .process(image, output_dir)
            .map_err(|e| (Stage::Process, e.to_string()))?;

        let text = self
            .extractor
            .extract_text(&processed)
            .await
            .map_err(|e| (Stage::Extract, e.to_string()))?;

        let text_path = text_output_path(text_dir, image);
        tokio::fs::write(&text_path, text)
            .await
            .map_err(|e| (Stage::Persist, e.to_string()))?;
        Ok(text_path)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
