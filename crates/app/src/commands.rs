use anyhow::Context;
use std::path::Path;

use imgtext_core::{AppConfig, ExtractorKind, ProcessorKind};
use imgtext_ocr::{
    extract_or_sentinel, BatchProcessor, BatchReport, ChainProcessor, ImageProcessor,
    LocalOcrExtractor, PassthroughProcessor, RemoteExtractor, TechniqueProcessor, TextExtractor,
};

pub fn build_processor(config: &AppConfig) -> Box<dyn ImageProcessor> {
    match config.effective_processor() {
        ProcessorKind::Enhance => Box::new(ChainProcessor::enhance()),
        ProcessorKind::Experimental => Box::new(TechniqueProcessor::experimental()),
        ProcessorKind::Orientations => Box::new(TechniqueProcessor::orientations()),
        ProcessorKind::Normalize => Box::new(ChainProcessor::normalize()),
        ProcessorKind::None => Box::new(PassthroughProcessor),
        ProcessorKind::Custom => {
            Box::new(TechniqueProcessor::new("custom", config.techniques.clone()))
        }
    }
}

pub fn build_extractor(config: &AppConfig) -> anyhow::Result<Box<dyn TextExtractor>> {
    match config.extractor {
        ExtractorKind::Remote => {
            let extractor = RemoteExtractor::new(&config.remote)
                .context("Failed to build HTTP client for the text extraction API")?;
            Ok(Box::new(extractor))
        }
        ExtractorKind::Tesseract => {
            #[cfg(feature = "tesseract")]
            let backend = imgtext_ocr::TesseractRecognizer::new(
                Some(config.tessdata_path.to_string_lossy().into_owned()),
                &config.language,
            );
            #[cfg(not(feature = "tesseract"))]
            let backend = {
                tracing::warn!("Built without the `tesseract` feature; local extraction will fail");
                imgtext_ocr::UnavailableRecognizer
            };
            Ok(Box::new(LocalOcrExtractor::new(backend, &config.tessdata_path)))
        }
    }
}

/// Process every image in the configured input folder.
pub async fn run_batch(config: &AppConfig) -> anyhow::Result<BatchReport> {
    let batch = BatchProcessor::new(build_processor(config), build_extractor(config)?);
    let report = batch
        .run(&config.input_folder, &config.processed_dir(), &config.text_dir())
        .await
        .with_context(|| format!("Batch over {} failed", config.input_folder.display()))?;
    Ok(report)
}

/// Process and extract a single image, returning the sentinel text when
/// extraction fails.
pub async fn extract_single(config: &AppConfig, image: &Path) -> anyhow::Result<String> {
    let processor = build_processor(config);
    let processed = processor
        .process(image, &config.processed_dir())
        .with_context(|| format!("Failed to process {}", image.display()))?;
    let extractor = build_extractor(config)?;
    let text = extract_or_sentinel(&extractor, &processed).await?;
    Ok(text)
}
