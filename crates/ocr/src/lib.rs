pub mod extractor;
pub mod pipeline;
pub mod preprocess;
pub mod processor;
pub mod recognizer;
pub mod types;

pub use extractor::{
    clean_text, extract_or_sentinel, ExtractError, LocalOcrExtractor, RemoteExtractor,
    TextExtractor, EXTRACTION_FAILED_TEXT,
};
pub use pipeline::{BatchError, BatchProcessor};
pub use preprocess::{apply_step, apply_steps, save_image, SaveError, TransformError};
pub use processor::{ChainProcessor, ImageProcessor, PassthroughProcessor, ProcessError, TechniqueProcessor};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, UnavailableRecognizer};
pub use types::{BatchReport, FileOutcome, FileStatus, Recognition, Stage};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
