use serde::Serialize;
use std::path::PathBuf;

/// Text recognised by an OCR engine with its confidence score (0.0–1.0).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recognition {
    pub text: String,
    /// Mean confidence over the page (0.0 = guessed, 1.0 = certain).
    pub confidence: f32,
}

impl Recognition {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self { text: text.into(), confidence: confidence.clamp(0.0, 1.0) }
    }
}

/// The step of the per-file pipeline at which a file was skipped.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Process,
    Extract,
    Persist,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Process => write!(f, "process"),
            Stage::Extract => write!(f, "extract"),
            Stage::Persist => write!(f, "persist"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Persisted { text_path: PathBuf },
    Skipped { stage: Stage, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub image: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, FileStatus::Persisted { .. })
    }
}

/// Tally of a batch run, one outcome per discovered image in enumeration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn discovered(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}
