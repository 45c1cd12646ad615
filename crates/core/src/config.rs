use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::technique::{check_technique_names, Technique};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which image processor variant runs before extraction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorKind {
    #[default]
    Enhance,
    Experimental,
    Orientations,
    Normalize,
    None,
    Custom,
}

impl std::fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessorKind::Enhance => write!(f, "enhance"),
            ProcessorKind::Experimental => write!(f, "experimental"),
            ProcessorKind::Orientations => write!(f, "orientations"),
            ProcessorKind::Normalize => write!(f, "normalize"),
            ProcessorKind::None => write!(f, "none"),
            ProcessorKind::Custom => write!(f, "custom"),
        }
    }
}

impl std::str::FromStr for ProcessorKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "enhance" => Ok(ProcessorKind::Enhance),
            "experimental" => Ok(ProcessorKind::Experimental),
            "orientations" => Ok(ProcessorKind::Orientations),
            "normalize" => Ok(ProcessorKind::Normalize),
            "none" => Ok(ProcessorKind::None),
            "custom" => Ok(ProcessorKind::Custom),
            other => Err(format!("Unknown processor: '{other}'")),
        }
    }
}

/// Which text extraction backend is used.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    #[default]
    Tesseract,
    Remote,
}

impl std::fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractorKind::Tesseract => write!(f, "tesseract"),
            ExtractorKind::Remote => write!(f, "remote"),
        }
    }
}

impl std::str::FromStr for ExtractorKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tesseract" => Ok(ExtractorKind::Tesseract),
            "remote" => Ok(ExtractorKind::Remote),
            other => Err(format!("Unknown extractor: '{other}'")),
        }
    }
}

/// Settings for the HTTP text-extraction API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Multipart field carrying the image bytes.
    pub field_name: String,
    /// No timeout when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            field_name: "file".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub input_folder: PathBuf,
    /// Processed images are written to `<output_folder>/processed`.
    pub output_folder: PathBuf,
    /// Defaults to `<output_folder>/text`.
    pub text_folder: Option<PathBuf>,
    pub tessdata_path: PathBuf,
    pub language: String,
    /// When false, images go to the extractor untouched regardless of `processor`.
    pub preprocess: bool,
    pub processor: ProcessorKind,
    pub extractor: ExtractorKind,
    pub remote: RemoteConfig,
    /// Only used by `processor = "custom"`.
    pub techniques: Vec<Technique>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_folder: PathBuf::from("InputImages"),
            output_folder: PathBuf::from("OutputResults"),
            text_folder: None,
            tessdata_path: PathBuf::from("tessdata"),
            language: "eng".to_string(),
            preprocess: true,
            processor: ProcessorKind::default(),
            extractor: ExtractorKind::default(),
            remote: RemoteConfig::default(),
            techniques: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&src)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(src)?)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.output_folder.join("processed")
    }

    pub fn text_dir(&self) -> PathBuf {
        self.text_folder
            .clone()
            .unwrap_or_else(|| self.output_folder.join("text"))
    }

    /// The processor that actually runs once the preprocessing toggle is applied.
    pub fn effective_processor(&self) -> ProcessorKind {
        if self.preprocess {
            self.processor
        } else {
            ProcessorKind::None
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.language.trim().is_empty() {
            return Err(ConfigError::Invalid("language must not be empty".into()));
        }
        if self.extractor == ExtractorKind::Remote && self.remote.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "extractor = \"remote\" requires remote.endpoint".into(),
            ));
        }
        if self.effective_processor() == ProcessorKind::Custom && self.techniques.is_empty() {
            return Err(ConfigError::Invalid(
                "processor = \"custom\" requires at least one [[techniques]] entry".into(),
            ));
        }
        check_technique_names(&self.techniques).map_err(ConfigError::Invalid)?;
        Ok(())
    }
}
