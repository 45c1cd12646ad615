pub mod config;
pub mod files;
pub mod technique;

pub use config::{AppConfig, ConfigError, ExtractorKind, ProcessorKind, RemoteConfig};
pub use files::{derived_image_path, file_stem, is_image_file, list_images, text_output_path, IMAGE_EXTENSIONS};
pub use technique::{Technique, TransformStep, MAX_DIMENSION};
