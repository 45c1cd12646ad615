use image::DynamicImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

use imgtext_core::technique::{
    enhancement_steps, experimental_techniques, orientation_techniques,
};
use imgtext_core::{derived_image_path, file_stem, Technique, TransformStep};

use crate::preprocess::{apply_steps, save_image, SaveError};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to load image {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("No technique produced an output for {0}")]
    NoOutput(PathBuf),
}

/// Turns one source image into one or more processed images and names the
/// one that extraction should read.
pub trait ImageProcessor: Send + Sync {
    fn process(&self, image_path: &Path, output_dir: &Path) -> Result<PathBuf, ProcessError>;

    fn name(&self) -> &str;
}

impl<T: ImageProcessor + ?Sized> ImageProcessor for Box<T> {
    fn process(&self, image_path: &Path, output_dir: &Path) -> Result<PathBuf, ProcessError> {
        (**self).process(image_path, output_dir)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

fn load(image_path: &Path) -> Result<DynamicImage, ProcessError> {
    if !image_path.is_file() {
        return Err(ProcessError::NotFound(image_path.to_path_buf()));
    }
    image::open(image_path).map_err(|source| ProcessError::Load {
        path: image_path.to_path_buf(),
        source,
    })
}

// ── Single output ─────────────────────────────────────────────────────────────

/// Applies one chain of steps and writes `<stem>_<suffix>.<ext>`.
pub struct ChainProcessor {
    name: String,
    suffix: String,
    steps: Vec<TransformStep>,
    force_png: bool,
}

impl ChainProcessor {
    pub fn new(name: impl Into<String>, suffix: impl Into<String>, steps: Vec<TransformStep>) -> Self {
        Self { name: name.into(), suffix: suffix.into(), steps, force_png: false }
    }

    /// Grayscale, contrast, slight deskew, shift, 2x upscale, brightness and
    /// sharpening. Output: `<stem>_processed.<ext>`.
    pub fn enhance() -> Self {
        Self::new("enhance", "processed", enhancement_steps())
    }

    /// Grayscale with a full-range contrast stretch, always PNG.
    /// Output: `<stem>_normalized.png`.
    pub fn normalize() -> Self {
        Self {
            force_png: true,
            ..Self::new("normalize", "normalized", vec![TransformStep::Normalize])
        }
    }

    fn output_path(&self, image_path: &Path, output_dir: &Path) -> PathBuf {
        if self.force_png {
            output_dir.join(format!("{}_{}.png", file_stem(image_path), self.suffix))
        } else {
            derived_image_path(output_dir, image_path, &self.suffix)
        }
    }
}

impl ImageProcessor for ChainProcessor {
    fn process(&self, image_path: &Path, output_dir: &Path) -> Result<PathBuf, ProcessError> {
        std::fs::create_dir_all(output_dir)?;
        let img = apply_steps(load(image_path)?, &self.steps);
        let written = save_image(&img, &self.output_path(image_path, output_dir))?;
        tracing::debug!("{}: wrote {}", self.name, written.display());
        Ok(written)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ── Multiple outputs ──────────────────────────────────────────────────────────

/// Writes one side output per technique (`<stem>_<technique>.<ext>`) and copies
/// the last one that succeeded to `<stem>_best.<ext>`, which is returned.
pub struct TechniqueProcessor {
    name: String,
    techniques: Vec<Technique>,
}

impl TechniqueProcessor {
    pub fn new(name: impl Into<String>, techniques: Vec<Technique>) -> Self {
        Self { name: name.into(), techniques }
    }

    /// grayscale, contrast, rotate90, rotate270, resize.
    pub fn experimental() -> Self {
        Self::new("experimental", experimental_techniques())
    }

    /// original, grayscale, rotated_90, rotated_180.
    pub fn orientations() -> Self {
        Self::new("orientations", orientation_techniques())
    }
}

impl ImageProcessor for TechniqueProcessor {
    fn process(&self, image_path: &Path, output_dir: &Path) -> Result<PathBuf, ProcessError> {
        std::fs::create_dir_all(output_dir)?;
        let source = load(image_path)?;

        let mut last_written = None;
        for technique in &self.techniques {
            let img = apply_steps(source.clone(), &technique.steps);
            let target = derived_image_path(output_dir, image_path, &technique.name);
            match save_image(&img, &target) {
                Ok(written) => {
                    tracing::debug!("{}: wrote {}", technique.name, written.display());
                    last_written = Some(written);
                }
                Err(e) => tracing::warn!("Error applying {}: {e}", technique.name),
            }
        }

        let chosen = last_written.ok_or_else(|| ProcessError::NoOutput(image_path.to_path_buf()))?;
        let ext = chosen
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "png".to_string());
        let best = output_dir.join(format!("{}_best.{ext}", file_stem(image_path)));
        // Copying a file onto itself truncates it.
        if chosen != best {
            std::fs::copy(&chosen, &best)?;
        }
        Ok(best)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ── No-op ─────────────────────────────────────────────────────────────────────

/// Hands the source image straight to extraction.
pub struct PassthroughProcessor;

impl ImageProcessor for PassthroughProcessor {
    fn process(&self, image_path: &Path, _output_dir: &Path) -> Result<PathBuf, ProcessError> {
        if image_path.is_file() {
            Ok(image_path.to_path_buf())
        } else {
            Err(ProcessError::NotFound(image_path.to_path_buf()))
        }
    }

    fn name(&self) -> &str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba, RgbaImage};

    /// Colour gradient with a dark "T" in the middle.
    fn write_test_image(path: &Path, width: u32, height: u32) {
        let (sx, sy, lw, lh, stroke) = (width / 4, height / 4, width / 2, height / 2, 10);
        let img: RgbaImage = ImageBuffer::from_fn(width, height, |x, y| {
            let bar = y >= sy && y < sy + stroke && x >= sx && x < sx + lw;
            let stem = y >= sy && y < sy + lh && x + stroke / 2 >= sx + lw / 2 && x < sx + lw / 2 + stroke / 2;
            if bar || stem {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
            }
        });
        img.save(path).unwrap();
    }

    #[test]
    fn enhance_writes_processed_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("test_image.png");
        write_test_image(&src, 120, 80);
        let out = dir.path().join("out");

        let result = ChainProcessor::enhance().process(&src, &out).unwrap();

        assert_eq!(result, out.join("test_image_processed.png"));
        assert!(result.exists());
        let (w, h) = image::image_dimensions(&result).unwrap();
        assert_eq!((w, h), (240, 160));
    }

    #[test]
    fn normalize_always_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("scan.jpg");
        image::DynamicImage::ImageRgba8(ImageBuffer::from_pixel(16, 16, Rgba([90, 10, 10, 255])))
            .to_rgb8()
            .save(&src)
            .unwrap();

        let result = ChainProcessor::normalize().process(&src, dir.path()).unwrap();
        assert_eq!(result, dir.path().join("scan_normalized.png"));
        assert!(result.exists());
    }

    #[test]
    fn experimental_writes_every_technique_and_best() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("test_image.png");
        write_test_image(&src, 60, 40);
        let out = dir.path().join("out");

        let best = TechniqueProcessor::experimental().process(&src, &out).unwrap();

        assert_eq!(best, out.join("test_image_best.png"));
        assert!(best.exists());
        for name in ["grayscale", "contrast", "rotate90", "rotate270", "resize"] {
            assert!(out.join(format!("test_image_{name}.png")).exists(), "missing {name}");
        }
        // The last technique (resize) is the one promoted to best.
        assert_eq!(image::image_dimensions(&best).unwrap(), (120, 80));
    }

    #[test]
    fn orientations_rotates_side_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("page.png");
        write_test_image(&src, 60, 40);

        let best = TechniqueProcessor::orientations().process(&src, dir.path()).unwrap();

        assert_eq!(image::image_dimensions(dir.path().join("page_original.png")).unwrap(), (60, 40));
        assert_eq!(image::image_dimensions(dir.path().join("page_rotated_90.png")).unwrap(), (40, 60));
        assert_eq!(image::image_dimensions(&best).unwrap(), (60, 40));
    }

    #[test]
    fn missing_image_is_an_error_not_a_dangling_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("non_existent_image.png");

        assert!(matches!(
            ChainProcessor::enhance().process(&missing, dir.path()),
            Err(ProcessError::NotFound(_))
        ));
        assert!(matches!(
            TechniqueProcessor::experimental().process(&missing, dir.path()),
            Err(ProcessError::NotFound(_))
        ));
        assert!(matches!(
            PassthroughProcessor.process(&missing, dir.path()),
            Err(ProcessError::NotFound(_))
        ));
    }

    #[test]
    fn corrupt_image_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("broken.png");
        std::fs::write(&src, b"definitely not a png").unwrap();

        let err = ChainProcessor::enhance().process(&src, dir.path()).unwrap_err();
        assert!(matches!(err, ProcessError::Load { .. }));
        assert!(!dir.path().join("broken_processed.png").exists());
    }

    #[test]
    fn technique_named_best_keeps_its_output() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("page.png");
        write_test_image(&src, 30, 20);
        let out = dir.path().join("out");
        let processor = TechniqueProcessor::new(
            "custom",
            vec![Technique::new("best", vec![TransformStep::Grayscale])],
        );

        let best = processor.process(&src, &out).unwrap();

        assert_eq!(best, out.join("page_best.png"));
        assert!(std::fs::metadata(&best).unwrap().len() > 0);
        assert_eq!(image::image_dimensions(&best).unwrap(), (30, 20));
    }

    #[test]
    fn every_technique_failing_to_save_is_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("page.png");
        write_test_image(&src, 30, 20);
        let out = dir.path().join("out");
        // A directory squatting on the target (and its PNG fallback) blocks both saves.
        std::fs::create_dir_all(out.join("page_gray.png")).unwrap();
        let processor = TechniqueProcessor::new(
            "custom",
            vec![Technique::new("gray", vec![TransformStep::Grayscale])],
        );

        let err = processor.process(&src, &out).unwrap_err();

        assert!(matches!(err, ProcessError::NoOutput(_)));
        assert!(!out.join("page_best.png").exists());
    }

    #[test]
    fn passthrough_returns_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.png");
        write_test_image(&src, 20, 20);
        assert_eq!(PassthroughProcessor.process(&src, dir.path()).unwrap(), src);
    }

    #[test]
    fn boxed_processor_delegates() {
        let boxed: Box<dyn ImageProcessor> = Box::new(PassthroughProcessor);
        assert_eq!(boxed.name(), "none");
    }
}
