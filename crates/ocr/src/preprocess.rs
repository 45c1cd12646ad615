use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Luma, Rgba};
use imageproc::geometric_transformations::{rotate_about_center, warp, Interpolation, Projection};
use std::path::{Path, PathBuf};
use thiserror::Error;

use imgtext_core::{TransformStep, MAX_DIMENSION};

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Invalid parameter for {step}: {reason}")]
    InvalidParameter { step: String, reason: String },
    #[error("Upscaled image would be {width}x{height}, limit is {max}px per side", max = MAX_DIMENSION)]
    TooLarge { width: u64, height: u64 },
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Failed to save {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Apply a single step. The input is left untouched so callers can keep it
/// when the step fails.
pub fn apply_step(img: &DynamicImage, step: &TransformStep) -> Result<DynamicImage, TransformError> {
    match *step {
        TransformStep::Grayscale => Ok(img.grayscale()),
        TransformStep::Contrast { percent } => {
            ensure_finite(step, percent)?;
            Ok(img.adjust_contrast(percent))
        }
        TransformStep::Rotate { degrees } => {
            ensure_finite(step, degrees)?;
            Ok(rotate(img, degrees))
        }
        TransformStep::Rotate90 => Ok(img.rotate90()),
        TransformStep::Rotate180 => Ok(img.rotate180()),
        TransformStep::Rotate270 => Ok(img.rotate270()),
        TransformStep::Shift { dx, dy } => Ok(shift(img, dx, dy)),
        TransformStep::Upscale { factor } => upscale(img, factor),
        TransformStep::Brighten { amount } => Ok(img.brighten(amount)),
        TransformStep::Sharpen { sigma, threshold } => {
            ensure_finite(step, sigma)?;
            if sigma <= 0.0 {
                return Err(invalid(step, "sigma must be positive"));
            }
            Ok(img.unsharpen(sigma, threshold))
        }
        TransformStep::Normalize => Ok(normalize(img)),
    }
}

/// Run `steps` in order. A failing step is logged and skipped; the chain
/// continues from the image as it was before that step.
pub fn apply_steps(img: DynamicImage, steps: &[TransformStep]) -> DynamicImage {
    steps.iter().fold(img, |current, step| match apply_step(&current, step) {
        Ok(next) => next,
        Err(e) => {
            tracing::warn!("Skipping {step}: {e}");
            current
        }
    })
}

/// Save `img` at `path` in the format implied by its extension. If that
/// encoder rejects the image, fall back to PNG next to it and return the
/// path actually written.
pub fn save_image(img: &DynamicImage, path: &Path) -> Result<PathBuf, SaveError> {
    let prepared = match ImageFormat::from_path(path) {
        // JPEG and BMP encoders reject alpha channels.
        Ok(ImageFormat::Jpeg | ImageFormat::Bmp) if img.color().has_alpha() => {
            if img.color().has_color() {
                DynamicImage::ImageRgb8(img.to_rgb8())
            } else {
                DynamicImage::ImageLuma8(img.to_luma8())
            }
        }
        _ => img.clone(),
    };

    match prepared.save(path) {
        Ok(()) => Ok(path.to_path_buf()),
        Err(e) => {
            tracing::warn!("Error saving {}: {e}; falling back to PNG", path.display());
            let png_path = path.with_extension("png");
            img.save_with_format(&png_path, ImageFormat::Png)
                .map_err(|source| SaveError::Encode { path: png_path.clone(), source })?;
            Ok(png_path)
        }
    }
}

fn ensure_finite(step: &TransformStep, value: f32) -> Result<(), TransformError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(step, "value must be finite"))
    }
}

fn invalid(step: &TransformStep, reason: &str) -> TransformError {
    TransformError::InvalidParameter { step: step.to_string(), reason: reason.to_string() }
}

fn rotate(img: &DynamicImage, degrees: f32) -> DynamicImage {
    let theta = degrees.to_radians();
    match img {
        DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(rotate_about_center(
            gray,
            theta,
            Interpolation::Bilinear,
            Luma([255u8]),
        )),
        other => DynamicImage::ImageRgba8(rotate_about_center(
            &other.to_rgba8(),
            theta,
            Interpolation::Bilinear,
            WHITE,
        )),
    }
}

fn shift(img: &DynamicImage, dx: i32, dy: i32) -> DynamicImage {
    let projection = Projection::translate(dx as f32, dy as f32);
    match img {
        DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(warp(
            gray,
            &projection,
            Interpolation::Nearest,
            Luma([255u8]),
        )),
        other => DynamicImage::ImageRgba8(warp(
            &other.to_rgba8(),
            &projection,
            Interpolation::Nearest,
            WHITE,
        )),
    }
}

fn upscale(img: &DynamicImage, factor: u32) -> Result<DynamicImage, TransformError> {
    if factor == 0 {
        return Err(invalid(&TransformStep::Upscale { factor }, "factor must be at least 1"));
    }
    let width = img.width() as u64 * factor as u64;
    let height = img.height() as u64 * factor as u64;
    if width > MAX_DIMENSION as u64 || height > MAX_DIMENSION as u64 {
        return Err(TransformError::TooLarge { width, height });
    }
    Ok(img.resize_exact(width as u32, height as u32, FilterType::Lanczos3))
}

/// Grayscale + contrast stretch.
fn normalize(img: &DynamicImage) -> DynamicImage {
    // Down-scale if the image is very large (Tesseract works best at 300 DPI / ~2000 px).
    let gray: GrayImage = if img.width() > 2800 || img.height() > 2800 {
        img.resize(2800, 2800, FilterType::Lanczos3).to_luma8()
    } else {
        img.to_luma8()
    };

    let (min_px, max_px) = gray
        .pixels()
        .fold((255u8, 0u8), |(mn, mx), p| (mn.min(p[0]), mx.max(p[0])));

    if max_px == min_px {
        // Uniform image — return grayscale as-is.
        return DynamicImage::ImageLuma8(gray);
    }

    let range = (max_px - min_px) as u32;
    let stretched: GrayImage = ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        let v = ((p - min_px) as u32 * 255 / range) as u8;
        Luma([v])
    });

    DynamicImage::ImageLuma8(stretched)
}
