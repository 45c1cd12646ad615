use std::io;
use std::path::{Path, PathBuf};

/// Extensions recognised as raster images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "gif"];

/// Whether `path` carries one of the recognised image extensions.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// List the image files directly inside `dir`, sorted by file name.
/// Subdirectories are not descended into.
pub fn list_images(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if is_image_file(&path) {
            images.push(path);
        }
    }
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// The file stem used to name every derived output. Falls back to `"image"`
/// for paths without a usable stem.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string())
}

/// `<text_dir>/<stem>.txt`
pub fn text_output_path(text_dir: &Path, image: &Path) -> PathBuf {
    text_dir.join(format!("{}.txt", file_stem(image)))
}

/// `<output_dir>/<stem>_<suffix>.<ext>`, keeping the source extension.
/// Images without an extension get `.png`.
pub fn derived_image_path(output_dir: &Path, image: &Path, suffix: &str) -> PathBuf {
    let ext = image
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    output_dir.join(format!("{}_{suffix}.{ext}", file_stem(image)))
}
