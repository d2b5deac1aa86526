use anyhow::{Context, Result};
use image::DynamicImage;
use log::warn;
use std::fs;
use std::path::Path;

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "ppm", "tif", "tiff"];

/// Whether the name carries one of the recognized image extensions.
pub fn is_image_filename(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|x| ext.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

/// List the image file names (not paths) of a directory.
///
/// Names come back in the order the file system enumerates them. A name that
/// is not valid UTF-8 is kept in lossy form, so loading it fails later and
/// the image is counted as skipped.
pub fn list_image_files<P: AsRef<Path>>(dir: P) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    let entries =
        fs::read_dir(dir).with_context(|| format!("cannot open directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = match name.to_str() {
            Some(name) => name.to_string(),
            None => {
                let lossy = name.to_string_lossy().into_owned();
                warn!("{}: file name is not valid UTF-8", lossy);
                lossy
            }
        };
        if is_image_filename(&name) {
            files.push(name);
        }
    }
    Ok(files)
}

/// Decode an image file.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();
    image::open(path).with_context(|| format!("cannot read image {}", path.display()))
}

/// The last component of a path, or the input when it has none.
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
