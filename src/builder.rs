use anyhow::Result;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::Path;

use crate::registry::TaskSpec;
use crate::scan::{list_image_files, load_image};
use crate::storage::FeatureWriter;
use crate::types::{DatabaseRow, FeatureVector};

/// Outcome of a database build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub written: usize,
    pub skipped: usize,
}

/// Extract features for every image of `dir` and write them to `output`.
///
/// Images that cannot be decoded or that the extractor refuses are skipped
/// and counted. Rows follow the directory enumeration order. Failing to read
/// the directory or create the output aborts before any image is decoded.
pub fn build_database<P: AsRef<Path>, Q: AsRef<Path>>(
    dir: P,
    output: Q,
    spec: &TaskSpec,
) -> Result<BuildReport> {
    let dir = dir.as_ref();
    let files = list_image_files(dir)?;
    info!(
        "building task {} database from {} images in {}",
        spec.task,
        files.len(),
        dir.display()
    );

    let mut writer = FeatureWriter::create(output, spec.task.id() as u32, spec.dim())?;
    let features: Vec<Option<FeatureVector>> = files
        .par_iter()
        .map(|name| extract_file(&dir.join(name), spec))
        .collect();

    let mut report = BuildReport::default();
    for (name, feat) in files.into_iter().zip(features) {
        match feat {
            Some(vector) => {
                writer.append(&DatabaseRow::new(name, vector))?;
                report.written += 1;
            }
            None => report.skipped += 1,
        }
    }
    info!(
        "wrote {} rows to {} (skipped {})",
        report.written,
        writer.path().display(),
        report.skipped
    );
    writer.finish()?;
    Ok(report)
}

fn extract_file(path: &Path, spec: &TaskSpec) -> Option<FeatureVector> {
    debug!("processing image file: {}", path.display());
    let image = match load_image(path) {
        Ok(image) => image,
        Err(e) => {
            warn!("[skip] {e:#}");
            return None;
        }
    };
    match spec.extract(&image) {
        Ok(feat) => Some(feat),
        Err(e) => {
            warn!("[skip] failed to compute feature for {}: {e}", path.display());
            None
        }
    }
}
