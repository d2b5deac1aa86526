use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use std::path::Path;

use crate::database::FeatureDb;
use crate::features::{GrassExtractor, GRASS_DIM};
use crate::metrics::Metric;
use crate::params::{FusionParams, GrassParams, GrassWeights};
use crate::registry::TaskSpec;
use crate::scan::{basename, load_image};
use crate::types::Match;

/// Length of the externally produced embeddings.
pub const EMBEDDING_DIM: usize = 512;

/// Rank the database against an image using a task's extractor and metric.
///
/// The row named like the target file is excluded.
pub fn query_image<P: AsRef<Path>>(
    target: P,
    db: &FeatureDb,
    spec: &TaskSpec,
    k: usize,
) -> Result<Vec<Match>> {
    let target = target.as_ref();
    let image = load_image(target)?;
    let query = spec
        .extract(&image)
        .with_context(|| format!("failed to compute target feature for {}", target.display()))?;
    let name = basename_of(target);
    Ok(db.search(&query, &spec.metric, Some(name), k))
}

/// Rank embeddings by cosine distance to the embedding stored for `target`.
pub fn query_embedding(target: &str, db: &FeatureDb, k: usize) -> Result<Vec<Match>> {
    let row = db
        .find(target)
        .ok_or_else(|| anyhow!("target filename not found in embeddings: {target}"))?;
    Ok(db.search(&row.vector, &Metric::Cosine, Some(target), k))
}

/// Settings of the fused embedding + vegetation query.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GrassQuery {
    pub grass: GrassParams,
    pub weights: GrassWeights,
    pub fusion: FusionParams,
}

/// Result of [`query_grass`].
#[derive(Clone, Debug, PartialEq)]
pub struct GrassRanking {
    /// Grass descriptor of the target image.
    pub target: [f32; GRASS_DIM],
    /// Every surviving candidate, closest first.
    pub matches: Vec<Match>,
}

/// Rank images by a blend of embedding cosine distance and grass distance.
///
/// `db` holds the embeddings; rows that are not [`EMBEDDING_DIM`] long are
/// ignored. Candidate images are read from `image_dir`; an alpha channel is
/// dropped. Candidates that cannot be read or whose green ratio is below the
/// fusion threshold are left out.
pub fn query_grass<P: AsRef<Path>, Q: AsRef<Path>>(
    target: P,
    image_dir: Q,
    db: &FeatureDb,
    settings: &GrassQuery,
) -> Result<GrassRanking> {
    let target = target.as_ref();
    let image_dir = image_dir.as_ref();
    let name = basename_of(target);

    let mut db = db.clone();
    db.retain_dim(EMBEDDING_DIM);
    let target_emb = db
        .find(name)
        .ok_or_else(|| anyhow!("target not found in embeddings: {name}"))?
        .vector
        .clone();

    let extractor = GrassExtractor::new(settings.grass);
    let image = load_image(target)?;
    let target_feat = extractor
        .describe(&image)
        .with_context(|| format!("failed to compute grass feature for {}", target.display()))?;
    debug!("target green ratio: {}", target_feat[0]);

    let FusionParams {
        embedding_weight,
        grass_weight,
        min_green_ratio,
    } = settings.fusion;

    let matches = db.search_by(usize::MAX, |row| {
        if row.filename == name {
            return None;
        }
        let image = load_image(image_dir.join(&row.filename))
            .map_err(|e| warn!("[skip] {e:#}"))
            .ok()?;
        let feat = match extractor.describe(&image) {
            Ok(feat) => feat,
            Err(e) => {
                warn!("[skip] {}: {e}", row.filename);
                return None;
            }
        };
        if feat[0] < min_green_ratio {
            return None;
        }
        let d_emb = Metric::Cosine.distance(&target_emb, &row.vector);
        let d_grass = Metric::Grass(settings.weights).distance(&target_feat, &feat);
        Some(embedding_weight * d_emb + grass_weight * d_grass)
    });

    Ok(GrassRanking {
        target: target_feat,
        matches,
    })
}

fn basename_of(path: &Path) -> &str {
    path.to_str().map(basename).unwrap_or_default()
}
