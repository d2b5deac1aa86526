//! Dissimilarity measures between feature vectors.
//!
//! All functions are pure and never fail: vectors of the wrong shape yield
//! [`SENTINEL`] so a ranking stays well defined. Smaller is more similar.

use serde::{Deserialize, Serialize};

use crate::params::{ChromaParams, GrassWeights, SegmentWeights, TextureParams};

/// Distance reported for vectors that cannot be compared.
pub const SENTINEL: f32 = 1e30;

/// Sum of squared differences, accumulated in `f64`.
pub fn ssd(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return SENTINEL;
    }
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum::<f64>() as f32
}

fn intersection(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| (x as f64).min(y as f64)).sum()
}

/// `1 - sum(min(a_i, b_i))` for normalized histograms of identical binning.
pub fn histogram_intersection(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return SENTINEL;
    }
    (1.0 - intersection(a, b)) as f32
}

/// Intersection distance on each half of a `[whole || center]` vector,
/// blended with `weights`.
pub fn two_segment(a: &[f32], b: &[f32], weights: SegmentWeights) -> f32 {
    if a.len() != b.len() || a.len() % 2 != 0 {
        return SENTINEL;
    }
    let half = a.len() / 2;
    let d_whole = 1.0 - intersection(&a[..half], &b[..half]);
    let d_center = 1.0 - intersection(&a[half..], &b[half..]);
    (weights.whole as f64 * d_whole + weights.center as f64 * d_center) as f32
}

/// [`two_segment`] with the center-biased 0.4/0.6 weights.
pub fn two_segment_center_biased(a: &[f32], b: &[f32]) -> f32 {
    two_segment(a, b, SegmentWeights::CENTER_BIASED)
}

/// Segment sizes of a color+texture vector.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct TextureLayout {
    pub color: usize,
    pub magnitude: usize,
    pub orientation: usize,
}

impl TextureLayout {
    pub fn new(chroma: &ChromaParams, texture: &TextureParams) -> Self {
        Self {
            color: chroma.dim(),
            magnitude: texture.magnitude_bins,
            orientation: texture.orientation_bins,
        }
    }

    pub fn dim(&self) -> usize {
        self.color + self.magnitude + self.orientation
    }
}

impl Default for TextureLayout {
    fn default() -> Self {
        Self::new(&ChromaParams::default(), &TextureParams::default())
    }
}

/// Equal blend of color intersection and texture intersection distance,
/// where texture is the equal blend of magnitude and orientation.
pub fn color_texture(a: &[f32], b: &[f32], layout: TextureLayout) -> f32 {
    if a.len() != b.len() || a.len() != layout.dim() {
        return SENTINEL;
    }
    let mag_off = layout.color;
    let ori_off = layout.color + layout.magnitude;

    let d_color = 1.0 - intersection(&a[..mag_off], &b[..mag_off]);
    let d_mag = 1.0 - intersection(&a[mag_off..ori_off], &b[mag_off..ori_off]);
    let d_ori = 1.0 - intersection(&a[ori_off..], &b[ori_off..]);

    let d_texture = 0.5 * d_mag + 0.5 * d_ori;
    (0.5 * d_color + 0.5 * d_texture) as f32
}

/// `1 - cos(a, b)`, accumulated in `f64`.
///
/// Empty vectors and vectors with a (near) zero norm yield [`SENTINEL`].
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return SENTINEL;
    }
    let (dot, na, nb) = a.iter().zip(b).fold(
        (0f64, 0f64, 0f64),
        |(dot, na, nb), (&x, &y)| {
            let (x, y) = (x as f64, y as f64);
            (dot + x * y, na + x * x, nb + y * y)
        },
    );
    let denom = na.sqrt() * nb.sqrt();
    if denom <= 1e-12 {
        return SENTINEL;
    }
    (1.0 - dot / denom) as f32
}

/// Weighted Euclidean distance between two five-value grass descriptors.
pub fn grass(a: &[f32], b: &[f32], weights: GrassWeights) -> f32 {
    if a.len() != 5 || b.len() != 5 {
        return SENTINEL;
    }
    weights
        .0
        .iter()
        .zip(a.iter().zip(b))
        .map(|(w, (x, y))| w * (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Closed set of distance measures, carrying their parameters.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub enum Metric {
    Ssd,
    Intersection,
    TwoSegment(SegmentWeights),
    ColorTexture(TextureLayout),
    Cosine,
    Grass(GrassWeights),
}

impl Metric {
    /// Distance between `a` and `b`; a NaN result is reported as [`SENTINEL`].
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        let d = match *self {
            Metric::Ssd => ssd(a, b),
            Metric::Intersection => histogram_intersection(a, b),
            Metric::TwoSegment(w) => two_segment(a, b, w),
            Metric::ColorTexture(layout) => color_texture(a, b, layout),
            Metric::Cosine => cosine(a, b),
            Metric::Grass(w) => grass(a, b, w),
        };
        if d.is_nan() {
            SENTINEL
        } else {
            d
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ssd_basics() {
        let a = [1.0, 2.0, 3.0];
        let b = [2.0, 0.0, 3.0];
        assert_eq!(ssd(&a, &a), 0.0);
        assert_eq!(ssd(&a, &b), 5.0);
        assert_eq!(ssd(&a, &b), ssd(&b, &a));
        assert_eq!(ssd(&a, &b[..2]), SENTINEL);
    }

    #[test]
    fn intersection_of_identical_histograms_is_zero() {
        let h = [0.25, 0.25, 0.5];
        assert_relative_eq!(histogram_intersection(&h, &h), 0.0);
        assert_relative_eq!(histogram_intersection(&h, &[1.0, 0.0, 0.0]), 0.75);
    }

    #[test]
    fn two_segment_presets() {
        let a = [1.0, 0.0, 1.0, 0.0];
        let b = [1.0, 0.0, 0.0, 1.0];
        // whole halves agree, center halves are disjoint
        assert_relative_eq!(two_segment(&a, &b, SegmentWeights::REGISTRY), 0.5);
        assert_relative_eq!(two_segment_center_biased(&a, &b), 0.6);
        assert_eq!(two_segment(&a[..3], &b[..3], SegmentWeights::REGISTRY), SENTINEL);
    }

    #[test]
    fn color_texture_segments() {
        let layout = TextureLayout {
            color: 2,
            magnitude: 1,
            orientation: 2,
        };
        let a = [1.0, 0.0, 1.0, 1.0, 0.0];
        let b = [0.0, 1.0, 1.0, 0.0, 1.0];
        // color 1, magnitude 0, orientation 1 -> 0.5 * 1 + 0.5 * 0.5
        assert_relative_eq!(color_texture(&a, &b, layout), 0.75);
        assert_eq!(color_texture(&a[..4], &b[..4], layout), SENTINEL);
        assert_eq!(TextureLayout::default().dim(), 290);
    }

    #[test]
    fn cosine_sentinels() {
        assert_eq!(cosine(&[0.0, 0.0], &[0.0, 0.0]), SENTINEL);
        assert_eq!(cosine(&[], &[]), SENTINEL);
        assert_eq!(cosine(&[1.0], &[1.0, 0.0]), SENTINEL);
        assert_relative_eq!(cosine(&[1.0, 0.0], &[0.0, 2.0]), 1.0);
        assert_relative_eq!(cosine(&[1.0, 1.0], &[2.0, 2.0]), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn grass_weights() {
        let w = GrassWeights::default();
        let a = [0.0, 0.0, 0.0, 0.0, 0.0];
        let b = [0.0, 1.0, 0.0, 0.0, 0.0];
        assert_relative_eq!(grass(&a, &b, w), 5f32.sqrt());
        assert_eq!(grass(&a, &b[..4], w), SENTINEL);
    }

    #[test]
    fn never_nan() {
        let m = Metric::Cosine;
        assert!(!m.distance(&[0.0; 4], &[1.0; 4]).is_nan());
    }

    #[test]
    fn nan_inputs_rank_last() {
        let nan = [f32::NAN, 1.0];
        assert_eq!(Metric::Ssd.distance(&[0.0, 1.0], &nan), SENTINEL);
        assert_eq!(Metric::Cosine.distance(&[1.0, 1.0], &nan), SENTINEL);
        assert_eq!(Metric::Intersection.distance(&nan, &nan), SENTINEL);
    }
}
