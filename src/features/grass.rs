use image::{DynamicImage, RgbImage};
use rayon::prelude::*;

use super::FeatureExtractor;
use crate::error::FeatureError;
use crate::params::GrassParams;
use crate::types::FeatureVector;

/// Length of a grass descriptor.
pub const GRASS_DIM: usize = 5;

/// Vegetation statistics: green ratio, mean H, S and V of the green mask,
/// and a flag set when any pixel is green.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GrassExtractor {
    pub params: GrassParams,
}

impl GrassExtractor {
    pub fn new(params: GrassParams) -> Self {
        Self { params }
    }

    /// Grass statistics of a decoded image. An alpha channel is dropped.
    pub fn describe(&self, image: &DynamicImage) -> Result<[f32; GRASS_DIM], FeatureError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(FeatureError::EmptyImage);
        }
        Ok(grass_features(&image.to_rgb8(), &self.params))
    }
}

impl FeatureExtractor for GrassExtractor {
    fn extract(&self, image: &DynamicImage) -> Result<FeatureVector, FeatureError> {
        Ok(self.describe(image)?.to_vec())
    }

    fn dim(&self) -> usize {
        GRASS_DIM
    }
}

/// Convert every pixel to HSV.
///
/// Hue is in degrees [0, 360), saturation and value in [0, 1]. Achromatic
/// pixels get a hue of zero.
pub fn hsv_from_rgb(src: &RgbImage) -> Vec<[f32; 3]> {
    src.as_raw()
        .par_chunks_exact(3)
        .map(|p| {
            let r = p[0] as f32 / 255.;
            let g = p[1] as f32 / 255.;
            let b = p[2] as f32 / 255.;

            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            let delta = max - min;

            let h = if delta == 0.0 {
                0.0
            } else if max == r {
                60.0 * (((g - b) / delta) % 6.0)
            } else if max == g {
                60.0 * (((b - r) / delta) + 2.0)
            } else {
                60.0 * (((r - g) / delta) + 4.0)
            };
            let h = if h < 0.0 { h + 360.0 } else { h };

            let s = if max == 0.0 { 0.0 } else { delta / max };

            [h, s, max]
        })
        .collect()
}

/// Compute the five grass statistics of an RGB image.
///
/// Pixels inside the hue band and above the saturation and value floors form
/// a mask which is opened and then closed with a square element. Means are
/// taken over the final mask and are zero when it is empty.
pub fn grass_features(src: &RgbImage, params: &GrassParams) -> [f32; GRASS_DIM] {
    let width = src.width() as usize;
    let height = src.height() as usize;
    let hsv = hsv_from_rgb(src);

    let mask: Vec<bool> = hsv
        .iter()
        .map(|&[h, s, v]| {
            h >= params.hue_min
                && h <= params.hue_max
                && s >= params.min_saturation
                && v >= params.min_value
        })
        .collect();

    let ksize = params.kernel_size;
    let mask = close(&open(&mask, width, height, ksize), width, height, ksize);

    let mut count = 0usize;
    let (mut sum_h, mut sum_s, mut sum_v) = (0f64, 0f64, 0f64);
    for (&[h, s, v], _) in hsv.iter().zip(&mask).filter(|&(_, &m)| m) {
        count += 1;
        sum_h += h as f64;
        sum_s += s as f64;
        sum_v += v as f64;
    }

    let total = hsv.len().max(1) as f64;
    if count == 0 {
        return [0.0; GRASS_DIM];
    }
    let n = count as f64;
    [
        (n / total) as f32,
        (sum_h / n / 360.0) as f32,
        (sum_s / n) as f32,
        (sum_v / n) as f32,
        1.0,
    ]
}

fn open(mask: &[bool], width: usize, height: usize, ksize: usize) -> Vec<bool> {
    let eroded = morph(mask, width, height, ksize, Op::Erode);
    morph(&eroded, width, height, ksize, Op::Dilate)
}

fn close(mask: &[bool], width: usize, height: usize, ksize: usize) -> Vec<bool> {
    let dilated = morph(mask, width, height, ksize, Op::Dilate);
    morph(&dilated, width, height, ksize, Op::Erode)
}

#[derive(Clone, Copy)]
enum Op {
    Erode,
    Dilate,
}

/// Binary erosion or dilation with a `ksize` x `ksize` square.
///
/// The square is separable, so the pass runs along rows and then columns.
/// Neighbors outside the image are ignored.
fn morph(mask: &[bool], width: usize, height: usize, ksize: usize, op: Op) -> Vec<bool> {
    if ksize <= 1 || mask.is_empty() {
        return mask.to_vec();
    }
    let radius = ksize / 2;
    let init = matches!(op, Op::Erode);
    let pick = |acc: bool, v: bool| match op {
        Op::Erode => acc && v,
        Op::Dilate => acc || v,
    };

    let mut rows = vec![false; mask.len()];
    for y in 0..height {
        let row = &mask[y * width..][..width];
        for x in 0..width {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(width - 1);
            rows[y * width + x] = row[lo..=hi].iter().fold(init, |acc, &v| pick(acc, v));
        }
    }

    let mut out = vec![false; mask.len()];
    for y in 0..height {
        let lo = y.saturating_sub(radius);
        let hi = (y + radius).min(height - 1);
        for x in 0..width {
            out[y * width + x] = (lo..=hi).fold(init, |acc, yy| pick(acc, rows[yy * width + x]));
        }
    }
    out
}
