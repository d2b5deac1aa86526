use image::{DynamicImage, RgbImage};
use rayon::prelude::*;

use super::{bin_index, chroma_histogram, color_image, FeatureExtractor};
use crate::error::FeatureError;
use crate::params::{ChromaParams, TextureParams};
use crate::types::FeatureVector;

const RW: f32 = 0.299;
const GW: f32 = 0.587;
const BW: f32 = 0.114;

/// Chromaticity histogram followed by gradient magnitude and orientation
/// histograms.
///
/// Layout: `[color (bins^2) || magnitude || orientation]`, 256 + 16 + 18 with
/// the default parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColorTexture {
    pub chroma: ChromaParams,
    pub texture: TextureParams,
}

impl ColorTexture {
    pub fn new(chroma: ChromaParams, texture: TextureParams) -> Self {
        Self { chroma, texture }
    }
}

impl FeatureExtractor for ColorTexture {
    fn extract(&self, image: &DynamicImage) -> Result<FeatureVector, FeatureError> {
        let src = color_image(image)?;
        let mut feat = chroma_histogram(&src, self.chroma.bins)?;
        let grad = sobel_gradients(&src);
        let (magnitude, orientation) = gradient_histograms(&grad, &self.texture)?;
        feat.extend(magnitude);
        feat.extend(orientation);
        Ok(feat)
    }

    fn dim(&self) -> usize {
        self.chroma.dim() + self.texture.magnitude_bins + self.texture.orientation_bins
    }
}

/// Horizontal and vertical derivatives of the luminance, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradients {
    pub width: usize,
    pub height: usize,
    pub dx: Vec<f32>,
    pub dy: Vec<f32>,
}

/// Compute the 3x3 Sobel derivatives of the image luminance.
///
/// Luminance is `0.299 R + 0.587 G + 0.114 B`. Borders are handled by
/// replicating the edge pixels.
pub fn sobel_gradients(src: &RgbImage) -> Gradients {
    let width = src.width() as usize;
    let height = src.height() as usize;

    let gray: Vec<f32> = src
        .as_raw()
        .chunks_exact(3)
        .map(|p| RW * p[0] as f32 + GW * p[1] as f32 + BW * p[2] as f32)
        .collect();

    let mut dx = vec![0f32; width * height];
    let mut dy = vec![0f32; width * height];
    if width == 0 || height == 0 {
        return Gradients {
            width,
            height,
            dx,
            dy,
        };
    }

    dx.par_chunks_mut(width)
        .zip(dy.par_chunks_mut(width))
        .enumerate()
        .for_each(|(r, (dx_row, dy_row))| {
            let up = &gray[r.saturating_sub(1) * width..][..width];
            let mid = &gray[r * width..][..width];
            let down = &gray[(r + 1).min(height - 1) * width..][..width];
            for c in 0..width {
                let l = c.saturating_sub(1);
                let rr = (c + 1).min(width - 1);
                dx_row[c] = (up[rr] + 2.0 * mid[rr] + down[rr]) - (up[l] + 2.0 * mid[l] + down[l]);
                dy_row[c] = (down[l] + 2.0 * down[c] + down[rr]) - (up[l] + 2.0 * up[c] + up[rr]);
            }
        });

    Gradients {
        width,
        height,
        dx,
        dy,
    }
}

/// Build the magnitude and orientation histograms of a gradient field.
///
/// Magnitudes are divided by the image's largest magnitude before binning
/// over [0, 1]. Orientations are folded into [0, 180) degrees so opposite
/// edges share a bin. Every pixel votes once in each histogram and both are
/// divided by the pixel count.
pub fn gradient_histograms(
    grad: &Gradients,
    params: &TextureParams,
) -> Result<(FeatureVector, FeatureVector), FeatureError> {
    let (mag_bins, ori_bins) = (params.magnitude_bins, params.orientation_bins);
    if mag_bins == 0 {
        return Err(FeatureError::InvalidBins(mag_bins));
    }
    if ori_bins == 0 {
        return Err(FeatureError::InvalidBins(ori_bins));
    }
    let total = grad.dx.len();
    if total == 0 {
        return Err(FeatureError::EmptyImage);
    }

    let magnitude: Vec<f32> = grad
        .dx
        .iter()
        .zip(&grad.dy)
        .map(|(x, y)| (x * x + y * y).sqrt())
        .collect();
    let max_mag = magnitude.iter().copied().fold(0f32, f32::max);

    let mut mag_counts = vec![0u32; mag_bins];
    let mut ori_counts = vec![0u32; ori_bins];
    let ori_step = 180.0 / ori_bins as f32;

    for ((m, x), y) in magnitude.iter().zip(&grad.dx).zip(&grad.dy) {
        let norm = if max_mag > 0.0 { m / max_mag } else { 0.0 };
        mag_counts[bin_index(norm, mag_bins)] += 1;

        let mut angle = y.atan2(*x).to_degrees();
        if angle < 0.0 {
            angle += 180.0;
        }
        if angle >= 180.0 {
            angle -= 180.0;
        }
        let idx = ((angle / ori_step) as usize).min(ori_bins - 1);
        ori_counts[idx] += 1;
    }

    let normalize = |counts: Vec<u32>| -> FeatureVector {
        counts
            .into_iter()
            .map(|c| (c as f64 / total as f64) as f32)
            .collect()
    };
    Ok((normalize(mag_counts), normalize(ori_counts)))
}
