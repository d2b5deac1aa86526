use image::{DynamicImage, RgbImage};
use rayon::prelude::*;

use super::{bin_index, color_image, FeatureExtractor};
use crate::error::FeatureError;
use crate::params::ChromaParams;
use crate::types::{FeatureVector, Region};

/// Whole-image r/g chromaticity histogram.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChromaHistogram {
    pub params: ChromaParams,
}

impl ChromaHistogram {
    pub fn new(params: ChromaParams) -> Self {
        Self { params }
    }
}

impl FeatureExtractor for ChromaHistogram {
    fn extract(&self, image: &DynamicImage) -> Result<FeatureVector, FeatureError> {
        chroma_histogram(&color_image(image)?, self.params.bins)
    }

    fn dim(&self) -> usize {
        self.params.dim()
    }
}

/// Compute the normalized r/g chromaticity histogram of the whole image.
///
/// See [`chroma_histogram_region`].
pub fn chroma_histogram(src: &RgbImage, bins: usize) -> Result<FeatureVector, FeatureError> {
    let (width, height) = src.dimensions();
    chroma_histogram_region(src, Region::new(0, 0, width, height), bins)
}

/// Compute the normalized r/g chromaticity histogram over a region.
///
/// Each pixel votes once into the cell `(r_bin, g_bin)` where
/// `r = R / (R + G + B)` and `g = G / (R + G + B)`, the sum being at least 1.
/// The `bins * bins` cells are laid out row-major with `r` selecting the row
/// and every cell is divided by the number of pixels, so the histogram sums
/// to one.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `region` - The area to count, clamped to the image bounds.
/// * `bins` - Bins per chromaticity axis.
///
/// # Errors
///
/// [`FeatureError::InvalidBins`] for zero bins, [`FeatureError::EmptyRegion`]
/// when the clamped region holds no pixel.
pub fn chroma_histogram_region(
    src: &RgbImage,
    region: Region,
    bins: usize,
) -> Result<FeatureVector, FeatureError> {
    if bins == 0 {
        return Err(FeatureError::InvalidBins(bins));
    }
    let (width, height) = src.dimensions();
    if width == 0 || height == 0 {
        return Err(FeatureError::EmptyImage);
    }
    let region = region
        .clamp_to(width, height)
        .ok_or(FeatureError::EmptyRegion)?;

    let cells = bins * bins;
    let row_len = width as usize * 3;
    let x0 = region.x as usize * 3;
    let x1 = x0 + region.width as usize * 3;
    let y0 = region.y as usize;
    let y1 = y0 + region.height as usize;

    let counts = src.as_raw()[y0 * row_len..y1 * row_len]
        .par_chunks(row_len)
        .fold(
            || vec![0u32; cells],
            |mut local, row| {
                for px in row[x0..x1].chunks_exact(3) {
                    let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
                    let sum = (r + g + b).max(1.0);
                    let ri = bin_index(r / sum, bins);
                    let gi = bin_index(g / sum, bins);
                    local[ri * bins + gi] += 1;
                }
                local
            },
        )
        .reduce(
            || vec![0u32; cells],
            |mut a, b| {
                a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                a
            },
        );

    let total = region.area() as f64;
    Ok(counts.into_iter().map(|c| (c as f64 / total) as f32).collect())
}
