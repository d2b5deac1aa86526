//! Image descriptors used to index and query a feature database.
//!
//! Every extractor maps a decoded image to a [`FeatureVector`] whose length
//! depends only on the extractor's parameters, never on the image.
//!
//! # Available extractors
//!
//! - [`CenterPatch`]: raw 7x7 pixel patch at the image center (147 values)
//! - [`ChromaHistogram`]: r/g chromaticity histogram (256 values by default)
//! - [`MultiRegionHistogram`]: whole-image and center-region chromaticity (512)
//! - [`ColorTexture`]: chromaticity plus gradient magnitude/orientation (290)
//! - [`GrassExtractor`]: vegetation statistics in HSV space (5)

mod chroma;
mod grass;
mod multi_region;
mod patch;
mod texture;

pub use chroma::{chroma_histogram, chroma_histogram_region, ChromaHistogram};
pub use grass::{grass_features, hsv_from_rgb, GrassExtractor, GRASS_DIM};
pub use multi_region::{center_region, MultiRegionHistogram};
pub use patch::{center_patch, CenterPatch, PATCH_DIM, PATCH_SIZE};
pub use texture::{gradient_histograms, sobel_gradients, ColorTexture, Gradients};

use image::{DynamicImage, RgbImage};

use crate::error::FeatureError;
use crate::types::FeatureVector;

/// A deterministic mapping from an image to a fixed-length descriptor.
pub trait FeatureExtractor {
    /// Compute the descriptor, or report why the image was refused.
    fn extract(&self, image: &DynamicImage) -> Result<FeatureVector, FeatureError>;

    /// Length of every vector this extractor produces.
    fn dim(&self) -> usize;
}

/// Closed set of extractors bound to registry tasks, dispatched by value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Extractor {
    CenterPatch(CenterPatch),
    Chroma(ChromaHistogram),
    MultiRegion(MultiRegionHistogram),
    ColorTexture(ColorTexture),
}

impl FeatureExtractor for Extractor {
    fn extract(&self, image: &DynamicImage) -> Result<FeatureVector, FeatureError> {
        match self {
            Extractor::CenterPatch(e) => e.extract(image),
            Extractor::Chroma(e) => e.extract(image),
            Extractor::MultiRegion(e) => e.extract(image),
            Extractor::ColorTexture(e) => e.extract(image),
        }
    }

    fn dim(&self) -> usize {
        match self {
            Extractor::CenterPatch(e) => e.dim(),
            Extractor::Chroma(e) => e.dim(),
            Extractor::MultiRegion(e) => e.dim(),
            Extractor::ColorTexture(e) => e.dim(),
        }
    }
}

/// Bring a decoded image into 8-bit RGB.
///
/// Gray images are expanded to three equal channels. Images with an alpha
/// channel are refused.
pub fn color_image(image: &DynamicImage) -> Result<RgbImage, FeatureError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(FeatureError::EmptyImage);
    }
    match image.color().channel_count() {
        1 | 3 => Ok(image.to_rgb8()),
        n => Err(FeatureError::UnsupportedChannels(n)),
    }
}

/// Map a value in [0, 1] to a bin index in `0..bins`.
#[inline]
pub(crate) fn bin_index(value: f32, bins: usize) -> usize {
    let idx = (value * bins as f32).floor();
    if idx <= 0.0 {
        0
    } else {
        (idx as usize).min(bins - 1)
    }
}
