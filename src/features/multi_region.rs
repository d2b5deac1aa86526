use image::DynamicImage;

use super::{chroma_histogram, chroma_histogram_region, color_image, FeatureExtractor};
use crate::error::FeatureError;
use crate::params::ChromaParams;
use crate::types::{FeatureVector, Region};

/// Whole-image histogram followed by the histogram of the central region.
///
/// The vector is `[whole || center]`, each half `bins * bins` long.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MultiRegionHistogram {
    pub params: ChromaParams,
}

impl MultiRegionHistogram {
    pub fn new(params: ChromaParams) -> Self {
        Self { params }
    }
}

impl FeatureExtractor for MultiRegionHistogram {
    fn extract(&self, image: &DynamicImage) -> Result<FeatureVector, FeatureError> {
        let src = color_image(image)?;
        let (width, height) = src.dimensions();

        let mut feat = chroma_histogram(&src, self.params.bins)?;
        let center = chroma_histogram_region(&src, center_region(width, height), self.params.bins)?;
        feat.extend(center);
        Ok(feat)
    }

    fn dim(&self) -> usize {
        2 * self.params.dim()
    }
}

/// The centered region of half the width and half the height (rounded down).
pub fn center_region(width: u32, height: u32) -> Region {
    let half_w = width / 2;
    let half_h = height / 2;
    Region::new((width - half_w) / 2, (height - half_h) / 2, half_w, half_h)
}
