use image::{DynamicImage, RgbImage};

use super::{color_image, FeatureExtractor};
use crate::error::FeatureError;
use crate::types::FeatureVector;

/// Side of the square patch.
pub const PATCH_SIZE: u32 = 7;

/// Length of a patch descriptor: 7 x 7 pixels x 3 channels.
pub const PATCH_DIM: usize = (PATCH_SIZE * PATCH_SIZE * 3) as usize;

/// Raw pixel values of the 7x7 neighborhood at the image center.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CenterPatch;

impl FeatureExtractor for CenterPatch {
    fn extract(&self, image: &DynamicImage) -> Result<FeatureVector, FeatureError> {
        center_patch(&color_image(image)?)
    }

    fn dim(&self) -> usize {
        PATCH_DIM
    }
}

/// Flatten the 7x7 patch centered at `(rows / 2, cols / 2)`.
///
/// Values are emitted row by row, three channels per pixel in B, G, R order,
/// the layout other task-1 databases use.
///
/// # Errors
///
/// [`FeatureError::TooSmall`] if the image is smaller than the patch or the
/// truncated center would push the patch over the border.
pub fn center_patch(src: &RgbImage) -> Result<FeatureVector, FeatureError> {
    let (width, height) = src.dimensions();
    let too_small = FeatureError::TooSmall {
        width,
        height,
        patch: PATCH_SIZE,
    };
    if width < PATCH_SIZE || height < PATCH_SIZE {
        return Err(too_small);
    }

    let half = (PATCH_SIZE / 2) as i64;
    let y0 = (height / 2) as i64 - half;
    let x0 = (width / 2) as i64 - half;
    let last = PATCH_SIZE as i64 - 1;
    if y0 < 0 || x0 < 0 || y0 + last >= height as i64 || x0 + last >= width as i64 {
        return Err(too_small);
    }

    let (x0, y0) = (x0 as u32, y0 as u32);
    let mut feat = Vec::with_capacity(PATCH_DIM);
    for y in y0..y0 + PATCH_SIZE {
        for x in x0..x0 + PATCH_SIZE {
            let [r, g, b] = src.get_pixel(x, y).0;
            feat.extend([b as f32, g as f32, r as f32]);
        }
    }

    Ok(feat)
}
