use serde::{Deserialize, Serialize};

/// Fixed-length descriptor produced by a feature extractor.
///
/// The length and layout are determined by the task that produced it.
pub type FeatureVector = Vec<f32>;

/// One persisted entry of a feature database.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct DatabaseRow {
    pub filename: String,
    pub vector: FeatureVector,
}

impl DatabaseRow {
    pub fn new(filename: impl Into<String>, vector: FeatureVector) -> Self {
        Self {
            filename: filename.into(),
            vector,
        }
    }
}

/// A ranked query result.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Match {
    pub filename: String,
    pub distance: f32,
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersect the region with an image of the given size.
    ///
    /// Returns `None` when nothing of the region is left inside the image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Region> {
        let x0 = self.x.min(width);
        let y0 = self.y.min(height);
        let x1 = self.x.saturating_add(self.width).min(width);
        let y1 = self.y.saturating_add(self.height).min(height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Region::new(x0, y0, x1 - x0, y1 - y0))
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
