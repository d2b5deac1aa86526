use serde::{Deserialize, Serialize};

/// Bin layout of the r/g chromaticity histogram.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct ChromaParams {
    /// Bins per axis; the histogram has `bins * bins` cells.
    pub bins: usize,
}

impl ChromaParams {
    pub fn dim(&self) -> usize {
        self.bins * self.bins
    }
}

impl Default for ChromaParams {
    fn default() -> Self {
        Self { bins: 16 }
    }
}

/// Bin layout of the gradient texture histograms.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct TextureParams {
    pub magnitude_bins: usize,
    /// Bins over the unsigned orientation range [0, 180) degrees.
    pub orientation_bins: usize,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            magnitude_bins: 16,
            orientation_bins: 18,
        }
    }
}

/// Thresholds of the vegetation mask.
///
/// Hue is in degrees [0, 360), saturation and value in [0, 1].
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct GrassParams {
    pub hue_min: f32,
    pub hue_max: f32,
    pub min_saturation: f32,
    pub min_value: f32,
    /// Side of the square structuring element used to open and close the mask.
    pub kernel_size: usize,
}

impl Default for GrassParams {
    fn default() -> Self {
        Self {
            hue_min: 70.0,
            hue_max: 170.0,
            min_saturation: 0.15,
            min_value: 0.15,
            kernel_size: 5,
        }
    }
}

/// Weights of the two halves of a `[whole || center]` histogram vector.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct SegmentWeights {
    pub whole: f32,
    pub center: f32,
}

impl SegmentWeights {
    /// Equal weighting, bound to the multi-region task.
    pub const REGISTRY: SegmentWeights = SegmentWeights {
        whole: 0.5,
        center: 0.5,
    };

    /// Favors the center region.
    pub const CENTER_BIASED: SegmentWeights = SegmentWeights {
        whole: 0.4,
        center: 0.6,
    };
}

impl Default for SegmentWeights {
    fn default() -> Self {
        Self::REGISTRY
    }
}

/// Per-dimension weights of the grass distance.
///
/// Order follows the grass vector: green ratio, hue, saturation, value, flag.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct GrassWeights(pub [f32; 5]);

impl Default for GrassWeights {
    fn default() -> Self {
        Self([2.0, 5.0, 3.0, 1.0, 0.5])
    }
}

/// Blend of embedding and grass distances for the vegetation query.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct FusionParams {
    pub embedding_weight: f32,
    pub grass_weight: f32,
    /// Candidates with a smaller green ratio are left out of the ranking.
    pub min_green_ratio: f32,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            embedding_weight: 0.4,
            grass_weight: 0.6,
            min_green_ratio: 0.05,
        }
    }
}

/// Extractor parameters shared by every task of a [`crate::Registry`].
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct FeatureConfig {
    pub chroma: ChromaParams,
    pub texture: TextureParams,
    pub segments: SegmentWeights,
}
