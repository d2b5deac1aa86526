use std::fmt;
use std::str::FromStr;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, RegistryError};
use crate::features::{
    CenterPatch, ChromaHistogram, ColorTexture, Extractor, FeatureExtractor, MultiRegionHistogram,
};
use crate::metrics::{Metric, TextureLayout};
use crate::params::FeatureConfig;
use crate::types::FeatureVector;

/// Identifier of a registered retrieval task.
#[repr(u8)]
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum TaskId {
    /// Center patch compared with sum of squared differences.
    CenterPatch = 1,
    /// Chromaticity histogram compared with histogram intersection.
    Chromaticity = 2,
    /// Whole + center histograms compared with the two-segment distance.
    MultiRegion = 3,
    /// Color and texture histograms compared with the composite distance.
    ColorTexture = 4,
}

impl TaskId {
    pub const ALL: [TaskId; 4] = [
        TaskId::CenterPatch,
        TaskId::Chromaticity,
        TaskId::MultiRegion,
        TaskId::ColorTexture,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i64> for TaskId {
    type Error = RegistryError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        TaskId::ALL
            .into_iter()
            .find(|t| t.id() as i64 == value)
            .ok_or(RegistryError::UnknownTask(value))
    }
}

impl FromStr for TaskId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|_| RegistryError::InvalidTask(s.to_string()))?;
        TaskId::try_from(value)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// An extractor bound to the metric that understands its vectors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TaskSpec {
    pub task: TaskId,
    pub extractor: Extractor,
    pub metric: Metric,
}

impl TaskSpec {
    pub fn extract(&self, image: &DynamicImage) -> Result<FeatureVector, FeatureError> {
        self.extractor.extract(image)
    }

    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        self.metric.distance(a, b)
    }

    /// Length of the vectors this task produces and compares.
    pub fn dim(&self) -> usize {
        self.extractor.dim()
    }
}

/// Resolves task ids into [`TaskSpec`]s built from one [`FeatureConfig`].
///
/// Every binding derives its extractor and metric from the same parameters,
/// so the vector layout a metric expects is the one its extractor emits.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Registry {
    config: FeatureConfig,
}

impl Registry {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn spec(&self, task: TaskId) -> TaskSpec {
        let FeatureConfig {
            chroma,
            texture,
            segments,
        } = self.config;
        let (extractor, metric) = match task {
            TaskId::CenterPatch => (Extractor::CenterPatch(CenterPatch), Metric::Ssd),
            TaskId::Chromaticity => (
                Extractor::Chroma(ChromaHistogram::new(chroma)),
                Metric::Intersection,
            ),
            TaskId::MultiRegion => (
                Extractor::MultiRegion(MultiRegionHistogram::new(chroma)),
                Metric::TwoSegment(segments),
            ),
            TaskId::ColorTexture => (
                Extractor::ColorTexture(ColorTexture::new(chroma, texture)),
                Metric::ColorTexture(TextureLayout::new(&chroma, &texture)),
            ),
        };
        TaskSpec {
            task,
            extractor,
            metric,
        }
    }

    /// Look up a raw task id.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownTask`] for ids outside the registered set.
    pub fn get(&self, id: i64) -> Result<TaskSpec, RegistryError> {
        Ok(self.spec(TaskId::try_from(id)?))
    }
}
