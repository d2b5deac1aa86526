/// Reasons a feature extractor can refuse an image.
///
/// Callers building or querying a database treat every variant as
/// "not computed": the image is skipped and counted, never fatal for a batch.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatureError {
    /// The image has no pixels.
    #[error("image is empty")]
    EmptyImage,

    /// The image layout is neither gray nor RGB.
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(u8),

    /// The image cannot hold the patch the extractor needs.
    #[error("image {width}x{height} is too small for a {patch}x{patch} patch")]
    TooSmall { width: u32, height: u32, patch: u32 },

    /// The requested region does not overlap the image.
    #[error("region lies outside the image")]
    EmptyRegion,

    /// A histogram was configured with zero bins.
    #[error("invalid histogram bin count: {0}")]
    InvalidBins(usize),
}

/// Errors raised while resolving a task.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown task id: {0}")]
    UnknownTask(i64),

    #[error("task id is not an integer: {0:?}")]
    InvalidTask(String),
}
