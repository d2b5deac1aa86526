//! Content-based image retrieval.
//!
//! Images are turned into fixed-length descriptors by a [`FeatureExtractor`],
//! persisted as `filename,f1,...,fn` rows, and later ranked against a query
//! image with the [`Metric`] bound to the same task in the [`Registry`].

pub mod builder;
pub mod database;
pub mod error;
pub mod features;
pub mod metrics;
pub mod params;
pub mod query;
pub mod registry;
pub mod scan;
pub mod storage;
pub mod types;

pub use builder::{build_database, BuildReport};
pub use database::FeatureDb;
pub use error::{FeatureError, RegistryError};
pub use features::{Extractor, FeatureExtractor};
pub use metrics::{Metric, SENTINEL};
pub use params::{
    ChromaParams, FeatureConfig, FusionParams, GrassParams, GrassWeights, SegmentWeights,
    TextureParams,
};
pub use query::{
    query_embedding, query_grass, query_image, GrassQuery, GrassRanking, EMBEDDING_DIM,
};
pub use registry::{Registry, TaskId, TaskSpec};
pub use storage::{FeatureFile, FeatureWriter};
pub use types::{DatabaseRow, FeatureVector, Match, Region};
