pub mod resolver;
pub mod types;

pub use resolver::{
    aggregate_similar,
    ScoreAccumulator,
    SimilarityResolver,
};
pub use types::{
    SimilarityDb,
    SimilarityEntry,
    SimilaritySource,
};
