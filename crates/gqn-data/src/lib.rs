pub mod dataset;
pub mod iterator;

pub use dataset::{Dataset, SceneBatch, Subset};
pub use iterator::BatchIterator;
