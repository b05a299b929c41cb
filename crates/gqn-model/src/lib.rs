pub mod config;
pub mod generator;
pub mod model;
pub mod representation;
pub mod snapshot;

pub use config::HyperParameters;
pub use model::{Gqn, SceneModel};
