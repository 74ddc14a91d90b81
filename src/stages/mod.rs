//! Pipeline stages, run strictly in order:
//! preprocess -> visualize -> train -> evaluate.

pub mod evaluate;
pub mod preprocess;
pub mod train;
pub mod visualize;

pub use evaluate::FamilyResult;
pub use train::{ModelRegistry, TrainedEntry};
