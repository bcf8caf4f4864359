pub mod block;
pub mod color;
pub mod grid;
pub mod scoring;
pub mod stimulus;
pub mod trial;

pub use block::{BlockKind, BlockSpec, TrialDescriptor};
pub use color::Rgba;
pub use grid::GridSize;
pub use scoring::{Score, score};
pub use stimulus::{StimulusContent, StimulusKind};
pub use trial::{NO_ANSWER_ACCURACY, TrialPhase, TrialRecord};
