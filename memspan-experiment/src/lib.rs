pub mod block;
pub mod config;
pub mod error;
pub mod feedback;
pub mod matrix;
pub mod participant;
pub mod results;
pub mod runner;
pub mod scene;
pub mod session;
pub mod trial;

pub use block::prepare_block;
pub use config::{ExperimentConfig, ExtraText, StimulusPool};
pub use error::{ConfigError, MatrixError, ResultsError, SessionError, TrialError};
pub use feedback::FeedbackTexts;
pub use matrix::{Border, Matrix, MatrixGeometry, MountedStimulus};
pub use participant::{ParticipantInfo, Sex};
pub use results::ResultLog;
pub use runner::{PointerState, RunnerEvent, TrialRunner};
pub use scene::{DrawCommand, Scene, SceneStyle};
pub use session::{CancelToken, Instructions, Session, SessionPhase, SessionStatus};
pub use trial::{MaskRect, Trial};
