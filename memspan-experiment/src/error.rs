use std::path::PathBuf;
use thiserror::Error;

/// Problems found while loading or validating the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("stimulus_list is empty")]
    EmptyStimulusList,

    #[error("stimulus `{0}` appears more than once in stimulus_list")]
    DuplicateStimulus(String),

    #[error("{block} block entry {index}: {reason}")]
    InvalidBlock {
        block: &'static str,
        index: usize,
        reason: String,
    },

    #[error("`{key}` must be a finite, non-negative number of seconds, got {value}")]
    InvalidDuration { key: &'static str, value: f64 },

    #[error("`{key}` must be positive, got {value}")]
    InvalidDimension { key: &'static str, value: f32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    #[error("matrix with {cells} cells cannot hold {n} elements")]
    TooManyElements { n: usize, cells: usize },

    #[error("matrix needs at least one element")]
    Empty,

    #[error("matrix was already prepared to draw")]
    AlreadyPrepared,

    #[error("expected {expected} stimuli, got {got}")]
    WrongStimulusCount { expected: usize, got: usize },

    #[error("stimulus `{0}` assigned twice")]
    DuplicateIdentity(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrialError {
    #[error("stimulus pool has {available} entries, a {needed}-cell grid needs more")]
    PoolTooSmall { needed: usize, available: usize },

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("cannot write results to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("cannot encode field: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Trial(#[from] TrialError),

    #[error(transparent)]
    Results(#[from] ResultsError),
}
