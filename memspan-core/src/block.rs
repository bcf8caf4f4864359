use crate::grid::GridSize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which block a trial belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Training,
    Experiment,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Training => "training",
            BlockKind::Experiment => "experiment",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of `training_trials` / `experiment_trials`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSpec {
    pub n_trials: usize,
    pub n_elements: usize,
    pub size: GridSize,
    #[serde(default)]
    pub group_elements: bool,
}

impl BlockSpec {
    pub fn descriptor(&self) -> TrialDescriptor {
        TrialDescriptor {
            n: self.n_elements,
            size: self.size,
            group_elements: self.group_elements,
        }
    }
}

/// What a single trial needs to know about its condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TrialDescriptor {
    pub n: usize,
    pub size: GridSize,
    pub group_elements: bool,
}
