use crate::block::BlockKind;
use crate::grid::GridSize;
use serde::Serialize;

/// Accuracy recorded when the participant selected nothing
pub const NO_ANSWER_ACCURACY: f64 = -1.0;

/// Trial state machine states, strictly in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPhase {
    Fixation,
    Study,
    Mask,
    Response,
    Feedback,
    Wait,
    Done,
}

/// Recorded result per trial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRecord {
    pub idx: usize,
    pub n: usize,
    pub size: GridSize,
    pub block_type: BlockKind,
    /// Seconds from response-grid onset to the first selection
    pub rt: Option<f64>,
    pub acc: f64,
    pub correct_answers: usize,
    pub number_of_answers: usize,
    pub answer: Vec<String>,
    pub stimulus: Vec<String>,
}

impl TrialRecord {
    pub const HEADER: [&'static str; 10] = [
        "idx",
        "n",
        "size",
        "block_type",
        "rt",
        "acc",
        "correct_answers",
        "number_of_answers",
        "answer",
        "stimulus",
    ];

    /// Flattens the record into one CSV row, in [`TrialRecord::HEADER`] order.
    /// List fields are written as JSON arrays, a missing `rt` as an empty field.
    pub fn fields(&self) -> Result<Vec<String>, serde_json::Error> {
        Ok(vec![
            self.idx.to_string(),
            self.n.to_string(),
            serde_json::to_string(&self.size)?,
            self.block_type.to_string(),
            self.rt.map(|rt| rt.to_string()).unwrap_or_default(),
            self.acc.to_string(),
            self.correct_answers.to_string(),
            self.number_of_answers.to_string(),
            serde_json::to_string(&self.answer)?,
            serde_json::to_string(&self.stimulus)?,
        ])
    }

    pub fn answered(&self) -> bool {
        self.number_of_answers > 0
    }
}
