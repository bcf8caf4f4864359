use crate::block::prepare_block;
use crate::config::{ExperimentConfig, StimulusPool};
use crate::error::{ConfigError, ResultsError, SessionError};
use crate::feedback::FeedbackTexts;
use crate::participant::ParticipantInfo;
use crate::results::ResultLog;
use crate::runner::{PointerState, RunnerEvent, TrialRunner};
use crate::scene::{Scene, SceneStyle};
use crate::trial::Trial;
use memspan_core::{BlockKind, TrialDescriptor, TrialPhase, TrialRecord};
use memspan_timing::{FrameStats, Timer};
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Cooperative stop signal, checked once per frame
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Instruction screens, shown verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instructions {
    pub training: String,
    pub experiment: String,
    pub end: String,
}

impl Instructions {
    pub fn load(config: &ExperimentConfig) -> Result<Self, ConfigError> {
        let read = |file: &str| {
            let path = config.instruction_path(file);
            std::fs::read_to_string(&path).map_err(|source| ConfigError::Io { path, source })
        };
        Ok(Self {
            training: read("instruction_training.txt")?,
            experiment: read("instruction_experiment.txt")?,
            end: read("end.txt")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    TrainingInstructions,
    Training,
    ExperimentInstructions,
    Experiment,
    End,
    Finished,
}

impl SessionPhase {
    pub fn next(&self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            TrainingInstructions => Training,
            Training => ExperimentInstructions,
            ExperimentInstructions => Experiment,
            Experiment => End,
            End => Finished,
            Finished => return None,
        })
    }

    pub fn block(&self) -> Option<BlockKind> {
        match self {
            SessionPhase::Training => Some(BlockKind::Training),
            SessionPhase::Experiment => Some(BlockKind::Experiment),
            _ => None,
        }
    }

    /// Screens that wait for a key press
    pub fn awaits_key(&self) -> bool {
        matches!(
            self,
            SessionPhase::TrainingInstructions | SessionPhase::ExperimentInstructions | SessionPhase::End
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Finished,
    Cancelled,
}

/// Drives the whole run: instruction screens, the training block, the
/// experiment block and the end screen, one trial at a time.
pub struct Session<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    config: ExperimentConfig,
    pool: StimulusPool,
    style: SceneStyle,
    instructions: Instructions,
    feedback_texts: FeedbackTexts,
    participant: ParticipantInfo,
    pub timer: T,
    rng: R,
    cancel: CancelToken,
    phase: SessionPhase,
    training: Vec<TrialDescriptor>,
    experiment: Vec<TrialDescriptor>,
    trial_index: usize,
    current: Option<TrialRunner>,
    results: ResultLog,
    cursor_warp: Option<(f32, f32)>,
}

impl<T, R> Session<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub fn new(
        config: ExperimentConfig,
        participant: ParticipantInfo,
        instructions: Instructions,
        timer: T,
        mut rng: R,
        results: ResultLog,
    ) -> Self {
        let pool = config.stimulus_pool();
        let style = SceneStyle::from_config(&config);
        let feedback_texts = FeedbackTexts::for_participant(&config, participant.sex);

        let experiment = prepare_block(
            &config.experiment_trials,
            config.experiment_randomize,
            &mut rng,
        );
        let (training, phase) = if config.do_training {
            let training =
                prepare_block(&config.training_trials, config.training_randomize, &mut rng);
            (training, SessionPhase::TrainingInstructions)
        } else {
            (Vec::new(), SessionPhase::ExperimentInstructions)
        };

        info!(
            participant = %participant.participant_id(),
            training_trials = training.len(),
            experiment_trials = experiment.len(),
            "session prepared"
        );

        Self {
            config,
            pool,
            style,
            instructions,
            feedback_texts,
            participant,
            timer,
            rng,
            cancel: CancelToken::new(),
            phase,
            training,
            experiment,
            trial_index: 0,
            current: None,
            results,
            cursor_warp: None,
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn participant(&self) -> &ParticipantInfo {
        &self.participant
    }

    pub fn trial_lists(&self) -> (&[TrialDescriptor], &[TrialDescriptor]) {
        (&self.training, &self.experiment)
    }

    pub fn current_trial(&self) -> Option<&TrialRunner> {
        self.current.as_ref()
    }

    pub fn results(&self) -> &[TrialRecord] {
        self.results.records()
    }

    /// Key press on an instruction or end screen. Returns whether the phase changed.
    pub fn advance(&mut self) -> bool {
        if !self.phase.awaits_key() {
            return false;
        }
        self.enter_next_phase();
        true
    }

    fn enter_next_phase(&mut self) {
        if let Some(next) = self.phase.next() {
            info!(from = ?self.phase, to = ?next, "session phase");
            self.phase = next;
            self.trial_index = 0;
            self.current = None;
        }
    }

    /// One frame of work. Checks the cancel token first.
    pub fn update(&mut self, pointer: PointerState) -> Result<SessionStatus, SessionError> {
        if self.cancel.is_cancelled() {
            return Ok(SessionStatus::Cancelled);
        }
        if let Some(block) = self.phase.block() {
            self.step_block(block, pointer)?;
        }
        Ok(match self.phase {
            SessionPhase::Finished => SessionStatus::Finished,
            _ => SessionStatus::Running,
        })
    }

    fn step_block(&mut self, block: BlockKind, pointer: PointerState) -> Result<(), SessionError> {
        if self.current.is_none() {
            let list = match block {
                BlockKind::Training => &self.training,
                BlockKind::Experiment => &self.experiment,
            };
            let Some(&descriptor) = list.get(self.trial_index) else {
                info!(block = %block, trials = list.len(), "block finished");
                self.enter_next_phase();
                return Ok(());
            };

            let trial = Trial::sample(&self.config, descriptor, &self.pool, &mut self.rng)?;
            let show_feedback = match block {
                BlockKind::Training => self.config.fdbk_training,
                BlockKind::Experiment => self.config.fdbk_experiment,
            };
            debug!(block = %block, idx = self.trial_index, n = descriptor.n, "trial start");
            self.current = Some(TrialRunner::new(
                self.trial_index,
                block,
                trial,
                &self.config,
                show_feedback,
                self.feedback_texts.clone(),
                &mut self.rng,
            ));
        }

        let now = self.timer.now();
        if let Some(runner) = self.current.as_mut() {
            for event in runner.update(now, pointer) {
                match event {
                    RunnerEvent::Recorded(record) => self.results.push(record),
                    RunnerEvent::ResponseOpened { cursor } => self.cursor_warp = Some(cursor),
                    RunnerEvent::Selected { identity } => debug!(%identity, "selected"),
                    RunnerEvent::PhaseChanged(_) => {}
                }
            }
            if runner.is_done() {
                self.current = None;
                self.trial_index += 1;
            }
        }
        Ok(())
    }

    /// What to show this frame
    pub fn scene(&self) -> Scene {
        let mut scene = Scene::new(self.style.background);
        match self.phase {
            SessionPhase::TrainingInstructions => {
                self.style.instructions(&mut scene, &self.instructions.training)
            }
            SessionPhase::ExperimentInstructions => {
                self.style.instructions(&mut scene, &self.instructions.experiment)
            }
            SessionPhase::End => self.style.instructions(&mut scene, &self.instructions.end),
            SessionPhase::Training | SessionPhase::Experiment => {
                if let Some(runner) = &self.current {
                    runner.draw(self.timer.now(), &self.style, &mut scene);
                }
            }
            SessionPhase::Finished => {}
        }
        scene
    }

    /// The cursor is only shown while the response grid is up.
    pub fn cursor_visible(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|r| r.phase() == TrialPhase::Response)
    }

    /// Pending request to move the cursor, consumed by the caller
    pub fn take_cursor_warp(&mut self) -> Option<(f32, f32)> {
        self.cursor_warp.take()
    }

    pub fn record_frame(&mut self, d: std::time::Duration) {
        self.timer.record_frame(d);
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.timer.frame_stats()
    }

    /// Writes the result file now instead of at drop.
    pub fn finish(&mut self) -> Result<Option<PathBuf>, ResultsError> {
        self.results.flush()
    }
}
