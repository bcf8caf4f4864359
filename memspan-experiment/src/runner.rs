use crate::config::{ExperimentConfig, secs};
use crate::feedback::FeedbackTexts;
use crate::scene::{Scene, SceneStyle};
use crate::trial::Trial;
use memspan_core::{BlockKind, TrialPhase, TrialRecord, score};
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Cursor position (screen-centred, y up) and left-button state for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub pos: (f32, f32),
    pub pressed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunnerEvent {
    PhaseChanged(TrialPhase),
    /// The response grid is up; the cursor should be placed at this point
    ResponseOpened { cursor: (f32, f32) },
    Selected { identity: String },
    Recorded(TrialRecord),
}

#[derive(Debug, Clone)]
struct PhaseDurations {
    fixation: Duration,
    study: Duration,
    mask: Duration,
    response: Duration,
    feedback: Option<Duration>,
    wait: Duration,
}

/// Runs one trial frame by frame:
/// `Fixation -> Study -> Mask -> Response -> Feedback? -> Wait -> Done`.
pub struct TrialRunner {
    idx: usize,
    block: BlockKind,
    trial: Trial,
    durations: PhaseDurations,
    cursor_home: (f32, f32),
    feedback_texts: FeedbackTexts,
    phase: TrialPhase,
    phase_start: Option<u64>,
    /// Set when the response grid has been queued but not yet presented
    onset_pending: bool,
    hovered: Option<usize>,
    answer: Vec<String>,
    rt: Option<f64>,
    last_rt: Option<f64>,
    feedback_message: Option<String>,
    recorded: bool,
}

impl TrialRunner {
    /// The jittered inter-trial wait is drawn here, once per trial.
    pub fn new<R: Rng + ?Sized>(
        idx: usize,
        block: BlockKind,
        trial: Trial,
        config: &ExperimentConfig,
        show_feedback: bool,
        feedback_texts: FeedbackTexts,
        rng: &mut R,
    ) -> Self {
        let jitter: f64 = rng.random::<f64>() * config.wait_jitter;
        let durations = PhaseDurations {
            fixation: secs(config.fixation_time),
            study: secs(config.matrix_1_time),
            mask: secs(config.mask_time),
            response: secs(config.matrix_2_time),
            feedback: show_feedback.then(|| secs(config.fdbk_show_time)),
            wait: secs(config.wait_time + jitter),
        };

        Self {
            idx,
            block,
            trial,
            durations,
            cursor_home: config.stimulus_central_pos,
            feedback_texts,
            phase: TrialPhase::Fixation,
            phase_start: None,
            onset_pending: false,
            hovered: None,
            answer: Vec::new(),
            rt: None,
            last_rt: None,
            feedback_message: None,
            recorded: false,
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == TrialPhase::Done
    }

    pub fn trial(&self) -> &Trial {
        &self.trial
    }

    pub fn answer(&self) -> &[String] {
        &self.answer
    }

    pub fn wait_duration(&self) -> Duration {
        self.durations.wait
    }

    /// Advances the state machine to `now` (nanoseconds on the session clock).
    ///
    /// Callers present the current scene before each update. The response
    /// clock therefore starts on the update after the one that opened the
    /// grid, which is the first one with the grid on screen.
    pub fn update(&mut self, now: u64, pointer: PointerState) -> Vec<RunnerEvent> {
        let mut events = Vec::new();

        let Some(mut start) = self.phase_start else {
            let first = if self.durations.fixation.is_zero() {
                TrialPhase::Study
            } else {
                TrialPhase::Fixation
            };
            self.enter(first, now, &mut events);
            return events;
        };
        if std::mem::take(&mut self.onset_pending) {
            start = now;
            self.phase_start = Some(now);
        }
        let elapsed = Duration::from_nanos(now.saturating_sub(start));

        match self.phase {
            TrialPhase::Fixation => {
                if elapsed >= self.durations.fixation {
                    self.enter(TrialPhase::Study, now, &mut events);
                }
            }
            TrialPhase::Study => {
                if elapsed >= self.durations.study {
                    self.enter(TrialPhase::Mask, now, &mut events);
                }
            }
            TrialPhase::Mask => {
                if elapsed >= self.durations.mask {
                    self.enter(TrialPhase::Response, now, &mut events);
                }
            }
            TrialPhase::Response => {
                if elapsed < self.durations.response {
                    self.poll_response(elapsed, pointer, &mut events);
                }
                if elapsed >= self.durations.response || self.answer.len() >= self.trial.study.n() {
                    self.finish_response(&mut events);
                    let next = if self.durations.feedback.is_some() {
                        TrialPhase::Feedback
                    } else {
                        TrialPhase::Wait
                    };
                    self.enter(next, now, &mut events);
                }
            }
            TrialPhase::Feedback => {
                if elapsed >= self.durations.feedback.unwrap_or_default() {
                    self.enter(TrialPhase::Wait, now, &mut events);
                }
            }
            TrialPhase::Wait => {
                if elapsed >= self.durations.wait {
                    self.enter(TrialPhase::Done, now, &mut events);
                }
            }
            TrialPhase::Done => {}
        }

        events
    }

    fn enter(&mut self, phase: TrialPhase, now: u64, events: &mut Vec<RunnerEvent>) {
        self.phase = phase;
        self.phase_start = Some(now);
        events.push(RunnerEvent::PhaseChanged(phase));
        if phase == TrialPhase::Response {
            self.onset_pending = true;
            events.push(RunnerEvent::ResponseOpened {
                cursor: self.cursor_home,
            });
        }
    }

    fn poll_response(
        &mut self,
        elapsed: Duration,
        pointer: PointerState,
        events: &mut Vec<RunnerEvent>,
    ) {
        let size = self.trial.response.geometry().stimulus_size;
        let target = self.trial.study.n();
        self.hovered = None;

        for (i, stim) in self.trial.response.stimuli_mut().iter_mut().enumerate() {
            if !stim.contains(pointer.pos, size) {
                continue;
            }
            if pointer.pressed && !stim.selected && self.answer.len() < target {
                stim.selected = true;
                self.answer.push(stim.identity.clone());
                let t = elapsed.as_secs_f64();
                if self.rt.is_none() {
                    self.rt = Some(t);
                }
                self.last_rt = Some(t);
                events.push(RunnerEvent::Selected {
                    identity: stim.identity.clone(),
                });
            } else {
                self.hovered = Some(i);
            }
        }
    }

    fn finish_response(&mut self, events: &mut Vec<RunnerEvent>) {
        if self.recorded {
            return;
        }
        self.recorded = true;
        self.hovered = None;

        let study = &self.trial.study;
        let targets = study.identities();
        let n = study.n();
        let score = score(&targets, &self.answer, n);

        let record = TrialRecord {
            idx: self.idx,
            n,
            size: study.size(),
            block_type: self.block,
            rt: self.rt,
            acc: score.accuracy,
            correct_answers: score.correct,
            number_of_answers: self.answer.len(),
            answer: self.answer.clone(),
            stimulus: targets,
        };
        debug!(
            idx = record.idx,
            block = %record.block_type,
            acc = record.acc,
            rt = ?record.rt,
            last_rt = ?self.last_rt,
            "trial recorded"
        );

        let correct = record.answered().then_some(score.correct);
        self.feedback_message = Some(self.feedback_texts.message(correct, n));
        events.push(RunnerEvent::Recorded(record));
    }

    /// What the current phase shows. `now` drives the countdown overlay.
    pub fn draw(&self, now: u64, style: &SceneStyle, scene: &mut Scene) {
        match self.phase {
            TrialPhase::Fixation => style.fixation(scene),
            TrialPhase::Study => style.matrix(scene, &self.trial.study, None),
            TrialPhase::Mask => style.mask(scene, &self.trial.mask),
            TrialPhase::Response => {
                let elapsed = self
                    .phase_start
                    .filter(|_| !self.onset_pending)
                    .map(|s| Duration::from_nanos(now.saturating_sub(s)))
                    .unwrap_or_default();
                let remaining = self.durations.response.saturating_sub(elapsed);
                style.response_overlay(scene, remaining.as_secs_f64());
                style.matrix(scene, &self.trial.response, self.hovered);
            }
            TrialPhase::Feedback => {
                if let Some(message) = &self.feedback_message {
                    style.feedback(scene, message);
                }
            }
            TrialPhase::Wait | TrialPhase::Done => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StimulusPool;
    use crate::participant::Sex;
    use memspan_core::{GridSize, NO_ANSWER_ACCURACY, StimulusKind, TrialDescriptor};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const MS: u64 = 1_000_000;

    fn config() -> ExperimentConfig {
        ExperimentConfig {
            fixation_time: 0.5,
            matrix_1_time: 1.0,
            mask_time: 0.5,
            matrix_2_time: 5.0,
            wait_time: 1.0,
            wait_jitter: 0.0,
            fdbk_show_time: 1.0,
            stimulus_dist: 100.0,
            stimulus_size: 80.0,
            ..ExperimentConfig::default()
        }
    }

    fn runner(config: &ExperimentConfig, show_feedback: bool) -> TrialRunner {
        let mut rng = StdRng::seed_from_u64(21);
        let pool = StimulusPool {
            kind: StimulusKind::Text,
            identities: "ABCDEFGHIJKL".chars().map(String::from).collect(),
        };
        let descriptor = TrialDescriptor {
            n: 2,
            size: GridSize::new(2, 2),
            group_elements: false,
        };
        let trial = Trial::sample(config, descriptor, &pool, &mut rng).unwrap();
        let texts = FeedbackTexts::for_participant(config, Sex::Male);
        TrialRunner::new(4, BlockKind::Training, trial, config, show_feedback, texts, &mut rng)
    }

    fn idle() -> PointerState {
        PointerState::default()
    }

    /// Steps through fixation, study and mask, then one update with the grid
    /// on screen; returns the response clock's zero.
    fn open_response(r: &mut TrialRunner) -> u64 {
        r.update(0, idle());
        assert_eq!(r.phase(), TrialPhase::Fixation);
        r.update(500 * MS, idle());
        assert_eq!(r.phase(), TrialPhase::Study);
        r.update(1500 * MS, idle());
        assert_eq!(r.phase(), TrialPhase::Mask);
        let events = r.update(2000 * MS, idle());
        assert_eq!(r.phase(), TrialPhase::Response);
        assert!(events.contains(&RunnerEvent::ResponseOpened { cursor: (0.0, 0.0) }));
        r.update(2016 * MS, idle());
        2016 * MS
    }

    fn click(pos: (f32, f32)) -> PointerState {
        PointerState { pos, pressed: true }
    }

    fn target_positions(r: &TrialRunner) -> Vec<(f32, f32)> {
        let targets = r.trial().study.identities();
        r.trial()
            .response
            .stimuli()
            .iter()
            .filter(|s| targets.contains(&s.identity))
            .map(|s| s.pos)
            .collect()
    }

    fn recorded(events: &[RunnerEvent]) -> Option<TrialRecord> {
        events.iter().find_map(|e| match e {
            RunnerEvent::Recorded(r) => Some(r.clone()),
            _ => None,
        })
    }

    #[test]
    fn phases_run_in_order_with_feedback() {
        let config = config();
        let mut r = runner(&config, true);
        let t0 = open_response(&mut r);

        let events = r.update(t0 + 5000 * MS, idle());
        assert!(recorded(&events).is_some());
        assert_eq!(r.phase(), TrialPhase::Feedback);

        r.update(t0 + 6000 * MS, idle());
        assert_eq!(r.phase(), TrialPhase::Wait);
        r.update(t0 + 6999 * MS, idle());
        assert_eq!(r.phase(), TrialPhase::Wait);
        r.update(t0 + 7000 * MS, idle());
        assert!(r.is_done());
    }

    #[test]
    fn zero_fixation_starts_with_study() {
        let config = ExperimentConfig {
            fixation_time: 0.0,
            ..config()
        };
        let mut r = runner(&config, false);
        r.update(0, idle());
        assert_eq!(r.phase(), TrialPhase::Study);
    }

    #[test]
    fn timeout_without_answers_records_sentinel() {
        let config = config();
        let mut r = runner(&config, false);
        let t0 = open_response(&mut r);

        assert!(recorded(&r.update(t0 + 4999 * MS, idle())).is_none());
        let record = recorded(&r.update(t0 + 5000 * MS, idle())).unwrap();
        assert_eq!(record.acc, NO_ANSWER_ACCURACY);
        assert_eq!(record.rt, None);
        assert_eq!(record.number_of_answers, 0);
        assert_eq!(record.idx, 4);
        assert_eq!(record.block_type, BlockKind::Training);
        assert_eq!(r.phase(), TrialPhase::Wait);
    }

    #[test]
    fn early_exit_after_n_selections() {
        let config = config();
        let mut r = runner(&config, false);
        let t0 = open_response(&mut r);
        let targets = target_positions(&r);
        assert_eq!(targets.len(), 2);

        let events = r.update(t0 + 700 * MS, click(targets[0]));
        assert!(matches!(events.as_slice(), [RunnerEvent::Selected { .. }]));
        // button still held on the same cell: no second selection
        r.update(t0 + 800 * MS, click(targets[0]));
        assert_eq!(r.answer().len(), 1);

        let events = r.update(t0 + 1200 * MS, click(targets[1]));
        let record = recorded(&events).expect("loop exits once n targets are selected");
        assert_eq!(record.number_of_answers, 2);
        assert_eq!(record.correct_answers, 2);
        assert_eq!(record.acc, 1.0);
        assert!((record.rt.unwrap() - 0.7).abs() < 1e-9);
        assert_eq!(record.n, r.trial().study.n());
        assert_eq!(record.size, r.trial().study.size());
        assert_eq!(r.phase(), TrialPhase::Wait);
    }

    #[test]
    fn response_clock_starts_when_grid_is_first_shown() {
        let config = config();
        let style = SceneStyle::from_config(&config);
        let mut r = runner(&config, false);
        r.update(0, idle());
        r.update(500 * MS, idle());
        r.update(1500 * MS, idle());
        r.update(2000 * MS, idle());
        assert_eq!(r.phase(), TrialPhase::Response);

        // the frame presented after the mask ends carries the full countdown
        let mut scene = Scene::new(style.background);
        r.draw(2016 * MS, &style, &mut scene);
        assert!(scene.texts().any(|t| t == "5"));

        let targets = target_positions(&r);
        r.update(2016 * MS, click(targets[0]));
        assert_eq!(r.answer().len(), 1);
        let record = recorded(&r.update(2500 * MS, click(targets[1]))).unwrap();
        assert_eq!(record.rt, Some(0.0));
        assert_eq!(r.phase(), TrialPhase::Wait);
    }

    #[test]
    fn hover_draws_a_transient_border() {
        let config = config();
        let style = SceneStyle::from_config(&config);
        let mut r = runner(&config, false);
        let t0 = open_response(&mut r);
        let pos = r.trial().response.stimuli()[0].pos;

        r.update(t0 + 100 * MS, PointerState { pos, pressed: false });
        let mut scene = Scene::new(style.background);
        r.draw(t0 + 100 * MS, &style, &mut scene);
        assert_eq!(scene.borders(), 1);
        assert_eq!(r.answer().len(), 0);

        r.update(t0 + 200 * MS, PointerState::default());
        let mut scene = Scene::new(style.background);
        r.draw(t0 + 200 * MS, &style, &mut scene);
        assert_eq!(scene.borders(), 0);
    }

    #[test]
    fn feedback_reports_counts() {
        let config = ExperimentConfig {
            fdbk_correctness_male: "{} / {}".into(),
            ..config()
        };
        let style = SceneStyle::from_config(&config);
        let mut r = runner(&config, true);
        let t0 = open_response(&mut r);
        let targets = target_positions(&r);

        r.update(t0 + 100 * MS, click(targets[0]));
        r.update(t0 + 5000 * MS, idle());
        assert_eq!(r.phase(), TrialPhase::Feedback);

        let mut scene = Scene::new(style.background);
        r.draw(t0 + 5000 * MS, &style, &mut scene);
        assert_eq!(scene.texts().collect::<Vec<_>>(), vec!["1 / 2"]);
    }

    #[test]
    fn mask_replaces_study_display() {
        let config = config();
        let style = SceneStyle::from_config(&config);
        let mut r = runner(&config, false);
        r.update(0, idle());
        r.update(500 * MS, idle());

        let mut study = Scene::new(style.background);
        r.draw(500 * MS, &style, &mut study);
        assert_eq!(study.commands.len(), 2);

        r.update(1500 * MS, idle());
        let mut mask = Scene::new(style.background);
        r.draw(1500 * MS, &style, &mut mask);
        assert_eq!(mask.commands.len(), 1);
        assert!(mask.texts().next().is_none());
    }

    #[test]
    fn wait_includes_jitter() {
        let config = ExperimentConfig {
            wait_time: 1.0,
            wait_jitter: 0.5,
            ..config()
        };
        let waits: Vec<Duration> = (0..10)
            .map(|seed| {
                let trial = runner(&config, false).trial;
                let texts = FeedbackTexts::for_participant(&config, Sex::Male);
                let mut rng = StdRng::seed_from_u64(seed);
                TrialRunner::new(0, BlockKind::Experiment, trial, &config, false, texts, &mut rng)
                    .wait_duration()
            })
            .collect();

        for wait in &waits {
            assert!(*wait >= Duration::from_secs(1) && *wait < Duration::from_millis(1500));
        }
        assert!(waits.iter().any(|w| *w > Duration::from_secs(1)));
        assert!(waits.iter().any(|w| *w != waits[0]));
    }
}
