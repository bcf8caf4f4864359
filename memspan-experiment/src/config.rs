use crate::error::ConfigError;
use memspan_core::{BlockSpec, Rgba, StimulusKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Text drawn next to the response grid for the whole response phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraText {
    pub text: String,
    pub color: Rgba,
    pub size: f32,
    pub pos: (f32, f32),
}

/// All experiment settings. Durations are in seconds; positions are pixels
/// relative to the screen centre with y pointing up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub procedure_test: bool,
    pub screen_color: Rgba,
    pub font_path: PathBuf,
    pub results_dir: PathBuf,
    pub messages_dir: PathBuf,
    pub images_dir: PathBuf,

    pub fixation_time: f64,
    pub matrix_1_time: f64,
    pub mask_time: f64,
    pub matrix_2_time: f64,
    pub wait_time: f64,
    pub wait_jitter: f64,
    pub fdbk_show_time: f64,

    pub fixation_text: String,
    pub fixation_color: Rgba,
    pub fixation_size: f32,
    pub fixation_pos: (f32, f32),

    pub stimulus_type: StimulusKind,
    pub stimulus_list: Vec<String>,
    pub stimulus_dist: f32,
    pub stimulus_size: f32,
    pub stimulus_color: Rgba,
    pub stimulus_central_pos: (f32, f32),
    pub stimulus_border_width: f32,
    pub stimulus_border_color: Rgba,

    pub extra_mask_size: f32,
    pub mask_pos: (f32, f32),
    pub mask_image: Option<PathBuf>,
    pub mask_color: Rgba,

    pub clock_image: Option<PathBuf>,
    pub clock_size: (f32, f32),
    pub clock_pos: (f32, f32),
    pub timer_color: Rgba,
    pub timer_size: f32,
    pub timer_pos: (f32, f32),
    pub extra_text_to_show: Vec<ExtraText>,

    pub text_color: Rgba,
    pub text_size: f32,

    pub fdbk_color: Rgba,
    pub fdbk_size: f32,
    pub fdbk_correctness_male: String,
    pub fdbk_correctness_female: String,
    pub fdbk_no_answer: String,
    pub fdbk_training: bool,
    pub fdbk_experiment: bool,

    pub do_training: bool,
    pub training_trials: Vec<BlockSpec>,
    pub training_randomize: bool,
    pub experiment_trials: Vec<BlockSpec>,
    pub experiment_randomize: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            procedure_test: false,
            screen_color: Rgba::rgb(128, 128, 128),
            font_path: PathBuf::from("assets/DejaVuSans.ttf"),
            results_dir: PathBuf::from("results"),
            messages_dir: PathBuf::from("messages"),
            images_dir: PathBuf::from("images"),

            fixation_time: 0.5,
            matrix_1_time: 1.0,
            mask_time: 0.5,
            matrix_2_time: 10.0,
            wait_time: 1.0,
            wait_jitter: 0.5,
            fdbk_show_time: 1.0,

            fixation_text: "+".to_owned(),
            fixation_color: Rgba::BLACK,
            fixation_size: 50.0,
            fixation_pos: (0.0, 0.0),

            stimulus_type: StimulusKind::Text,
            stimulus_list: Vec::new(),
            stimulus_dist: 120.0,
            stimulus_size: 100.0,
            stimulus_color: Rgba::BLACK,
            stimulus_central_pos: (0.0, 0.0),
            stimulus_border_width: 5.0,
            stimulus_border_color: Rgba::rgb(255, 0, 0),

            extra_mask_size: 50.0,
            mask_pos: (0.0, 0.0),
            mask_image: None,
            mask_color: Rgba::rgb(64, 64, 64),

            clock_image: None,
            clock_size: (60.0, 60.0),
            clock_pos: (-400.0, 300.0),
            timer_color: Rgba::BLACK,
            timer_size: 40.0,
            timer_pos: (-330.0, 300.0),
            extra_text_to_show: Vec::new(),

            text_color: Rgba::BLACK,
            text_size: 30.0,

            fdbk_color: Rgba::BLACK,
            fdbk_size: 40.0,
            fdbk_correctness_male: "Correct answers: {} of {}".to_owned(),
            fdbk_correctness_female: "Correct answers: {} of {}".to_owned(),
            fdbk_no_answer: "No answer".to_owned(),
            fdbk_training: true,
            fdbk_experiment: false,

            do_training: true,
            training_trials: Vec::new(),
            training_randomize: true,
            experiment_trials: Vec::new(),
            experiment_randomize: true,
        }
    }
}

impl ExperimentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ExperimentConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks everything that the trial flow relies on, once, up front.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("fixation_time", self.fixation_time),
            ("matrix_1_time", self.matrix_1_time),
            ("mask_time", self.mask_time),
            ("matrix_2_time", self.matrix_2_time),
            ("wait_time", self.wait_time),
            ("wait_jitter", self.wait_jitter),
            ("fdbk_show_time", self.fdbk_show_time),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDuration { key, value });
            }
        }

        for (key, value) in [
            ("stimulus_size", self.stimulus_size),
            ("stimulus_dist", self.stimulus_dist),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::InvalidDimension { key, value });
            }
        }

        if self.stimulus_list.is_empty() {
            return Err(ConfigError::EmptyStimulusList);
        }
        let mut seen = HashSet::with_capacity(self.stimulus_list.len());
        for s in &self.stimulus_list {
            if !seen.insert(s.as_str()) {
                return Err(ConfigError::DuplicateStimulus(s.clone()));
            }
        }

        let pool = self.stimulus_list.len();
        let blocks: [(&'static str, &[BlockSpec]); 2] = [
            ("training", &self.training_trials),
            ("experiment", &self.experiment_trials),
        ];
        for (block, specs) in blocks {
            for (index, spec) in specs.iter().enumerate() {
                let invalid = |reason: String| ConfigError::InvalidBlock {
                    block,
                    index,
                    reason,
                };
                let cells = spec.size.cells();
                if cells == 0 {
                    return Err(invalid("grid size must be at least 1x1".to_owned()));
                }
                if spec.n_elements == 0 {
                    return Err(invalid("n_elements must be at least 1".to_owned()));
                }
                if spec.n_elements > cells {
                    return Err(invalid(format!(
                        "n_elements {} exceeds the {} cells of the grid",
                        spec.n_elements, cells
                    )));
                }
                if cells > pool {
                    return Err(invalid(format!(
                        "a {cells}-cell grid needs {cells} stimuli, stimulus_list has {pool}"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Resolves `stimulus_list` into stimulus identities.
    pub fn stimulus_pool(&self) -> StimulusPool {
        let identities = match self.stimulus_type {
            StimulusKind::Image => self
                .stimulus_list
                .iter()
                .map(|name| {
                    self.images_dir
                        .join("all_png")
                        .join(name)
                        .to_string_lossy()
                        .into_owned()
                })
                .collect(),
            StimulusKind::Text => self.stimulus_list.clone(),
        };
        StimulusPool {
            kind: self.stimulus_type,
            identities,
        }
    }

    pub fn instruction_path(&self, file: &str) -> PathBuf {
        self.messages_dir.join(file)
    }
}

/// Everything a trial may draw from: image paths or literal strings
#[derive(Debug, Clone, PartialEq)]
pub struct StimulusPool {
    pub kind: StimulusKind,
    pub identities: Vec<String>,
}

pub(crate) fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use memspan_core::GridSize;

    const MINIMAL: &str = r#"
stimulus_type: text
stimulus_list: [A, B, C, D, E, F, G, H, I]
experiment_trials:
  - n_trials: 2
    n_elements: 4
    size: [3, 3]
    group_elements: false
"#;

    #[test]
    fn minimal_document_fills_defaults() {
        let config = ExperimentConfig::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(config.stimulus_list.len(), 9);
        assert_eq!(config.experiment_trials[0].size, GridSize::new(3, 3));
        assert_eq!(config.matrix_2_time, ExperimentConfig::default().matrix_2_time);
        assert!(config.training_trials.is_empty());
    }

    #[test]
    fn unknown_stimulus_type_is_fatal() {
        let doc = MINIMAL.replace("stimulus_type: text", "stimulus_type: audio");
        let err = ExperimentConfig::from_yaml_str(&doc).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn too_many_elements_is_rejected() {
        let doc = MINIMAL.replace("n_elements: 4", "n_elements: 10");
        let err = ExperimentConfig::from_yaml_str(&doc).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidBlock {
                block: "experiment",
                index: 0,
                ..
            }
        ));
    }

    #[test]
    fn grid_larger_than_pool_is_rejected() {
        let doc = MINIMAL.replace("size: [3, 3]", "size: [4, 4]");
        assert!(matches!(
            ExperimentConfig::from_yaml_str(&doc),
            Err(ConfigError::InvalidBlock { .. })
        ));
    }

    #[test]
    fn negative_duration_is_rejected() {
        let doc = format!("{MINIMAL}wait_jitter: -0.5\n");
        assert!(matches!(
            ExperimentConfig::from_yaml_str(&doc),
            Err(ConfigError::InvalidDuration {
                key: "wait_jitter",
                ..
            })
        ));
    }

    #[test]
    fn duplicate_stimuli_are_rejected() {
        let doc = MINIMAL.replace("[A, B, C", "[A, A, C");
        assert!(matches!(
            ExperimentConfig::from_yaml_str(&doc),
            Err(ConfigError::DuplicateStimulus(s)) if s == "A"
        ));
    }

    #[test]
    fn image_pool_resolves_paths() {
        let mut config = ExperimentConfig::from_yaml_str(MINIMAL).unwrap();
        config.stimulus_type = StimulusKind::Image;
        config.stimulus_list = vec!["cat.png".into()];
        let pool = config.stimulus_pool();
        assert_eq!(pool.kind, StimulusKind::Image);
        let expected = Path::new("images").join("all_png").join("cat.png");
        assert_eq!(pool.identities, vec![expected.to_string_lossy().into_owned()]);
    }

    #[test]
    fn colors_parse_from_hex() {
        let doc = format!("{MINIMAL}stimulus_border_color: \"#00ff00\"\n");
        let config = ExperimentConfig::from_yaml_str(&doc).unwrap();
        assert_eq!(config.stimulus_border_color, Rgba::rgb(0, 255, 0));
    }
}
