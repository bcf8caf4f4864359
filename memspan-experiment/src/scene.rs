use crate::config::{ExperimentConfig, ExtraText};
use crate::matrix::Matrix;
use crate::trial::MaskRect;
use memspan_core::{Rgba, StimulusContent};
use std::path::PathBuf;

/// Drawing primitive. Positions are centres in screen-centred, y-up pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Text {
        text: String,
        pos: (f32, f32),
        size: f32,
        color: Rgba,
    },
    Image {
        path: PathBuf,
        pos: (f32, f32),
        size: (f32, f32),
    },
    Rect {
        pos: (f32, f32),
        size: (f32, f32),
        color: Rgba,
    },
    Border {
        pos: (f32, f32),
        size: (f32, f32),
        width: f32,
        color: Rgba,
    },
}

/// Everything visible on one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub background: Rgba,
    pub commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new(background: Rgba) -> Self {
        Self {
            background,
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn borders(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Border { .. }))
            .count()
    }
}

/// Shared visual assets, built once from the configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SceneStyle {
    pub background: Rgba,
    pub fixation: DrawCommand,
    pub stimulus_size: f32,
    pub stimulus_color: Rgba,
    pub mask_image: Option<PathBuf>,
    pub mask_color: Rgba,
    pub clock: Option<DrawCommand>,
    pub timer_pos: (f32, f32),
    pub timer_size: f32,
    pub timer_color: Rgba,
    pub extra_text: Vec<DrawCommand>,
    pub text_size: f32,
    pub text_color: Rgba,
    pub feedback_size: f32,
    pub feedback_color: Rgba,
}

impl SceneStyle {
    pub fn from_config(config: &ExperimentConfig) -> Self {
        let clock = config.clock_image.as_ref().map(|path| DrawCommand::Image {
            path: path.clone(),
            pos: config.clock_pos,
            size: config.clock_size,
        });
        let extra_text = config
            .extra_text_to_show
            .iter()
            .map(|ExtraText { text, color, size, pos }| DrawCommand::Text {
                text: text.clone(),
                pos: *pos,
                size: *size,
                color: *color,
            })
            .collect();

        Self {
            background: config.screen_color,
            fixation: DrawCommand::Text {
                text: config.fixation_text.clone(),
                pos: config.fixation_pos,
                size: config.fixation_size,
                color: config.fixation_color,
            },
            stimulus_size: config.stimulus_size,
            stimulus_color: config.stimulus_color,
            mask_image: config.mask_image.clone(),
            mask_color: config.mask_color,
            clock,
            timer_pos: config.timer_pos,
            timer_size: config.timer_size,
            timer_color: config.timer_color,
            extra_text,
            text_size: config.text_size,
            text_color: config.text_color,
            feedback_size: config.fdbk_size,
            feedback_color: config.fdbk_color,
        }
    }

    pub fn fixation(&self, scene: &mut Scene) {
        scene.push(self.fixation.clone());
    }

    /// Draws every mounted stimulus, a persistent border on selected ones and
    /// a transient border on the hovered one.
    pub fn matrix(&self, scene: &mut Scene, matrix: &Matrix, hovered: Option<usize>) {
        let size = self.stimulus_size;
        let border = matrix.border();
        for (i, stim) in matrix.stimuli().iter().enumerate() {
            scene.push(match &stim.content {
                StimulusContent::Image(path) => DrawCommand::Image {
                    path: path.clone(),
                    pos: stim.pos,
                    size: (size, size),
                },
                StimulusContent::Text(text) => DrawCommand::Text {
                    text: text.clone(),
                    pos: stim.pos,
                    size,
                    color: self.stimulus_color,
                },
            });
            if let Some(border) = border {
                if stim.selected || hovered == Some(i) {
                    scene.push(DrawCommand::Border {
                        pos: stim.pos,
                        size: (size, size),
                        width: border.width,
                        color: border.color,
                    });
                }
            }
        }
    }

    pub fn mask(&self, scene: &mut Scene, mask: &MaskRect) {
        scene.push(match &self.mask_image {
            Some(path) => DrawCommand::Image {
                path: path.clone(),
                pos: mask.pos,
                size: mask.size,
            },
            None => DrawCommand::Rect {
                pos: mask.pos,
                size: mask.size,
                color: self.mask_color,
            },
        });
    }

    /// Extra instructions, the clock and the remaining whole seconds
    pub fn response_overlay(&self, scene: &mut Scene, remaining_secs: f64) {
        scene.commands.extend(self.extra_text.iter().cloned());
        if let Some(clock) = &self.clock {
            scene.push(clock.clone());
        }
        scene.push(DrawCommand::Text {
            text: format!("{}", remaining_secs.max(0.0).ceil() as u64),
            pos: self.timer_pos,
            size: self.timer_size,
            color: self.timer_color,
        });
    }

    pub fn feedback(&self, scene: &mut Scene, message: &str) {
        scene.push(DrawCommand::Text {
            text: message.to_owned(),
            pos: (0.0, 0.0),
            size: self.feedback_size,
            color: self.feedback_color,
        });
    }

    pub fn instructions(&self, scene: &mut Scene, text: &str) {
        scene.push(DrawCommand::Text {
            text: text.to_owned(),
            pos: (0.0, 0.0),
            size: self.text_size,
            color: self.text_color,
        });
    }
}
