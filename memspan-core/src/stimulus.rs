use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where stimulus identities come from: image files or literal strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StimulusKind {
    Image,
    Text,
}

/// Drawable content bound to a matrix slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StimulusContent {
    Image(PathBuf),
    Text(String),
}

impl StimulusContent {
    /// Identities of image stimuli are already resolved file paths.
    pub fn from_identity(kind: StimulusKind, identity: &str) -> Self {
        match kind {
            StimulusKind::Image => StimulusContent::Image(PathBuf::from(identity)),
            StimulusKind::Text => StimulusContent::Text(identity.to_owned()),
        }
    }
}
