use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown sex `{0}`, expected M or F")]
pub struct ParseSexError(pub String);

impl FromStr for Sex {
    type Err = ParseSexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "M" | "MALE" => Ok(Sex::Male),
            "F" | "FEMALE" => Ok(Sex::Female),
            _ => Err(ParseSexError(s.to_owned())),
        }
    }
}

/// Who is taking part; collected once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantInfo {
    pub identifier: String,
    pub sex: Sex,
    pub age: u32,
    pub test: bool,
}

impl ParticipantInfo {
    /// Placeholder participant used when the procedure runs in test mode
    pub fn test_participant() -> Self {
        Self {
            identifier: "test".to_owned(),
            sex: Sex::Male,
            age: 0,
            test: true,
        }
    }

    /// Id used in result file names
    pub fn participant_id(&self) -> String {
        format!("{}{}{}", self.identifier, self.sex, self.age)
    }
}
