use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A stage number, guaranteed to lie in `1..=stages` for the deployment it
/// was validated against.
///
/// Each stage owns one queue and one object store. Stages share nothing.
///
/// Deserializing only rejects stage 0; the upper bound is a deployment
/// setting and is checked by [`StageId::new`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32")]
pub struct StageId(u32);

impl StageId {
    /// Validate `stage` against the configured stage count.
    pub fn new(stage: i64, stages: u32) -> Result<Self, TypeError> {
        if stage < 1 || stage > i64::from(stages) {
            return Err(TypeError::StageOutOfRange { stage, max: stages });
        }
        Ok(Self(stage as u32))
    }

    /// Parse a path segment such as `"3"` and validate it. Only ASCII
    /// digits are accepted, so `"+3"` and `"-1"` are invalid.
    pub fn parse(s: &str, stages: u32) -> Result<Self, TypeError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypeError::InvalidStage(s.to_string()));
        }
        let stage: i64 = s
            .parse()
            .map_err(|_| TypeError::InvalidStage(s.to_string()))?;
        Self::new(stage, stages)
    }

    /// The raw stage number.
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for StageId {
    type Error = TypeError;

    fn try_from(stage: u32) -> Result<Self, Self::Error> {
        if stage == 0 {
            return Err(TypeError::InvalidStage(stage.to_string()));
        }
        Ok(Self(stage))
    }
}

impl fmt::Debug for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StageId({})", self.0)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage-{}", self.0)
    }
}
