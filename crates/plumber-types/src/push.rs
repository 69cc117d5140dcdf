use std::fmt;

use serde::{Deserialize, Serialize};

/// How a push treats items that were pushed before.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PushMode {
    /// Insert every item.
    Always,
    /// Insert an item only if no entry with an equal payload was ever
    /// pushed to the stage, consumed or not.
    IfNew,
    /// Insert an item only if no entry with an equal payload was pushed
    /// within the last `window_secs` seconds. Never constructed with 0.
    IfOlderThan { window_secs: u64 },
}

impl PushMode {
    /// Build a mode from the two push flags.
    ///
    /// `push_if_new` wins over a window, and a window of 0 means disabled.
    pub fn from_flags(push_if_new: bool, push_if_older_than: u64) -> Self {
        if push_if_new {
            Self::IfNew
        } else if push_if_older_than > 0 {
            Self::IfOlderThan {
                window_secs: push_if_older_than,
            }
        } else {
            Self::Always
        }
    }
}

impl fmt::Display for PushMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::IfNew => write!(f, "if-new"),
            Self::IfOlderThan { window_secs } => write!(f, "if-older-than {window_secs}"),
        }
    }
}
