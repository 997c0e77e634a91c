use serde::{Deserialize, Serialize};

/// A timed subtitle interval. Times are in seconds from the start of the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Cue {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Both ends are inclusive, so a sample landing exactly on `end` still shows the cue.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Which end of a cue a timing edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueEdge {
    Start,
    End,
}
