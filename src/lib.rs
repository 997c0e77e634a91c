//! Subtitle and vocabulary synchronization for video study pages.
//!
//! A content document is loaded into a [`Session`](content::Session): its subtitle
//! track (plain SRT or the scrambled `hiddenSub` form) becomes a list of cues and its
//! vocabulary is sorted by time. On each playback sample the [`sync`] module picks the
//! cue and vocabulary entry to display.

pub mod clock;
pub mod config;
pub mod content;
pub mod error;
pub mod logging;
pub mod obfuscation;
pub mod parser;
pub mod serialiser;
pub mod source;
pub mod srt;
pub mod sync;
pub mod transcript;
pub mod vocab;

pub use content::{ContentDocument, Session};
pub use error::{CinesyncError, ObfuscationError};
pub use srt::{Cue, CueEdge};
pub use vocab::{VocabEntry, VocabList};
