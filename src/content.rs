//! The per-video JSON document and the session state built from it.

use crate::error::{CinesyncError, Result};
use crate::obfuscation;
use crate::serialiser::{self, LineEnding};
use crate::source::SubtitleSource;
use crate::srt::{Cue, CueEdge};
use crate::vocab::{VocabEntry, VocabList};

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// A video's content file as stored in the site's `data/` directory.
///
/// Styling blocks and unknown fields are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    #[serde(default)]
    pub video: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(rename = "hiddenSub", default, skip_serializing_if = "Option::is_none")]
    pub hidden_sub: Option<String>,
    #[serde(default)]
    pub vocab: Vec<VocabEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Two-space indented JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn subtitle_source(&self) -> SubtitleSource {
        SubtitleSource::from_fields(self.subtitle.as_deref(), self.hidden_sub.as_deref())
    }

    pub fn video_id(&self) -> Option<String> {
        extract_video_id(&self.video)
    }

    /// Moves a plain `subtitle` track into `hiddenSub`. Returns false when there was
    /// nothing to conceal.
    pub fn conceal_subtitle(&mut self) -> bool {
        match self.subtitle.take().filter(|s| !s.trim().is_empty()) {
            Some(plain) => {
                self.hidden_sub = Some(obfuscation::conceal(&plain));
                true
            }
            None => false,
        }
    }

    /// Moves a `hiddenSub` track back into plain `subtitle`. Returns false when there was
    /// nothing to reveal. The document is left unchanged if decoding fails.
    pub fn reveal_subtitle(&mut self) -> Result<bool> {
        let hidden = match self.hidden_sub.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(hidden) => hidden,
            None => return Ok(false),
        };
        let plain = obfuscation::reveal(hidden)?;
        self.subtitle = Some(plain);
        self.hidden_sub = None;
        Ok(true)
    }
}

/// Pulls the video id out of a YouTube watch or share URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    static WATCH: OnceLock<Regex> = OnceLock::new();
    static SHARE: OnceLock<Regex> = OnceLock::new();
    let watch = WATCH.get_or_init(|| Regex::new(r"[?&]v=([^&#]*)").expect("valid regex"));
    let share = SHARE.get_or_init(|| Regex::new(r"youtu\.be/([^?&#]+)").expect("valid regex"));

    watch
        .captures(url)
        .or_else(|| share.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|id| !id.is_empty())
        .map(String::from)
}

/// Length in seconds of a newly added subtitle line.
pub const NEW_CUE_SECS: f64 = 3.0;

/// Everything one open video view needs: resolved cues, sorted vocabulary, and the
/// document they came from.
#[derive(Debug, Clone)]
pub struct Session {
    document: ContentDocument,
    obfuscated: bool,
    cues: Vec<Cue>,
    cues_edited: bool,
    vocab: VocabList,
    video_id: Option<String>,
}

impl Session {
    pub fn load(json: &str) -> Result<Self> {
        Ok(Self::from_document(ContentDocument::from_json(json)?))
    }

    pub fn from_document(mut document: ContentDocument) -> Self {
        let source = document.subtitle_source();
        let cues = source.resolve();
        let vocab = VocabList::from_entries(std::mem::take(&mut document.vocab));
        let video_id = document.video_id();
        if video_id.is_none() && !document.video.is_empty() {
            debug!(url = %document.video, "no video id found in url");
        }
        info!(
            cues = cues.len(),
            vocab = vocab.len(),
            hidden = source.is_obfuscated(),
            "loaded content"
        );
        Self {
            obfuscated: source.is_obfuscated(),
            document,
            cues,
            cues_edited: false,
            vocab,
            video_id,
        }
    }

    /// A session holding only a bare subtitle track, as when opening an `.srt` file.
    pub fn from_cues(cues: Vec<Cue>) -> Self {
        Self {
            document: ContentDocument::default(),
            obfuscated: false,
            cues,
            cues_edited: true,
            vocab: VocabList::default(),
            video_id: None,
        }
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Replaces the whole subtitle track.
    pub fn set_cues(&mut self, cues: Vec<Cue>) {
        self.cues = cues;
        self.cues_edited = true;
    }

    /// Adds a line lasting [`NEW_CUE_SECS`], then re-sorts the track by start time.
    /// Returns the new line's index.
    pub fn add_cue(&mut self, start: f64, text: impl Into<String>) -> Result<usize> {
        let start = edit_time(start)?;
        let text = non_blank(text.into())?;
        self.cues.push(Cue::new(start, start + NEW_CUE_SECS, text));
        self.cues_edited = true;
        Ok(self.resort(self.cues.len() - 1))
    }

    pub fn remove_cue(&mut self, index: usize) -> Result<Cue> {
        self.check_cue_index(index)?;
        self.cues_edited = true;
        Ok(self.cues.remove(index))
    }

    /// Moves one end of a line by `delta` seconds. Returns the line's new index.
    pub fn shift_cue(&mut self, index: usize, edge: CueEdge, delta: f64) -> Result<usize> {
        self.check_cue_index(index)?;
        let cue = &self.cues[index];
        let time = match edge {
            CueEdge::Start => cue.start,
            CueEdge::End => cue.end,
        } + delta;
        self.set_cue_time(index, edge, time)
    }

    /// Sets one end of a line, clamped at zero and rounded to the millisecond. Moving
    /// the start re-sorts the track. Returns the line's new index.
    pub fn set_cue_time(&mut self, index: usize, edge: CueEdge, time: f64) -> Result<usize> {
        self.check_cue_index(index)?;
        let time = edit_time(time)?;
        let cue = &self.cues[index];
        let (start, end) = match edge {
            CueEdge::Start => (time, cue.end),
            CueEdge::End => (cue.start, time),
        };
        if end <= start {
            return Err(CinesyncError::InvalidTime(format!(
                "{} --> {}",
                serialiser::format_ts(start),
                serialiser::format_ts(end)
            )));
        }

        let cue = &mut self.cues[index];
        cue.start = start;
        cue.end = end;
        self.cues_edited = true;
        match edge {
            CueEdge::Start => Ok(self.resort(index)),
            CueEdge::End => Ok(index),
        }
    }

    pub fn set_cue_text(&mut self, index: usize, text: impl Into<String>) -> Result<()> {
        self.check_cue_index(index)?;
        self.cues[index].text = non_blank(text.into())?;
        self.cues_edited = true;
        Ok(())
    }

    pub fn vocab(&self) -> &VocabList {
        &self.vocab
    }

    pub fn vocab_mut(&mut self) -> &mut VocabList {
        &mut self.vocab
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    pub fn document(&self) -> &ContentDocument {
        &self.document
    }

    /// Rebuilds the document for saving. The vocabulary is always written back whole.
    /// Subtitles are re-encoded only if they were replaced, and keep their original
    /// plain or hidden form.
    pub fn to_document(&self) -> ContentDocument {
        let mut document = self.document.clone();
        document.vocab = self.vocab.entries().to_vec();
        if self.cues_edited {
            let srt = serialiser::to_srt(&self.cues, LineEnding::Lf);
            if self.obfuscated {
                document.hidden_sub = Some(obfuscation::conceal(&srt));
                document.subtitle = None;
            } else {
                document.subtitle = Some(srt);
                document.hidden_sub = None;
            }
        }
        document
    }

    pub fn to_json(&self) -> Result<String> {
        self.to_document().to_json()
    }

    /// Stable sort by start time. Returns where the line at `index` ended up.
    fn resort(&mut self, index: usize) -> usize {
        let mut tagged: Vec<(usize, Cue)> =
            std::mem::take(&mut self.cues).into_iter().enumerate().collect();
        tagged.sort_by(|a, b| a.1.start.total_cmp(&b.1.start));
        let moved_to = tagged
            .iter()
            .position(|(i, _)| *i == index)
            .unwrap_or(index);
        self.cues = tagged.into_iter().map(|(_, cue)| cue).collect();
        moved_to
    }

    fn check_cue_index(&self, index: usize) -> Result<()> {
        if index < self.cues.len() {
            Ok(())
        } else {
            Err(CinesyncError::CueIndex {
                index,
                len: self.cues.len(),
            })
        }
    }
}

fn edit_time(t: f64) -> Result<f64> {
    if !t.is_finite() {
        return Err(CinesyncError::InvalidTime(t.to_string()));
    }
    Ok((t.max(0.0) * 1000.0).round() / 1000.0)
}

fn non_blank(text: String) -> Result<String> {
    if text.trim().is_empty() {
        Err(CinesyncError::EmptyText)
    } else {
        Ok(text)
    }
}
