use crate::obfuscation;
use crate::parser::Parser;
use crate::srt::Cue;

use tracing::{debug, warn};

/// Where a video's subtitle track comes from in its content document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleSource {
    PlainText(String),
    Obfuscated(String),
    Absent,
}

impl SubtitleSource {
    /// Picks the track from the two optional document fields. Plain text wins when both
    /// are set; empty strings count as missing.
    pub fn from_fields(subtitle: Option<&str>, hidden_sub: Option<&str>) -> Self {
        let present = |s: Option<&str>| s.filter(|s| !s.trim().is_empty()).map(String::from);
        if let Some(plain) = present(subtitle) {
            SubtitleSource::PlainText(plain)
        } else if let Some(hidden) = present(hidden_sub) {
            SubtitleSource::Obfuscated(hidden)
        } else {
            SubtitleSource::Absent
        }
    }

    pub fn is_obfuscated(&self) -> bool {
        matches!(self, SubtitleSource::Obfuscated(_))
    }

    /// Resolves the track into cues. A track that cannot be unscrambled yields no cues;
    /// the failure is logged and playback carries on without subtitles.
    pub fn resolve(&self) -> Vec<Cue> {
        match self {
            SubtitleSource::Absent => Vec::new(),
            SubtitleSource::PlainText(text) => Parser::new().parse(text),
            SubtitleSource::Obfuscated(hidden) => match obfuscation::reveal(hidden) {
                Ok(text) => {
                    debug!(bytes = text.len(), "revealed obfuscated subtitle track");
                    Parser::new().parse(&text)
                }
                Err(err) => {
                    warn!(error = %err, "could not decode hidden subtitle track, continuing without subtitles");
                    Vec::new()
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRT: &str = "1\n00:00:01,000 --> 00:00:03,500\nHello\n";

    #[test]
    fn plain_text_wins_over_hidden() {
        let src = SubtitleSource::from_fields(Some(SRT), Some("abc"));
        assert_eq!(src, SubtitleSource::PlainText(SRT.to_string()));
    }

    #[test]
    fn empty_fields_are_absent() {
        assert_eq!(SubtitleSource::from_fields(Some(""), None), SubtitleSource::Absent);
        assert_eq!(SubtitleSource::from_fields(None, Some("  ")), SubtitleSource::Absent);
        assert!(SubtitleSource::Absent.resolve().is_empty());
    }

    #[test]
    fn resolves_hidden_track() {
        let hidden = obfuscation::conceal(SRT);
        let src = SubtitleSource::from_fields(None, Some(&hidden));
        assert!(src.is_obfuscated());
        let cues = src.resolve();
        assert_eq!(cues, vec![Cue::new(1.0, 3.5, "Hello")]);
    }

    #[test]
    fn undecodable_track_degrades_to_no_cues() {
        let src = SubtitleSource::Obfuscated("%%% not base64 %%%".to_string());
        assert!(src.resolve().is_empty());
    }
}
