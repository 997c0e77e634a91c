//! Timestamped plain-text transcripts, one `[MM:SS] text` line per cue.

use crate::parser::Parser;
use crate::srt::Cue;

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

/// How long the final line stays up, since nothing follows it.
const LAST_CUE_SECS: f64 = 5.0;

/// Parses either format: input containing an SRT arrow goes through the SRT parser,
/// anything else is read as a bracketed transcript.
pub fn parse_any(input: &str) -> Vec<Cue> {
    if input.contains("-->") {
        Parser::new().parse(input)
    } else {
        parse_transcript(input)
    }
}

/// Each cue runs until the next line's timestamp.
pub fn parse_transcript(input: &str) -> Vec<Cue> {
    static LINE: OnceLock<Regex> = OnceLock::new();
    let line = LINE.get_or_init(|| Regex::new(r"\[(\d+):(\d+)\][ \t]*(.*)").expect("valid regex"));

    let marks: Vec<(f64, &str)> = line
        .captures_iter(input)
        .filter_map(|caps| {
            let minutes: u64 = caps[1].parse().ok()?;
            let seconds: u64 = caps[2].parse().ok()?;
            let text = caps.get(3).map_or("", |m| m.as_str()).trim();
            let whole = minutes.checked_mul(60)?.checked_add(seconds)?;
            Some((whole as f64, text))
        })
        .collect();

    let cues: Vec<Cue> = marks
        .iter()
        .enumerate()
        .filter_map(|(i, &(start, text))| {
            let end = marks
                .get(i + 1)
                .map_or(start + LAST_CUE_SECS, |&(next, _)| next);
            // Lines sharing a timestamp would give an empty interval.
            (end > start).then(|| Cue::new(start, end, text))
        })
        .collect();

    debug!(lines = marks.len(), cues = cues.len(), "converted transcript");
    cues
}
