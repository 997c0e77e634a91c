use crate::srt::Cue;

use nom::bytes::complete::{tag, take_while_m_n};
use nom::character::complete::{char, digit0, digit1, one_of, space0};
use nom::combinator::{map, map_res, opt};
use nom::error::VerboseError;
use nom::sequence::preceded;
use nom::IResult;
use tracing::{debug, trace};

/// Block-tolerant SRT parser. Malformed blocks are dropped and counted; they never
/// abort the rest of the track.
pub struct Parser {
    skipped: usize,
}

impl Parser {
    pub fn new() -> Self {
        Self { skipped: 0 }
    }

    /// Number of blocks dropped by the most recent call to [`Parser::parse`].
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn parse(&mut self, input: &str) -> Vec<Cue> {
        self.skipped = 0;
        let input = match optional_bom(input) {
            Ok((rest, _)) => rest,
            Err(_) => input,
        };
        let normalised = input.replace("\r\n", "\n").replace('\r', "\n");

        let mut cues = Vec::new();
        for (number, block) in blocks(&normalised).enumerate() {
            match cue_block(&block) {
                Some(cue) => cues.push(cue),
                None => {
                    trace!(block = number, first_line = ?block.first(), "skipping malformed subtitle block");
                    self.skipped += 1;
                }
            }
        }

        if self.skipped > 0 {
            debug!(parsed = cues.len(), skipped = self.skipped, "parsed subtitle track");
        }
        cues
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience wrapper for callers that don't care about the skip count.
pub fn parse_srt(input: &str) -> Vec<Cue> {
    Parser::new().parse(input)
}

/// Reads a playback position typed by a person: plain seconds (`83.5`), `MM:SS`, or a
/// full SRT timestamp.
pub fn parse_position(input: &str) -> Option<f64> {
    let input = input.trim();
    if let Ok(secs) = input.parse::<f64>() {
        return (secs.is_finite() && secs >= 0.0).then_some(secs);
    }
    if let Ok(("", secs)) = timestamp(input) {
        return Some(secs);
    }
    let (minutes, seconds) = input.split_once(':')?;
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: f64 = seconds.parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then(|| minutes as f64 * 60.0 + seconds)
}

/// Groups lines into blocks separated by one or more whitespace-only lines.
fn blocks(input: &str) -> impl Iterator<Item = Vec<&str>> + '_ {
    let mut lines = input.lines().peekable();
    std::iter::from_fn(move || {
        while lines.peek().map_or(false, |l| l.trim().is_empty()) {
            lines.next();
        }
        let mut block = Vec::new();
        while let Some(line) = lines.next_if(|l| !l.trim().is_empty()) {
            block.push(line);
        }
        if block.is_empty() {
            None
        } else {
            Some(block)
        }
    })
}

fn cue_block(lines: &[&str]) -> Option<Cue> {
    // The index line is optional; the timing line is either first or second.
    let (timing_at, (start, end)) = lines
        .iter()
        .take(2)
        .enumerate()
        .find_map(|(i, line)| timing_line(line).ok().map(|(_, times)| (i, times)))?;

    if end <= start {
        return None;
    }

    let text = lines[timing_at + 1..]
        .iter()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        return None;
    }

    Some(Cue { start, end, text })
}

fn optional_bom(input: &str) -> IResult<&str, Option<&str>, VerboseError<&str>> {
    opt(tag("\u{FEFF}"))(input)
}

/// Parses `HH:MM:SS,mmm --> HH:MM:SS,mmm`, allowing trailing cue settings after whitespace.
pub(crate) fn timing_line(input: &str) -> IResult<&str, (f64, f64), VerboseError<&str>> {
    let (input, _) = space0(input)?;
    let (input, show_at) = timestamp(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = tag("-->")(input)?;
    let (input, _) = space0(input)?;
    let (rest, hide_at) = timestamp(input)?;

    if !rest.is_empty() && !rest.starts_with(|c: char| c.is_whitespace()) {
        return Err(nom::Err::Error(nom::error::make_error(
            rest,
            nom::error::ErrorKind::Space,
        )));
    }

    Ok((rest, (show_at, hide_at)))
}

pub(crate) fn timestamp(input: &str) -> IResult<&str, f64, VerboseError<&str>> {
    let mut take_hours = map_res(digit1, |s: &str| s.parse::<u64>());

    const MS_MIN: usize = 1;
    const MS_MAX: usize = 2;
    let take_ms = || {
        map_res(
            take_while_m_n(MS_MIN, MS_MAX, |c: char| c.is_ascii_digit()),
            |s: &str| s.parse::<u64>(),
        )
    };

    // The fraction is decimal, so `,5` is half a second and `,05` is fifty milliseconds.
    let take_fraction = map(digit0, |s: &str| {
        if s.is_empty() {
            0.0
        } else {
            format!("0.{}", s).parse::<f64>().unwrap_or(0.0)
        }
    });

    let (input, hours) = take_hours(input)?;
    let (input, _) = char(':')(input)?;
    let (input, minutes) = take_ms()(input)?;
    let (input, _) = char(':')(input)?;
    let (input, seconds) = take_ms()(input)?;
    let (input, fraction) = preceded(one_of(",."), take_fraction)(input)?;

    let whole = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60 + seconds));
    match whole {
        Some(whole) => Ok((input, whole as f64 + fraction)),
        None => Err(nom::Err::Error(nom::error::make_error(
            input,
            nom::error::ErrorKind::TooLarge,
        ))),
    }
}
