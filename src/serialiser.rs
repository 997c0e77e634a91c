use crate::srt::Cue;

use std::io::{BufWriter, Write};

use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

pub fn serialise<W: Write>(cues: &[Cue], output: W, ending: LineEnding) -> Result<()> {
    let mut writer = BufWriter::new(output);
    write_cues(&mut writer, cues, ending).context("Failed to write subtitles.")?;
    writer.flush().context("Failed to write subtitles.")?;
    Ok(())
}

/// Renders cues as SRT text, numbering them from 1.
pub fn to_srt(cues: &[Cue], ending: LineEnding) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_cues(&mut buf, cues, ending);
    String::from_utf8_lossy(&buf).into_owned()
}

fn write_cues<W: Write>(buf: &mut W, cues: &[Cue], ending: LineEnding) -> std::io::Result<()> {
    for (i, cue) in cues.iter().enumerate() {
        write_cue(buf, i + 1, cue, ending)?;
    }
    Ok(())
}

fn write_cue<W: Write>(
    buf: &mut W,
    seqnum: usize,
    cue: &Cue,
    ending: LineEnding,
) -> std::io::Result<()> {
    let nl = ending.as_str();
    write!(buf, "{}{}", seqnum, nl)?;
    write_ts(buf, cue.start)?;
    write!(buf, " --> ")?;
    write_ts(buf, cue.end)?;
    write!(buf, "{}", nl)?;
    // A blank line ends the block, so empty text lines are dropped.
    for line in cue.text.lines().filter(|l| !l.trim().is_empty()) {
        write!(buf, "{}{}", line, nl)?;
    }
    write!(buf, "{}", nl)?;
    Ok(())
}

pub(crate) fn write_ts<W: Write>(buf: &mut W, secs: f64) -> std::io::Result<()> {
    let secs = if secs.is_finite() && secs > 0.0 { secs } else { 0.0 };
    let total_ms = (secs * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    write!(
        buf,
        "{:02}:{:02}:{:02},{:03}",
        hours, minutes, seconds, millis
    )
}

/// Formats a second count as `HH:MM:SS,mmm`.
pub fn format_ts(secs: f64) -> String {
    let mut buf = Vec::with_capacity(12);
    let _ = write_ts(&mut buf, secs);
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    use proptest::prelude::*;
    use std::io::Cursor;

    macro_rules! test_write_ts {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, expected) = $value;

                let mut buf = Cursor::new(vec![]);

                write_ts(&mut buf, input).expect("Failed to write to buffer");

                assert_eq!(String::from_utf8(buf.into_inner()).unwrap(), expected);
            }
        )*
        }
    }

    test_write_ts! {
        test_write_ts_0: (0.0, "00:00:00,000"),
        test_write_ts_1: (0.001, "00:00:00,001"),
        test_write_ts_2: (0.999, "00:00:00,999"),
        test_write_ts_3: (1.0, "00:00:01,000"),
        test_write_ts_4: (1.0004, "00:00:01,000"),
        test_write_ts_5: (59.9996, "00:01:00,000"),
        test_write_ts_6: (60.0, "00:01:00,000"),
        test_write_ts_7: (3600.0, "01:00:00,000"),
        test_write_ts_8: (7326.159, "02:02:06,159"),
        test_write_ts_9: (360_000.001, "100:00:00,001"),
        test_write_ts_10: (-4.0, "00:00:00,000"),
        test_write_ts_11: (f64::NAN, "00:00:00,000"),
    }

    #[test]
    fn writes_numbered_blocks() {
        let cues = vec![
            Cue::new(1.0, 3.5, "Hello"),
            Cue::new(5.0, 7.0, "Two\nlines"),
        ];
        assert_eq!(
            to_srt(&cues, LineEnding::Lf),
            "1\n00:00:01,000 --> 00:00:03,500\nHello\n\n\
             2\n00:00:05,000 --> 00:00:07,000\nTwo\nlines\n\n"
        );
    }

    #[test]
    fn crlf_output_parses_back() {
        let cues = vec![Cue::new(0.5, 2.25, "<i>Hi</i>"), Cue::new(3.0, 4.0, "there")];
        let srt = to_srt(&cues, LineEnding::CrLf);
        assert!(srt.contains("1\r\n00:00:00,500 --> 00:00:02,250\r\n"));
        assert_eq!(parser::parse_srt(&srt), cues);
    }

    #[test]
    fn blank_text_lines_do_not_split_the_block() {
        let cues = vec![
            Cue::new(1.0, 2.0, "first\n\nsecond"),
            Cue::new(3.0, 4.0, "next\n \n"),
        ];
        let srt = to_srt(&cues, LineEnding::Lf);
        assert_eq!(
            srt,
            "1\n00:00:01,000 --> 00:00:02,000\nfirst\nsecond\n\n\
             2\n00:00:03,000 --> 00:00:04,000\nnext\n\n"
        );
        assert_eq!(
            parser::parse_srt(&srt),
            vec![Cue::new(1.0, 2.0, "first\nsecond"), Cue::new(3.0, 4.0, "next")]
        );
    }

    #[test]
    fn serialise_writes_to_any_writer() {
        let mut out = Vec::new();
        serialise(&[Cue::new(2.0, 3.0, "x")], &mut out, LineEnding::Lf).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1\n00:00:02,000 --> 00:00:03,000\nx\n\n");
    }

    proptest! {
        #[test]
        fn timing_round_trips(h in 0u64..200, m in 0u64..60, s in 0u64..60, ms in 0u64..1000) {
            let text = format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms);
            let (_, secs) = parser::timestamp(&text).unwrap();
            let expected = (h * 3600 + m * 60 + s) as f64 + ms as f64 / 1000.0;
            prop_assert!((secs - expected).abs() < 1e-6);
            prop_assert_eq!(format_ts(secs), text);
        }
    }
}
