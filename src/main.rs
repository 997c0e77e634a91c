use cinesync::clock::SimulatedClock;
use cinesync::config::Config;
use cinesync::content::{ContentDocument, Session};
use cinesync::logging;
use cinesync::parser;
use cinesync::serialiser::{self, format_ts, LineEnding};
use cinesync::sync::{self, Renderer, SyncLoop, View};
use cinesync::transcript;
use cinesync::{Cue, CueEdge, VocabEntry};

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use tracing::info;

fn main() {
    match run() {
        Ok(()) => (),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            std::process::exit(1);
        }
    }
}

#[derive(ClapParser)]
#[command(about = "Parse, scramble and synchronize video subtitles and vocabulary notes")]
struct Cli {
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        help = "The file to read from: a content JSON document, an SRT file or a bracketed transcript. If not supplied, input is read from standard input.",
        default_value = "-"
    )]
    input: String,
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        help = "The file to write to. If not supplied, output is written to standard output.",
        default_value = "-"
    )]
    output: String,
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        help = "Write a backup of the original input to the specified file."
    )]
    backup: Option<String>,
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        help = "Read settings from a TOML file."
    )]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the subtitle track as normalized SRT.
    Cues {
        #[arg(long, help = "Use CRLF line endings.")]
        crlf: bool,
    },
    /// Show the subtitle and vocabulary entry active at a playback position.
    At {
        #[arg(value_parser = position, help = "Seconds, MM:SS or HH:MM:SS,mmm.")]
        time: f64,
    },
    /// Move a plain `subtitle` track into the scrambled `hiddenSub` field.
    Conceal,
    /// Move a `hiddenSub` track back into the plain `subtitle` field.
    Reveal,
    /// Edit individual subtitle lines. JSON input is written back as JSON, anything
    /// else as SRT.
    Cue {
        #[command(subcommand)]
        action: CueAction,
    },
    /// Edit the vocabulary list of a content document.
    Vocab {
        #[command(subcommand)]
        action: VocabAction,
    },
    /// Simulate playback and print subtitle and vocabulary changes as they happen.
    Play {
        #[arg(long, value_parser = position, default_value = "0", help = "Start position.")]
        from: f64,
        #[arg(long, value_parser = position, help = "End position. Defaults to the end of the content.")]
        to: Option<f64>,
        #[arg(long, default_value_t = 1.0, help = "Playback rate.")]
        speed: f64,
    },
}

#[derive(Subcommand)]
enum VocabAction {
    /// List entries in time order with their indices.
    List,
    /// Add an entry.
    Add {
        #[arg(value_parser = position)]
        time: f64,
        word: String,
        #[arg(default_value = "")]
        def: String,
    },
    /// Delete the entry at an index.
    Remove { index: usize },
    /// Move an entry earlier or later.
    Shift {
        index: usize,
        #[arg(long, allow_negative_numbers = true, help = "Seconds to move by.")]
        by: f64,
    },
    /// Merge entries from a JSON array file.
    Import { file: String },
}

#[derive(Subcommand)]
enum CueAction {
    /// List lines in track order with their indices.
    List,
    /// Add a three second line starting at a position.
    Add {
        #[arg(value_parser = position)]
        time: f64,
        text: String,
    },
    /// Delete the line at an index.
    Remove { index: usize },
    /// Move the start (or end) of a line earlier or later.
    Shift {
        index: usize,
        #[arg(long, allow_negative_numbers = true, help = "Seconds to move by.")]
        by: f64,
        #[arg(long, help = "Move the end instead of the start.")]
        end: bool,
    },
    /// Set the start (or end) of a line.
    SetTime {
        index: usize,
        #[arg(value_parser = position)]
        time: f64,
        #[arg(long, help = "Set the end instead of the start.")]
        end: bool,
    },
    /// Replace the text of a line.
    SetText { index: usize, text: String },
}

fn position(s: &str) -> Result<f64, String> {
    parser::parse_position(s).ok_or_else(|| format!("'{}' is not a playback position", s))
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config file: '{}'", path.display()))?,
        None => Config::default(),
    };
    logging::init_logging(&config.logging);

    let data = if cli.input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(&cli.input)
            .context(format!("Failed to open input file: '{}'", cli.input))?
    };

    if let Some(backup_path) = &cli.backup {
        std::fs::write(backup_path, &data)
            .context(format!("Failed to write backup file: '{}'", backup_path))?;
    }

    if data.trim().is_empty() {
        bail!("You appear to have supplied an empty file.");
    }

    match cli.command {
        Command::Cues { crlf } => {
            let session = load_session(&data)?;
            let ending = if crlf { LineEnding::CrLf } else { LineEnding::Lf };
            serialiser::serialise(session.cues(), open_output(&cli.output)?, ending)?;
        }
        Command::At { time } => {
            let session = load_session(&data)?;
            write_output(&cli.output, &describe_position(&session, time))?;
        }
        Command::Conceal => {
            let mut document = load_document(&data)?;
            if !document.conceal_subtitle() {
                bail!("The document has no plain subtitle track to conceal.");
            }
            write_output(&cli.output, &format!("{}\n", document.to_json()?))?;
        }
        Command::Reveal => {
            let mut document = load_document(&data)?;
            let revealed = document
                .reveal_subtitle()
                .context("Failed to decode the hidden subtitle track")?;
            if !revealed {
                bail!("The document has no hidden subtitle track to reveal.");
            }
            write_output(&cli.output, &format!("{}\n", document.to_json()?))?;
        }
        Command::Cue { action } => edit_cues(action, &data, &cli.output)?,
        Command::Vocab { action } => edit_vocab(action, &data, &cli.output)?,
        Command::Play { from, to, speed } => play(&data, from, to, speed, &config)?,
    }

    Ok(())
}

fn looks_like_json(data: &str) -> bool {
    data.trim_start_matches('\u{FEFF}').trim_start().starts_with('{')
}

fn load_document(data: &str) -> Result<ContentDocument> {
    if !looks_like_json(data) {
        bail!("This command needs a content JSON document as input.");
    }
    ContentDocument::from_json(data).context("Failed to parse content document")
}

fn load_session(data: &str) -> Result<Session> {
    if looks_like_json(data) {
        return Session::load(data).context("Failed to parse content document");
    }
    Ok(Session::from_cues(transcript::parse_any(data)))
}

fn open_output(path: &str) -> Result<Box<dyn Write>> {
    if path == "-" {
        Ok(Box::new(io::stdout()))
    } else {
        let file = std::fs::File::create(path)
            .context(format!("Failed to create output file: '{}'", path))?;
        Ok(Box::new(file))
    }
}

fn write_output(path: &str, text: &str) -> Result<()> {
    let mut dst = open_output(path)?;
    dst.write_all(text.as_bytes())
        .and_then(|_| dst.flush())
        .context("Failed to write output")?;
    Ok(())
}

fn one_line(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(" / ")
}

fn describe_position(session: &Session, t: f64) -> String {
    let selection = sync::select(session, t);
    let mut report = String::new();
    if let Some(id) = session.video_id() {
        report.push_str(&format!("video:    {}\n", id));
    }
    report.push_str(&format!("time:     {}\n", format_ts(t)));
    match selection.cue.and_then(|i| session.cues().get(i)) {
        Some(cue) => report.push_str(&format!(
            "subtitle: [{} --> {}] {}\n",
            format_ts(cue.start),
            format_ts(cue.end),
            one_line(&cue.text)
        )),
        None => report.push_str("subtitle: (none)\n"),
    }
    match selection.vocab.and_then(|i| session.vocab().get(i).map(|e| (i, e))) {
        Some((i, entry)) => report.push_str(&format!(
            "vocab:    #{} [{}] {} - {}\n",
            i,
            format_ts(entry.time),
            entry.word,
            entry.def
        )),
        None => report.push_str("vocab:    (none)\n"),
    }
    report
}

fn edge(end: bool) -> CueEdge {
    if end {
        CueEdge::End
    } else {
        CueEdge::Start
    }
}

fn edit_cues(action: CueAction, data: &str, output: &str) -> Result<()> {
    let mut session = load_session(data)?;

    match action {
        CueAction::List => {
            let listing: String = session
                .cues()
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    format!(
                        "{:>3}  {} --> {}  {}\n",
                        i,
                        format_ts(c.start),
                        format_ts(c.end),
                        one_line(&c.text)
                    )
                })
                .collect();
            return write_output(output, &listing);
        }
        CueAction::Add { time, text } => {
            let index = session.add_cue(time, text)?;
            info!(index, "added subtitle line");
        }
        CueAction::Remove { index } => {
            let removed = session.remove_cue(index)?;
            info!(index, text = %one_line(&removed.text), "removed subtitle line");
        }
        CueAction::Shift { index, by, end } => {
            let moved_to = session.shift_cue(index, edge(end), by)?;
            info!(from = index, to = moved_to, by, "shifted subtitle line");
        }
        CueAction::SetTime { index, time, end } => {
            let moved_to = session.set_cue_time(index, edge(end), time)?;
            info!(from = index, to = moved_to, time, "retimed subtitle line");
        }
        CueAction::SetText { index, text } => {
            session.set_cue_text(index, text)?;
            info!(index, "replaced subtitle text");
        }
    }

    if looks_like_json(data) {
        write_output(output, &format!("{}\n", session.to_json()?))
    } else {
        serialiser::serialise(session.cues(), open_output(output)?, LineEnding::Lf)
    }
}

fn edit_vocab(action: VocabAction, data: &str, output: &str) -> Result<()> {
    let mut session = Session::from_document(load_document(data)?);

    match action {
        VocabAction::List => {
            let listing: String = session
                .vocab()
                .entries()
                .iter()
                .enumerate()
                .map(|(i, e)| format!("{:>3}  {}  {} - {}\n", i, format_ts(e.time), e.word, e.def))
                .collect();
            return write_output(output, &listing);
        }
        VocabAction::Add { time, word, def } => {
            let index = session.vocab_mut().add(VocabEntry::new(time, word, def));
            info!(index, "added vocabulary entry");
        }
        VocabAction::Remove { index } => {
            let removed = session.vocab_mut().remove(index)?;
            info!(index, word = %removed.word, "removed vocabulary entry");
        }
        VocabAction::Shift { index, by } => {
            let moved_to = session.vocab_mut().shift(index, by)?;
            info!(from = index, to = moved_to, by, "shifted vocabulary entry");
        }
        VocabAction::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .context(format!("Failed to open vocabulary file: '{}'", file))?;
            let entries: Vec<VocabEntry> = serde_json::from_str(&text)
                .context("Vocabulary imports must be a JSON array of {time, word, def} objects")?;
            info!(count = entries.len(), "importing vocabulary entries");
            session.vocab_mut().import(entries);
        }
    }

    write_output(output, &format!("{}\n", session.to_json()?))
}

/// Prints what a viewer would see as it changes.
struct TerminalRenderer;

impl Renderer for TerminalRenderer {
    fn show_cue(&mut self, cue: Option<&Cue>) {
        if let Some(cue) = cue {
            println!("{}  {}", format_ts(cue.start), one_line(&cue.text));
        }
    }

    fn highlight_vocab(&mut self, entry: Option<(usize, &VocabEntry)>) {
        if let Some((_, entry)) = entry {
            println!("{}      * {}: {}", format_ts(entry.time), entry.word, entry.def);
        }
    }
}

fn content_end(session: &Session) -> f64 {
    let last_cue = session.cues().iter().map(|c| c.end).fold(0.0, f64::max);
    let last_vocab = session.vocab().entries().last().map_or(0.0, |e| e.time + 1.0);
    last_cue.max(last_vocab)
}

fn play(data: &str, from: f64, to: Option<f64>, speed: f64, config: &Config) -> Result<()> {
    if !(speed.is_finite() && speed > 0.0) {
        bail!("--speed must be a positive number.");
    }
    let session = load_session(data)?;
    let end = to.unwrap_or_else(|| content_end(&session));
    if end <= from {
        bail!(
            "Nothing to play between {} and {}.",
            format_ts(from),
            format_ts(end)
        );
    }
    let wall = Duration::from_secs_f64((end - from) / speed);
    let sync_loop = SyncLoop::new(config.sync.poll_interval());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start the playback runtime")?;
    runtime
        .block_on(async {
            let view = View::new(session, SimulatedClock::new(from, speed), TerminalRenderer);
            let mounted = sync_loop.mount(view);
            tokio::time::sleep(wall).await;
            mounted.unmount().await
        })
        .context("Playback loop failed")?;
    Ok(())
}
