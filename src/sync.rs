//! Picks the subtitle and vocabulary entry to show for a playback position, and the
//! polling loop that keeps a view in step with the player.

use crate::clock::PlaybackClock;
use crate::config::SyncSettings;
use crate::content::Session;
use crate::srt::Cue;
use crate::vocab::VocabEntry;

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// First cue in list order whose interval contains `t`. Overlapping input resolves to the
/// earliest listed cue.
pub fn active_cue(cues: &[Cue], t: f64) -> Option<usize> {
    cues.iter().position(|cue| cue.contains(t))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub cue: Option<usize>,
    pub vocab: Option<usize>,
}

/// Recomputed from scratch for every sample, so seeks in either direction need no
/// special handling.
pub fn select(session: &Session, t: f64) -> Selection {
    Selection {
        cue: active_cue(session.cues(), t),
        vocab: session.vocab().active_at(t),
    }
}

/// Receives what the view should display.
pub trait Renderer {
    /// `None` hides the subtitle box.
    fn show_cue(&mut self, cue: Option<&Cue>);

    /// `None` clears the highlight.
    fn highlight_vocab(&mut self, entry: Option<(usize, &VocabEntry)>);
}

/// What the view last rendered. Renderer calls are made only when the selection changes;
/// redrawing on every sample makes the subtitle flicker.
#[derive(Debug, Default)]
pub struct ViewState {
    rendered: Option<Selection>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rendered(&self) -> Option<Selection> {
        self.rendered
    }

    /// Forgets what was drawn so the next tick repaints everything.
    pub fn invalidate(&mut self) {
        self.rendered = None;
    }

    /// Returns true if anything was sent to the renderer.
    pub fn tick<R: Renderer>(&mut self, session: &Session, t: f64, renderer: &mut R) -> bool {
        let next = select(session, t);
        let prev = self.rendered;
        if prev == Some(next) {
            return false;
        }

        if prev.map(|p| p.cue) != Some(next.cue) {
            trace!(t, cue = ?next.cue, "subtitle changed");
            renderer.show_cue(next.cue.and_then(|i| session.cues().get(i)));
        }
        if prev.map(|p| p.vocab) != Some(next.vocab) {
            trace!(t, vocab = ?next.vocab, "vocabulary highlight changed");
            let entry = next
                .vocab
                .and_then(|i| session.vocab().get(i).map(|entry| (i, entry)));
            renderer.highlight_vocab(entry);
        }

        self.rendered = Some(next);
        true
    }
}

/// The state a mounted view owns while its loop runs, handed back on unmount.
#[derive(Debug)]
pub struct View<C, R> {
    pub session: Session,
    pub clock: C,
    pub renderer: R,
    pub state: ViewState,
}

impl<C, R> View<C, R> {
    pub fn new(session: Session, clock: C, renderer: R) -> Self {
        Self {
            session,
            clock,
            renderer,
            state: ViewState::new(),
        }
    }
}

/// Samples the clock on a fixed period and updates the renderer.
#[derive(Debug, Clone, Copy)]
pub struct SyncLoop {
    period: Duration,
}

impl SyncLoop {
    pub const DEFAULT_PERIOD: Duration = Duration::from_millis(200);

    pub const MIN_PERIOD: Duration = Duration::from_millis(SyncSettings::MIN_POLL_MS);

    /// Periods shorter than [`SyncLoop::MIN_PERIOD`] are raised to it.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Self::MIN_PERIOD),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts the loop on the current tokio runtime.
    pub fn mount<C, R>(&self, view: View<C, R>) -> MountedView<C, R>
    where
        C: PlaybackClock + Send + 'static,
        R: Renderer + Send + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        debug!(period_ms = self.period.as_millis() as u64, "mounting view");
        let task = tokio::spawn(run(view, self.period, stop_rx));
        MountedView {
            stop: stop_tx,
            task,
        }
    }
}

impl Default for SyncLoop {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERIOD)
    }
}

/// Handle to a running loop.
#[derive(Debug)]
pub struct MountedView<C, R> {
    stop: watch::Sender<bool>,
    task: JoinHandle<View<C, R>>,
}

impl<C, R> MountedView<C, R> {
    /// Stops the loop after its current tick and returns the view state.
    pub async fn unmount(self) -> Result<View<C, R>, JoinError> {
        // A send error means the loop already exited; the join below reports why.
        let _ = self.stop.send(true);
        let view = self.task.await?;
        debug!("view unmounted");
        Ok(view)
    }
}

async fn run<C, R>(mut view: View<C, R>, period: Duration, mut stop: watch::Receiver<bool>) -> View<C, R>
where
    C: PlaybackClock,
    R: Renderer,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match view.clock.current_time() {
                    Some(t) => {
                        view.state.tick(&view.session, t, &mut view.renderer);
                    }
                    None => trace!("player not ready"),
                }
            }
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
        }
    }
    view
}
