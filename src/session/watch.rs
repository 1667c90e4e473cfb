// Session Watch Loop - Regenerate MIDI sketches when clips are renamed
//
// Each cycle takes a snapshot, compares every clip's name with the name seen
// at the same (track, clip) position last time, and hands each rename to a
// handler. Per key the order is: read the old name, fire on a change, then
// always store the new name, so a rename fires exactly once.
//
// A failure while handling one clip is logged and counted; it never stops the
// cycle or the loop. Only the cancellation flag ends `WatchLoop::run`, and it
// is checked before every clip so a cancelled cycle starts no new generation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::pipeline::{RegenError, RegenOutcome};

use super::source::{SessionError, SessionSource};
use super::types::{ClipKey, SessionSnapshot};

/// Longest uninterrupted sleep, so cancellation is noticed promptly
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Last-seen clip names, keyed by slot position
///
/// Lives as long as one watch run. Entries for clips that disappear from the
/// session are never pruned.
#[derive(Debug, Clone, Default)]
pub struct ObservationMap {
    names: HashMap<ClipKey, String>,
}

impl ObservationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ClipKey) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    /// Record the current name, returning the previous one
    pub fn observe(&mut self, key: ClipKey, name: &str) -> Option<String> {
        self.names.insert(key, name.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Reacts to a detected rename
pub trait RenameHandler {
    fn on_rename(&mut self, key: ClipKey, new_name: &str) -> Result<RegenOutcome, RegenError>;
}

impl<F> RenameHandler for F
where
    F: FnMut(ClipKey, &str) -> Result<RegenOutcome, RegenError>,
{
    fn on_rename(&mut self, key: ClipKey, new_name: &str) -> Result<RegenOutcome, RegenError> {
        self(key, new_name)
    }
}

/// What happened during one polling cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Occupied clip slots in the snapshot
    pub clips_seen: usize,

    /// Renames detected
    pub renames: usize,

    /// Renames that produced a new file
    pub regenerated: usize,

    /// Renames where the generator returned no usable chords
    pub skipped: usize,

    /// Renames whose handling failed
    pub failed: usize,

    /// The cycle stopped early because cancellation was requested
    pub cancelled: bool,
}

/// Diff one snapshot against the observation map and handle renames
///
/// Once `cancel` is set, the remaining clips are left unvisited and
/// unobserved.
pub fn poll_once<H: RenameHandler + ?Sized>(
    observations: &mut ObservationMap,
    snapshot: &SessionSnapshot,
    handler: &mut H,
    cancel: &AtomicBool,
) -> CycleReport {
    let mut report = CycleReport::default();

    for (key, clip) in snapshot.clips() {
        if cancel.load(Ordering::SeqCst) {
            log::info!("Cancelled, leaving the rest of this cycle unprocessed");
            report.cancelled = true;
            break;
        }

        report.clips_seen += 1;
        let name = clip.name();

        let previous = match observations.get(&key) {
            Some(previous) if previous != name => Some(previous.to_string()),
            _ => None,
        };

        if let Some(previous) = previous {
            report.renames += 1;
            log::info!("Detected rename at {}: '{}' -> '{}'", key, previous, name);

            match handler.on_rename(key, name) {
                Ok(RegenOutcome::Written(path)) => {
                    report.regenerated += 1;
                    log::info!("New MIDI for '{}' saved as {}", name, path.display());
                }
                Ok(RegenOutcome::NoChords) => {
                    report.skipped += 1;
                    log::warn!("No valid chords returned for '{}', skipping", name);
                }
                Err(e) => {
                    report.failed += 1;
                    log::error!("Regeneration for '{}' at {} failed: {}", name, key, e);
                }
            }
        }

        observations.observe(key, name);
    }

    report
}

/// Polls a session source forever, regenerating on renames
pub struct WatchLoop<S, H> {
    source: S,
    handler: H,
    poll_interval: Duration,
}

impl<S: SessionSource, H: RenameHandler> WatchLoop<S, H> {
    pub fn new(source: S, handler: H, poll_interval: Duration) -> Self {
        WatchLoop {
            source,
            handler,
            poll_interval,
        }
    }

    /// Take one snapshot and process it, stopping early once `cancel` is set
    pub fn cycle(
        &mut self,
        observations: &mut ObservationMap,
        cancel: &AtomicBool,
    ) -> Result<CycleReport, SessionError> {
        let snapshot = self.source.snapshot()?;
        Ok(poll_once(observations, &snapshot, &mut self.handler, cancel))
    }

    /// Run cycles until `cancel` is set
    ///
    /// A snapshot failure is logged and the loop carries on with the next
    /// cycle; the observation map is left as it was.
    pub fn run(&mut self, observations: &mut ObservationMap, cancel: &AtomicBool) {
        log::info!(
            "Monitoring {} for clip renames (every {:?})",
            self.source.describe(),
            self.poll_interval
        );

        while !cancel.load(Ordering::SeqCst) {
            match self.cycle(observations, cancel) {
                Ok(report) => log::debug!("Cycle complete: {:?}", report),
                Err(e) => log::warn!("Could not read session: {}", e),
            }
            sleep_unless_cancelled(self.poll_interval, cancel);
        }

        log::info!("Watch loop stopped after tracking {} clip(s)", observations.len());
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

fn sleep_unless_cancelled(duration: Duration, cancel: &AtomicBool) {
    let mut remaining = duration;
    while !remaining.is_zero() && !cancel.load(Ordering::SeqCst) {
        let step = remaining.min(SLEEP_SLICE);
        thread::sleep(step);
        remaining -= step;
    }
}
