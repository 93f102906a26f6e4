//! The watch session: one owner for all mutable core state.
//!
//! A session ties the clipboard reader, the watcher, the aggregator and the
//! status machine together in a single task. Poll ticks and timer firings
//! arrive through `tokio::select!` and are handled strictly sequentially, so
//! no state is ever touched concurrently. Timed transitions are single-shot
//! spawned sleeps; scheduling a new one aborts the previous handle, and the
//! status machine additionally rejects stale tokens.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, AggregateResult};
use crate::clip::{ClipRecord, ClipboardReader};
use crate::config::Config;
use crate::parser::ClipParser;
use crate::status::{StatusMachine, StatusState, TimerToken};
use crate::watcher::{ClipboardWatcher, PollOutcome};

/// A status transition surfaced to the UI layer.
///
/// `result` carries the latest aggregate whenever one exists, so a `Ready`
/// update after a successful session can still render the muted
/// "last calculated" indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUpdate {
    /// The new status state.
    #[serde(flatten)]
    pub state: StatusState,

    /// The most recent aggregation result, if any.
    pub result: Option<AggregateResult>,
}

/// A fired one-shot timer, tagged with the token it was armed with.
#[derive(Debug, Clone, Copy)]
enum TimerEvent {
    DetectElapsed(TimerToken),
    PhaseElapsed(TimerToken),
}

/// A handle to stop a running session from another task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    running: Arc<AtomicBool>,
}

impl SessionHandle {
    /// Signal the session to stop after the current event.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the session is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// The clipboard watch session.
pub struct Session<R> {
    config: Config,
    reader: R,
    watcher: ClipboardWatcher,
    machine: StatusMachine,
    last_result: Option<AggregateResult>,
    pending_clips: Option<Vec<ClipRecord>>,
    captured_raw: Option<String>,
    pending_timer: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl<R> std::fmt::Debug for Session<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("machine", &self.machine)
            .field("last_result", &self.last_result)
            .finish_non_exhaustive()
    }
}

impl<R: ClipboardReader> Session<R> {
    /// Create a new session over the given clipboard reader.
    #[must_use]
    pub fn new(config: Config, reader: R) -> Self {
        Self {
            config,
            reader,
            watcher: ClipboardWatcher::new(),
            machine: StatusMachine::new(),
            last_result: None,
            pending_clips: None,
            captured_raw: None,
            pending_timer: None,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Get a handle that can stop the session from another task.
    #[must_use]
    pub fn stop_handle(&self) -> SessionHandle {
        SessionHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Run the session until stopped or the update receiver is dropped.
    pub async fn run(mut self, updates: mpsc::Sender<SessionUpdate>) {
        let (timer_tx, mut timer_rx) = mpsc::channel::<TimerEvent>(8);

        let mut ticker = interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(
            interval_ms = self.config.poll_interval().as_millis(),
            reader = self.reader.name(),
            "starting clipboard watch session"
        );

        while self.running.load(Ordering::SeqCst) && !updates.is_closed() {
            tokio::select! {
                _ = ticker.tick() => {
                    self.handle_tick(&timer_tx, &updates).await;
                }
                Some(event) = timer_rx.recv() => {
                    self.handle_timer(event, &timer_tx, &updates).await;
                }
            }
        }

        if let Some(handle) = self.pending_timer.take() {
            handle.abort();
        }
        debug!("clipboard watch session stopped");
    }

    /// One poll tick: read the clipboard and react to the outcome.
    async fn handle_tick(
        &mut self,
        timer_tx: &mpsc::Sender<TimerEvent>,
        updates: &mpsc::Sender<SessionUpdate>,
    ) {
        let raw = match self.reader.read_text().await {
            Ok(raw) => raw,
            Err(e) => {
                // Unreadable this tick; cached state stays intact.
                warn!(error = %e, "clipboard read failed, skipping tick");
                None
            }
        };

        match self.watcher.poll(raw) {
            PollOutcome::Ignored => {}
            PollOutcome::Unchanged { cached_clips } => {
                let count = cached_clips.as_ref().map_or(0, Vec::len);
                if let Some(state) = self.machine.unchanged_tick(count) {
                    self.emit(updates, state).await;
                }
            }
            PollOutcome::Detected { clips, raw } => {
                let (state, token) = self.machine.clips_detected(clips.len());
                self.pending_clips = Some(clips);
                self.captured_raw = Some(raw);
                self.schedule(
                    timer_tx,
                    TimerEvent::DetectElapsed(token),
                    self.config.detect_delay(),
                );
                self.emit(updates, state).await;
            }
            PollOutcome::Invalid => {
                let state = self.machine.invalid_content();
                self.pending_clips = None;
                self.emit(updates, state).await;
            }
        }
    }

    /// One timer firing: aggregate or settle the calculated display.
    async fn handle_timer(
        &mut self,
        event: TimerEvent,
        timer_tx: &mpsc::Sender<TimerEvent>,
        updates: &mpsc::Sender<SessionUpdate>,
    ) {
        match event {
            TimerEvent::DetectElapsed(token) => {
                if !self.machine.detect_elapsed(token) {
                    debug!("stale detect timer ignored");
                    return;
                }
                let Some(clips) = self.pending_clips.take() else {
                    return;
                };

                let result = aggregate(&clips, self.config.sample_rate());
                info!(
                    clips = result.clip_count(),
                    total = %result.total_duration(),
                    "aggregated clip durations"
                );

                let (state, token) = self.machine.calculated(result.clip_count());
                self.last_result = Some(result);
                self.restore_clipboard().await;
                self.schedule(
                    timer_tx,
                    TimerEvent::PhaseElapsed(token),
                    self.config.phase_delay(),
                );
                self.emit(updates, state).await;
            }
            TimerEvent::PhaseElapsed(token) => {
                if let Some(state) = self.machine.phase_elapsed(token) {
                    self.emit(updates, state).await;
                }
            }
        }
    }

    /// Arm a single-shot timer, cancelling any outstanding one.
    fn schedule(&mut self, timer_tx: &mpsc::Sender<TimerEvent>, event: TimerEvent, delay: Duration) {
        if let Some(handle) = self.pending_timer.take() {
            handle.abort();
        }
        let tx = timer_tx.clone();
        self.pending_timer = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            let _ = tx.send(event).await;
        }));
    }

    /// Put the original captured text back on the clipboard so the DAW
    /// paste keeps working. Failure is logged and ignored.
    async fn restore_clipboard(&self) {
        if !self.config.watch.restore_clipboard {
            return;
        }
        let Some(raw) = self.captured_raw.as_deref() else {
            return;
        };
        if let Err(e) = self.reader.restore(raw).await {
            warn!(error = %e, "failed to restore clipboard contents");
        }
    }

    async fn emit(&self, updates: &mpsc::Sender<SessionUpdate>, state: StatusState) {
        let update = SessionUpdate {
            state,
            result: self.last_result.clone(),
        };
        let _ = updates.send(update).await;
    }
}

/// One-shot calculation for an explicit user request.
///
/// Reads the clipboard once, parses, aggregates at the configured sample
/// rate and restores the original text. `Ok(None)` means no valid clip data
/// was found — the caller owns the user-visible failure message.
///
/// # Errors
///
/// Returns an error only if the clipboard read itself fails.
pub async fn calculate_once<R: ClipboardReader>(
    reader: &R,
    config: &Config,
) -> crate::error::Result<Option<AggregateResult>> {
    let Some(raw) = reader.read_text().await? else {
        return Ok(None);
    };

    let parser = ClipParser::new();
    match parser.parse(&raw) {
        Ok(parsed) if !parsed.clips.is_empty() => {
            let result = aggregate(&parsed.clips, config.sample_rate());
            if config.watch.restore_clipboard {
                if let Err(e) = reader.restore(&raw).await {
                    warn!(error = %e, "failed to restore clipboard contents");
                }
            }
            Ok(Some(result))
        }
        Ok(_) | Err(_) => Ok(None),
    }
}
