//! Cancellable one-second countdown shared by the prep and game phases.

use std::{fmt, time::Duration};

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

const TICK: Duration = Duration::from_secs(1);

/// Identifies one run of a [`Timer`]; events from superseded runs carry a stale id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Events emitted by a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One second elapsed; `remaining` seconds are left.
    Tick {
        /// Run that produced the event.
        id: TimerId,
        /// Seconds left after this tick.
        remaining: u32,
    },
    /// The countdown reached zero. Sent exactly once per run that was not cancelled.
    Expired {
        /// Run that produced the event.
        id: TimerId,
    },
}

impl TimerEvent {
    /// Run that produced the event.
    pub fn id(&self) -> TimerId {
        match self {
            Self::Tick { id, .. } | Self::Expired { id } => *id,
        }
    }
}

/// Single-slot countdown: starting a new run cancels the previous one.
///
/// Ticks are delivered on the channel passed to [`Timer::start`] so the owning station
/// handles them on its own event loop. Because the task may have queued an event right
/// before being aborted, consumers must check [`Timer::is_current`] before acting on one.
#[derive(Debug, Default)]
pub struct Timer {
    generation: u64,
    active: Option<TimerId>,
    task: Option<JoinHandle<()>>,
}

impl Timer {
    /// Create an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a countdown of `duration_secs`, cancelling any previous run.
    pub fn start(&mut self, duration_secs: u32, events: mpsc::UnboundedSender<TimerEvent>) -> TimerId {
        self.cancel();
        self.generation += 1;
        let id = TimerId(self.generation);

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            for remaining in (0..duration_secs).rev() {
                ticker.tick().await;
                if events.send(TimerEvent::Tick { id, remaining }).is_err() {
                    return;
                }
            }
            let _ = events.send(TimerEvent::Expired { id });
        }));
        self.active = Some(id);
        id
    }

    /// Stop the current run. Safe to call at any time, including on an idle timer.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.active = None;
    }

    /// Mark `id` as finished after its [`TimerEvent::Expired`] was handled.
    pub fn finish(&mut self, id: TimerId) {
        if self.active == Some(id) {
            self.active = None;
            self.task = None;
        }
    }

    /// Whether an event from `id` should still be acted upon.
    pub fn is_current(&self, id: TimerId) -> bool {
        self.active == Some(id)
    }

    /// Whether a countdown is in progress.
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Id of the run in progress, if any.
    pub fn active(&self) -> Option<TimerId> {
        self.active
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}
