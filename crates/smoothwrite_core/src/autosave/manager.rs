//! Auto-save debounce state machine.
//!
//! # Responsibility
//! - Track whether a save is pending and when it is due.
//! - Invoke the externally supplied save callback on expiry or on demand.
//!
//! # Invariants
//! - `Idle --notify_change--> Pending(now + delay)`.
//! - `Pending --notify_change--> Pending(now + delay)` (restart, not extend).
//! - `Pending --poll at/after deadline--> Idle`, callback invoked once.
//! - `Pending --force_save_now--> Idle`, callback invoked once, synchronously.
//! - `* --cancel--> Idle`, callback not invoked.
//! - The state is `Idle` before the callback runs, so a failed save is not
//!   retried here; retry policy belongs to the owner.
//!
//! The scheduler owns no timer. The owning event loop calls `poll()` when
//! `time_until_due()` has elapsed, which keeps the callback on the same
//! thread that handles input.

use crate::autosave::clock::{Clock, SystemClock};
use log::{debug, error, info};
use std::fmt::Display;
use std::time::{Duration, Instant};

type SaveCallback<E> = Box<dyn FnMut() -> Result<(), E>>;

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSaveState {
    /// Nothing pending.
    Idle,
    /// A save fires at `deadline` unless reset, forced or cancelled.
    Pending { deadline: Instant },
}

/// Debounces change notifications into delayed save-callback invocations.
pub struct AutoSaveManager<E, C: Clock = SystemClock> {
    save_callback: SaveCallback<E>,
    delay: Duration,
    clock: C,
    state: AutoSaveState,
    enabled: bool,
}

impl<E: Display> AutoSaveManager<E, SystemClock> {
    /// Creates a scheduler driven by the system clock.
    pub fn new(save_callback: impl FnMut() -> Result<(), E> + 'static, delay_ms: u64) -> Self {
        Self::with_clock(save_callback, delay_ms, SystemClock)
    }
}

impl<E: Display, C: Clock> AutoSaveManager<E, C> {
    /// Creates a scheduler driven by `clock`.
    pub fn with_clock(
        save_callback: impl FnMut() -> Result<(), E> + 'static,
        delay_ms: u64,
        clock: C,
    ) -> Self {
        info!("event=autosave_init module=autosave status=ok delay_ms={delay_ms}");
        Self {
            save_callback: Box::new(save_callback),
            delay: Duration::from_millis(delay_ms),
            clock,
            state: AutoSaveState::Idle,
            enabled: true,
        }
    }

    /// Records a content change and (re)arms the timer for `delay` from now.
    ///
    /// Ignored while disabled.
    pub fn notify_change(&mut self) {
        if !self.enabled {
            return;
        }
        let deadline = self.clock.now() + self.delay;
        let restarted = self.is_pending();
        self.state = AutoSaveState::Pending { deadline };
        debug!("event=autosave_arm module=autosave status=ok restarted={restarted}");
    }

    /// Fires the pending save if its deadline has passed.
    ///
    /// Returns `Ok(true)` when the callback ran. A callback error is logged
    /// and returned; the state is already `Idle` at that point.
    pub fn poll(&mut self) -> Result<bool, E> {
        match self.state {
            AutoSaveState::Pending { deadline } if self.clock.now() >= deadline => {
                self.state = AutoSaveState::Idle;
                self.run_callback("timer").map(|()| true)
            }
            _ => Ok(false),
        }
    }

    /// Runs the pending save immediately, bypassing the remaining delay.
    ///
    /// No-op returning `Ok(false)` when nothing is pending. When it returns,
    /// the callback has completed.
    pub fn force_save_now(&mut self) -> Result<bool, E> {
        if !self.is_pending() {
            return Ok(false);
        }
        self.state = AutoSaveState::Idle;
        self.run_callback("forced").map(|()| true)
    }

    /// Drops the pending save without invoking the callback.
    ///
    /// Returns whether a save was pending.
    pub fn cancel(&mut self) -> bool {
        let was_pending = self.is_pending();
        self.state = AutoSaveState::Idle;
        if was_pending {
            debug!("event=autosave_cancel module=autosave status=ok");
        }
        was_pending
    }

    /// Re-enables change tracking.
    pub fn enable(&mut self) {
        self.enabled = true;
        info!("event=autosave_enable module=autosave status=ok");
    }

    /// Stops change tracking and cancels any pending save.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.cancel();
        info!("event=autosave_disable module=autosave status=ok");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Changes the quiet period. An already pending deadline is kept; the new
    /// delay applies from the next `notify_change`.
    pub fn set_delay(&mut self, delay_ms: u64) {
        self.delay = Duration::from_millis(delay_ms);
        info!("event=autosave_delay module=autosave status=ok delay_ms={delay_ms}");
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> AutoSaveState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, AutoSaveState::Pending { .. })
    }

    /// Instant at which the pending save becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            AutoSaveState::Pending { deadline } => Some(deadline),
            AutoSaveState::Idle => None,
        }
    }

    /// Time left before `poll()` will fire; zero once due.
    pub fn time_until_due(&self) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(self.clock.now()))
    }

    fn run_callback(&mut self, trigger: &'static str) -> Result<(), E> {
        match (self.save_callback)() {
            Ok(()) => {
                debug!("event=autosave_fire module=autosave status=ok trigger={trigger}");
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=autosave_fire module=autosave status=error trigger={trigger} error={err}"
                );
                Err(err)
            }
        }
    }
}
