//! Focus acquisition for the capture surface.
//!
//! A just-shown capture surface may not have mounted its input yet, and even a
//! mounted input can silently fail to take keyboard focus. [`FocusAcquisition`]
//! is the explicit retry machine:
//!
//! ```text
//! Unattempted -> Retrying(n) -> Focused
//!                            \-> GaveUp
//! ```
//!
//! The machine never sleeps itself; [`FocusAcquisition::attempt`] returns the
//! delay to wait before the next attempt. [`acquire_focus`] drives it on the
//! Tokio clock and [`FocusCoordinator`] restarts it on every visibility trigger.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::FocusConfig;
use crate::util::lock;

/// The capture surface's text input, as seen by the focus machine.
pub trait FocusTarget: Send + Sync {
    /// Whether the input element exists yet.
    fn is_mounted(&self) -> bool;

    /// Request keyboard focus and select the current draft text.
    fn focus_and_select(&self);

    /// Whether the input actually holds keyboard focus.
    fn has_focus(&self) -> bool;
}

/// Machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    Unattempted,
    /// `n` attempts have failed so far and another is scheduled.
    Retrying(u32),
    Focused,
    GaveUp,
}

/// Terminal result of one acquisition sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    Focused,
    /// Budget exhausted. A soft degradation, never surfaced to the user.
    GaveUp,
}

/// What the driver should do after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusStep {
    RetryAfter(Duration),
    Finished(FocusOutcome),
}

/// Why a sequence was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTrigger {
    InitialMount,
    CaptureReopened,
    ReopenFollowUp,
    WindowFocusRegained,
}

/// One acquisition sequence with a fresh attempt budget.
#[derive(Debug, Clone)]
pub struct FocusAcquisition {
    config: FocusConfig,
    failed: u32,
    state: FocusState,
}

impl FocusAcquisition {
    pub const fn new(config: FocusConfig) -> Self {
        Self {
            config,
            failed: 0,
            state: FocusState::Unattempted,
        }
    }

    pub const fn state(&self) -> FocusState {
        self.state
    }

    pub const fn remaining_attempts(&self) -> u32 {
        self.config.attempts.saturating_sub(self.failed)
    }

    /// Make one attempt against `target`.
    ///
    /// Calling this after the machine finished returns the same outcome
    /// without touching the target.
    pub fn attempt(&mut self, target: &dyn FocusTarget) -> FocusStep {
        match self.state {
            FocusState::Focused => return FocusStep::Finished(FocusOutcome::Focused),
            FocusState::GaveUp => return FocusStep::Finished(FocusOutcome::GaveUp),
            FocusState::Unattempted | FocusState::Retrying(_) => {}
        }

        if !target.is_mounted() {
            return self.fail(self.config.missing_element_delay());
        }

        target.focus_and_select();
        if target.has_focus() {
            self.state = FocusState::Focused;
            return FocusStep::Finished(FocusOutcome::Focused);
        }

        self.fail(self.config.retry_delay())
    }

    fn fail(&mut self, delay: Duration) -> FocusStep {
        self.failed += 1;
        if self.remaining_attempts() == 0 {
            self.state = FocusState::GaveUp;
            FocusStep::Finished(FocusOutcome::GaveUp)
        } else {
            self.state = FocusState::Retrying(self.failed);
            FocusStep::RetryAfter(delay)
        }
    }
}

/// Run a full acquisition sequence, sleeping between attempts.
pub async fn acquire_focus(target: &dyn FocusTarget, config: FocusConfig) -> FocusOutcome {
    let mut machine = FocusAcquisition::new(config);
    loop {
        match machine.attempt(target) {
            FocusStep::RetryAfter(delay) => tokio::time::sleep(delay).await,
            FocusStep::Finished(outcome) => return outcome,
        }
    }
}

/// Starts focus sequences for a capture surface and cancels superseded ones.
///
/// At most one immediate sequence and one pending re-open follow-up exist at a
/// time. Dropping the coordinator (or calling [`FocusCoordinator::cancel`])
/// revokes all pending timers.
pub struct FocusCoordinator {
    target: Arc<dyn FocusTarget>,
    config: FocusConfig,
    running: Mutex<Option<JoinHandle<FocusOutcome>>>,
    follow_up: Mutex<Option<JoinHandle<FocusOutcome>>>,
    stopped: AtomicBool,
}

impl FocusCoordinator {
    pub fn new(target: Arc<dyn FocusTarget>, config: FocusConfig) -> Self {
        Self {
            target,
            config,
            running: Mutex::new(None),
            follow_up: Mutex::new(None),
            stopped: AtomicBool::new(false),
        }
    }

    /// Start a fresh sequence for `trigger`, superseding the one in flight.
    ///
    /// A [`FocusTrigger::CaptureReopened`] also schedules a delayed follow-up
    /// sequence to outlast window-manager races.
    pub fn trigger(&self, trigger: FocusTrigger) {
        if self.stopped.load(Ordering::Acquire) {
            tracing::debug!("Ignoring {trigger:?} after shutdown");
            return;
        }
        tracing::debug!("Focus acquisition triggered by {trigger:?}");
        let handle = self.spawn_sequence(Duration::ZERO, trigger);
        if let Some(previous) = lock(&self.running).replace(handle) {
            previous.abort();
        }

        if trigger == FocusTrigger::CaptureReopened {
            let handle = self.spawn_sequence(
                self.config.reopen_followup_delay(),
                FocusTrigger::ReopenFollowUp,
            );
            if let Some(previous) = lock(&self.follow_up).replace(handle) {
                previous.abort();
            }
        }
    }

    /// Abort every pending sequence.
    pub fn cancel(&self) {
        for slot in [&self.running, &self.follow_up] {
            if let Some(handle) = lock(slot).take() {
                handle.abort();
            }
        }
    }

    /// Abort pending sequences and ignore every later trigger.
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::Release);
        self.cancel();
    }

    /// Take the handle of the most recent immediate sequence.
    pub fn take_running(&self) -> Option<JoinHandle<FocusOutcome>> {
        lock(&self.running).take()
    }

    /// Take the handle of the pending follow-up sequence.
    pub fn take_follow_up(&self) -> Option<JoinHandle<FocusOutcome>> {
        lock(&self.follow_up).take()
    }

    fn spawn_sequence(&self, delay: Duration, trigger: FocusTrigger) -> JoinHandle<FocusOutcome> {
        let target = Arc::clone(&self.target);
        let config = self.config;
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let outcome = acquire_focus(target.as_ref(), config).await;
            match outcome {
                FocusOutcome::Focused => tracing::debug!("Capture input focused ({trigger:?})"),
                FocusOutcome::GaveUp => {
                    tracing::debug!("Gave up focusing capture input ({trigger:?})");
                }
            }
            outcome
        })
    }
}

impl Drop for FocusCoordinator {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use super::FocusTarget;

    /// Input that mounts after `mount_after` probes and accepts focus from the
    /// `focus_on`-th focus request onwards (1-based; 0 never accepts).
    #[derive(Default)]
    pub struct FakeInput {
        pub mount_after: u32,
        pub focus_on: u32,
        pub probes: AtomicU32,
        pub focus_requests: AtomicU32,
        pub focused: AtomicBool,
    }

    impl FakeInput {
        pub fn new(mount_after: u32, focus_on: u32) -> Self {
            Self {
                mount_after,
                focus_on,
                ..Self::default()
            }
        }

        pub fn focus_requests(&self) -> u32 {
            self.focus_requests.load(Ordering::SeqCst)
        }

        pub fn blur(&self) {
            self.focused.store(false, Ordering::SeqCst);
        }
    }

    impl FocusTarget for FakeInput {
        fn is_mounted(&self) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst) >= self.mount_after
        }

        fn focus_and_select(&self) {
            let request = self.focus_requests.fetch_add(1, Ordering::SeqCst) + 1;
            if self.focus_on != 0 && request >= self.focus_on {
                self.focused.store(true, Ordering::SeqCst);
            }
        }

        fn has_focus(&self) -> bool {
            self.focused.load(Ordering::SeqCst)
        }
    }
}
