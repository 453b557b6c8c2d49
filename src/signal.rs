//! The retimeable signal: a one-shot abort notification whose deadline can
//! be moved or withdrawn while it is still pending.
//!
//! # State machine
//!
//! ```text
//! Armed --(delay elapses)--> Aborted   [terminal]
//! Armed --(reset)--> Armed (new delay)
//! Armed --(clear)--> Cleared
//! Cleared --(reset)--> Armed (new delay)
//! Cleared --(clear)--> Cleared
//! Aborted --(reset | clear)--> Aborted (no-op)
//! ```
//!
//! A signal starts `Armed`. `Cleared` is deliberately not terminal: clearing
//! only withdraws the pending deadline, and a later [`reset()`](RetimeableSignal::reset)
//! re-arms the same signal.

use super::*;

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Identifies a listener registered with [`RetimeableSignal::on_abort`], for
/// use with [`RetimeableSignal::remove_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

enum Phase {
    Armed,
    Cleared,
    Aborted,
}

type Listener = Box<dyn FnOnce(&AbortReason) + Send>;

struct State {
    phase: Phase,
    // Bumped on every arm/clear. A timer task may only fire the signal if
    // the epoch it captured is still current, so a handle that outlived its
    // reset can never cause a late abort.
    epoch: u64,
    // The single owned slot for the pending delay. Never more than one live
    // timer per signal.
    timer: Option<tokio::task::JoinHandle<()>>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

struct Shared {
    reason: AbortReason,
    default_delay: Duration,
    // Cancelled exactly once, at the Armed -> Aborted transition.
    fired: CancellationToken,
    state: Mutex<State>,
}

impl Shared {
    fn arm(self: &Arc<Self>, delay: Duration) {
        let mut state = self.state.lock().trace_expect("Failed to lock mutex");
        if matches!(state.phase, Phase::Aborted) {
            return;
        }

        state.epoch += 1;
        let epoch = state.epoch;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.phase = Phase::Armed;

        // Deadline is fixed here, at the arming call, not when the spawned
        // task first polls. The task holds a Weak so an unreferenced signal
        // doesn't linger for the remainder of its delay.
        let sleep = tokio::time::sleep(delay);
        let shared = Arc::downgrade(self);
        state.timer = Some(tokio::spawn(async move {
            sleep.await;
            if let Some(shared) = shared.upgrade() {
                shared.fire(epoch);
            }
        }));

        trace!("abort armed for {delay:?}");
    }

    fn fire(&self, epoch: u64) {
        let listeners = {
            let mut state = self.state.lock().trace_expect("Failed to lock mutex");
            if !matches!(state.phase, Phase::Armed) || state.epoch != epoch {
                // A reset or clear took the lock first; this timer is stale
                return;
            }
            state.phase = Phase::Aborted;
            state.timer = None;
            std::mem::take(&mut state.listeners)
        };

        trace!("signal aborted: {}", self.reason);

        self.fired.cancel();
        for (_, listener) in listeners {
            listener(&self.reason);
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Ok(state) = self.state.get_mut() {
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
        }
    }
}

/// A one-shot cancellation signal with a movable deadline.
///
/// Construction arms an internal delay; when it elapses the signal aborts,
/// exactly once, and notifies every observer. Before that happens the
/// deadline can be moved with [`reset()`](Self::reset) /
/// [`reset_after()`](Self::reset_after) or withdrawn with
/// [`clear()`](Self::clear), any number of times.
///
/// The handle is cheap to clone; all clones observe the same signal.
///
/// # Example
///
/// ```no_run
/// use retimeable_signal::RetimeableSignal;
/// use std::time::Duration;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let signal = RetimeableSignal::new(Duration::from_secs(5));
///
/// tokio::select! {
///     _ = do_work() => {}
///     _ = signal.aborted() => {
///         // Abandon the work; signal.reason() says why
///     }
/// }
/// # });
/// # async fn do_work() {}
/// ```
#[derive(Clone)]
pub struct RetimeableSignal {
    shared: Arc<Shared>,
}

impl RetimeableSignal {
    /// Creates a signal that aborts after `delay`, with the default reason.
    ///
    /// `Duration` cannot be negative or non-finite, so there is no invalid
    /// delay to reject; `Duration::ZERO` aborts on the next timer tick.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime, which provides the
    /// underlying delay primitive.
    pub fn new(delay: Duration) -> Self {
        Self::with_options(delay, SignalOptions::default())
    }

    /// Creates a signal that aborts after `delay`, with the reason fields
    /// overridden by `options`.
    ///
    /// The [`AbortReason`] is built here, once, and never changes afterwards
    /// no matter how often the signal is reset.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn with_options(delay: Duration, options: SignalOptions) -> Self {
        let shared = Arc::new(Shared {
            reason: options.into(),
            default_delay: delay,
            fired: CancellationToken::new(),
            state: Mutex::new(State {
                phase: Phase::Cleared,
                epoch: 0,
                timer: None,
                listeners: Vec::new(),
                next_listener: 0,
            }),
        });
        shared.arm(delay);
        Self { shared }
    }

    /// Re-arms the signal with the delay supplied at construction.
    ///
    /// The pending delay (if any) is cancelled first, so rapid repeated
    /// resets produce exactly one eventual abort, timed from the last call.
    /// Observers and the eventual [`AbortReason`] are unchanged; only the
    /// firing time moves. No-op once the signal has aborted.
    pub fn reset(&self) {
        self.shared.arm(self.shared.default_delay);
    }

    /// Re-arms the signal with an explicit delay, overriding the default
    /// for this one scheduling.
    ///
    /// Otherwise identical to [`reset()`](Self::reset).
    pub fn reset_after(&self, delay: Duration) {
        self.shared.arm(delay);
    }

    /// Withdraws the pending deadline; the signal will not abort from
    /// timeout.
    ///
    /// Clearing is idempotent and not terminal: a later
    /// [`reset()`](Self::reset) re-arms the signal and it will then abort
    /// after the new delay. No-op once the signal has aborted.
    pub fn clear(&self) {
        let mut state = self
            .shared
            .state
            .lock()
            .trace_expect("Failed to lock mutex");
        if matches!(state.phase, Phase::Aborted) {
            return;
        }

        state.epoch += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.phase = Phase::Cleared;

        trace!("pending abort cleared");
    }

    /// Returns `true` once the signal has aborted.
    pub fn is_aborted(&self) -> bool {
        matches!(
            self.shared
                .state
                .lock()
                .trace_expect("Failed to lock mutex")
                .phase,
            Phase::Aborted
        )
    }

    /// The abort cause; `Some` once the signal has aborted.
    pub fn reason(&self) -> Option<&AbortReason> {
        self.is_aborted().then(|| &self.shared.reason)
    }

    /// Completes when the signal aborts.
    ///
    /// Completes immediately if the signal has already aborted. Cleared
    /// signals keep waiters pending, since a later reset may still re-arm
    /// and fire.
    pub async fn aborted(&self) {
        self.shared.fired.cancelled().await
    }

    /// Registers a listener invoked with the [`AbortReason`] when the signal
    /// aborts.
    ///
    /// All listeners run synchronously, in subscription order, within the
    /// single task that processes the elapsed delay. A listener registered
    /// after the signal has already aborted is invoked immediately, before
    /// this method returns.
    pub fn on_abort<F>(&self, f: F) -> ListenerId
    where
        F: FnOnce(&AbortReason) + Send + 'static,
    {
        let mut state = self
            .shared
            .state
            .lock()
            .trace_expect("Failed to lock mutex");
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;

        if matches!(state.phase, Phase::Aborted) {
            drop(state);
            f(&self.shared.reason);
        } else {
            state.listeners.push((id, Box::new(f)));
        }
        id
    }

    /// Removes a listener registered with [`on_abort()`](Self::on_abort).
    ///
    /// Returns `false` if the id is unknown, already removed, or already
    /// consumed by the abort.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut state = self
            .shared
            .state
            .lock()
            .trace_expect("Failed to lock mutex");
        if let Some(idx) = state.listeners.iter().position(|(l, _)| *l == id) {
            _ = state.listeners.remove(idx);
            true
        } else {
            false
        }
    }

    /// The delay supplied at construction, as reused by
    /// [`reset()`](Self::reset).
    pub fn default_delay(&self) -> Duration {
        self.shared.default_delay
    }
}
