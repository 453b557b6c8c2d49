//! A reschedulable one-shot cancellation signal for cooperative timeouts.
//!
//! This crate provides [`RetimeableSignal`], a cancellation signal that
//! aborts after a configurable delay unless the delay is moved
//! ([`reset`](RetimeableSignal::reset)) or withdrawn
//! ([`clear`](RetimeableSignal::clear)) first. It fires at most once, no
//! matter how many times it is rescheduled, and rescheduling can never leave
//! a stale timer able to abort the signal late.
//!
//! It is a building block for operations that need a cooperative timeout:
//! callers observe the signal (by awaiting
//! [`aborted()`](RetimeableSignal::aborted), registering an
//! [`on_abort`](RetimeableSignal::on_abort) listener, or polling
//! [`is_aborted()`](RetimeableSignal::is_aborted)) and abandon in-flight
//! work once it aborts.
//!
//! # Example
//!
//! ```no_run
//! use retimeable_signal::RetimeableSignal;
//! use std::time::Duration;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let signal = RetimeableSignal::new(Duration::from_secs(30));
//!
//! loop {
//!     tokio::select! {
//!         item = next_item() => {
//!             // Activity observed, push the deadline out again
//!             signal.reset();
//!             handle(item);
//!         }
//!         _ = signal.aborted() => {
//!             // Idle too long, give up
//!             break;
//!         }
//!     }
//! }
//! # });
//! # async fn next_item() {}
//! # fn handle(_: ()) {}
//! ```

use trace_err::*;

pub mod reason;
pub mod signal;

// Re-export commonly used types at crate root
pub use reason::{AbortReason, SignalOptions};
pub use signal::{ListenerId, RetimeableSignal};
