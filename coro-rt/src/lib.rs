#![cfg_attr(not(feature = "std"), no_std)]
//! Cooperative scheduling built directly on `async`/`.await`, replacing a
//! stackful-fiber runtime with one where the compiler generates the state
//! machines instead of hand-written yield points.
//!
//! Layering, bottom to top:
//! - [`channel`] — bounded SPSC-ish queues tasks `.await` to communicate,
//!   plus a lock-free ring for interrupt-context producers.
//! - [`sleep`] — a timer future against an abstract [`sleep::Clock`].
//! - [`select`] — waiting on more than one channel at once.
//! - [`executor`] — `block_on` for driving a single future, and
//!   [`executor::Scheduler`] for round-robin driving several.
//!
//! None of this allocates: channels are stack- or static-allocated by the
//! caller, and [`executor::Scheduler`] holds borrowed `Pin<&mut dyn Future>`
//! task slots rather than boxing them.

pub mod channel;
pub mod executor;
#[cfg(feature = "std")]
pub mod pool;
pub mod select;
pub mod sleep;

pub use channel::{Channel, Closed, TryRecvOutcome};
pub use executor::{block_on, Scheduler, SchedulerResult};
#[cfg(feature = "std")]
pub use pool::{exec_thread, wait_file, Monitor, READABLE, WRITABLE};
pub use select::{select2, select_same, try_select2, Either};
pub use sleep::{sleep, Clock};
