//! Timers, expressed against an abstract millisecond clock rather than a
//! hardware timer directly — this crate stays platform-agnostic the same
//! way the rest of the workspace's core crates take an abstract transport
//! instead of a concrete UART. The firmware binary supplies a `Clock` backed
//! by `embassy_time::Instant`; host tests supply one backed by a counter.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

pub trait Clock {
    /// Monotonically non-decreasing milliseconds since an arbitrary epoch.
    fn now_ms(&self) -> u64;
}

pub struct Sleep<'a> {
    clock: &'a dyn Clock,
    deadline_ms: u64,
}

/// Returns a future that resolves once `clock.now_ms()` reaches
/// `clock.now_ms() + duration_ms` at the time this is called.
pub fn sleep<'a>(clock: &'a dyn Clock, duration_ms: u64) -> Sleep<'a> {
    Sleep { clock, deadline_ms: clock.now_ms().saturating_add(duration_ms) }
}

impl Future for Sleep<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.clock.now_ms() >= self.deadline_ms {
            Poll::Ready(())
        } else {
            // No hardware wakeup source at this layer (COROCGO_HAS_THREADS=0
            // busy-polls too); the scheduler re-polls every round until the
            // deadline passes.
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::block_on;
    use core::cell::Cell;

    struct TestClock(Cell<u64>);

    impl Clock for TestClock {
        fn now_ms(&self) -> u64 {
            let v = self.0.get();
            self.0.set(v + 1); // advances one tick per poll
            v
        }
    }

    #[test]
    fn sleep_resolves_once_deadline_passes() {
        let clock = TestClock(Cell::new(0));
        block_on(sleep(&clock, 5));
        assert!(clock.0.get() >= 5);
    }

    #[test]
    fn zero_duration_sleep_resolves_immediately() {
        let clock = TestClock(Cell::new(100));
        block_on(sleep(&clock, 0));
    }
}
