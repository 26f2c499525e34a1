//! A minimal single-threaded executor, plus the scheduler that drives
//! spawned tasks (coroutines) to completion cooperatively.
//!
//! Coroutines in the system this runtime replaces are stackful fibers
//! scheduled round-robin by a C function (`coro`/`scheduler_step`). Rust
//! gets the same cooperative-yield behaviour for free from `async`/`.await`
//! state machines, so this executor just needs to poll each task when woken
//! and otherwise sit idle — no stack switching to implement by hand.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

fn noop_raw_waker() -> RawWaker {
    fn noop(_: *const ()) {}
    fn clone(_: *const ()) -> RawWaker {
        noop_raw_waker()
    }
    static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
    RawWaker::new(core::ptr::null(), &VTABLE)
}

/// Runs a future to completion on the current call stack, polling in a tight
/// loop. Correct only because every future this runtime produces completes
/// (or parks on external interrupt/timer state it's already checked) rather
/// than needing a real OS-level wakeup signal — the scheduler below is what
/// actually avoids busy-polling in production; this is the primitive it's
/// built from, and it is also what tests use directly to drive one future.
pub fn block_on<F: Future>(mut f: F) -> F::Output {
    let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
    let mut cx = Context::from_waker(&waker);

    // SAFETY: `f` is not moved again after this point.
    let mut f = unsafe { Pin::new_unchecked(&mut f) };
    loop {
        if let Poll::Ready(out) = f.as_mut().poll(&mut cx) {
            return out;
        }
    }
}

/// Result of running the scheduler to quiescence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerResult {
    /// Every task finished.
    Done,
    /// No task is ready and none are waiting on a timer or external event —
    /// the system this runtime is modelled on calls this a deadlock.
    Deadlock,
}

type BoxedTask<'a> = Pin<&'a mut (dyn Future<Output = ()> + 'a)>;

/// Cooperative round-robin scheduler over a fixed number of coroutine slots.
///
/// Unlike a heap-allocating executor, every task's storage is supplied by
/// the caller (as a `&mut dyn Future` living as long as the scheduler),
/// matching the no-heap discipline the rest of this workspace holds to.
pub struct Scheduler<'a, const MAX_TASKS: usize> {
    tasks: heapless::Vec<Option<BoxedTask<'a>>, MAX_TASKS>,
}

impl<'a, const MAX_TASKS: usize> Default for Scheduler<'a, MAX_TASKS> {
    fn default() -> Self {
        Self { tasks: heapless::Vec::new() }
    }
}

impl<'a, const MAX_TASKS: usize> Scheduler<'a, MAX_TASKS> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a task. Returns `Err(task)` if every slot is taken.
    pub fn spawn(&mut self, task: BoxedTask<'a>) -> Result<(), BoxedTask<'a>> {
        self.tasks.push(Some(task)).map_err(|opt| opt.unwrap())
    }

    /// Polls every live task once. Finished tasks are dropped from their
    /// slot. Returns how many tasks completed this round — a task newly
    /// unblocked by another task's progress earlier in the same round (e.g.
    /// a channel send unblocking a receive) is polled again within the same
    /// `step`, since slots are visited in spawn order.
    pub fn step(&mut self) -> usize {
        let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut completions = 0;

        for slot in self.tasks.iter_mut() {
            if let Some(task) = slot {
                if task.as_mut().poll(&mut cx).is_ready() {
                    *slot = None;
                    completions += 1;
                }
            }
        }
        completions
    }

    /// Runs until every task completes. A real deployment drives `step` from
    /// the embassy executor's own wait-for-interrupt loop instead of calling
    /// this directly; `run` exists for host-side tests and the one-shot
    /// `exec_thread` helper.
    ///
    /// A round that completes zero tasks means nothing in the system can
    /// make further progress on its own — no pending send will ever be
    /// matched by a receive, no timer will ever fire — so that round is
    /// reported as a deadlock rather than looped on forever.
    pub fn run(&mut self) -> SchedulerResult {
        loop {
            if self.tasks.iter().all(|t| t.is_none()) {
                return SchedulerResult::Done;
            }
            if self.step() == 0 {
                return SchedulerResult::Deadlock;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;

    #[test]
    fn block_on_resolves_an_already_ready_future() {
        assert_eq!(block_on(core::future::ready(5)), 5);
    }

    #[test]
    fn scheduler_runs_two_tasks_communicating_over_a_channel() {
        let ch: Channel<i32, 1> = Channel::new();
        let mut received = None;

        let mut producer = async {
            ch.send(99).await.unwrap();
        };
        let mut consumer = async {
            received = ch.receive().await.ok();
        };

        let mut scheduler = Scheduler::<2>::new();
        scheduler.spawn(unsafe { Pin::new_unchecked(&mut producer) }).ok().unwrap();
        scheduler.spawn(unsafe { Pin::new_unchecked(&mut consumer) }).ok().unwrap();

        assert_eq!(scheduler.run(), SchedulerResult::Done);
        assert_eq!(received, Some(99));
    }

    #[test]
    fn scheduler_reports_deadlock_when_nothing_can_progress() {
        let ch: Channel<i32, 1> = Channel::new();
        let mut stuck = async {
            // Nobody will ever send or close; this future parks forever.
            let _ = ch.receive().await;
        };

        let mut scheduler = Scheduler::<1>::new();
        scheduler.spawn(unsafe { Pin::new_unchecked(&mut stuck) }).ok().unwrap();
        assert_eq!(scheduler.run(), SchedulerResult::Deadlock);
    }
}
