//! Bounded async channel with close semantics and an optional lock-free
//! external-producer ring for interrupt-context senders.
//!
//! The main ring is only ever touched from scheduler-driven tasks running on
//! one core, so it's a plain `RefCell`-guarded `heapless::Deque` — no atomics
//! needed there. The external ring exists for exactly one use case: an
//! interrupt handler that wants to hand data to a task without blocking or
//! taking a lock the main loop might be holding. That ring is SPSC by
//! construction (one interrupt source, one consumer drain point) and uses
//! acquire/release atomics to stay correct across that boundary.

use core::cell::{Cell, RefCell, UnsafeCell};
use core::future::Future;
use core::mem::MaybeUninit;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};

use portable_atomic::{AtomicUsize, Ordering};

/// The channel has been closed; no more values will ever arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed;

struct ExternalRing<T, const EXT_N: usize> {
    buf: UnsafeCell<[MaybeUninit<T>; EXT_N]>,
    write_idx: AtomicUsize,
    read_idx: AtomicUsize,
}

// SAFETY: `buf` is only ever written at `write_idx` by the producer and read
// at `read_idx` by the consumer; acquire/release on the indices establishes
// the happens-before edge needed for that handoff to be race-free.
unsafe impl<T: Send, const EXT_N: usize> Sync for ExternalRing<T, EXT_N> {}

impl<T, const EXT_N: usize> ExternalRing<T, EXT_N> {
    fn new() -> Self {
        Self {
            buf: UnsafeCell::new(core::array::from_fn(|_| MaybeUninit::uninit())),
            write_idx: AtomicUsize::new(0),
            read_idx: AtomicUsize::new(0),
        }
    }

    fn push(&self, value: T) -> Result<(), T> {
        if EXT_N == 0 {
            return Err(value);
        }
        let w = self.write_idx.load(Ordering::Relaxed);
        let next = (w + 1) % EXT_N;
        if next == self.read_idx.load(Ordering::Acquire) {
            return Err(value); // full
        }
        // SAFETY: slot `w` is not touched by the consumer until write_idx advances past it.
        unsafe { (*self.buf.get())[w].write(value) };
        self.write_idx.store(next, Ordering::Release);
        Ok(())
    }

    fn pop(&self) -> Option<T> {
        let r = self.read_idx.load(Ordering::Relaxed);
        if r == self.write_idx.load(Ordering::Acquire) {
            return None; // empty
        }
        // SAFETY: slot `r` was published by the producer's Release store above.
        let value = unsafe { (*self.buf.get())[r].assume_init_read() };
        self.read_idx.store((r + 1) % EXT_N.max(1), Ordering::Release);
        Some(value)
    }
}

/// A bounded channel of capacity `N`, with an optional `EXT_N`-deep external
/// ring for non-cooperative (interrupt-context) producers. `EXT_N = 0`
/// (the default) disables the external path entirely.
pub struct Channel<T, const N: usize, const EXT_N: usize = 0> {
    ring: RefCell<heapless::Deque<T, N>>,
    closed: Cell<bool>,
    send_waker: RefCell<Option<Waker>>,
    recv_waker: RefCell<Option<Waker>>,
    ext: ExternalRing<T, EXT_N>,
}

impl<T, const N: usize, const EXT_N: usize> Default for Channel<T, N, EXT_N> {
    fn default() -> Self {
        Self {
            ring: RefCell::new(heapless::Deque::new()),
            closed: Cell::new(false),
            send_waker: RefCell::new(None),
            recv_waker: RefCell::new(None),
            ext: ExternalRing::new(),
        }
    }
}

impl<T, const N: usize, const EXT_N: usize> Channel<T, N, EXT_N> {
    pub fn new() -> Self {
        Self::default()
    }

    fn drain_external(&self) {
        if EXT_N == 0 {
            return;
        }
        let mut ring = self.ring.borrow_mut();
        while !ring.is_full() {
            match self.ext.pop() {
                Some(v) => {
                    let _ = ring.push_back(v);
                }
                None => break,
            }
        }
    }

    /// Non-blocking receive. Drains the external ring first so
    /// interrupt-delivered values are not starved by direct senders.
    /// Distinguishes "empty, still open" from "closed", unlike a bare
    /// `Result<T, Closed>`.
    pub fn try_receive(&self) -> TryRecvOutcome<T> {
        self.drain_external();
        if let Some(v) = self.ring.borrow_mut().pop_front() {
            if let Some(w) = self.send_waker.borrow_mut().take() {
                w.wake();
            }
            return TryRecvOutcome::Ready(v);
        }
        if self.closed.get() {
            TryRecvOutcome::Closed
        } else {
            TryRecvOutcome::Empty
        }
    }

    /// Registers `cx`'s waker to be woken on the next send, without
    /// consuming a value. Used by [`crate::select`] to park on several
    /// channels at once, since a plain `receive()` future can only ever
    /// represent waiting on one.
    pub fn receive_waker_hint(&self, cx: &Context<'_>) {
        *self.recv_waker.borrow_mut() = Some(cx.waker().clone());
    }

    pub fn try_send(&self, value: T) -> Result<(), T> {
        if self.closed.get() {
            return Err(value);
        }
        let mut ring = self.ring.borrow_mut();
        ring.push_back(value)?;
        drop(ring);
        if let Some(w) = self.recv_waker.borrow_mut().take() {
            w.wake();
        }
        Ok(())
    }

    /// Non-blocking send from an interrupt or other non-cooperative context.
    /// Requires `EXT_N > 0`. Never touches the main ring directly.
    pub fn send_external_nonblock(&self, value: T) -> Result<(), T> {
        if self.closed.get() {
            return Err(value);
        }
        self.ext.push(value)
    }

    pub fn close(&self) {
        self.closed.set(true);
        if let Some(w) = self.send_waker.borrow_mut().take() {
            w.wake();
        }
        if let Some(w) = self.recv_waker.borrow_mut().take() {
            w.wake();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    pub fn send(&self, value: T) -> Send<'_, T, N, EXT_N> {
        Send { channel: self, value: Some(value) }
    }

    pub fn receive(&self) -> Receive<'_, T, N, EXT_N> {
        Receive { channel: self }
    }
}

pub enum TryRecvOutcome<T> {
    Ready(T),
    Empty,
    Closed,
}

pub struct Send<'a, T, const N: usize, const EXT_N: usize> {
    channel: &'a Channel<T, N, EXT_N>,
    value: Option<T>,
}

impl<T, const N: usize, const EXT_N: usize> Future for Send<'_, T, N, EXT_N> {
    type Output = Result<(), Closed>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let value = this.value.take().expect("Send polled after completion");
        match this.channel.try_send(value) {
            Ok(()) => Poll::Ready(Ok(())),
            Err(_) if this.channel.is_closed() => Poll::Ready(Err(Closed)),
            Err(v) => {
                this.value = Some(v);
                *this.channel.send_waker.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

pub struct Receive<'a, T, const N: usize, const EXT_N: usize> {
    channel: &'a Channel<T, N, EXT_N>,
}

impl<T, const N: usize, const EXT_N: usize> Future for Receive<'_, T, N, EXT_N> {
    type Output = Result<T, Closed>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.channel.try_receive() {
            TryRecvOutcome::Ready(v) => Poll::Ready(Ok(v)),
            TryRecvOutcome::Closed => Poll::Ready(Err(Closed)),
            TryRecvOutcome::Empty => {
                *self.channel.recv_waker.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::block_on;

    #[test]
    fn send_then_receive_round_trips() {
        let ch: Channel<i32, 4> = Channel::new();
        ch.try_send(42).unwrap();
        assert_eq!(block_on(ch.receive()), Ok(42));
    }

    #[test]
    fn receive_on_closed_empty_channel_errors() {
        let ch: Channel<i32, 4> = Channel::new();
        ch.close();
        assert_eq!(block_on(ch.receive()), Err(Closed));
    }

    #[test]
    fn full_channel_rejects_try_send() {
        let ch: Channel<i32, 1> = Channel::new();
        ch.try_send(1).unwrap();
        assert!(ch.try_send(2).is_err());
    }

    #[test]
    fn external_producer_value_is_observed_by_receiver() {
        let ch: Channel<i32, 2, 4> = Channel::new();
        ch.send_external_nonblock(7).unwrap();
        assert_eq!(block_on(ch.receive()), Ok(7));
    }

    #[test]
    fn closing_unblocks_a_pending_send_on_a_full_channel() {
        let ch: Channel<i32, 1> = Channel::new();
        ch.try_send(1).unwrap();
        ch.close();
        assert_eq!(block_on(ch.send(2)), Err(Closed));
    }
}
