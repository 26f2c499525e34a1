//! Waiting on more than one channel at once.
//!
//! The variadic template `select(Cases...)` this is modelled on tries every
//! case non-blockingly, falls back to a default case if one was given, and
//! otherwise parks on every case's monitor at once. Rust has no variadic
//! generics, so this crate covers the two shapes that pattern actually
//! needs in practice: two channels of different item types (`select2`), and
//! any number of channels sharing one item type (`select_same`, e.g. N
//! identical worker queues). Both support a non-blocking "default case"
//! variant via `try_*` alongside the blocking `Future` one.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use crate::channel::{Channel, Closed, TryRecvOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Either<A, B> {
    Left(A),
    Right(B),
}

/// Non-blocking: the "has a default case" shape. `None` means neither
/// channel had anything ready, so the caller should run its default branch.
pub fn try_select2<T1, T2, const N1: usize, const E1: usize, const N2: usize, const E2: usize>(
    a: &Channel<T1, N1, E1>,
    b: &Channel<T2, N2, E2>,
) -> Option<Either<T1, T2>> {
    if let TryRecvOutcome::Ready(v) = a.try_receive() {
        return Some(Either::Left(v));
    }
    if let TryRecvOutcome::Ready(v) = b.try_receive() {
        return Some(Either::Right(v));
    }
    None
}

/// Blocking form of [`try_select2`]: parks until either channel has a value,
/// or resolves to `Err(Closed)` once both are closed and empty.
pub struct Select2<'a, T1, T2, const N1: usize, const E1: usize, const N2: usize, const E2: usize> {
    a: &'a Channel<T1, N1, E1>,
    b: &'a Channel<T2, N2, E2>,
}

pub fn select2<'a, T1, T2, const N1: usize, const E1: usize, const N2: usize, const E2: usize>(
    a: &'a Channel<T1, N1, E1>,
    b: &'a Channel<T2, N2, E2>,
) -> Select2<'a, T1, T2, N1, E1, N2, E2> {
    Select2 { a, b }
}

impl<T1, T2, const N1: usize, const E1: usize, const N2: usize, const E2: usize> Future
    for Select2<'_, T1, T2, N1, E1, N2, E2>
{
    type Output = Result<Either<T1, T2>, Closed>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let a_outcome = self.a.try_receive();
        if let TryRecvOutcome::Ready(v) = a_outcome {
            return Poll::Ready(Ok(Either::Left(v)));
        }
        let b_outcome = self.b.try_receive();
        if let TryRecvOutcome::Ready(v) = b_outcome {
            return Poll::Ready(Ok(Either::Right(v)));
        }

        let a_closed = matches!(a_outcome, TryRecvOutcome::Closed);
        let b_closed = matches!(b_outcome, TryRecvOutcome::Closed);
        if a_closed && b_closed {
            return Poll::Ready(Err(Closed));
        }

        // Park on whichever side(s) are still open; a wake from either
        // causes this future to be polled again.
        self.a.receive_waker_hint(cx);
        self.b.receive_waker_hint(cx);
        Poll::Pending
    }
}

/// Blocking select over `COUNT` channels sharing one item type. Resolves to
/// the index of the channel that produced a value and the value itself, or
/// `Err(Closed)` once every channel is closed and empty.
pub struct SelectSame<'a, T, const N: usize, const EXT: usize, const COUNT: usize> {
    channels: [&'a Channel<T, N, EXT>; COUNT],
}

pub fn select_same<T, const N: usize, const EXT: usize, const COUNT: usize>(
    channels: [&Channel<T, N, EXT>; COUNT],
) -> SelectSame<'_, T, N, EXT, COUNT> {
    SelectSame { channels }
}

impl<T, const N: usize, const EXT: usize, const COUNT: usize> Future for SelectSame<'_, T, N, EXT, COUNT> {
    type Output = Result<(usize, T), Closed>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut all_closed = true;
        for (i, ch) in self.channels.iter().enumerate() {
            match ch.try_receive() {
                TryRecvOutcome::Ready(v) => return Poll::Ready(Ok((i, v))),
                TryRecvOutcome::Closed => {}
                TryRecvOutcome::Empty => all_closed = false,
            }
        }
        if all_closed {
            return Poll::Ready(Err(Closed));
        }
        for ch in self.channels.iter() {
            ch.receive_waker_hint(cx);
        }
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::block_on;

    #[test]
    fn try_select2_returns_none_when_both_empty() {
        let a: Channel<i32, 1> = Channel::new();
        let b: Channel<&str, 1> = Channel::new();
        assert_eq!(try_select2(&a, &b), None);
    }

    #[test]
    fn try_select2_prefers_left_when_both_ready() {
        let a: Channel<i32, 1> = Channel::new();
        let b: Channel<&str, 1> = Channel::new();
        a.try_send(1).unwrap();
        b.try_send("x").unwrap();
        assert_eq!(try_select2(&a, &b), Some(Either::Left(1)));
    }

    #[test]
    fn select2_blocks_until_the_right_side_is_sent() {
        let a: Channel<i32, 1> = Channel::new();
        let b: Channel<&str, 1> = Channel::new();
        b.try_send("hi").unwrap();
        let result = block_on(select2(&a, &b));
        assert_eq!(result, Ok(Either::Right("hi")));
    }

    #[test]
    fn select2_closes_once_both_channels_close() {
        let a: Channel<i32, 1> = Channel::new();
        let b: Channel<&str, 1> = Channel::new();
        a.close();
        b.close();
        assert_eq!(block_on(select2(&a, &b)), Err(Closed));
    }

    #[test]
    fn select_same_reports_the_index_that_fired() {
        let a: Channel<i32, 1> = Channel::new();
        let b: Channel<i32, 1> = Channel::new();
        b.try_send(7).unwrap();
        let result = block_on(select_same([&a, &b]));
        assert_eq!(result, Ok((1, 7)));
    }
}
