//! Table of in-flight client calls awaiting a reply, keyed by call ID.
//!
//! A slot's state is either a fixed-size scratch buffer waiting to be filled
//! by [`PendingCalls::resolve`], or already resolved and waiting to be
//! collected by the caller. There is no `shared_ptr`-backed future here: the
//! synchronous caller just polls `take_if_ready` from the scheduler's own
//! cooperative loop instead of blocking a thread.

use crate::error::RpcError;
use heapless::Vec;

const MAX_REPLY_LEN: usize = 256;

enum Slot {
    Pending,
    Ready(Vec<u8, MAX_REPLY_LEN>),
    Failed(RpcError),
}

struct Entry {
    call_id: u32,
    slot: Slot,
}

/// Fixed-capacity table of outstanding calls. `MAX_PENDING` bounds how many
/// calls may be in flight at once; a call that can't find a free slot fails
/// immediately rather than growing unboundedly, matching the no-heap
/// constraint the rest of the fabric holds to.
pub struct PendingCalls<const MAX_PENDING: usize> {
    entries: heapless::Vec<Entry, MAX_PENDING>,
    next_call_id: u32,
}

impl<const MAX_PENDING: usize> Default for PendingCalls<MAX_PENDING> {
    fn default() -> Self {
        Self { entries: heapless::Vec::new(), next_call_id: 1 }
    }
}

impl<const MAX_PENDING: usize> PendingCalls<MAX_PENDING> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new call ID and registers it as pending. Returns `None`
    /// if the table is full.
    pub fn begin(&mut self) -> Option<u32> {
        let call_id = self.next_call_id;
        self.entries.push(Entry { call_id, slot: Slot::Pending }).ok()?;
        self.next_call_id = self.next_call_id.wrapping_add(1).max(1);
        Some(call_id)
    }

    /// Cancels a pending call without waiting for a reply (used on timeout).
    pub fn cancel(&mut self, call_id: u32) {
        self.entries.retain(|e| e.call_id != call_id);
    }

    /// Feeds a reply payload to its matching pending call. Returns
    /// `UnexpectedCallId` if no pending call has this ID (a duplicate reply,
    /// or one that already timed out and was cancelled).
    pub fn resolve(&mut self, call_id: u32, payload: &[u8]) -> Result<(), RpcError> {
        let entry = self.entries.iter_mut().find(|e| e.call_id == call_id);
        match entry {
            Some(entry) => {
                let mut buf = heapless::Vec::new();
                let slot = if buf.extend_from_slice(payload).is_ok() {
                    Slot::Ready(buf)
                } else {
                    Slot::Failed(RpcError::PayloadTooLarge)
                };
                entry.slot = slot;
                Ok(())
            }
            None => Err(RpcError::UnexpectedCallId),
        }
    }

    /// Non-blocking poll: returns the reply bytes once ready, removing the
    /// entry. Returns `Ok(None)` while still pending.
    pub fn take_if_ready(&mut self, call_id: u32) -> Result<Option<Vec<u8, MAX_REPLY_LEN>>, RpcError> {
        let idx = self.entries.iter().position(|e| e.call_id == call_id);
        let Some(idx) = idx else {
            return Err(RpcError::UnexpectedCallId);
        };
        match &self.entries[idx].slot {
            Slot::Pending => Ok(None),
            Slot::Ready(_) => {
                let entry = self.entries.swap_remove(idx);
                match entry.slot {
                    Slot::Ready(buf) => Ok(Some(buf)),
                    _ => unreachable!(),
                }
            }
            Slot::Failed(err) => {
                let err = *err;
                self.entries.swap_remove(idx);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_then_resolve_then_take() {
        let mut calls = PendingCalls::<4>::new();
        let id = calls.begin().unwrap();
        assert_eq!(calls.take_if_ready(id), Ok(None));
        calls.resolve(id, b"reply").unwrap();
        let reply = calls.take_if_ready(id).unwrap().unwrap();
        assert_eq!(&reply[..], b"reply");
        // Already taken: now unknown.
        assert_eq!(calls.take_if_ready(id), Err(RpcError::UnexpectedCallId));
    }

    #[test]
    fn resolve_of_unknown_call_id_is_an_error() {
        let mut calls = PendingCalls::<4>::new();
        assert_eq!(calls.resolve(999, b"x"), Err(RpcError::UnexpectedCallId));
    }

    #[test]
    fn cancel_removes_pending_entry() {
        let mut calls = PendingCalls::<4>::new();
        let id = calls.begin().unwrap();
        calls.cancel(id);
        assert_eq!(calls.resolve(id, b"late"), Err(RpcError::UnexpectedCallId));
    }

    #[test]
    fn table_full_returns_none_from_begin() {
        let mut calls = PendingCalls::<1>::new();
        assert!(calls.begin().is_some());
        assert!(calls.begin().is_none());
    }
}
