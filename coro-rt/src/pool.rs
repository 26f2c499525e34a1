//! Host-only extensions: offloading a blocking closure to a real OS thread,
//! and waiting on file descriptor readiness. Both only make sense with an
//! OS underneath, so this module is `std`-gated; firmware builds never pull
//! it in.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};
use std::sync::{Arc, Mutex};
use std::thread;

/// Handle a thread spawned by [`exec_thread`] uses to wake whoever is
/// `.await`ing its completion, mirroring the bridge the external-send path
/// on [`crate::channel::Channel`] uses for the same interrupt-to-async
/// handoff, just across an OS thread instead of an interrupt.
#[derive(Clone)]
pub struct Monitor {
    waker: Arc<Mutex<Option<Waker>>>,
}

impl Monitor {
    pub fn wake(&self) {
        if let Some(w) = self.waker.lock().unwrap().take() {
            w.wake();
        }
    }
}

struct Shared<T> {
    result: Mutex<Option<T>>,
    waker: Arc<Mutex<Option<Waker>>>,
}

/// Runs `f` on a dedicated OS thread and returns a future that resolves to
/// its return value once the thread finishes. `f` receives a [`Monitor`] it
/// can use to wake the awaiting task early instead of relying solely on
/// re-polling.
pub fn exec_thread<T, F>(f: F) -> ThreadTask<T>
where
    T: Send + 'static,
    F: FnOnce(Monitor) -> T + Send + 'static,
{
    let waker = Arc::new(Mutex::new(None));
    let shared = Arc::new(Shared { result: Mutex::new(None), waker: waker.clone() });

    let spawned = shared.clone();
    thread::spawn(move || {
        let monitor = Monitor { waker: waker.clone() };
        let result = f(monitor);
        *spawned.result.lock().unwrap() = Some(result);
        if let Some(w) = waker.lock().unwrap().take() {
            w.wake();
        }
    });

    ThreadTask { shared }
}

pub struct ThreadTask<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Future for ThreadTask<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        if let Some(v) = self.shared.result.lock().unwrap().take() {
            return Poll::Ready(v);
        }
        *self.shared.waker.lock().unwrap() = Some(cx.waker().clone());
        Poll::Pending
    }
}

/// Bit flags for [`wait_file`], matching `poll(2)`'s readable/writable bits.
pub const READABLE: i32 = libc::POLLIN;
pub const WRITABLE: i32 = libc::POLLOUT;

/// Waits for `fd` to become ready for any of the events in `mode_bit_flags`
/// (a combination of [`READABLE`]/[`WRITABLE`]). Resolves to the subset of
/// requested events that are actually ready.
pub fn wait_file(fd: i32, mode_bit_flags: i32) -> WaitFile {
    WaitFile { fd, mode_bit_flags }
}

pub struct WaitFile {
    fd: i32,
    mode_bit_flags: i32,
}

impl Future for WaitFile {
    type Output = i32;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<i32> {
        let mut pfd = libc::pollfd { fd: self.fd, events: self.mode_bit_flags as i16, revents: 0 };
        // SAFETY: `pfd` is a single valid pollfd on the stack, `timeout` of 0
        // makes this call non-blocking so it's safe to call from inside poll().
        let ready = unsafe { libc::poll(&mut pfd, 1, 0) };
        let revents = pfd.revents as i32 & self.mode_bit_flags;
        if ready > 0 && revents != 0 {
            Poll::Ready(revents)
        } else {
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::block_on;

    #[test]
    fn exec_thread_returns_the_closure_result() {
        let result = block_on(exec_thread(|_monitor| 2 + 2));
        assert_eq!(result, 4);
    }

    #[test]
    fn wait_file_resolves_once_a_pipe_has_data() {
        let mut fds = [0i32; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let [read_fd, write_fd] = fds;
        let byte = [1u8];
        assert_eq!(unsafe { libc::write(write_fd, byte.as_ptr() as *const _, 1) }, 1);

        let revents = block_on(wait_file(read_fd, READABLE));
        assert_eq!(revents, READABLE);

        unsafe {
            libc::close(read_fd);
            libc::close(write_fd);
        }
    }
}
