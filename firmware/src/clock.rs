//! Bridges `coro-rt`'s abstract [`coro_rt::Clock`] to `embassy_time`'s
//! free-running tick counter, the concrete timer the donor's `sleep_ms`
//! ultimately reads on this target.

pub struct EmbassyClock;

impl coro_rt::Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}
