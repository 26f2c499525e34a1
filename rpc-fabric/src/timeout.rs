//! Hierarchical timeout resolution: a per-method override wins over the
//! manager-wide default, which itself defaults to no timeout at all.

fn key(provider_id: u16, method_id: u16) -> u32 {
    (provider_id as u32) << 16 | method_id as u32
}

/// Timeout policy for synchronous calls. `0` (and the absence of a default)
/// both mean "wait forever", matching the donor's `timeout_ms == 0` sentinel.
///
/// Overrides are few in practice (a handful of slow methods at most), so a
/// linear-scan fixed-capacity table is simpler than a hashed one and avoids
/// `heapless::FnvIndexMap`'s power-of-two capacity requirement.
pub struct TimeoutPolicy<const MAX_OVERRIDES: usize> {
    default_ms: u32,
    overrides: heapless::Vec<(u32, u32), MAX_OVERRIDES>,
}

impl<const MAX_OVERRIDES: usize> Default for TimeoutPolicy<MAX_OVERRIDES> {
    fn default() -> Self {
        Self { default_ms: 0, overrides: heapless::Vec::new() }
    }
}

impl<const MAX_OVERRIDES: usize> TimeoutPolicy<MAX_OVERRIDES> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_default(&mut self, timeout_ms: u32) {
        self.default_ms = timeout_ms;
    }

    /// Sets (or replaces) a per-method override. Silently drops the override
    /// if the table is full — callers size `MAX_OVERRIDES` for the number of
    /// methods they actually intend to override, not every method.
    pub fn set_method_timeout(&mut self, provider_id: u16, method_id: u16, timeout_ms: u32) {
        let k = key(provider_id, method_id);
        if let Some(slot) = self.overrides.iter_mut().find(|(existing, _)| *existing == k) {
            slot.1 = timeout_ms;
        } else {
            let _ = self.overrides.push((k, timeout_ms));
        }
    }

    pub fn clear_method_timeout(&mut self, provider_id: u16, method_id: u16) {
        let k = key(provider_id, method_id);
        self.overrides.retain(|(existing, _)| *existing != k);
    }

    /// Resolves the effective timeout in milliseconds for a call, or `None`
    /// for "wait forever".
    pub fn effective(&self, provider_id: u16, method_id: u16) -> Option<u32> {
        let k = key(provider_id, method_id);
        let resolved = match self.overrides.iter().find(|(existing, _)| *existing == k) {
            Some(&(_, ms)) if ms > 0 => ms,
            _ => self.default_ms,
        };
        if resolved == 0 {
            None
        } else {
            Some(resolved)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_override_and_no_default_means_infinite() {
        let policy = TimeoutPolicy::<4>::new();
        assert_eq!(policy.effective(100, 0), None);
    }

    #[test]
    fn manager_default_applies_absent_override() {
        let mut policy = TimeoutPolicy::<4>::new();
        policy.set_default(500);
        assert_eq!(policy.effective(100, 0), Some(500));
    }

    #[test]
    fn per_method_override_wins_over_default() {
        let mut policy = TimeoutPolicy::<4>::new();
        policy.set_default(500);
        policy.set_method_timeout(100, 2, 2000);
        assert_eq!(policy.effective(100, 2), Some(2000));
        assert_eq!(policy.effective(100, 0), Some(500));
    }

    #[test]
    fn clearing_override_reverts_to_default() {
        let mut policy = TimeoutPolicy::<4>::new();
        policy.set_default(500);
        policy.set_method_timeout(100, 2, 2000);
        policy.clear_method_timeout(100, 2);
        assert_eq!(policy.effective(100, 2), Some(500));
    }
}
