#![forbid(unsafe_code)]

//! Per-cycle notification summary.

/// What one `notify()` call did.
///
/// Listener and chain failures never reach the owner as errors; they are
/// logged and counted here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyReport {
    /// Chained targets that were invoked (live entries only).
    pub chained: usize,
    /// Chained targets that returned an error or panicked.
    pub chain_failures: usize,
    /// Chain entries whose target had been dropped.
    pub dead_links: usize,
    /// The producer returned `Skipped`; no listener was touched.
    pub skipped: bool,
    /// Listeners that accepted the value.
    pub delivered: usize,
    /// Listeners that returned an error or panicked.
    pub listener_failures: usize,
    /// Nested `notify()` calls into this publisher refused during its chain
    /// phase (chain cycles, self-notifying targets).
    pub reentrant: usize,
}

impl NotifyReport {
    /// No listener or chained target failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.chain_failures == 0 && self.listener_failures == 0
    }

    /// Listeners invoked this cycle, successful or not.
    #[must_use]
    pub fn listeners_invoked(&self) -> usize {
        self.delivered + self.listener_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_clean() {
        let report = NotifyReport::default();
        assert!(report.is_clean());
        assert_eq!(report.listeners_invoked(), 0);
    }

    #[test]
    fn failures_make_it_dirty() {
        let report = NotifyReport {
            delivered: 3,
            listener_failures: 1,
            ..NotifyReport::default()
        };
        assert!(!report.is_clean());
        assert_eq!(report.listeners_invoked(), 4);
    }
}
