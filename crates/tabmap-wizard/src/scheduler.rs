//! Debounced suggestion recomputation.
//!
//! Mutations mark the session dirty; suggestions are rebuilt once no change
//! has happened for `coalesce_ms`. Skipping the debounce only changes when
//! suggestions are rebuilt, never what they contain.

use std::time::Instant;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecomputeConfig {
    /// Quiet period after the last change before recomputing.
    pub coalesce_ms: u64,
}

impl Default for RecomputeConfig {
    fn default() -> Self {
        Self { coalesce_ms: 150 }
    }
}

impl RecomputeConfig {
    /// Recompute on the first poll after every change.
    pub fn immediate() -> Self {
        Self { coalesce_ms: 0 }
    }
}

/// Tracks whether cached suggestions are stale.
#[derive(Debug, Clone, Default)]
pub struct RecomputeScheduler {
    dirty: bool,
    last_change: Option<Instant>,
    /// Number of changes coalesced since the last recompute.
    pending_changes: usize,
}

impl RecomputeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn pending_changes(&self) -> usize {
        self.pending_changes
    }

    pub fn mark_dirty(&mut self) {
        self.mark_dirty_at(Instant::now());
    }

    pub fn mark_dirty_at(&mut self, now: Instant) {
        self.dirty = true;
        self.last_change = Some(now);
        self.pending_changes += 1;
    }

    pub fn is_due(&self, config: &RecomputeConfig) -> bool {
        self.is_due_at(config, Instant::now())
    }

    /// Whether the coalescing window after the last change has passed.
    pub fn is_due_at(&self, config: &RecomputeConfig, now: Instant) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_change {
            Some(changed) => {
                now.saturating_duration_since(changed).as_millis() >= u128::from(config.coalesce_ms)
            }
            None => true,
        }
    }

    /// Record that suggestions were rebuilt.
    pub fn recomputed(&mut self) {
        self.dirty = false;
        self.last_change = None;
        self.pending_changes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn clean_scheduler_is_never_due() {
        let scheduler = RecomputeScheduler::new();
        assert!(!scheduler.is_due(&RecomputeConfig::immediate()));
    }

    #[test]
    fn rapid_changes_coalesce_into_one_recompute() {
        let config = RecomputeConfig::default();
        let start = Instant::now();
        let mut scheduler = RecomputeScheduler::new();

        scheduler.mark_dirty_at(start);
        scheduler.mark_dirty_at(start + Duration::from_millis(100));
        scheduler.mark_dirty_at(start + Duration::from_millis(200));
        assert_eq!(scheduler.pending_changes(), 3);

        // Window restarts on each change.
        assert!(!scheduler.is_due_at(&config, start + Duration::from_millis(300)));
        assert!(scheduler.is_due_at(&config, start + Duration::from_millis(350)));

        scheduler.recomputed();
        assert!(!scheduler.is_dirty());
        assert!(!scheduler.is_due_at(&config, start + Duration::from_secs(10)));
    }

    #[test]
    fn immediate_config_is_due_right_away() {
        let mut scheduler = RecomputeScheduler::new();
        scheduler.mark_dirty();
        assert!(scheduler.is_due(&RecomputeConfig::immediate()));
    }
}
