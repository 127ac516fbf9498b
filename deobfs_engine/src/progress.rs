//! Deobfs engine: match progress counters.
//!
//! One instance per run, passed by reference into each stage. Atomic so the
//! counters stay coherent if stages ever run on separate threads. Never
//! consulted by matching decisions.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct MatchProgress {
    total: AtomicU64,
    matched_so_far: AtomicU64,
}

impl MatchProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the denominator for this run and reset the matched count.
    pub fn init(&self, total: usize) {
        self.total.store(total as u64, Ordering::SeqCst);
        self.matched_so_far.store(0, Ordering::SeqCst);
    }

    pub fn add_matches(&self, count: usize) {
        self.matched_so_far.fetch_add(count as u64, Ordering::SeqCst);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    pub fn matched(&self) -> u64 {
        self.matched_so_far.load(Ordering::SeqCst)
    }

    /// `matched / total * 100`, or 0 before `init` or with an empty run.
    pub fn progress(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.matched() as f64 / total as f64 * 100.0
    }
}
