//! Run statistics

use std::time::Duration;

use log::info;

/// Counters for everything the tick loop absorbs instead of failing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub ticks: u64,
    pub admitted: u64,
    /// Requests dropped because the lane queue was full
    pub rejected_full: u64,
    /// Requests for lanes that no path starts from
    pub rejected_unroutable: u64,
    pub malformed_records: u64,
    pub feed_unavailable: u64,
    pub duplicate_records: u64,
    pub despawned: u64,
    pub escalations: u64,
    pub boosts: u64,
}

impl SimulationStats {
    pub fn rejected(&self) -> u64 {
        self.rejected_full + self.rejected_unroutable
    }

    /// Log the end-of-run summary
    pub fn log_summary(&self, elapsed: Duration, released: usize) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Simulated time: {:.2}s", elapsed.as_secs_f32());
        info!("Ticks: {}", self.ticks);
        info!("Total vehicles admitted: {}", self.admitted);
        info!("Total vehicles completed: {}", self.despawned);
        info!("Released at shutdown: {}", released);
        info!(
            "Rejected admissions: {} (queue full {}, unroutable {})",
            self.rejected(),
            self.rejected_full,
            self.rejected_unroutable
        );
        info!(
            "Feed problems: {} malformed, {} unavailable polls, {} duplicates",
            self.malformed_records, self.feed_unavailable, self.duplicate_records
        );
        info!(
            "Priority escalations: {} ({} boosts)",
            self.escalations, self.boosts
        );
        info!(
            "Completion rate: {:.1}%",
            if self.admitted > 0 {
                (self.despawned as f32 / self.admitted as f32) * 100.0
            } else {
                0.0
            }
        );
    }
}
