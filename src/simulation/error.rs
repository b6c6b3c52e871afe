//! Error taxonomy for the simulation
//!
//! Admission and feed errors are absorbed by the controller and only show
//! up in counters and logs. Path and configuration errors are fatal and are
//! raised before the tick loop starts.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::types::LaneId;

/// Why an admission request did not make it into a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionRejected {
    #[error("queue for lane {0} is full")]
    QueueFull(LaneId),
    #[error("lane {0} is destination-only and accepts no admissions")]
    Unroutable(LaneId),
}

/// Problems reading the vehicle feed
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("malformed feed record {record:?}: {reason}")]
    MalformedRecord { record: String, reason: &'static str },
    #[error("feed channel {path:?} unavailable: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FeedError {
    pub fn malformed(record: &str, reason: &'static str) -> Self {
        FeedError::MalformedRecord {
            record: record.to_string(),
            reason,
        }
    }
}

/// Fatal simulation errors
#[derive(Debug, Error)]
pub enum SimError {
    #[error("no movement path is defined for lane {0}")]
    InvalidPathConfiguration(LaneId),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Startup configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("low-water mark {low} must not exceed high-water mark {high}")]
    LowAboveHigh { low: usize, high: usize },
    #[error("queue capacity {0} is below the minimum of {min}", min = super::config::MIN_QUEUE_CAPACITY)]
    CapacityTooSmall(usize),
    #[error("high-water mark {high} can never be exceeded with queue capacity {capacity}")]
    HighWaterUnreachable { high: usize, capacity: usize },
    #[error("vehicle speed must be a finite value of at least 1 pixel per tick, got {0}")]
    SpeedTooLow(f32),
    #[error("priority boost must be a finite value of at least 1.0, got {0}")]
    BoostTooLow(f32),
    #[error("{0} must be at least one millisecond")]
    ZeroDuration(&'static str),
    #[error("feed interval range is empty: min {min_ms}ms > max {max_ms}ms")]
    EmptyFeedInterval { min_ms: u64, max_ms: u64 },
    #[error("geometry does not fit: {0}")]
    Geometry(&'static str),
}
