//! Simulation configuration
//!
//! Everything tunable lives in [`SimConfig`]. The binary builds one from
//! command line flags; tests usually start from `SimConfig::default()` and
//! tweak a field or two. `validate` is the single fail-fast gate before a
//! controller is built.

use std::time::Duration;

use super::error::ConfigError;
use super::traffic_light::LightState;
use super::types::{Lane, LaneId, LightId, Road, Size};

/// Smallest queue capacity accepted
pub const MIN_QUEUE_CAPACITY: usize = 10;

/// Default per-lane queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default high-water mark for priority escalation
pub const DEFAULT_HIGH_WATER: usize = 5;

/// Default low-water mark for releasing priority escalation
pub const DEFAULT_LOW_WATER: usize = 3;

/// Screen and lane geometry used to compute path boundaries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub screen_width: f32,
    pub screen_height: f32,
    pub lane_width: f32,
    pub vehicle: Size,
}

impl Default for Geometry {
    fn default() -> Self {
        let screen_width = 1000.0;
        Self {
            screen_width,
            screen_height: 800.0,
            lane_width: screen_width / 9.0,
            vehicle: Size::new(40.0, 40.0),
        }
    }
}

impl Geometry {
    /// Left edge of the intersection box
    pub fn left(&self) -> f32 {
        self.screen_width / 3.0
    }

    /// Right edge of the intersection box
    pub fn right(&self) -> f32 {
        self.left() + 3.0 * self.lane_width
    }

    /// Top edge of the intersection box
    pub fn top(&self) -> f32 {
        self.screen_height / 3.0
    }

    /// Bottom edge of the intersection box
    pub fn bottom(&self) -> f32 {
        self.top() + 3.0 * self.lane_width
    }

    /// X coordinate of a vehicle centred in vertical lane column `col` (0..3)
    pub fn column_x(&self, col: u8) -> f32 {
        self.left() + f32::from(col) * self.lane_width + (self.lane_width - self.vehicle.width) / 2.0
    }

    /// Y coordinate of a vehicle centred in horizontal lane row `row` (0..3)
    pub fn row_y(&self, row: u8) -> f32 {
        self.top() + f32::from(row) * self.lane_width + (self.lane_width - self.vehicle.height) / 2.0
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let dimensions = [
            self.screen_width,
            self.screen_height,
            self.lane_width,
            self.vehicle.width,
            self.vehicle.height,
        ];
        if !dimensions.iter().all(|d| d.is_finite()) {
            return Err(ConfigError::Geometry("dimensions must be finite numbers"));
        }
        if self.vehicle.width <= 0.0 || self.vehicle.height <= 0.0 {
            return Err(ConfigError::Geometry("vehicle size must be positive"));
        }
        if self.vehicle.width > self.lane_width || self.vehicle.height > self.lane_width {
            return Err(ConfigError::Geometry("vehicle is wider than a lane"));
        }
        if self.right() > self.screen_width || self.bottom() > self.screen_height {
            return Err(ConfigError::Geometry("intersection box exceeds the screen"));
        }
        if self.left() < self.vehicle.width || self.top() < self.vehicle.height {
            return Err(ConfigError::Geometry("no room for an approach segment"));
        }
        Ok(())
    }
}

/// Timing and starting state of one traffic light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightConfig {
    pub duration: Duration,
    pub initial: LightState,
}

/// Settings for the in-process vehicle generator
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Shortest gap between generated vehicles
    pub min_interval: Duration,
    /// Longest gap between generated vehicles
    pub max_interval: Duration,
    /// Number of A2 records after which new A2 records carry priority
    pub priority_threshold: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(3),
            priority_threshold: 10,
        }
    }
}

/// Full simulation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub geometry: Geometry,
    pub queue_capacity: usize,
    /// Per-road light settings, indexed by `Road::index`
    pub lights: [LightConfig; 4],
    pub priority_lane: LaneId,
    pub high_water: usize,
    pub low_water: usize,
    /// Speed multiplier applied to the vehicle being expedited
    pub priority_boost: f32,
    /// Vehicle speed in pixels per tick
    pub vehicle_speed: f32,
    /// Simulated time per tick
    pub tick_delta: Duration,
    pub feed: FeedConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        let light = |initial| LightConfig {
            duration: Duration::from_secs(5),
            initial,
        };
        Self {
            geometry: Geometry::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            // North/south and east/west run in opposite phases
            lights: [
                light(LightState::Red),
                light(LightState::Red),
                light(LightState::Green),
                light(LightState::Green),
            ],
            priority_lane: LaneId::new(Road::A, Lane::Middle),
            high_water: DEFAULT_HIGH_WATER,
            low_water: DEFAULT_LOW_WATER,
            priority_boost: 2.0,
            vehicle_speed: 4.0,
            tick_delta: Duration::from_millis(30),
            feed: FeedConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn light(&self, id: LightId) -> &LightConfig {
        &self.lights[id.0.index()]
    }

    /// Set the same toggle duration on every light
    pub fn with_light_duration(mut self, duration: Duration) -> Self {
        for light in &mut self.lights {
            light.duration = duration;
        }
        self
    }

    /// Check the configuration for missing or contradictory values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geometry.validate()?;

        if self.queue_capacity < MIN_QUEUE_CAPACITY {
            return Err(ConfigError::CapacityTooSmall(self.queue_capacity));
        }
        if self.low_water > self.high_water {
            return Err(ConfigError::LowAboveHigh {
                low: self.low_water,
                high: self.high_water,
            });
        }
        if self.high_water >= self.queue_capacity {
            return Err(ConfigError::HighWaterUnreachable {
                high: self.high_water,
                capacity: self.queue_capacity,
            });
        }
        // Written so that NaN fails too
        if !(self.vehicle_speed.is_finite() && self.vehicle_speed >= 1.0) {
            return Err(ConfigError::SpeedTooLow(self.vehicle_speed));
        }
        if !(self.priority_boost.is_finite() && self.priority_boost >= 1.0) {
            return Err(ConfigError::BoostTooLow(self.priority_boost));
        }
        if self.tick_delta.is_zero() {
            return Err(ConfigError::ZeroDuration("tick delta"));
        }
        if self.lights.iter().any(|l| l.duration.is_zero()) {
            return Err(ConfigError::ZeroDuration("light duration"));
        }
        // The generator works in whole milliseconds
        if self.feed.min_interval.as_millis() == 0 {
            return Err(ConfigError::ZeroDuration("feed interval"));
        }
        if self.feed.min_interval > self.feed.max_interval {
            return Err(ConfigError::EmptyFeedInterval {
                min_ms: self.feed.min_interval.as_millis() as u64,
                max_ms: self.feed.max_interval.as_millis() as u64,
            });
        }
        Ok(())
    }
}
