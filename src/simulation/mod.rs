//! Four-way intersection simulation
//!
//! This module contains all the intersection control logic: lane queues,
//! traffic lights, movement paths, priority escalation and the vehicle
//! feeds. Nothing here renders; a display consumes the per-tick
//! [`Snapshot`] through the [`DisplaySink`] trait.

mod config;
mod controller;
mod error;
mod feed;
mod lane_queue;
mod path;
mod priority;
mod snapshot;
mod stats;
mod traffic_light;
mod types;
mod vehicle;

// Re-export public types for external use
pub use config::{
    FeedConfig, Geometry, LightConfig, SimConfig, DEFAULT_HIGH_WATER, DEFAULT_LOW_WATER,
    DEFAULT_QUEUE_CAPACITY, MIN_QUEUE_CAPACITY,
};
pub use controller::{build_controller, ApproachLane, IntersectionController};
pub use error::{AdmissionRejected, ConfigError, FeedError, SimError};
pub use feed::{
    channel_file_name, AdmissionRequest, FeedPoll, FileFeed, LaneFileWriter, NoFeed, TimerFeed,
    VehicleFeed, VehicleGenerator,
};
pub use lane_queue::LaneQueue;
pub use path::{ExitBoundary, Movement, PathDescriptor, PathTable, StopLine, STOP_WAYPOINT};
pub use priority::{Escalation, PriorityEscalator};
pub use snapshot::{
    ConsoleSink, DisplaySink, LightView, RecordingSink, SinkSignal, Snapshot, VehicleView,
};
pub use stats::SimulationStats;
pub use traffic_light::{light_position, LightBank, LightState, TrafficLight, LIGHT_RADIUS};
pub use types::{Heading, Lane, LaneId, LightId, Plate, Position, Road, Size, PLATE_LEN};
pub use vehicle::{SimVehicle, VehicleColor};
