//! Per-vehicle state

use super::path::PathDescriptor;
use super::types::{LaneId, Plate, Position, Size};

/// Display color derived from the vehicle flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleColor {
    Standard,
    Priority,
}

/// A vehicle admitted into a lane queue
#[derive(Debug, Clone)]
pub struct SimVehicle {
    pub plate: Plate,
    pub lane: LaneId,
    pub destination: LaneId,
    pub priority: bool,
    /// Visible and subject to movement. Cleared for good on arrival.
    pub active: bool,
    pub position: Position,
    pub size: Size,
    /// Pixels per tick
    pub speed: f32,
    /// Speed multiplier for the current tick only
    pub boost: f32,
    /// Index of the next waypoint on the path
    pub next_waypoint: usize,
    /// Pixels covered since spawning
    pub travelled: f32,
}

impl SimVehicle {
    /// Spawn a vehicle at the start of `path`
    pub fn spawn(plate: Plate, priority: bool, path: &PathDescriptor, size: Size, speed: f32) -> Self {
        Self {
            plate,
            lane: path.origin,
            destination: path.destination,
            priority,
            active: true,
            position: path.spawn,
            size,
            speed,
            boost: 1.0,
            next_waypoint: 0,
            travelled: 0.0,
        }
    }

    pub fn effective_speed(&self) -> f32 {
        self.speed * self.boost
    }

    pub fn has_left_spawn(&self) -> bool {
        self.travelled > 0.0
    }

    pub fn despawn(&mut self) {
        self.active = false;
        self.boost = 1.0;
    }

    pub fn color(&self) -> VehicleColor {
        if self.priority {
            VehicleColor::Priority
        } else {
            VehicleColor::Standard
        }
    }
}
