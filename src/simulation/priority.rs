//! Priority escalation for a backlogged lane
//!
//! When the watched lane holds more than `high_water` live vehicles its
//! light is pinned green and every other light red. The override stays on
//! until the count drops to `low_water` or below. While engaged, the
//! vehicle nearest the stop line gets a one-tick speed boost.

use std::time::Duration;

use log::info;
use ordered_float::OrderedFloat;

use super::path::StopLine;
use super::traffic_light::LightBank;
use super::types::{LaneId, LightId, Plate};
use super::vehicle::SimVehicle;

/// What the escalator did on one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Not engaged and no reason to engage
    Idle,
    /// Override switched on this tick
    Engaged,
    /// Override still on
    Holding,
    /// Override switched off this tick
    Released,
}

#[derive(Debug, Clone)]
pub struct PriorityEscalator {
    lane: LaneId,
    light: LightId,
    high_water: usize,
    low_water: usize,
    boost: f32,
    engaged: bool,
    engagements: u64,
}

impl PriorityEscalator {
    pub fn new(lane: LaneId, light: LightId, high_water: usize, low_water: usize, boost: f32) -> Self {
        Self {
            lane,
            light,
            high_water,
            low_water,
            boost,
            engaged: false,
            engagements: 0,
        }
    }

    pub fn lane(&self) -> LaneId {
        self.lane
    }

    pub fn light(&self) -> LightId {
        self.light
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Times the override has been switched on
    pub fn engagements(&self) -> u64 {
        self.engagements
    }

    /// Apply the hysteresis rule to the lane's live vehicle count
    pub fn evaluate(&mut self, live: usize, lights: &mut LightBank, now: Duration) -> Escalation {
        if self.engaged {
            if live <= self.low_water {
                self.engaged = false;
                lights.release_all();
                info!(
                    "Priority released for lane {} ({} live <= low-water {})",
                    self.lane, live, self.low_water
                );
                return Escalation::Released;
            }
            return Escalation::Holding;
        }

        if live > self.high_water {
            self.engaged = true;
            self.engagements += 1;
            lights.force_priority(self.light, now);
            info!(
                "Priority engaged for lane {} ({} live > high-water {})",
                self.lane, live, self.high_water
            );
            return Escalation::Engaged;
        }

        Escalation::Idle
    }

    /// Boost the active vehicle closest to the stop line for one tick.
    ///
    /// Only vehicles that have left the spawn point and not yet crossed
    /// the line are candidates. Returns the boosted plate, if any.
    pub fn expedite<'a>(
        &self,
        vehicles: impl Iterator<Item = &'a mut SimVehicle>,
        stop_line: &StopLine,
    ) -> Option<Plate> {
        if !self.engaged {
            return None;
        }
        let closest = vehicles
            .filter(|v| v.active && v.has_left_spawn())
            .filter(|v| !stop_line.crossed(&v.position, &v.size))
            .min_by_key(|v| OrderedFloat(stop_line.distance(&v.position, &v.size)))?;
        closest.boost = self.boost;
        Some(closest.plate)
    }
}
