//! Per-tick snapshot handed to the display sink
//!
//! The sink only ever sees this read-only view. It answers with a
//! [`SinkSignal`], which is how a display asks the loop to stop.

use std::time::Duration;

use log::info;

use super::traffic_light::LightState;
use super::types::{LaneId, LightId, Plate, Position, Road, Size};
use super::vehicle::VehicleColor;

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleView {
    pub plate: Plate,
    pub lane: LaneId,
    pub destination: LaneId,
    pub position: Position,
    pub size: Size,
    pub priority: bool,
    pub color: VehicleColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightView {
    pub id: LightId,
    pub position: Position,
    pub radius: f32,
    pub state: LightState,
    pub held: bool,
    pub priority: bool,
}

/// Immutable state of the intersection at the end of a tick
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tick: u64,
    pub time: Duration,
    pub vehicles: Vec<VehicleView>,
    pub lights: Vec<LightView>,
    pub override_active: bool,
}

impl Snapshot {
    pub fn light(&self, id: LightId) -> Option<&LightView> {
        self.lights.iter().find(|l| l.id == id)
    }

    pub fn light_state(&self, road: Road) -> Option<LightState> {
        self.light(LightId(road)).map(|l| l.state)
    }

    /// Active vehicles on `lane`
    pub fn live_in(&self, lane: LaneId) -> usize {
        self.vehicles.iter().filter(|v| v.lane == lane).count()
    }

    pub fn vehicle(&self, plate: Plate) -> Option<&VehicleView> {
        self.vehicles.iter().find(|v| v.plate == plate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkSignal {
    Continue,
    Shutdown,
}

/// Consumer of per-tick snapshots
pub trait DisplaySink {
    fn present(&mut self, snapshot: &Snapshot) -> SinkSignal;
}

/// Text display for headless runs.
///
/// Logs a summary every `report_every` ticks and asks for shutdown after
/// `max_ticks`.
pub struct ConsoleSink {
    max_ticks: Option<u64>,
    report_every: u64,
}

impl ConsoleSink {
    pub fn new(max_ticks: Option<u64>, report_every: u64) -> Self {
        Self {
            max_ticks,
            report_every: report_every.max(1),
        }
    }

    fn report(&self, snapshot: &Snapshot) {
        info!(
            "--- Tick {} ({:.1}s simulated) ---",
            snapshot.tick,
            snapshot.time.as_secs_f32()
        );
        let lights: Vec<String> = snapshot
            .lights
            .iter()
            .map(|l| {
                let marker = match (l.held, l.priority) {
                    (true, true) => "*",
                    (true, false) => "!",
                    _ => "",
                };
                format!("{}={}{}", l.id.0, l.state, marker)
            })
            .collect();
        info!("Lights: {}", lights.join(" "));

        let mut lanes: Vec<(LaneId, usize)> = Vec::new();
        for vehicle in &snapshot.vehicles {
            match lanes.iter_mut().find(|(lane, _)| *lane == vehicle.lane) {
                Some((_, count)) => *count += 1,
                None => lanes.push((vehicle.lane, 1)),
            }
        }
        lanes.sort();
        let lanes: Vec<String> = lanes
            .iter()
            .map(|(lane, count)| format!("{}:{}", lane, count))
            .collect();
        info!(
            "Vehicles: {} [{}]{}",
            snapshot.vehicles.len(),
            lanes.join(" "),
            if snapshot.override_active {
                " PRIORITY"
            } else {
                ""
            }
        );
    }
}

impl DisplaySink for ConsoleSink {
    fn present(&mut self, snapshot: &Snapshot) -> SinkSignal {
        if snapshot.tick % self.report_every == 0 {
            self.report(snapshot);
        }
        match self.max_ticks {
            Some(max) if snapshot.tick >= max => SinkSignal::Shutdown,
            _ => SinkSignal::Continue,
        }
    }
}

/// Keeps every snapshot; shuts down after a fixed number of ticks
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub snapshots: Vec<Snapshot>,
    stop_after: usize,
}

impl RecordingSink {
    pub fn new(stop_after: usize) -> Self {
        Self {
            snapshots: Vec::with_capacity(stop_after),
            stop_after,
        }
    }
}

impl DisplaySink for RecordingSink {
    fn present(&mut self, snapshot: &Snapshot) -> SinkSignal {
        self.snapshots.push(snapshot.clone());
        if self.snapshots.len() >= self.stop_after {
            SinkSignal::Shutdown
        } else {
            SinkSignal::Continue
        }
    }
}
