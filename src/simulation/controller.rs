//! Intersection controller
//!
//! Owns every lane queue, path and light and runs the tick sequence. The
//! order inside a tick is fixed and observable:
//!
//! 1. periodic light updates (held lights are skipped)
//! 2. priority escalation
//! 3. admissions from the feed
//! 4. movement of every active vehicle
//! 5. reclaiming slots of vehicles that arrived
//! 6. snapshot

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};

use super::config::SimConfig;
use super::error::{AdmissionRejected, FeedError, SimError};
use super::feed::{AdmissionRequest, FeedPoll, VehicleFeed};
use super::lane_queue::LaneQueue;
use super::path::{Movement, PathDescriptor, PathTable};
use super::priority::{Escalation, PriorityEscalator};
use super::snapshot::{DisplaySink, LightView, SinkSignal, Snapshot, VehicleView};
use super::stats::SimulationStats;
use super::traffic_light::{light_position, LightBank, TrafficLight, LIGHT_RADIUS};
use super::types::{LaneId, LightId, Road};
use super::vehicle::SimVehicle;

/// A routable lane: its path and the queue of vehicles on it
#[derive(Debug, Clone)]
pub struct ApproachLane {
    pub path: PathDescriptor,
    pub queue: LaneQueue<SimVehicle>,
}

impl ApproachLane {
    /// Vehicles currently on the road
    pub fn live(&self) -> usize {
        self.queue.iter().filter(|v| v.active).count()
    }
}

pub struct IntersectionController {
    config: SimConfig,
    lanes: BTreeMap<LaneId, ApproachLane>,
    lights: LightBank,
    escalator: PriorityEscalator,
    time: Duration,
    tick: u64,
    stats: SimulationStats,
}

impl IntersectionController {
    /// Build a controller with the eight standard paths
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        let paths = PathTable::standard(&config.geometry);
        Self::with_paths(config, paths)
    }

    /// Build a controller over an explicit path table
    pub fn with_paths(config: SimConfig, paths: PathTable) -> Result<Self, SimError> {
        config.validate()?;

        let priority_light = paths.resolve(config.priority_lane)?.light;

        let lanes = paths
            .iter()
            .map(|path| {
                let lane = ApproachLane {
                    path: path.clone(),
                    queue: LaneQueue::new(config.queue_capacity),
                };
                (path.origin, lane)
            })
            .collect();

        let geometry = config.geometry;
        let lights = LightBank::new(Road::ALL.map(|road| {
            let id = LightId(road);
            let settings = config.light(id);
            TrafficLight::new(
                id,
                light_position(id, geometry.screen_width, geometry.screen_height),
                settings.initial,
                settings.duration,
            )
        }));

        let escalator = PriorityEscalator::new(
            config.priority_lane,
            priority_light,
            config.high_water,
            config.low_water,
            config.priority_boost,
        );

        Ok(Self {
            config,
            lanes,
            lights,
            escalator,
            time: Duration::ZERO,
            tick: 0,
            stats: SimulationStats::default(),
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn time(&self) -> Duration {
        self.time
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn lights(&self) -> &LightBank {
        &self.lights
    }

    pub fn escalator(&self) -> &PriorityEscalator {
        &self.escalator
    }

    pub fn lane(&self, lane: LaneId) -> Option<&ApproachLane> {
        self.lanes.get(&lane)
    }

    pub fn lanes(&self) -> impl Iterator<Item = &ApproachLane> {
        self.lanes.values()
    }

    /// Active vehicles on `lane`; zero for lanes without a queue
    pub fn live_count(&self, lane: LaneId) -> usize {
        self.lanes.get(&lane).map_or(0, ApproachLane::live)
    }

    pub fn active_vehicles(&self) -> usize {
        self.lanes.values().map(ApproachLane::live).sum()
    }

    /// Queue a vehicle on its lane and spawn it at the path start
    pub fn admit(&mut self, request: AdmissionRequest) -> Result<(), AdmissionRejected> {
        let Some(lane) = self.lanes.get_mut(&request.lane) else {
            self.stats.rejected_unroutable += 1;
            debug!("Rejected {}: no path from lane {}", request.plate, request.lane);
            return Err(AdmissionRejected::Unroutable(request.lane));
        };

        let vehicle = SimVehicle::spawn(
            request.plate,
            request.priority,
            &lane.path,
            self.config.geometry.vehicle,
            self.config.vehicle_speed,
        );
        if !lane.queue.enqueue(vehicle) {
            self.stats.rejected_full += 1;
            debug!("Rejected {}: lane {} is full", request.plate, request.lane);
            return Err(AdmissionRejected::QueueFull(request.lane));
        }

        self.stats.admitted += 1;
        debug!(
            "Admitted {} into {}{}",
            request.plate,
            request.lane,
            if request.priority { " (priority)" } else { "" }
        );
        Ok(())
    }

    /// Run one tick and return its snapshot
    pub fn tick(&mut self, feed: &mut dyn VehicleFeed) -> Snapshot {
        self.tick += 1;
        self.time += self.config.tick_delta;
        let now = self.time;

        self.lights.update_all(now);

        self.escalate(now);

        let poll = feed.poll(now);
        self.absorb(poll);

        self.move_vehicles();

        for lane in self.lanes.values_mut() {
            lane.queue.reclaim_while(|v| !v.active);
        }

        self.stats.ticks = self.tick;
        self.snapshot()
    }

    fn escalate(&mut self, now: Duration) {
        let lane_id = self.escalator.lane();
        let live = self.live_count(lane_id);
        if self.escalator.evaluate(live, &mut self.lights, now) == Escalation::Engaged {
            self.stats.escalations += 1;
        }

        if let Some(lane) = self.lanes.get_mut(&lane_id) {
            if let Some(plate) = self
                .escalator
                .expedite(lane.queue.iter_mut(), &lane.path.stop_line)
            {
                debug!("Expediting {} on lane {}", plate, lane_id);
                self.stats.boosts += 1;
            }
        }
    }

    fn absorb(&mut self, poll: FeedPoll) {
        self.stats.duplicate_records += poll.duplicates as u64;
        for error in &poll.errors {
            match error {
                FeedError::MalformedRecord { .. } => self.stats.malformed_records += 1,
                FeedError::Unavailable { .. } => self.stats.feed_unavailable += 1,
            }
        }
        for request in poll.requests {
            // Rejections are counted inside admit
            let _ = self.admit(request);
        }
    }

    fn move_vehicles(&mut self) {
        for lane in self.lanes.values_mut() {
            let light = self.lights.state(lane.path.light);
            for vehicle in lane.queue.iter_mut().filter(|v| v.active) {
                if lane.path.advance(vehicle, light) == Movement::Arrived {
                    self.stats.despawned += 1;
                    debug!(
                        "{} reached {} after {:.0}px",
                        vehicle.plate, vehicle.destination, vehicle.travelled
                    );
                }
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let vehicles = self
            .lanes
            .values()
            .flat_map(|lane| lane.queue.iter())
            .filter(|v| v.active)
            .map(|v| VehicleView {
                plate: v.plate,
                lane: v.lane,
                destination: v.destination,
                position: v.position,
                size: v.size,
                priority: v.priority,
                color: v.color(),
            })
            .collect();

        let lights = self
            .lights
            .iter()
            .map(|l| LightView {
                id: l.id,
                position: l.position,
                radius: LIGHT_RADIUS,
                state: l.state(),
                held: l.is_held(),
                priority: l.has_priority(),
            })
            .collect();

        Snapshot {
            tick: self.tick,
            time: self.time,
            vehicles,
            lights,
            override_active: self.escalator.is_engaged(),
        }
    }

    /// Tick until the sink asks to stop, optionally sleeping `pace` between
    /// ticks, then release all queue storage. Returns the released slot count.
    pub fn run(
        &mut self,
        feed: &mut dyn VehicleFeed,
        sink: &mut dyn DisplaySink,
        pace: Option<Duration>,
    ) -> usize {
        loop {
            let snapshot = self.tick(feed);
            if sink.present(&snapshot) == SinkSignal::Shutdown {
                break;
            }
            if let Some(pace) = pace {
                thread::sleep(pace);
            }
        }
        self.shutdown()
    }

    /// Empty every queue. Only called between ticks.
    pub fn shutdown(&mut self) -> usize {
        let released: usize = self.lanes.values_mut().map(|l| l.queue.clear()).sum();
        info!("Released {} queued vehicles on shutdown", released);
        released
    }
}

/// Build a controller, attaching context for the binary's error report
pub fn build_controller(config: SimConfig) -> Result<IntersectionController> {
    IntersectionController::new(config).context("Invalid simulation configuration")
}
