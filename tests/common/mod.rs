//! Helpers shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use junction_sim::simulation::{
    AdmissionRequest, FeedPoll, Lane, LaneId, LightState, Plate, Road, SimConfig, VehicleFeed,
};

/// Plate `TEST0000` + n, e.g. `TEST0007`
pub fn plate(n: u32) -> Plate {
    format!("TEST{:04}", n).parse().expect("test plates are valid")
}

pub fn request(n: u32, road: Road, lane: Lane) -> AdmissionRequest {
    AdmissionRequest {
        plate: plate(n),
        lane: LaneId::new(road, lane),
        priority: false,
    }
}

/// Config whose lights never toggle on their own during a test
pub fn frozen_lights(states: [LightState; 4]) -> SimConfig {
    let mut config = SimConfig::default().with_light_duration(Duration::from_secs(3600));
    for (light, state) in config.lights.iter_mut().zip(states) {
        light.initial = state;
    }
    config
}

pub fn all_green() -> SimConfig {
    frozen_lights([LightState::Green; 4])
}

pub fn all_red() -> SimConfig {
    frozen_lights([LightState::Red; 4])
}

/// Feed that releases requests on fixed poll numbers (1-based, one poll per tick)
#[derive(Default)]
pub struct ScriptedFeed {
    polls: u64,
    script: VecDeque<(u64, AdmissionRequest)>,
}

impl ScriptedFeed {
    pub fn new(script: Vec<(u64, AdmissionRequest)>) -> Self {
        Self {
            polls: 0,
            script: script.into(),
        }
    }
}

impl VehicleFeed for ScriptedFeed {
    fn poll(&mut self, _now: Duration) -> FeedPoll {
        self.polls += 1;
        let mut poll = FeedPoll::default();
        while let Some((due, _)) = self.script.front() {
            if *due > self.polls {
                break;
            }
            if let Some((_, request)) = self.script.pop_front() {
                poll.requests.push(request);
            }
        }
        poll
    }
}

/// Fresh, empty scratch directory for one test
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("junction_sim_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}
