//! Controller construction, admission and the tick loop

mod common;

use std::time::Duration;

use junction_sim::simulation::{
    build_controller, AdmissionRejected, ConfigError, ConsoleSink, DisplaySink, FileFeed,
    IntersectionController, Lane, LaneFileWriter, LaneId, LightState, NoFeed, PathTable,
    RecordingSink, Road, SimConfig, SimError, SinkSignal, TimerFeed, VehicleColor,
    VehicleGenerator, MIN_QUEUE_CAPACITY,
};

use common::{all_red, plate, request, scratch_dir, ScriptedFeed};

#[test]
fn test_default_config_is_valid() {
    let config = SimConfig::default();
    assert!(config.validate().is_ok());
    assert!(config.low_water <= config.high_water);
    assert!(config.queue_capacity >= MIN_QUEUE_CAPACITY);
}

#[test]
fn test_low_above_high_fails_fast() {
    let mut config = SimConfig::default();
    config.high_water = 3;
    config.low_water = 4;
    match IntersectionController::new(config) {
        Err(SimError::Config(ConfigError::LowAboveHigh { low: 4, high: 3 })) => {}
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("contradictory marks accepted"),
    }
}

#[test]
fn test_equal_marks_are_accepted() {
    let mut config = SimConfig::default();
    config.high_water = 4;
    config.low_water = 4;
    assert!(IntersectionController::new(config).is_ok());
}

#[test]
fn test_invalid_configs_are_rejected() {
    let cases: [(fn(&mut SimConfig), ConfigError); 9] = [
        (|c| c.queue_capacity = 5, ConfigError::CapacityTooSmall(5)),
        (
            |c| c.high_water = c.queue_capacity,
            ConfigError::HighWaterUnreachable {
                high: 100,
                capacity: 100,
            },
        ),
        (|c| c.vehicle_speed = 0.5, ConfigError::SpeedTooLow(0.5)),
        (|c| c.priority_boost = 0.0, ConfigError::BoostTooLow(0.0)),
        (|c| c.tick_delta = Duration::ZERO, ConfigError::ZeroDuration("tick delta")),
        (
            |c| c.lights[2].duration = Duration::ZERO,
            ConfigError::ZeroDuration("light duration"),
        ),
        (
            |c| c.feed.min_interval = Duration::from_secs(5),
            ConfigError::EmptyFeedInterval {
                min_ms: 5000,
                max_ms: 3000,
            },
        ),
        (
            |c| {
                c.feed.min_interval = Duration::from_micros(500);
                c.feed.max_interval = Duration::from_micros(900);
            },
            ConfigError::ZeroDuration("feed interval"),
        ),
        (
            |c| c.geometry.lane_width = 30.0,
            ConfigError::Geometry("vehicle is wider than a lane"),
        ),
    ];

    for (tweak, expected) in cases {
        let mut config = SimConfig::default();
        tweak(&mut config);
        assert_eq!(config.validate(), Err(expected));
    }
}

/// NaN slips through plain `<` comparisons, so check it explicitly
#[test]
fn test_non_finite_values_are_rejected() {
    let mut config = SimConfig::default();
    config.vehicle_speed = f32::NAN;
    assert!(matches!(config.validate(), Err(ConfigError::SpeedTooLow(_))));

    config.vehicle_speed = f32::INFINITY;
    assert!(matches!(config.validate(), Err(ConfigError::SpeedTooLow(_))));

    let mut config = SimConfig::default();
    config.priority_boost = f32::NAN;
    assert!(matches!(config.validate(), Err(ConfigError::BoostTooLow(_))));

    let tweaks: [fn(&mut SimConfig); 3] = [
        |c| c.geometry.lane_width = f32::NAN,
        |c| c.geometry.screen_width = f32::INFINITY,
        |c| c.geometry.vehicle.height = f32::NAN,
    ];
    for tweak in tweaks {
        let mut config = SimConfig::default();
        tweak(&mut config);
        assert!(matches!(config.validate(), Err(ConfigError::Geometry(_))));
    }

    let mut config = SimConfig::default();
    config.vehicle_speed = f32::NAN;
    assert!(IntersectionController::new(config).is_err());
}

#[test]
fn test_build_controller_reports_context() {
    let mut config = SimConfig::default();
    config.low_water = 9;
    let err = build_controller(config).err().expect("should fail");
    let report = format!("{:#}", err);
    assert!(report.contains("Invalid simulation configuration"), "{}", report);
    assert!(report.contains("low-water mark 9"), "{}", report);
}

#[test]
fn test_missing_priority_path_is_fatal() {
    match IntersectionController::with_paths(SimConfig::default(), PathTable::default()) {
        Err(SimError::InvalidPathConfiguration(lane)) => {
            assert_eq!(lane, LaneId::new(Road::A, Lane::Middle));
        }
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("controller built without paths"),
    }
}

#[test]
fn test_every_routable_lane_gets_a_queue() {
    let controller = IntersectionController::new(SimConfig::default()).unwrap();
    assert_eq!(controller.lanes().count(), 8);
    for road in Road::ALL {
        assert!(controller.lane(LaneId::new(road, Lane::Outer)).is_none());
        assert!(controller.lane(LaneId::new(road, Lane::Middle)).is_some());
        assert!(controller.lane(LaneId::new(road, Lane::Incoming)).is_some());
    }
}

#[test]
fn test_lane_one_admission_is_unroutable() {
    let mut controller = IntersectionController::new(SimConfig::default()).unwrap();
    let result = controller.admit(request(1, Road::C, Lane::Outer));
    assert_eq!(
        result,
        Err(AdmissionRejected::Unroutable(LaneId::new(Road::C, Lane::Outer)))
    );
    assert_eq!(controller.stats().rejected_unroutable, 1);
    assert_eq!(controller.stats().admitted, 0);
    assert_eq!(controller.active_vehicles(), 0);
}

#[test]
fn test_full_queue_drops_request() {
    let mut config = all_red();
    config.queue_capacity = MIN_QUEUE_CAPACITY;
    let mut controller = IntersectionController::new(config).unwrap();
    let lane = LaneId::new(Road::B, Lane::Incoming);

    for n in 0..MIN_QUEUE_CAPACITY as u32 {
        assert!(controller.admit(request(n, Road::B, Lane::Incoming)).is_ok());
    }
    assert_eq!(
        controller.admit(request(99, Road::B, Lane::Incoming)),
        Err(AdmissionRejected::QueueFull(lane))
    );
    assert_eq!(controller.lane(lane).unwrap().queue.len(), MIN_QUEUE_CAPACITY);
    assert_eq!(controller.stats().rejected_full, 1);
    assert_eq!(controller.stats().rejected(), 1);

    // The loop keeps going after a drop
    let snapshot = controller.tick(&mut NoFeed);
    assert_eq!(snapshot.live_in(lane), MIN_QUEUE_CAPACITY);
    assert!(snapshot.vehicle(plate(99)).is_none());
}

#[test]
fn test_priority_vehicles_are_colored() {
    let mut controller = IntersectionController::new(SimConfig::default()).unwrap();
    let mut vip = request(1, Road::A, Lane::Middle);
    vip.priority = true;
    controller.admit(vip).unwrap();
    controller.admit(request(2, Road::A, Lane::Middle)).unwrap();

    let snapshot = controller.tick(&mut NoFeed);
    assert_eq!(snapshot.vehicle(plate(1)).unwrap().color, VehicleColor::Priority);
    assert_eq!(snapshot.vehicle(plate(2)).unwrap().color, VehicleColor::Standard);
}

#[test]
fn test_tick_advances_time() {
    let mut controller = IntersectionController::new(SimConfig::default()).unwrap();
    for _ in 0..10 {
        controller.tick(&mut NoFeed);
    }
    assert_eq!(controller.tick_count(), 10);
    assert_eq!(controller.time(), Duration::from_millis(300));
    assert_eq!(controller.stats().ticks, 10);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.tick, 10);
    assert_eq!(snapshot.lights.len(), 4);
    assert!(snapshot.lights.iter().all(|l| l.radius == 15.0));
}

#[test]
fn test_default_lights_alternate() {
    let mut controller = IntersectionController::new(SimConfig::default()).unwrap();
    let mut sink = RecordingSink::new(400);
    controller.run(&mut NoFeed, &mut sink, None);

    // 5s lights at 30ms per tick toggle on tick 167 (5.01s)
    let before = &sink.snapshots[165];
    let after = &sink.snapshots[166];
    assert_eq!(before.tick, 166);
    assert_eq!(before.light_state(Road::A), Some(LightState::Red));
    assert_eq!(before.light_state(Road::C), Some(LightState::Green));
    assert_eq!(after.light_state(Road::A), Some(LightState::Green));
    assert_eq!(after.light_state(Road::C), Some(LightState::Red));
}

#[test]
fn test_run_stops_on_sink_signal_and_releases_slots() {
    let mut controller = IntersectionController::new(all_red()).unwrap();
    let script = (0..6)
        .map(|i| {
            let road = Road::ALL[i as usize % 4];
            (1, request(i, road, Lane::Middle))
        })
        .collect();
    let mut feed = ScriptedFeed::new(script);
    let mut sink = RecordingSink::new(25);

    let released = controller.run(&mut feed, &mut sink, None);
    assert_eq!(sink.snapshots.len(), 25);
    assert_eq!(controller.tick_count(), 25);
    assert_eq!(released, 6);
    assert_eq!(controller.active_vehicles(), 0);
    assert!(controller.lanes().all(|l| l.queue.is_empty()));
}

#[test]
fn test_arrived_vehicles_free_their_slot() {
    let mut controller = IntersectionController::new(common::all_green()).unwrap();
    let lane = LaneId::new(Road::C, Lane::Middle);
    controller.admit(request(1, Road::C, Lane::Middle)).unwrap();
    assert_eq!(controller.lane(lane).unwrap().queue.len(), 1);

    for _ in 0..400 {
        controller.tick(&mut NoFeed);
    }
    assert_eq!(controller.lane(lane).unwrap().queue.len(), 0);
    assert_eq!(controller.stats().despawned, 1);
    assert_eq!(controller.shutdown(), 0);
}

#[test]
fn test_console_sink_stops_after_max_ticks() {
    let mut controller = IntersectionController::new(SimConfig::default()).unwrap();
    let mut sink = ConsoleSink::new(Some(12), 5);
    controller.run(&mut NoFeed, &mut sink, None);
    assert_eq!(controller.tick_count(), 12);

    let mut open_ended = ConsoleSink::new(None, 0);
    assert_eq!(open_ended.present(&controller.snapshot()), SinkSignal::Continue);
}

#[test]
fn test_generated_traffic_flows() {
    let config = SimConfig::default();
    let generator = VehicleGenerator::new_with_seed(2024, config.feed.priority_threshold);
    let mut feed = TimerFeed::new(generator, &config.feed);
    let mut controller = IntersectionController::new(config).unwrap();
    let mut sink = RecordingSink::new(3000);

    controller.run(&mut feed, &mut sink, None);

    let stats = controller.stats();
    assert!(stats.admitted > 0);
    assert!(stats.despawned > 0);
    assert!(stats.despawned <= stats.admitted);
    assert_eq!(stats.malformed_records, 0);
    for snapshot in &sink.snapshots {
        for lane in controller.lanes() {
            assert!(snapshot.live_in(lane.path.origin) <= lane.queue.capacity());
        }
    }
}

#[test]
fn test_file_feed_drives_controller() {
    let dir = scratch_dir("controller_feed");
    let writer = LaneFileWriter::create(&dir).unwrap();
    for line in [
        "AA1AA111:A2:0",
        "BB2BB222:B1:0",
        "CC3CC333:C3:1",
        "AA1AA111:A2:0",
        "garbage",
    ] {
        if let Ok(request) = line.parse() {
            writer.append(&request).unwrap();
        }
    }
    std::fs::write(
        dir.join("laneD.txt"),
        "DD4DD444:D2:0\nthis is not a record\n",
    )
    .unwrap();

    let mut feed = FileFeed::new(&dir);
    let mut controller = IntersectionController::new(SimConfig::default()).unwrap();
    let snapshot = controller.tick(&mut feed);

    let stats = controller.stats();
    assert_eq!(stats.admitted, 3);
    assert_eq!(stats.rejected_unroutable, 1);
    assert_eq!(stats.duplicate_records, 1);
    assert_eq!(stats.malformed_records, 1);
    assert_eq!(stats.feed_unavailable, 0);
    assert_eq!(snapshot.vehicles.len(), 3);
    assert!(snapshot.vehicle("CC3CC333".parse().unwrap()).unwrap().priority);

    std::fs::remove_dir_all(&dir).unwrap();
    controller.tick(&mut feed);
    assert_eq!(controller.stats().feed_unavailable, 4);
    assert_eq!(controller.stats().admitted, 3);
}
