//! Movement paths through the intersection
//!
//! Every routable lane has one path: an approach segment that ends at a
//! stop line, then a departure through the box and off screen. A path is
//! plain data (spawn point, waypoints, stop line, exit boundary), and a
//! single driver, [`PathDescriptor::advance`], moves any vehicle along any
//! path.

use std::collections::BTreeMap;

use super::config::Geometry;
use super::error::SimError;
use super::traffic_light::LightState;
use super::types::{Heading, Lane, LaneId, LightId, Position, Road, Size};
use super::vehicle::SimVehicle;

/// The stop-line waypoint is always the first one
pub const STOP_WAYPOINT: usize = 0;

/// Rounding slack when comparing a leading edge against the stop line
const STOP_LINE_EPSILON: f32 = 1e-3;

/// A vehicle counts as "at the stop line" until it has crossed it by this much
const STOP_LINE_BAND: f32 = 0.5;

/// Boundary where an approaching vehicle must hold on red
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopLine {
    pub heading: Heading,
    pub boundary: f32,
}

impl StopLine {
    /// How far the leading edge is past the line; negative while approaching
    pub fn overshoot(&self, position: &Position, size: &Size) -> f32 {
        match self.heading {
            Heading::East => position.x + size.width - self.boundary,
            Heading::West => self.boundary - position.x,
            Heading::South => position.y + size.height - self.boundary,
            Heading::North => self.boundary - position.y,
        }
    }

    /// Distance left to the line along the approach axis
    pub fn distance(&self, position: &Position, size: &Size) -> f32 {
        -self.overshoot(position, size)
    }

    /// Leading edge sits on the stop line
    pub fn at_intersection(&self, position: &Position, size: &Size) -> bool {
        let overshoot = self.overshoot(position, size);
        overshoot > -STOP_LINE_EPSILON && overshoot < STOP_LINE_BAND
    }

    pub fn crossed(&self, position: &Position, size: &Size) -> bool {
        self.overshoot(position, size) >= STOP_LINE_BAND
    }
}

/// Screen edge a path leaves through
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitBoundary {
    pub heading: Heading,
    pub boundary: f32,
}

impl ExitBoundary {
    /// The vehicle is entirely past the edge
    pub fn reached(&self, position: &Position, size: &Size) -> bool {
        match self.heading {
            Heading::North => position.y + size.height <= self.boundary,
            Heading::South => position.y >= self.boundary,
            Heading::East => position.x >= self.boundary,
            Heading::West => position.x + size.width <= self.boundary,
        }
    }
}

/// Result of moving one vehicle for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    /// Held at the stop line by a red light
    Held,
    Moved,
    /// Reached the exit and was deactivated
    Arrived,
}

/// Declarative description of one origin to destination path
#[derive(Debug, Clone, PartialEq)]
pub struct PathDescriptor {
    pub origin: LaneId,
    pub destination: LaneId,
    /// Light gating the stop line
    pub light: LightId,
    pub spawn: Position,
    /// Axis-aligned targets; the stop-line point comes first
    pub waypoints: Vec<Position>,
    pub stop_line: StopLine,
    pub exit: ExitBoundary,
}

impl PathDescriptor {
    /// Manhattan length from spawn to exit
    pub fn length(&self) -> f32 {
        let mut from = self.spawn;
        let mut total = 0.0;
        for waypoint in &self.waypoints {
            total += from.manhattan(waypoint);
            from = *waypoint;
        }
        total
    }

    pub fn has_reached_destination(&self, vehicle: &SimVehicle) -> bool {
        self.exit.reached(&vehicle.position, &vehicle.size)
    }

    /// Move `vehicle` one tick along this path.
    ///
    /// A vehicle on the stop line does not move while `light` is red. A
    /// vehicle still approaching never crosses the line on red; it stops
    /// exactly on it.
    pub fn advance(&self, vehicle: &mut SimVehicle, light: LightState) -> Movement {
        let red = light == LightState::Red;
        if red && self.stop_line.at_intersection(&vehicle.position, &vehicle.size) {
            vehicle.boost = 1.0;
            return Movement::Held;
        }

        let speed = vehicle.effective_speed();
        let mut budget = speed;
        while budget > 0.0 {
            let Some(target) = self.waypoints.get(vehicle.next_waypoint) else {
                break;
            };
            budget = vehicle.position.step_toward(target, budget);
            if vehicle.position != *target {
                break;
            }
            vehicle.next_waypoint += 1;
            if red && vehicle.next_waypoint == STOP_WAYPOINT + 1 {
                break;
            }
        }
        vehicle.travelled += speed - budget;
        vehicle.boost = 1.0;

        if self.has_reached_destination(vehicle) {
            vehicle.despawn();
            Movement::Arrived
        } else {
            Movement::Moved
        }
    }
}

/// A lane position on the grid: a horizontal row or a vertical column
#[derive(Debug, Clone, Copy)]
enum Track {
    Row(u8),
    Column(u8),
}

impl Track {
    fn coordinate(self, geometry: &Geometry) -> f32 {
        match self {
            Track::Row(row) => geometry.row_y(row),
            Track::Column(col) => geometry.column_x(col),
        }
    }
}

struct Route {
    origin: LaneId,
    destination: LaneId,
    light: Road,
    approach: (Heading, Track),
    departure: Option<(Heading, Track)>,
}

const fn lane(road: Road, lane: Lane) -> LaneId {
    LaneId::new(road, lane)
}

/// The eight paths. Incoming lanes turn into the adjacent road's outer lane
/// and wait on that road's light; middle lanes go straight across on their
/// own light.
const ROUTES: [Route; 8] = [
    Route {
        origin: lane(Road::D, Lane::Incoming),
        destination: lane(Road::A, Lane::Outer),
        light: Road::A,
        approach: (Heading::East, Track::Row(0)),
        departure: Some((Heading::North, Track::Column(0))),
    },
    Route {
        origin: lane(Road::B, Lane::Incoming),
        destination: lane(Road::D, Lane::Outer),
        light: Road::D,
        approach: (Heading::North, Track::Column(0)),
        departure: Some((Heading::West, Track::Row(2))),
    },
    Route {
        origin: lane(Road::C, Lane::Incoming),
        destination: lane(Road::B, Lane::Outer),
        light: Road::B,
        approach: (Heading::West, Track::Row(2)),
        departure: Some((Heading::South, Track::Column(2))),
    },
    Route {
        origin: lane(Road::A, Lane::Incoming),
        destination: lane(Road::C, Lane::Outer),
        light: Road::C,
        approach: (Heading::South, Track::Column(2)),
        departure: Some((Heading::East, Track::Row(0))),
    },
    Route {
        origin: lane(Road::A, Lane::Middle),
        destination: lane(Road::B, Lane::Middle),
        light: Road::A,
        approach: (Heading::South, Track::Column(1)),
        departure: None,
    },
    Route {
        origin: lane(Road::B, Lane::Middle),
        destination: lane(Road::A, Lane::Middle),
        light: Road::B,
        approach: (Heading::North, Track::Column(1)),
        departure: None,
    },
    Route {
        origin: lane(Road::C, Lane::Middle),
        destination: lane(Road::D, Lane::Middle),
        light: Road::C,
        approach: (Heading::West, Track::Row(1)),
        departure: None,
    },
    Route {
        origin: lane(Road::D, Lane::Middle),
        destination: lane(Road::C, Lane::Middle),
        light: Road::D,
        approach: (Heading::East, Track::Row(1)),
        departure: None,
    },
];

impl Route {
    fn describe(&self, g: &Geometry) -> PathDescriptor {
        let vehicle = g.vehicle;
        let (approach, track) = self.approach;
        let along = track.coordinate(g);

        let (spawn, stop_line) = match approach {
            Heading::East => (Position::new(-vehicle.width, along), g.left()),
            Heading::West => (Position::new(g.screen_width, along), g.right()),
            Heading::South => (Position::new(along, -vehicle.height), g.top()),
            Heading::North => (Position::new(along, g.screen_height), g.bottom()),
        };
        let stop_point = match approach {
            Heading::East => Position::new(stop_line - vehicle.width, along),
            Heading::West => Position::new(stop_line, along),
            Heading::South => Position::new(along, stop_line - vehicle.height),
            Heading::North => Position::new(along, stop_line),
        };

        let mut waypoints = vec![stop_point];
        let (exit_heading, from) = match self.departure {
            Some((heading, track)) => {
                let cross = track.coordinate(g);
                let turn = if approach.is_horizontal() {
                    Position::new(cross, along)
                } else {
                    Position::new(along, cross)
                };
                waypoints.push(turn);
                (heading, turn)
            }
            None => (approach, stop_point),
        };

        let (exit_point, boundary) = match exit_heading {
            Heading::North => (Position::new(from.x, -vehicle.height), 0.0),
            Heading::South => (Position::new(from.x, g.screen_height), g.screen_height),
            Heading::East => (Position::new(g.screen_width, from.y), g.screen_width),
            Heading::West => (Position::new(-vehicle.width, from.y), 0.0),
        };
        waypoints.push(exit_point);

        PathDescriptor {
            origin: self.origin,
            destination: self.destination,
            light: LightId(self.light),
            spawn,
            waypoints,
            stop_line: StopLine {
                heading: approach,
                boundary: stop_line,
            },
            exit: ExitBoundary {
                heading: exit_heading,
                boundary,
            },
        }
    }
}

/// Paths keyed by origin lane
#[derive(Debug, Clone, Default)]
pub struct PathTable {
    paths: BTreeMap<LaneId, PathDescriptor>,
}

impl PathTable {
    /// The eight standard paths for `geometry`
    pub fn standard(geometry: &Geometry) -> Self {
        let paths = ROUTES
            .iter()
            .map(|route| (route.origin, route.describe(geometry)))
            .collect();
        Self { paths }
    }

    pub fn resolve(&self, lane: LaneId) -> Result<&PathDescriptor, SimError> {
        self.paths
            .get(&lane)
            .ok_or(SimError::InvalidPathConfiguration(lane))
    }

    pub fn contains(&self, lane: LaneId) -> bool {
        self.paths.contains_key(&lane)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathDescriptor> {
        self.paths.values()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
