//! Core types for the intersection simulation
//!
//! Roads, lanes, plates and the 2D geometry primitives shared by every
//! other module. Nothing here depends on simulation state.

use std::fmt;
use std::str::FromStr;

use super::error::FeedError;

/// One of the four approaches to the intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Road {
    /// North approach
    A,
    /// South approach
    B,
    /// East approach
    C,
    /// West approach
    D,
}

impl Road {
    pub const ALL: [Road; 4] = [Road::A, Road::B, Road::C, Road::D];

    pub fn as_char(self) -> char {
        match self {
            Road::A => 'A',
            Road::B => 'B',
            Road::C => 'C',
            Road::D => 'D',
        }
    }

    pub fn from_char(c: char) -> Option<Road> {
        match c {
            'A' => Some(Road::A),
            'B' => Some(Road::B),
            'C' => Some(Road::C),
            'D' => Some(Road::D),
            _ => None,
        }
    }

    /// Position of the road in `Road::ALL`, used for fixed-size per-road tables
    pub fn index(self) -> usize {
        match self {
            Road::A => 0,
            Road::B => 1,
            Road::C => 2,
            Road::D => 3,
        }
    }
}

impl fmt::Display for Road {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Lane number within a road
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lane {
    /// Lane 1: outer lane, destination only
    Outer,
    /// Lane 2: middle lane, the only priority-capable lane
    Middle,
    /// Lane 3: incoming lane
    Incoming,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Outer, Lane::Middle, Lane::Incoming];

    pub fn number(self) -> u8 {
        match self {
            Lane::Outer => 1,
            Lane::Middle => 2,
            Lane::Incoming => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Lane> {
        match n {
            1 => Some(Lane::Outer),
            2 => Some(Lane::Middle),
            3 => Some(Lane::Incoming),
            _ => None,
        }
    }
}

/// A (road, lane) pair such as `A2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaneId {
    pub road: Road,
    pub lane: Lane,
}

impl LaneId {
    pub const fn new(road: Road, lane: Lane) -> Self {
        Self { road, lane }
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.road, self.lane.number())
    }
}

impl FromStr for LaneId {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(road), Some(lane), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(FeedError::malformed(s, "lane tag must be <ROAD><LANE>"));
        };
        let road = Road::from_char(road)
            .ok_or_else(|| FeedError::malformed(s, "unknown road"))?;
        let lane = lane
            .to_digit(10)
            .and_then(|d| Lane::from_number(d as u8))
            .ok_or_else(|| FeedError::malformed(s, "unknown lane"))?;
        Ok(LaneId::new(road, lane))
    }
}

/// Identifier of a traffic light; there is one light per road
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(pub Road);

impl fmt::Display for LightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "light {}", self.0)
    }
}

/// Number of characters in a licence plate
pub const PLATE_LEN: usize = 8;

/// An 8-character alphanumeric licence plate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Plate([u8; PLATE_LEN]);

impl Plate {
    /// Wrap bytes produced by the vehicle generator, which only emits
    /// uppercase letters and digits
    pub(crate) fn from_generated(bytes: [u8; PLATE_LEN]) -> Self {
        debug_assert!(bytes.iter().all(u8::is_ascii_alphanumeric));
        Plate(bytes)
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII alphanumerics are ever stored
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plate {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != PLATE_LEN {
            return Err(FeedError::malformed(s, "plate must be exactly 8 characters"));
        }
        if !bytes.iter().all(u8::is_ascii_alphanumeric) {
            return Err(FeedError::malformed(s, "plate must be alphanumeric"));
        }
        let mut plate = [0u8; PLATE_LEN];
        plate.copy_from_slice(bytes);
        Ok(Plate(plate))
    }
}

/// Direction of travel along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    North,
    South,
    East,
    West,
}

impl Heading {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Heading::East | Heading::West)
    }
}

/// A 2D position in screen pixels (top-left corner for vehicles)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(&self, other: &Position) -> f32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Move up to `budget` pixels toward `target` along a single axis.
    ///
    /// Returns the unused part of the budget, which is zero unless the
    /// target was reached.
    pub fn step_toward(&mut self, target: &Position, budget: f32) -> f32 {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        let (delta, coord, goal) = if dx != 0.0 {
            (dx, &mut self.x, target.x)
        } else if dy != 0.0 {
            (dy, &mut self.y, target.y)
        } else {
            return budget;
        };

        if delta.abs() <= budget {
            *coord = goal;
            budget - delta.abs()
        } else {
            *coord += budget * delta.signum();
            0.0
        }
    }
}

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}
