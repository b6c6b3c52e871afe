//! Traffic light state machine
//!
//! Two states, one transition. Lights toggle on their own schedule in
//! `update`; the priority escalator can pin them with `force`, which
//! suspends the schedule until `release`.

use std::fmt;
use std::time::Duration;

use log::debug;

use super::types::{LightId, Position, Road};

/// Radius of a light in the display snapshot
pub const LIGHT_RADIUS: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    Red,
    Green,
}

impl LightState {
    pub fn flipped(self) -> Self {
        match self {
            LightState::Red => LightState::Green,
            LightState::Green => LightState::Red,
        }
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightState::Red => f.write_str("RED"),
            LightState::Green => f.write_str("GREEN"),
        }
    }
}

/// A timed two-state signal for one road
#[derive(Debug, Clone)]
pub struct TrafficLight {
    pub id: LightId,
    pub position: Position,
    state: LightState,
    last_transition: Duration,
    duration: Duration,
    /// Periodic toggling is suspended while held
    held: bool,
    /// This light is the one being served by the escalator
    priority: bool,
}

impl TrafficLight {
    pub fn new(id: LightId, position: Position, initial: LightState, duration: Duration) -> Self {
        Self {
            id,
            position,
            state: initial,
            last_transition: Duration::ZERO,
            duration,
            held: false,
            priority: false,
        }
    }

    pub fn state(&self) -> LightState {
        self.state
    }

    pub fn is_green(&self) -> bool {
        self.state == LightState::Green
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn has_priority(&self) -> bool {
        self.priority
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn last_transition(&self) -> Duration {
        self.last_transition
    }

    /// Flip the state and restart the timer
    pub fn toggle(&mut self, now: Duration) {
        self.state = self.state.flipped();
        self.last_transition = now;
    }

    /// Toggle if the duration has elapsed. Returns true when the state changed.
    ///
    /// The next period is timed from `now`, not from the end of the previous
    /// one, so a tick delta that does not divide the duration makes each
    /// phase last up to one delta longer.
    pub fn update(&mut self, now: Duration) -> bool {
        if self.held {
            return false;
        }
        if now.saturating_sub(self.last_transition) >= self.duration {
            self.toggle(now);
            return true;
        }
        false
    }

    /// Pin the light to `state` and suspend periodic toggling.
    ///
    /// The transition time only moves when the state actually changes.
    pub fn force(&mut self, state: LightState, priority: bool, now: Duration) {
        if self.state != state {
            self.state = state;
            self.last_transition = now;
        }
        self.held = true;
        self.priority = priority;
    }

    /// Resume periodic toggling from the current state
    pub fn release(&mut self) {
        self.held = false;
        self.priority = false;
    }
}

/// Default light placement around the intersection box
pub fn light_position(id: LightId, screen_width: f32, screen_height: f32) -> Position {
    match id.0 {
        Road::A => Position::new(screen_width / 2.0, screen_height / 2.6),
        Road::B => Position::new(screen_width / 2.0, 5.0 * screen_height / 8.2),
        Road::C => Position::new(5.0 * screen_width / 8.1, screen_height / 1.85),
        Road::D => Position::new(screen_width / 2.8, screen_height / 1.8),
    }
}

/// The four lights, one per road
#[derive(Debug, Clone)]
pub struct LightBank {
    lights: [TrafficLight; 4],
}

impl LightBank {
    pub fn new(lights: [TrafficLight; 4]) -> Self {
        Self { lights }
    }

    pub fn get(&self, id: LightId) -> &TrafficLight {
        &self.lights[id.0.index()]
    }

    pub fn get_mut(&mut self, id: LightId) -> &mut TrafficLight {
        &mut self.lights[id.0.index()]
    }

    pub fn state(&self, id: LightId) -> LightState {
        self.get(id).state()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrafficLight> {
        self.lights.iter()
    }

    /// Run the periodic schedule of every light. Returns how many toggled.
    pub fn update_all(&mut self, now: Duration) -> usize {
        let mut toggled = 0;
        for light in &mut self.lights {
            if light.update(now) {
                debug!("{} toggled to {} at {:?}", light.id, light.state(), now);
                toggled += 1;
            }
        }
        toggled
    }

    /// Force `served` green and every other light red, all held
    pub fn force_priority(&mut self, served: LightId, now: Duration) {
        for light in &mut self.lights {
            if light.id == served {
                light.force(LightState::Green, true, now);
            } else {
                light.force(LightState::Red, false, now);
            }
        }
    }

    pub fn release_all(&mut self) {
        for light in &mut self.lights {
            light.release();
        }
    }
}
