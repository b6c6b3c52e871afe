//! Intersection Simulation Library
//!
//! A four-road, three-lane intersection simulator that runs headless; any
//! display plugs in through the snapshot sink.

pub mod simulation;
