//! # LifeFlight Simulator
//!
//! Generates synthetic mission exports in the dispatch system's CSV layout,
//! for local development and end-to-end testing of the API.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod generator;
pub mod towns;
pub mod writer;

pub use generator::{MissionGenerator, ScenarioConfig, ScenarioError, SimulatedMission};
pub use towns::{Town, TownPicker, STATE, TOWNS};
pub use writer::write_csv;
