//! State module for tracking harvest progress
//!
//! `UnitState` tracks a single (page, kind) unit of work from launch until it
//! reaches the completion barrier.

mod unit_state;

pub use unit_state::UnitState;
