//! Spatial utilities for the periodic world

pub mod toroidal;

pub use toroidal::{displacement, wrap_position, Displacement};
