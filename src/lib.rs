//! EPH Swarm - multi-agent navigation with egocentric perception
//!
//! Each agent senses its neighbourhood as a log-polar saliency map,
//! attenuates attention with haze, and picks a velocity by minimising a
//! perceptual-risk plus goal cost.

pub mod control;
pub mod core;
pub mod entity;
pub mod haze;
pub mod perception;
pub mod scenario;
pub mod simulation;
pub mod spatial;
