//! Decision core: turn an SPM + precision into a velocity command
//!
//! Two strategies share one interface and one perceptual risk term:
//! - `SamplingController` scores a fixed candidate set and takes the argmin
//! - `GradientController` runs a few clipped descent steps from the goal
//!   velocity (or the current one) using an analytic gradient
//!
//! The variant is picked once, when the agent is built.

pub mod constants;
pub mod cost;
pub mod gradient;
pub mod sampling;

pub use cost::{inside_penalty, RiskField};
pub use gradient::GradientController;
pub use sampling::SamplingController;

use std::fmt::Debug;

use crate::core::config::{ControllerKind, SimulationConfig};
use crate::core::types::Vec2;
use crate::perception::{PrecisionMatrix, SpmTensor};

/// Agent state a controller needs besides its sensory input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EgoState {
    pub velocity: Vec2,
    /// Heading the SPM was encoded against (radians, world frame)
    pub orientation: f32,
    pub max_speed: f32,
    pub haze_self: f32,
}

/// Velocity selection strategy
///
/// `precision` is the unmodulated base matrix; implementations apply haze
/// to a copy. The returned velocity is in the world frame.
pub trait Controller: Send + Debug {
    fn decide_action(
        &mut self,
        ego: &EgoState,
        spm: &SpmTensor,
        precision: &PrecisionMatrix,
        env_haze: f32,
        preferred_velocity: Option<Vec2>,
    ) -> Vec2;

    fn kind(&self) -> ControllerKind;
}

impl ControllerKind {
    /// Build a controller of this kind; `seed` only matters for variants
    /// with internal randomness
    pub fn build(self, config: &SimulationConfig, seed: u64) -> Box<dyn Controller> {
        match self {
            ControllerKind::Sampling => Box::new(SamplingController::new(&config.sampling)),
            ControllerKind::Gradient => Box::new(GradientController::new(&config.gradient, seed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_matches_kind() {
        let config = SimulationConfig::default();
        for kind in [ControllerKind::Sampling, ControllerKind::Gradient] {
            assert_eq!(kind.build(&config, 1).kind(), kind);
        }
    }

    #[test]
    fn test_boxed_controllers_agree_on_open_space_goal() {
        let config = SimulationConfig::default();
        let spm = SpmTensor::zeros(6, 6);
        let precision = PrecisionMatrix::filled(6, 6, 1.0);
        let ego = EgoState {
            velocity: Vec2::ZERO,
            orientation: 0.0,
            max_speed: 50.0,
            haze_self: 0.0,
        };
        let goal = Some(Vec2::new(0.0, 50.0));

        for kind in [ControllerKind::Sampling, ControllerKind::Gradient] {
            let mut controller = kind.build(&config, 5);
            let action = controller.decide_action(&ego, &spm, &precision, 0.0, goal);
            assert!(action.y > 0.0, "{:?} moved {:?}", kind, action);
            assert!(action.x.abs() < 1e-3);
        }
    }
}
