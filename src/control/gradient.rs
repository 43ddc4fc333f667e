//! Gradient controller: a few steps of clipped gradient descent on J(a)
//!
//! ```text
//! J(a) = F_percept(a) + META_WEIGHT * M_meta(a)
//! F_percept(a) = risk(a) + inside_penalty
//! M_meta(a) = |a - v*|^2                      if |v*| > GOAL_SPEED_THRESHOLD
//!           = -IDLE_SPEED_REWARD * sqrt(|a|^2 + eps)   otherwise
//! ```
//!
//! The gradient is written out by hand: risk contributes the column weights
//! of every bin the action approaches, the penalty is constant in `a`, and
//! the meta term switches between two closed forms.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;

use crate::control::constants::{
    GOAL_SPEED_THRESHOLD, IDLE_SPEED_REWARD, INSIDE_OCCUPANCY_THRESHOLD, META_WEIGHT,
    NEAR_FIELD_RINGS, NORM_EPSILON, SPEED_EPSILON, WANDER_SPEED_FRACTION,
};
use crate::control::cost::{inside_penalty, RiskField};
use crate::control::{Controller, EgoState};
use crate::core::config::{ControllerKind, GradientConfig};
use crate::core::types::Vec2;
use crate::haze::modulate_precision;
use crate::perception::{PrecisionMatrix, SpmTensor};

#[derive(Debug, Clone)]
pub struct GradientController {
    config: GradientConfig,
    rng: ChaCha8Rng,
    wander_angle: f32,
    wander_timer: u32,
}

impl GradientController {
    pub fn new(config: &GradientConfig, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let wander_angle = rng.gen_range(0.0..TAU);
        Self {
            config: config.clone(),
            rng,
            wander_angle,
            wander_timer: 0,
        }
    }

    /// Heading of the current wander target (radians, world frame)
    pub fn wander_heading(&self) -> f32 {
        self.wander_angle
    }

    /// Velocity the meta term pulls toward
    fn target_velocity(&mut self, ego: &EgoState, spm: &SpmTensor, preferred: Option<Vec2>) -> Vec2 {
        if let Some(pref) = preferred {
            return pref;
        }

        if spm.near_field_occupancy(NEAR_FIELD_RINGS) > INSIDE_OCCUPANCY_THRESHOLD {
            // Inside an obstacle: pure repulsion, no wander bias
            return Vec2::ZERO;
        }

        self.wander_timer += 1;
        if self.wander_timer > self.config.wander_period {
            self.wander_angle = self.rng.gen_range(0.0..TAU);
            self.wander_timer = 0;
        }
        Vec2::from_angle(self.wander_angle) * (ego.max_speed * WANDER_SPEED_FRACTION)
    }
}

/// Total cost J(a)
pub fn expected_cost(action: Vec2, field: &RiskField, penalty: f32, target: Vec2) -> f32 {
    let perceptual = field.risk(action) + penalty;
    perceptual + META_WEIGHT * meta_cost(action, target)
}

/// Analytic dJ/da
pub fn cost_gradient(action: Vec2, field: &RiskField, target: Vec2) -> Vec2 {
    field.gradient(action) + META_WEIGHT * meta_gradient(action, target)
}

fn meta_cost(action: Vec2, target: Vec2) -> f32 {
    if target.length() > GOAL_SPEED_THRESHOLD {
        (action - target).length_squared()
    } else {
        -IDLE_SPEED_REWARD * (action.length_squared() + SPEED_EPSILON).sqrt()
    }
}

fn meta_gradient(action: Vec2, target: Vec2) -> Vec2 {
    if target.length() > GOAL_SPEED_THRESHOLD {
        2.0 * (action - target)
    } else {
        -IDLE_SPEED_REWARD * action / (action.length_squared() + SPEED_EPSILON).sqrt()
    }
}

impl Controller for GradientController {
    fn decide_action(
        &mut self,
        ego: &EgoState,
        spm: &SpmTensor,
        precision: &PrecisionMatrix,
        env_haze: f32,
        preferred_velocity: Option<Vec2>,
    ) -> Vec2 {
        let precision = modulate_precision(precision, ego.haze_self, env_haze);
        let field = RiskField::new(spm, &precision, ego.orientation);
        let target = self.target_velocity(ego, spm, preferred_velocity);

        let clip = Vec2::splat(self.config.gradient_clip);
        let mut action = preferred_velocity.unwrap_or(ego.velocity);
        for _ in 0..self.config.n_iterations {
            let grad = cost_gradient(action, &field, target).clamp(-clip, clip);
            action -= self.config.learning_rate * grad;

            let speed = action.length() + NORM_EPSILON;
            if speed > ego.max_speed {
                action = action / speed * ego.max_speed;
            }
        }

        tracing::trace!(
            "gradient decision {:?} (target {:?}, cost {:.3})",
            action,
            target,
            expected_cost(action, &field, inside_penalty(spm, &precision), target)
        );
        action
    }

    fn kind(&self) -> ControllerKind {
        ControllerKind::Gradient
    }
}
