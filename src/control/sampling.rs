//! Sampling controller: evaluate a fixed candidate set, take the argmin

use std::f32::consts::TAU;

use crate::control::constants::{IDLE_SPEED_REWARD, SAMPLING_GOAL_WEIGHT};
use crate::control::cost::RiskField;
use crate::control::{Controller, EgoState};
use crate::core::config::{ControllerKind, SamplingConfig};
use crate::core::types::Vec2;
use crate::haze::modulate_precision;
use crate::perception::{PrecisionMatrix, SpmTensor};

#[derive(Debug, Clone)]
pub struct SamplingController {
    n_headings: usize,
}

impl SamplingController {
    pub fn new(config: &SamplingConfig) -> Self {
        Self {
            n_headings: config.n_headings,
        }
    }

    /// Candidate actions in evaluation order: headings at max speed
    /// (heading 0 first, counter-clockwise), stop, hold current velocity
    pub fn candidates(&self, ego: &EgoState) -> Vec<Vec2> {
        let mut candidates: Vec<Vec2> = (0..self.n_headings)
            .map(|i| {
                let angle = i as f32 / self.n_headings as f32 * TAU;
                Vec2::from_angle(angle) * ego.max_speed
            })
            .collect();
        candidates.push(Vec2::ZERO);
        candidates.push(ego.velocity);
        candidates
    }

    /// Cost of one world-frame action: perceptual risk plus instrumental term
    pub fn evaluate_action(action: Vec2, field: &RiskField, preferred: Option<Vec2>) -> f32 {
        let instrumental = match preferred {
            Some(pref) => SAMPLING_GOAL_WEIGHT * (action - pref).length_squared(),
            None => -IDLE_SPEED_REWARD * action.length(),
        };
        field.risk(action) + instrumental
    }
}

impl Controller for SamplingController {
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

        // Strict comparison: equal costs keep the earliest candidate
        let mut best: Option<(Vec2, f32)> = None;
        for action in self.candidates(ego) {
            let cost = Self::evaluate_action(action, &field, preferred_velocity);
            let improves = match best {
                None => true,
                Some((_, min_cost)) => cost < min_cost,
            };
            if improves {
                best = Some((action, cost));
            }
        }
        best.map(|(action, _)| action).unwrap_or(Vec2::ZERO)
    }

    fn kind(&self) -> ControllerKind {
        ControllerKind::Sampling
    }
}
