//! Perceptual risk shared by both controllers
//!
//! For an action `a` rotated into the ego frame and a bin direction `e_t`,
//! the approach speed toward bin t is `a . e_t`. Risk only counts approach:
//!
//! ```text
//! risk(a) = sum_r sum_t occupancy[r,t] * precision[r,t] * max(0, a_ego . e_t)
//!         = sum_t W_t * max(0, a_ego . e_t)
//! ```
//!
//! with column weights `W_t = sum_r occupancy[r,t] * precision[r,t]`.

use crate::control::constants::{INSIDE_PENALTY_WEIGHT, NEAR_FIELD_RINGS};
use crate::core::types::{rotate, Vec2};
use crate::perception::spm::bin_directions;
use crate::perception::{PrecisionMatrix, SpmTensor};

/// Risk landscape for one decision, precomputed from SPM and precision
#[derive(Debug, Clone)]
pub struct RiskField {
    weights: Vec<f32>,
    directions: Vec<Vec2>,
    orientation: f32,
}

impl RiskField {
    pub fn new(spm: &SpmTensor, precision: &PrecisionMatrix, orientation: f32) -> Self {
        let (_, n_r, n_theta) = spm.shape();
        let weights: Vec<f32> = (0..n_theta)
            .map(|t| {
                (0..n_r)
                    .map(|r| spm.occupancy(r, t) * precision.get(r, t))
                    .sum::<f32>()
            })
            .collect();

        Self {
            weights,
            directions: bin_directions(n_theta),
            orientation,
        }
    }

    /// World-frame action expressed in the ego frame
    #[inline]
    pub fn to_ego(&self, action: Vec2) -> Vec2 {
        rotate(action, -self.orientation)
    }

    /// Risk of a world-frame action
    pub fn risk(&self, action: Vec2) -> f32 {
        let a = self.to_ego(action);
        self.weights
            .iter()
            .zip(&self.directions)
            .map(|(w, e)| w * a.dot(*e).max(0.0))
            .sum()
    }

    /// d risk / d action, world frame
    pub fn gradient(&self, action: Vec2) -> Vec2 {
        let a = self.to_ego(action);
        let ego_grad = self
            .weights
            .iter()
            .zip(&self.directions)
            .filter(|(_, e)| a.dot(**e) > 0.0)
            .fold(Vec2::ZERO, |acc, (w, e)| acc + *e * *w);
        rotate(ego_grad, self.orientation)
    }
}

/// Penalty for already overlapping something: occupancy x precision summed
/// over the innermost radial bins. Independent of the action.
pub fn inside_penalty(spm: &SpmTensor, precision: &PrecisionMatrix) -> f32 {
    let rings = NEAR_FIELD_RINGS.min(spm.n_r());
    let mut sum = 0.0;
    for r in 0..rings {
        for t in 0..spm.n_theta() {
            sum += spm.occupancy(r, t) * precision.get(r, t);
        }
    }
    sum * INSIDE_PENALTY_WEIGHT
}
