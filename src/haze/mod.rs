//! Haze: modulatory signals that suppress precision
//!
//! Two sources, both attenuating by `(1 - h)^2`:
//! - self-haze, a per-agent stuck detector acting on the frontal sector
//! - environmental haze, a decaying world grid sampled at the agent's cell
//!   and applied to the whole matrix

pub mod grid;

pub use grid::{HazeCell, HazeGrid};

use serde::Serialize;

use crate::core::config::SelfHazeConfig;
use crate::perception::PrecisionMatrix;

/// Per-agent stuck detector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SelfHaze {
    /// Haze intensity in [0, 1]
    pub level: f32,
    /// Consecutive-ish slow steps (decrements when moving, floor 0)
    pub stuck_counter: u32,
}

impl SelfHaze {
    /// Advance one step given the agent's current speed
    ///
    /// Returns true on the step haze starts building from zero.
    pub fn update(&mut self, speed: f32, config: &SelfHazeConfig) -> bool {
        if speed < config.speed_threshold {
            self.stuck_counter += 1;
        } else {
            self.stuck_counter = self.stuck_counter.saturating_sub(1);
        }

        let was_clear = self.level <= 0.0;
        if self.stuck_counter > config.stuck_threshold {
            self.level = (self.level + config.increase_rate).min(1.0);
        } else {
            self.level = (self.level - config.decay_rate).max(0.0);
        }
        was_clear && self.level > 0.0
    }

    pub fn is_active(&self) -> bool {
        self.level > 0.0
    }
}

/// Angular bins covered by the self-haze frontal sector
///
/// Centre bin n_theta/2 (straight ahead) plus n_theta/6 bins either side,
/// wrapped.
pub fn frontal_sector(n_theta: usize) -> Vec<usize> {
    let center = (n_theta / 2) as i64;
    let half_width = (n_theta / 6) as i64;
    let n = n_theta as i64;
    let mut bins: Vec<usize> = ((center - half_width)..=(center + half_width))
        .map(|t| t.rem_euclid(n) as usize)
        .collect();
    bins.dedup();
    bins
}

/// Haze-modulated copy of a base precision matrix
///
/// The base matrix is left untouched.
pub fn modulate_precision(base: &PrecisionMatrix, haze_self: f32, env_haze: f32) -> PrecisionMatrix {
    let mut modulated = base.clone();

    if haze_self > 0.0 {
        let attenuation = (1.0 - haze_self).powi(2);
        for t in frontal_sector(base.n_theta()) {
            modulated.scale_column(t, attenuation);
        }
    }

    modulated.scale((1.0 - env_haze).powi(2));
    modulated
}
