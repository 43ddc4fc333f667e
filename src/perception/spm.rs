//! Saliency polar map encoder
//!
//! Converts the entities around an observer into a (3, n_r, n_theta)
//! tensor in the observer's own frame:
//!
//! - radial axis: bin 0 holds everything inside personal space, bins
//!   1..n_r-1 cover (personal_space, d_max] on a log scale
//! - angular axis: [-pi, pi) relative to the heading, bin n_theta/2 is
//!   straight ahead
//!
//! Each entity is splatted with a Gaussian kernel (half-width 2 bins), and
//! contributions are summed. Channel 0 is therefore an accumulated weight,
//! not a count, and can exceed 1.0 where entities overlap.

use serde::Serialize;
use std::f32::consts::{PI, TAU};

use crate::core::config::{SimulationConfig, SpmConfig};
use crate::core::types::{normalize_angle, Vec2};
use crate::perception::precision::{sigmoid, PrecisionMatrix};
use crate::perception::{EntitySource, Observer, SenseWorld};
use crate::spatial::toroidal::displacement;

pub const OCCUPANCY: usize = 0;
pub const RADIAL_VELOCITY: usize = 1;
pub const TANGENTIAL_VELOCITY: usize = 2;
pub const CHANNELS: usize = 3;

/// Kernel half-width in bins, both axes
const KERNEL_HALF_WIDTH: i64 = 2;

/// Guards the log-scale denominator
const LOG_SCALE_EPSILON: f32 = 1e-6;

/// Egocentric log-polar sensory tensor, shape (3, n_r, n_theta), row-major
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpmTensor {
    n_r: usize,
    n_theta: usize,
    data: Vec<f32>,
}

impl SpmTensor {
    pub fn zeros(n_r: usize, n_theta: usize) -> Self {
        Self {
            n_r,
            n_theta,
            data: vec![0.0; CHANNELS * n_r * n_theta],
        }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (CHANNELS, self.n_r, self.n_theta)
    }

    pub fn n_r(&self) -> usize {
        self.n_r
    }

    pub fn n_theta(&self) -> usize {
        self.n_theta
    }

    #[inline]
    fn index(&self, channel: usize, r: usize, t: usize) -> usize {
        (channel * self.n_r + r) * self.n_theta + t
    }

    #[inline]
    pub fn get(&self, channel: usize, r: usize, t: usize) -> f32 {
        self.data[self.index(channel, r, t)]
    }

    #[inline]
    pub fn set(&mut self, channel: usize, r: usize, t: usize, value: f32) {
        let i = self.index(channel, r, t);
        self.data[i] = value;
    }

    #[inline]
    fn add(&mut self, channel: usize, r: usize, t: usize, value: f32) {
        let i = self.index(channel, r, t);
        self.data[i] += value;
    }

    #[inline]
    pub fn occupancy(&self, r: usize, t: usize) -> f32 {
        self.get(OCCUPANCY, r, t)
    }

    /// Flat view of one channel, (n_r, n_theta) row-major
    pub fn channel(&self, channel: usize) -> &[f32] {
        let len = self.n_r * self.n_theta;
        &self.data[channel * len..(channel + 1) * len]
    }

    pub fn total_occupancy(&self) -> f32 {
        self.channel(OCCUPANCY).iter().sum()
    }

    /// Summed occupancy of the innermost `rings` radial bins
    pub fn near_field_occupancy(&self, rings: usize) -> f32 {
        let rings = rings.min(self.n_r);
        self.channel(OCCUPANCY)[..rings * self.n_theta].iter().sum()
    }
}

/// Stateless SPM encoder; one instance serves every agent
#[derive(Debug, Clone)]
pub struct SpmEncoder {
    config: SpmConfig,
    tau: f32,
}

impl SpmEncoder {
    pub fn new(config: SpmConfig, tau: f32) -> Self {
        Self { config, tau }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.spm.clone(), config.precision.tau)
    }

    pub fn config(&self) -> &SpmConfig {
        &self.config
    }

    /// Sense the world: fresh SPM tensor plus base precision matrix
    pub fn sense(&self, observer: &Observer, world: &SenseWorld) -> (SpmTensor, PrecisionMatrix) {
        (
            self.compute_spm(observer, world),
            self.precision_matrix(observer.personal_space),
        )
    }

    pub fn compute_spm(&self, observer: &Observer, world: &SenseWorld) -> SpmTensor {
        let mut tensor = SpmTensor::zeros(self.config.n_r, self.config.n_theta);

        for entity in &world.entities {
            if entity.source == EntitySource::Agent(observer.id) {
                continue;
            }

            let d = displacement(observer.position, entity.position, world.width, world.height);
            if d.dist > self.config.d_max {
                continue;
            }

            let bearing = d.dy.atan2(d.dx);
            let rel_angle = normalize_angle(bearing - observer.orientation);

            // Static obstacles close in at the observer's own speed
            let rel_vel = match entity.velocity {
                Some(v) => v - observer.velocity,
                None => -observer.velocity,
            };
            let (sin_b, cos_b) = bearing.sin_cos();
            let v_radial = rel_vel.x * cos_b + rel_vel.y * sin_b;
            let v_tangential = -rel_vel.x * sin_b + rel_vel.y * cos_b;

            self.splat(
                &mut tensor,
                d.dist,
                rel_angle,
                v_radial,
                v_tangential,
                observer.personal_space,
            );
        }

        tensor
    }

    /// Continuous radial bin coordinate for a distance, `None` when the
    /// log band is degenerate (d_max <= personal_space)
    pub fn radial_coordinate(&self, dist: f32, personal_space: f32) -> Option<f32> {
        if dist <= personal_space {
            return Some(0.0);
        }
        if self.config.d_max <= personal_space {
            return None;
        }
        let log_ps = personal_space.ln();
        let scale = self.log_scale(personal_space);
        Some(1.0 + scale * (dist.ln() - log_ps))
    }

    /// Continuous angular bin coordinate for an ego-frame angle in [-pi, pi)
    pub fn angular_coordinate(&self, rel_angle: f32) -> f32 {
        (rel_angle + PI) / TAU * self.config.n_theta as f32
    }

    fn log_scale(&self, personal_space: f32) -> f32 {
        (self.config.n_r as f32 - 2.0)
            / (self.config.d_max.ln() - personal_space.ln() + LOG_SCALE_EPSILON)
    }

    fn splat(
        &self,
        tensor: &mut SpmTensor,
        dist: f32,
        rel_angle: f32,
        v_radial: f32,
        v_tangential: f32,
        personal_space: f32,
    ) {
        let Some(r_center) = self.radial_coordinate(dist, personal_space) else {
            return;
        };
        let theta_center = self.angular_coordinate(rel_angle);

        let n_r = self.config.n_r as i64;
        let n_theta = self.config.n_theta as i64;
        let two_sr2 = 2.0 * self.config.sigma_r * self.config.sigma_r;
        let two_st2 = 2.0 * self.config.sigma_theta * self.config.sigma_theta;

        let r_base = r_center.round() as i64;
        let t_base = theta_center.round() as i64;

        for r in (r_base - KERNEL_HALF_WIDTH)..=(r_base + KERNEL_HALF_WIDTH) {
            if r < 0 || r >= n_r {
                continue;
            }
            let dr = r as f32 - r_center;

            for t in (t_base - KERNEL_HALF_WIDTH)..=(t_base + KERNEL_HALF_WIDTH) {
                let t_wrapped = t.rem_euclid(n_theta);

                // Shortest angular distance to the bin, in bin units
                let bin_angle = t_wrapped as f32 / n_theta as f32 * TAU - PI;
                let diff = normalize_angle(bin_angle - rel_angle);
                let dt = diff / TAU * n_theta as f32;

                let weight = (-(dr * dr) / two_sr2 - (dt * dt) / two_st2).exp();

                let (r, t) = (r as usize, t_wrapped as usize);
                tensor.add(OCCUPANCY, r, t, weight);
                tensor.add(RADIAL_VELOCITY, r, t, weight * v_radial);
                tensor.add(TANGENTIAL_VELOCITY, r, t, weight * v_tangential);
            }
        }
    }

    /// Representative distance of radial bin `r` (inverse of the log map)
    pub fn bin_distance(&self, r: usize, personal_space: f32) -> f32 {
        if r == 0 {
            return 0.0;
        }
        let scale = self.log_scale(personal_space);
        if scale > 0.0 {
            ((r as f32 - 1.0) / scale + personal_space.ln()).exp()
        } else {
            // n_r == 2 or d_max <= personal_space: single outer band
            self.config.d_max.max(personal_space)
        }
    }

    /// Base precision: sigmoid((personal_space - dist) / tau) per radial
    /// bin, identical across angular bins
    pub fn precision_matrix(&self, personal_space: f32) -> PrecisionMatrix {
        let mut precision = PrecisionMatrix::filled(self.config.n_r, self.config.n_theta, 0.0);
        for r in 0..self.config.n_r {
            let dist = self.bin_distance(r, personal_space);
            precision.fill_row(r, sigmoid((personal_space - dist) / self.tau));
        }
        precision
    }
}

/// Ego-frame unit direction of each angular bin, as used by the controllers
///
/// Bin t is centred at -pi + (t + 0.5) * 2pi / n_theta.
pub fn bin_directions(n_theta: usize) -> Vec<Vec2> {
    let step = TAU / n_theta as f32;
    (0..n_theta)
        .map(|t| {
            let angle = -PI + (t as f32 + 0.5) * step;
            Vec2::new(angle.cos(), angle.sin())
        })
        .collect()
}
