//! Controller constants - fixed weights of the cost function
//!
//! Tunable optimiser settings (learning rate, iterations, clip) live in
//! `SimulationConfig`; these are structural parts of the cost itself.

// Sampling variant instrumental term
pub const SAMPLING_GOAL_WEIGHT: f32 = 0.5;
pub const IDLE_SPEED_REWARD: f32 = 0.1;

// Gradient variant: J = F_percept + META_WEIGHT * M_meta
pub const META_WEIGHT: f32 = 0.5;

// Inside-obstacle emergency penalty over the innermost radial bins
pub const NEAR_FIELD_RINGS: usize = 2;
pub const INSIDE_PENALTY_WEIGHT: f32 = 100.0;

// Accumulated near-field occupancy above which the agent counts as inside
// an obstacle. Compared against an unnormalised kernel sum, so its meaning
// shifts with n_r and sigma_r.
pub const INSIDE_OCCUPANCY_THRESHOLD: f32 = 0.5;

// A preferred velocity slower than this is treated as "no goal"
pub const GOAL_SPEED_THRESHOLD: f32 = 1.0;

// Wander target speed as a fraction of max speed
pub const WANDER_SPEED_FRACTION: f32 = 0.5;

// Epsilons for sqrt / norm stabilisation
pub const SPEED_EPSILON: f32 = 1e-8;
pub const NORM_EPSILON: f32 = 1e-8;
