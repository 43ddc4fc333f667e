//! Simulation configuration with documented constants
//!
//! Every tunable number of the perception, haze, control and kinematics
//! systems lives here. Sections map one-to-one onto the tables of
//! `data/config/default.toml`; any missing table or key falls back to the
//! defaults below.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::core::error::{EphError, Result};

/// Top-level configuration for a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub world: WorldConfig,
    pub spm: SpmConfig,
    pub precision: PrecisionConfig,
    pub self_haze: SelfHazeConfig,
    pub sampling: SamplingConfig,
    pub gradient: GradientConfig,
    pub agent: AgentDefaults,

    /// Base seed for scenario generation and controller wander headings
    pub seed: u64,

    /// Minimum agent count before the decide phase runs on the rayon pool
    ///
    /// Only honoured with deferred haze deposits; immediate deposits force
    /// sequential processing.
    pub parallel_threshold: usize,

    /// Distance to goal under which a `GoalReached` event is emitted
    pub goal_tolerance: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            spm: SpmConfig::default(),
            precision: PrecisionConfig::default(),
            self_haze: SelfHazeConfig::default(),
            sampling: SamplingConfig::default(),
            gradient: GradientConfig::default(),
            agent: AgentDefaults::default(),
            seed: 42,
            parallel_threshold: 256,
            goal_tolerance: 20.0,
        }
    }
}

// === WORLD ===

/// When haze deposits made during the decide phase become visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositMode {
    /// All agents decide against the same haze grid; deposits land afterwards
    Deferred,
    /// Each deposit lands right after its agent decides, so later agents in
    /// the same step observe it (agent order matters)
    Immediate,
}

impl FromStr for DepositMode {
    type Err = EphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "deferred" => Ok(DepositMode::Deferred),
            "immediate" => Ok(DepositMode::Immediate),
            other => Err(EphError::UnknownDepositMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World extent along x (periodic)
    pub width: f32,
    /// World extent along y (periodic)
    pub height: f32,
    /// Integration time step (seconds)
    pub dt: f32,
    /// Side length of one environmental haze cell (world units)
    pub haze_cell_size: f32,
    /// Multiplicative haze decay applied once per step
    ///
    /// At 0.99 a saturated cell falls below 0.5 after ~69 steps.
    pub haze_decay: f32,
    /// Haze added to an agent's cell each time it decides (capped at 1.0)
    pub haze_deposit: f32,
    pub deposit_mode: DepositMode,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            dt: 0.1,
            haze_cell_size: 20.0,
            haze_decay: 0.99,
            haze_deposit: 0.1,
            deposit_mode: DepositMode::Deferred,
        }
    }
}

// === PERCEPTION ===

/// Saliency polar map geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpmConfig {
    /// Radial bins; bin 0 is the personal-space ("intimate") bin
    pub n_r: usize,
    /// Angular bins covering [-pi, pi) in the ego frame
    pub n_theta: usize,
    /// Sensing horizon (world units)
    pub d_max: f32,
    /// Gaussian splat width along the radial axis (bins)
    pub sigma_r: f32,
    /// Gaussian splat width along the angular axis (bins)
    pub sigma_theta: f32,
}

impl Default for SpmConfig {
    fn default() -> Self {
        Self {
            n_r: 6,
            n_theta: 6,
            d_max: 300.0,
            sigma_r: 0.5,
            sigma_theta: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecisionConfig {
    /// Width of the sigmoid transition around the personal-space radius
    pub tau: f32,
}

impl Default for PrecisionConfig {
    fn default() -> Self {
        Self { tau: 5.0 }
    }
}

// === HAZE ===

/// Stuck detector driving per-agent self-haze
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfHazeConfig {
    /// Counter value above which haze starts building (50 steps = 5s at dt 0.1)
    pub stuck_threshold: u32,
    /// Speed below which a step counts as stuck
    pub speed_threshold: f32,
    pub increase_rate: f32,
    pub decay_rate: f32,
}

impl Default for SelfHazeConfig {
    fn default() -> Self {
        Self {
            stuck_threshold: 50,
            speed_threshold: 5.0,
            increase_rate: 0.05,
            decay_rate: 0.01,
        }
    }
}

// === CONTROL ===

/// Which decision strategy an agent is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    Sampling,
    Gradient,
}

impl FromStr for ControllerKind {
    type Err = EphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sampling" => Ok(ControllerKind::Sampling),
            "gradient" => Ok(ControllerKind::Gradient),
            other => Err(EphError::UnknownController(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Evenly spaced candidate headings evaluated at max speed
    pub n_headings: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { n_headings: 16 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientConfig {
    pub learning_rate: f32,
    pub n_iterations: usize,
    /// Per-component gradient clip (symmetric)
    pub gradient_clip: f32,
    /// Steps between wander heading changes when the agent has no goal
    pub wander_period: u32,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            n_iterations: 5,
            gradient_clip: 10.0,
            wander_period: 50,
        }
    }
}

// === AGENTS ===

/// Defaults applied to every agent a scenario spawns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentDefaults {
    pub radius: f32,
    pub max_speed: f32,
    pub personal_space: f32,
    pub controller: ControllerKind,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            radius: 10.0,
            max_speed: 50.0,
            personal_space: 20.0,
            controller: ControllerKind::Sampling,
        }
    }
}

impl SimulationConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let w = &self.world;
        if w.width <= 0.0 || w.height <= 0.0 {
            return Err(invalid(format!(
                "world extent must be positive (got {}x{})",
                w.width, w.height
            )));
        }
        if w.dt <= 0.0 {
            return Err(invalid(format!("dt must be positive (got {})", w.dt)));
        }
        if w.haze_cell_size <= 0.0 {
            return Err(invalid("haze_cell_size must be positive".into()));
        }
        if !(w.haze_decay > 0.0 && w.haze_decay <= 1.0) {
            return Err(invalid(format!(
                "haze_decay must lie in (0, 1] (got {})",
                w.haze_decay
            )));
        }
        if w.haze_deposit < 0.0 {
            return Err(invalid("haze_deposit must not be negative".into()));
        }

        let s = &self.spm;
        if s.n_r < 2 {
            return Err(invalid(format!("spm.n_r must be >= 2 (got {})", s.n_r)));
        }
        if s.n_theta < 1 {
            return Err(invalid("spm.n_theta must be >= 1".into()));
        }
        if s.d_max <= 0.0 || s.sigma_r <= 0.0 || s.sigma_theta <= 0.0 {
            return Err(invalid("spm d_max and sigmas must be positive".into()));
        }

        // Displacement wraps each axis at most once
        if w.width < 2.0 * s.d_max || w.height < 2.0 * s.d_max {
            return Err(invalid(format!(
                "world extent ({}x{}) must be at least 2 * d_max ({})",
                w.width,
                w.height,
                2.0 * s.d_max
            )));
        }

        if self.precision.tau <= 0.0 {
            return Err(invalid("precision.tau must be positive".into()));
        }

        let a = &self.agent;
        if a.radius <= 0.0 || a.max_speed <= 0.0 || a.personal_space <= 0.0 {
            return Err(invalid(
                "agent radius, max_speed and personal_space must be positive".into(),
            ));
        }
        if a.personal_space >= s.d_max {
            tracing::warn!(
                "personal_space ({}) >= d_max ({}): agents will not sense beyond their personal space",
                a.personal_space,
                s.d_max
            );
        }

        if self.sampling.n_headings == 0 {
            return Err(invalid("sampling.n_headings must be >= 1".into()));
        }
        if self.gradient.learning_rate <= 0.0 || self.gradient.gradient_clip <= 0.0 {
            return Err(invalid(
                "gradient learning_rate and gradient_clip must be positive".into(),
            ));
        }

        Ok(())
    }
}

fn invalid(msg: String) -> EphError {
    EphError::InvalidConfig(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            seed = 7

            [spm]
            n_r = 10
            n_theta = 12
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(config.seed, 7);
        assert_eq!(config.spm.n_r, 10);
        assert_eq!(config.spm.n_theta, 12);
        assert_eq!(config.spm.d_max, 300.0);
        assert_eq!(config.world, WorldConfig::default());
    }

    #[test]
    fn test_enum_fields_parse_lowercase() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [world]
            deposit_mode = "immediate"

            [agent]
            controller = "gradient"
            "#,
        )
        .unwrap();
        assert_eq!(config.world.deposit_mode, DepositMode::Immediate);
        assert_eq!(config.agent.controller, ControllerKind::Gradient);
    }

    #[test]
    fn test_rejects_single_radial_bin() {
        let mut config = SimulationConfig::default();
        config.spm.n_r = 1;
        assert!(matches!(config.validate(), Err(EphError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_world_smaller_than_sensing_range() {
        let mut config = SimulationConfig::default();
        config.world.width = 500.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_decay() {
        let mut config = SimulationConfig::default();
        config.world.haze_decay = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_controller_kind_from_str() {
        assert_eq!("Gradient".parse::<ControllerKind>().unwrap(), ControllerKind::Gradient);
        assert!(matches!(
            "neural".parse::<ControllerKind>(),
            Err(EphError::UnknownController(_))
        ));
    }

    #[test]
    fn test_deposit_mode_from_str() {
        assert_eq!("Immediate".parse::<DepositMode>().unwrap(), DepositMode::Immediate);
        let err = "eager".parse::<DepositMode>().unwrap_err();
        assert!(matches!(err, EphError::UnknownDepositMode(ref m) if m == "eager"));
        assert_eq!(err.to_string(), "Unknown haze deposit mode: eager");
    }

    #[test]
    fn test_load_default_file() {
        let config = SimulationConfig::load(Path::new("data/config/default.toml"))
            .expect("Should load default config");
        assert_eq!(config, SimulationConfig::default());
    }
}
