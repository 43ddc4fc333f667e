//! Navigating agents

use serde::{Deserialize, Serialize};

use crate::control::{Controller, EgoState};
use crate::core::config::AgentDefaults;
use crate::core::types::{AgentId, Vec2};
use crate::haze::SelfHaze;
use crate::perception::{Observer, PrecisionMatrix, SpmTensor};
use crate::spatial::toroidal::displacement;

/// Speed above which the heading follows the velocity
pub const ORIENTATION_SPEED_THRESHOLD: f32 = 0.1;

/// Per-agent physical and perceptual parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub radius: f32,
    pub max_speed: f32,
    /// Attention radius; sets the intimate SPM bin and the precision falloff
    pub personal_space: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::from(&AgentDefaults::default())
    }
}

impl From<&AgentDefaults> for AgentConfig {
    fn from(defaults: &AgentDefaults) -> Self {
        Self {
            radius: defaults.radius,
            max_speed: defaults.max_speed,
            personal_space: defaults.personal_space,
        }
    }
}

#[derive(Debug)]
pub struct Agent {
    pub id: AgentId,
    pub position: Vec2,
    velocity: Vec2,
    /// Heading (radians, world frame)
    pub orientation: f32,
    pub config: AgentConfig,
    pub goal: Option<Vec2>,
    pub self_haze: SelfHaze,
    pub controller: Box<dyn Controller>,
    /// Most recent sensory input, kept for read-only observers
    pub last_spm: Option<SpmTensor>,
    pub last_precision: Option<PrecisionMatrix>,
}

impl Agent {
    pub fn new(
        id: AgentId,
        position: Vec2,
        config: AgentConfig,
        controller: Box<dyn Controller>,
    ) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            orientation: 0.0,
            config,
            goal: None,
            self_haze: SelfHaze::default(),
            controller,
            last_spm: None,
            last_precision: None,
        }
    }

    pub fn with_orientation(mut self, orientation: f32) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_goal(mut self, goal: Vec2) -> Self {
        self.goal = Some(goal);
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.set_velocity(velocity);
        self
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Set velocity, rescaled to at most max_speed
    pub fn set_velocity(&mut self, velocity: Vec2) {
        let speed = velocity.length();
        self.velocity = if speed > self.config.max_speed {
            velocity / speed * self.config.max_speed
        } else {
            velocity
        };
    }

    /// Velocity correction from the kinematics pass; never increases speed
    pub(crate) fn remove_velocity_component(&mut self, direction: Vec2, amount: f32) {
        self.velocity -= direction * amount;
    }

    /// Advance position by one step (no wrapping) and turn toward the
    /// direction of travel
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        if self.speed() > ORIENTATION_SPEED_THRESHOLD {
            self.orientation = self.velocity.y.atan2(self.velocity.x);
        }
    }

    /// Full-speed velocity toward the goal along the shortest wrapped path
    pub fn preferred_velocity(&self, width: f32, height: f32) -> Option<Vec2> {
        let goal = self.goal?;
        let d = displacement(self.position, goal, width, height);
        if d.dist > 0.0 {
            Some(d.as_vec() / d.dist * self.config.max_speed)
        } else {
            None
        }
    }

    /// Toroidal distance to the goal, if any
    pub fn distance_to_goal(&self, width: f32, height: f32) -> Option<f32> {
        self.goal
            .map(|goal| displacement(self.position, goal, width, height).dist)
    }

    pub fn observer(&self) -> Observer {
        Observer {
            id: self.id,
            position: self.position,
            velocity: self.velocity,
            orientation: self.orientation,
            personal_space: self.config.personal_space,
        }
    }

    pub fn ego_state(&self) -> EgoState {
        EgoState {
            velocity: self.velocity,
            orientation: self.orientation,
            max_speed: self.config.max_speed,
            haze_self: self.self_haze.level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ControllerKind, SimulationConfig};

    fn agent_at(x: f32, y: f32) -> Agent {
        let config = SimulationConfig::default();
        Agent::new(
            AgentId(0),
            Vec2::new(x, y),
            AgentConfig::from(&config.agent),
            ControllerKind::Sampling.build(&config, 0),
        )
    }

    #[test]
    fn test_defaults() {
        let agent = agent_at(0.0, 0.0);
        assert_eq!(agent.config.radius, 10.0);
        assert_eq!(agent.config.max_speed, 50.0);
        assert_eq!(agent.config.personal_space, 20.0);
        assert_eq!(agent.velocity(), Vec2::ZERO);
        assert!(agent.goal.is_none());
        assert!(!agent.self_haze.is_active());
    }

    #[test]
    fn test_set_velocity_clamps() {
        let mut agent = agent_at(0.0, 0.0);
        agent.set_velocity(Vec2::new(300.0, 400.0));
        assert!((agent.speed() - 50.0).abs() < 1e-4);
        assert!((agent.velocity() - Vec2::new(30.0, 40.0)).length() < 1e-4);

        agent.set_velocity(Vec2::new(3.0, 4.0));
        assert_eq!(agent.velocity(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_integrate_updates_orientation_only_when_moving() {
        let mut agent = agent_at(10.0, 10.0).with_orientation(1.0);

        agent.set_velocity(Vec2::new(0.05, 0.0));
        agent.integrate(1.0);
        assert_eq!(agent.orientation, 1.0);

        agent.set_velocity(Vec2::new(0.0, -10.0));
        agent.integrate(0.5);
        assert!((agent.position - Vec2::new(10.05, 5.0)).length() < 1e-4);
        assert!((agent.orientation + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_preferred_velocity_takes_short_way_round() {
        let agent = agent_at(790.0, 300.0).with_goal(Vec2::new(10.0, 300.0));
        let pref = agent.preferred_velocity(800.0, 600.0).unwrap();
        assert!((pref - Vec2::new(50.0, 0.0)).length() < 1e-4);
        assert!((agent.distance_to_goal(800.0, 600.0).unwrap() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_no_preferred_velocity_without_goal_or_at_goal() {
        let agent = agent_at(100.0, 100.0);
        assert!(agent.preferred_velocity(800.0, 600.0).is_none());

        let arrived = agent_at(100.0, 100.0).with_goal(Vec2::new(100.0, 100.0));
        assert!(arrived.preferred_velocity(800.0, 600.0).is_none());
    }
}
