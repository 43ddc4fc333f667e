//! Scenario generation
//!
//! Each scenario fixes a world layout and spawns agents from a seeded
//! `ChaCha8Rng`, so a (scenario, config, agent count) triple always yields
//! the same initial state.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::core::config::SimulationConfig;
use crate::core::error::{EphError, Result};
use crate::core::types::Vec2;
use crate::entity::{Agent, AgentConfig, Obstacle};
use crate::simulation::environment::Environment;

// Swarm
const SWARM_MARGIN: f32 = 50.0;
const SWARM_INITIAL_SPEED: f32 = 20.0;
const SWARM_OBSTACLE_RADIUS: f32 = 50.0;

// Scramble crossing
const SCRAMBLE_EXTENT: f32 = 800.0;
const SCRAMBLE_SPAWN_DISTANCE: f32 = 150.0;
const SCRAMBLE_SPREAD_ACROSS: f32 = 30.0;
const SCRAMBLE_SPREAD_ALONG: f32 = 20.0;
const SCRAMBLE_GOAL_JITTER: f32 = 30.0;
const SCRAMBLE_PERSONAL_SPACE: (f32, f32) = (15.0, 35.0);

// Narrow corridor
const CORRIDOR_WIDTH: f32 = 800.0;
const CORRIDOR_HEIGHT: f32 = 400.0;
const CORRIDOR_WALL_X: f32 = 400.0;
const CORRIDOR_GAP_Y: f32 = 200.0;
const CORRIDOR_GAP_WIDTH: f32 = 30.0;
const CORRIDOR_PILLAR_RADIUS: f32 = 10.0;
const CORRIDOR_PILLAR_SPACING: f32 = 15.0;
const CORRIDOR_GOAL: Vec2 = Vec2::new(700.0, 200.0);
const CORRIDOR_SPAWN_X: (f32, f32) = (50.0, 300.0);
const CORRIDOR_SPAWN_Y: (f32, f32) = (50.0, 350.0);
const CORRIDOR_PERSONAL_SPACE: (f32, f32) = (10.0, 40.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioKind {
    /// Goal-less agents scattered around one central obstacle
    Swarm,
    /// Four groups crossing through the centre to the opposite side
    ScrambleCrossing,
    /// Agents squeezing through a one-agent gap in a pillar wall
    NarrowCorridor,
}

impl FromStr for ScenarioKind {
    type Err = EphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "swarm" => Ok(ScenarioKind::Swarm),
            "scramble" | "scramble-crossing" => Ok(ScenarioKind::ScrambleCrossing),
            "corridor" | "narrow-corridor" => Ok(ScenarioKind::NarrowCorridor),
            other => Err(EphError::UnknownScenario(other.to_string())),
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScenarioKind::Swarm => "swarm",
            ScenarioKind::ScrambleCrossing => "scramble-crossing",
            ScenarioKind::NarrowCorridor => "narrow-corridor",
        };
        f.write_str(name)
    }
}

impl ScenarioKind {
    pub fn default_agent_count(self) -> usize {
        match self {
            ScenarioKind::Swarm => 10,
            ScenarioKind::ScrambleCrossing => 20,
            ScenarioKind::NarrowCorridor => 50,
        }
    }

    /// Apply the scenario's fixed world extent
    ///
    /// The sensing horizon is shrunk to half the smaller extent when the
    /// world would otherwise be too small for single-wrap displacement.
    pub fn configure(self, config: &mut SimulationConfig) {
        match self {
            ScenarioKind::Swarm => {}
            ScenarioKind::ScrambleCrossing => {
                config.world.width = SCRAMBLE_EXTENT;
                config.world.height = SCRAMBLE_EXTENT;
            }
            ScenarioKind::NarrowCorridor => {
                config.world.width = CORRIDOR_WIDTH;
                config.world.height = CORRIDOR_HEIGHT;
            }
        }

        let limit = config.world.width.min(config.world.height) / 2.0;
        if config.spm.d_max > limit {
            tracing::info!(
                "{}: reducing d_max from {} to {} to fit the world",
                self,
                config.spm.d_max,
                limit
            );
            config.spm.d_max = limit;
        }
    }
}

/// Build the initial environment for a scenario
///
/// `config` should already have been passed through
/// [`ScenarioKind::configure`].
pub fn build_environment(
    kind: ScenarioKind,
    config: &SimulationConfig,
    agent_count: usize,
) -> Environment {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut env = Environment::new(&config.world);

    match kind {
        ScenarioKind::Swarm => spawn_swarm(&mut env, config, agent_count, &mut rng),
        ScenarioKind::ScrambleCrossing => spawn_scramble(&mut env, config, agent_count, &mut rng),
        ScenarioKind::NarrowCorridor => spawn_corridor(&mut env, config, agent_count, &mut rng),
    }

    tracing::debug!(
        "Built {} scenario: {} agents, {} obstacles, {}x{} world",
        kind,
        env.agents.len(),
        env.obstacles.len(),
        env.width,
        env.height
    );
    env
}

fn new_agent(
    env: &Environment,
    config: &SimulationConfig,
    position: Vec2,
    agent_config: AgentConfig,
    rng: &mut ChaCha8Rng,
) -> Agent {
    let controller = config.agent.controller.build(config, rng.gen());
    Agent::new(env.next_agent_id(), position, agent_config, controller)
}

fn spawn_swarm(env: &mut Environment, config: &SimulationConfig, count: usize, rng: &mut ChaCha8Rng) {
    let (w, h) = (env.width, env.height);
    let agent_config = AgentConfig::from(&config.agent);

    for _ in 0..count {
        let position = Vec2::new(
            rng.gen_range(SWARM_MARGIN..w - SWARM_MARGIN),
            rng.gen_range(SWARM_MARGIN..h - SWARM_MARGIN),
        );
        let heading = rng.gen_range(-PI..PI);
        let velocity = Vec2::new(
            rng.gen_range(-SWARM_INITIAL_SPEED..SWARM_INITIAL_SPEED),
            rng.gen_range(-SWARM_INITIAL_SPEED..SWARM_INITIAL_SPEED),
        );
        let agent = new_agent(env, config, position, agent_config, rng)
            .with_orientation(heading)
            .with_velocity(velocity);
        env.add_agent(agent);
    }

    env.add_obstacle(Obstacle::circle(Vec2::new(w / 2.0, h / 2.0), SWARM_OBSTACLE_RADIUS));
}

fn spawn_scramble(env: &mut Environment, config: &SimulationConfig, count: usize, rng: &mut ChaCha8Rng) {
    let center = Vec2::new(env.width / 2.0, env.height / 2.0);
    let d = SCRAMBLE_SPAWN_DISTANCE;
    // (spawn offset, travels vertically)
    let groups = [
        (Vec2::new(0.0, -d), true),
        (Vec2::new(0.0, d), true),
        (Vec2::new(d, 0.0), false),
        (Vec2::new(-d, 0.0), false),
    ];

    for i in 0..count {
        let (offset, vertical) = groups[i % groups.len()];
        let across = rng.gen_range(-SCRAMBLE_SPREAD_ACROSS..SCRAMBLE_SPREAD_ACROSS);
        let along = rng.gen_range(-SCRAMBLE_SPREAD_ALONG..SCRAMBLE_SPREAD_ALONG);
        let jitter = if vertical {
            Vec2::new(across, along)
        } else {
            Vec2::new(along, across)
        };
        let goal_jitter = Vec2::new(
            rng.gen_range(-SCRAMBLE_GOAL_JITTER..SCRAMBLE_GOAL_JITTER),
            rng.gen_range(-SCRAMBLE_GOAL_JITTER..SCRAMBLE_GOAL_JITTER),
        );

        let agent_config = AgentConfig {
            personal_space: rng.gen_range(SCRAMBLE_PERSONAL_SPACE.0..SCRAMBLE_PERSONAL_SPACE.1),
            ..AgentConfig::from(&config.agent)
        };
        let heading = rng.gen_range(-PI..PI);
        let agent = new_agent(env, config, center + offset + jitter, agent_config, rng)
            .with_orientation(heading)
            .with_goal(center - offset + goal_jitter);
        env.add_agent(agent);
    }
}

fn spawn_corridor(env: &mut Environment, config: &SimulationConfig, count: usize, rng: &mut ChaCha8Rng) {
    let gap_top = CORRIDOR_GAP_Y - CORRIDOR_GAP_WIDTH / 2.0;
    let gap_bottom = CORRIDOR_GAP_Y + CORRIDOR_GAP_WIDTH / 2.0;

    let mut y = 0.0;
    while y < gap_top {
        env.add_obstacle(Obstacle::circle(Vec2::new(CORRIDOR_WALL_X, y), CORRIDOR_PILLAR_RADIUS));
        y += CORRIDOR_PILLAR_SPACING;
    }
    let mut y = gap_bottom;
    while y < env.height {
        env.add_obstacle(Obstacle::circle(Vec2::new(CORRIDOR_WALL_X, y), CORRIDOR_PILLAR_RADIUS));
        y += CORRIDOR_PILLAR_SPACING;
    }

    for _ in 0..count {
        let position = Vec2::new(
            rng.gen_range(CORRIDOR_SPAWN_X.0..CORRIDOR_SPAWN_X.1),
            rng.gen_range(CORRIDOR_SPAWN_Y.0..CORRIDOR_SPAWN_Y.1),
        );
        let agent_config = AgentConfig {
            personal_space: rng.gen_range(CORRIDOR_PERSONAL_SPACE.0..CORRIDOR_PERSONAL_SPACE.1),
            ..AgentConfig::from(&config.agent)
        };
        let agent = new_agent(env, config, position, agent_config, rng).with_goal(CORRIDOR_GOAL);
        env.add_agent(agent);
    }
}
