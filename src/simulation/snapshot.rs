//! Read-only snapshots for logging and visualisation

use serde::Serialize;

use crate::core::types::{AgentId, Tick, Vec2};
use crate::entity::{Agent, Obstacle};
use crate::haze::HazeGrid;
use crate::perception::{PrecisionMatrix, SpmTensor};
use crate::simulation::environment::Environment;

#[derive(Debug, Clone, Serialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub orientation: f32,
    pub goal: Option<Vec2>,
    pub personal_space: f32,
    pub haze_self: f32,
    pub stuck_counter: u32,
    /// Environmental haze at the agent's cell
    pub env_haze: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spm: Option<SpmTensor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<PrecisionMatrix>,
}

impl AgentSnapshot {
    fn capture(agent: &Agent, env_haze: f32, include_fields: bool) -> Self {
        Self {
            id: agent.id,
            position: agent.position,
            velocity: agent.velocity(),
            orientation: agent.orientation,
            goal: agent.goal,
            personal_space: agent.config.personal_space,
            haze_self: agent.self_haze.level,
            stuck_counter: agent.self_haze.stuck_counter,
            env_haze,
            spm: include_fields.then(|| agent.last_spm.clone()).flatten(),
            precision: include_fields.then(|| agent.last_precision.clone()).flatten(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub tick: Tick,
    pub time: f32,
    pub width: f32,
    pub height: f32,
    pub agents: Vec<AgentSnapshot>,
    pub obstacles: Vec<Obstacle>,
    pub haze_max: f32,
    pub haze_total: f32,
    /// Full haze grid, only with `include_fields`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub haze: Option<HazeGrid>,
}

impl WorldSnapshot {
    /// Capture the environment; `include_fields` adds each agent's last SPM
    /// and precision plus the haze grid
    pub fn capture(env: &Environment, include_fields: bool) -> Self {
        Self {
            tick: env.current_tick,
            time: env.time,
            width: env.width,
            height: env.height,
            agents: env
                .agents
                .iter()
                .map(|a| AgentSnapshot::capture(a, env.haze_at(a.position), include_fields))
                .collect(),
            obstacles: env.obstacles.clone(),
            haze_max: env.haze.max_value(),
            haze_total: env.haze.total(),
            haze: include_fields.then(|| env.haze.clone()),
        }
    }

    pub fn mean_speed(&self) -> f32 {
        if self.agents.is_empty() {
            return 0.0;
        }
        self.agents.iter().map(|a| a.velocity.length()).sum::<f32>() / self.agents.len() as f32
    }
}
