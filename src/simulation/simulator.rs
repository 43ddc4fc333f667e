//! Simulation driver: owns the environment, encoder and config

use serde::Serialize;

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::Tick;
use crate::perception::SpmEncoder;
use crate::scenario::{build_environment, ScenarioKind};
use crate::simulation::environment::Environment;
use crate::simulation::snapshot::WorldSnapshot;
use crate::simulation::tick::{run_simulation_tick, SimulationEvent};

/// Event counts accumulated over a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub steps: Tick,
    pub agent_collisions: usize,
    pub obstacle_contacts: usize,
    pub goals_reached: usize,
    pub stuck_events: usize,
    pub recoveries: usize,
}

impl RunStats {
    pub fn record(&mut self, events: &[SimulationEvent]) {
        self.steps += 1;
        for event in events {
            match event {
                SimulationEvent::AgentCollision { .. } => self.agent_collisions += 1,
                SimulationEvent::ObstacleContact { .. } => self.obstacle_contacts += 1,
                SimulationEvent::GoalReached { .. } => self.goals_reached += 1,
                SimulationEvent::AgentStuck { .. } => self.stuck_events += 1,
                SimulationEvent::AgentRecovered { .. } => self.recoveries += 1,
            }
        }
    }
}

#[derive(Debug)]
pub struct Simulator {
    pub environment: Environment,
    encoder: SpmEncoder,
    config: SimulationConfig,
}

impl Simulator {
    /// Wrap an environment; the config is validated first
    pub fn new(config: SimulationConfig, environment: Environment) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            environment,
            encoder: SpmEncoder::from_config(&config),
            config,
        })
    }

    /// Configure the world for `kind`, then spawn its agents
    pub fn from_scenario(
        kind: ScenarioKind,
        mut config: SimulationConfig,
        agent_count: usize,
    ) -> Result<Self> {
        kind.configure(&mut config);
        config.validate()?;
        let environment = build_environment(kind, &config, agent_count);
        Self::new(config, environment)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// sense -> decide -> integrate for every agent
    pub fn step(&mut self) -> Vec<SimulationEvent> {
        run_simulation_tick(&mut self.environment, &self.encoder, &self.config)
    }

    /// Run `steps` ticks, keeping only event counts
    pub fn run(&mut self, steps: u64) -> RunStats {
        let mut stats = RunStats::default();
        for _ in 0..steps {
            let events = self.step();
            stats.record(&events);
        }
        tracing::debug!("Run finished: {:?}", stats);
        stats
    }

    pub fn snapshot(&self, include_fields: bool) -> WorldSnapshot {
        WorldSnapshot::capture(&self.environment, include_fields)
    }
}
