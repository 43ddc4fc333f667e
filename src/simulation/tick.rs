//! Tick system - orchestrates one simulation step
//!
//! sense -> decide -> deposit haze -> kinematics
//!
//! With deferred deposits every agent decides against the same haze grid,
//! so the decide phase is order-independent and runs on rayon for large
//! populations. Immediate deposits land as each agent decides; later agents
//! in the list see them, and the pass is sequential.

use rayon::prelude::*;
use serde::Serialize;

use crate::core::config::{DepositMode, SimulationConfig};
use crate::core::types::{AgentId, ObstacleId, Tick};
use crate::entity::Agent;
use crate::haze::{HazeCell, HazeGrid};
use crate::perception::{SenseWorld, SpmEncoder};
use crate::simulation::environment::Environment;

/// Events generated during a simulation tick
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum SimulationEvent {
    /// Self-haze started building (agent has been slow for too long)
    AgentStuck {
        agent: AgentId,
        tick: Tick,
        stuck_counter: u32,
    },
    /// Self-haze decayed back to zero
    AgentRecovered { agent: AgentId, tick: Tick },
    /// Two agents overlapped and were pushed apart
    AgentCollision {
        a: AgentId,
        b: AgentId,
        tick: Tick,
        overlap: f32,
    },
    /// An agent overlapped an obstacle and was pushed out
    ObstacleContact {
        agent: AgentId,
        obstacle: ObstacleId,
        tick: Tick,
        overlap: f32,
    },
    /// An agent came within tolerance of its goal; the goal is cleared
    GoalReached { agent: AgentId, tick: Tick },
}

/// Outcome of one agent's decide step
#[derive(Debug, Clone, Copy)]
struct Decision {
    agent: AgentId,
    cell: HazeCell,
    haze_started: bool,
    haze_cleared: bool,
    stuck_counter: u32,
}

/// Run one simulation step
pub fn run_simulation_tick(
    env: &mut Environment,
    encoder: &SpmEncoder,
    config: &SimulationConfig,
) -> Vec<SimulationEvent> {
    let mut events = Vec::new();
    let tick = env.current_tick;

    let decisions = match config.world.deposit_mode {
        DepositMode::Deferred => decide_deferred(env, encoder, config),
        DepositMode::Immediate => decide_immediate(env, encoder, config),
    };

    for decision in &decisions {
        if decision.haze_started {
            tracing::debug!(
                "Agent {:?} stuck (counter {}), self-haze rising",
                decision.agent,
                decision.stuck_counter
            );
            events.push(SimulationEvent::AgentStuck {
                agent: decision.agent,
                tick,
                stuck_counter: decision.stuck_counter,
            });
        }
        if decision.haze_cleared {
            events.push(SimulationEvent::AgentRecovered {
                agent: decision.agent,
                tick,
            });
        }
    }

    events.extend(env.update());
    check_goals(env, config.goal_tolerance, tick, &mut events);

    tracing::debug!(
        "Tick {}: {} agents, {} events, haze max {:.3}",
        tick,
        env.agents.len(),
        events.len(),
        env.haze.max_value()
    );

    events
}

/// Decide against a read-only haze grid, then apply every deposit
fn decide_deferred(
    env: &mut Environment,
    encoder: &SpmEncoder,
    config: &SimulationConfig,
) -> Vec<Decision> {
    let world = env.sense_world();
    let haze = &env.haze;

    // Use parallel for large agent counts, sequential for small
    let decisions: Vec<Decision> = if env.agents.len() >= config.parallel_threshold {
        env.agents
            .par_iter_mut()
            .map(|agent| decide_agent(agent, &world, encoder, haze, config))
            .collect()
    } else {
        env.agents
            .iter_mut()
            .map(|agent| decide_agent(agent, &world, encoder, haze, config))
            .collect()
    };

    for decision in &decisions {
        env.haze.deposit(decision.cell, config.world.haze_deposit);
    }
    decisions
}

/// Sequential decide with deposits visible to agents later in the list
fn decide_immediate(
    env: &mut Environment,
    encoder: &SpmEncoder,
    config: &SimulationConfig,
) -> Vec<Decision> {
    let mut world = env.sense_world();
    let mut decisions = Vec::with_capacity(env.agents.len());

    for i in 0..env.agents.len() {
        let agent = &mut env.agents[i];
        let decision = decide_agent(agent, &world, encoder, &env.haze, config);

        // Later agents also sense the updated velocity
        world.entities[i].velocity = Some(agent.velocity());
        env.haze.deposit(decision.cell, config.world.haze_deposit);
        decisions.push(decision);
    }
    decisions
}

/// Self-haze update, sense, decide and set velocity for one agent
fn decide_agent(
    agent: &mut Agent,
    world: &SenseWorld,
    encoder: &SpmEncoder,
    haze: &HazeGrid,
    config: &SimulationConfig,
) -> Decision {
    let was_hazy = agent.self_haze.is_active();
    let haze_started = agent.self_haze.update(agent.speed(), &config.self_haze);
    let haze_cleared = was_hazy && !agent.self_haze.is_active();

    let (spm, precision) = encoder.sense(&agent.observer(), world);
    let cell = haze.cell_of(agent.position);
    let env_haze = haze.get(cell);
    let preferred = agent.preferred_velocity(world.width, world.height);

    let action = agent.controller.decide_action(
        &agent.ego_state(),
        &spm,
        &precision,
        env_haze,
        preferred,
    );
    agent.set_velocity(action);

    tracing::trace!(
        "Agent {:?} at {:?}: action {:?} (env haze {:.2}, self haze {:.2})",
        agent.id,
        agent.position,
        agent.velocity(),
        env_haze,
        agent.self_haze.level
    );

    agent.last_spm = Some(spm);
    agent.last_precision = Some(precision);

    Decision {
        agent: agent.id,
        cell,
        haze_started,
        haze_cleared,
        stuck_counter: agent.self_haze.stuck_counter,
    }
}

fn check_goals(env: &mut Environment, tolerance: f32, tick: Tick, events: &mut Vec<SimulationEvent>) {
    let (width, height) = (env.width, env.height);
    for agent in &mut env.agents {
        let reached = agent
            .distance_to_goal(width, height)
            .is_some_and(|d| d < tolerance);
        if reached {
            tracing::debug!("Agent {:?} reached its goal at tick {}", agent.id, tick);
            agent.goal = None;
            events.push(SimulationEvent::GoalReached {
                agent: agent.id,
                tick,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ControllerKind, WorldConfig};
    use crate::core::types::Vec2;
    use crate::entity::AgentConfig;

    fn setup(mode: DepositMode) -> (Environment, SpmEncoder, SimulationConfig) {
        let mut config = SimulationConfig::default();
        config.world.deposit_mode = mode;
        let env = Environment::new(&config.world);
        let encoder = SpmEncoder::from_config(&config);
        (env, encoder, config)
    }

    fn spawn(env: &mut Environment, config: &SimulationConfig, pos: Vec2) -> AgentId {
        let id = env.next_agent_id();
        env.add_agent(Agent::new(
            id,
            pos,
            AgentConfig::from(&config.agent),
            ControllerKind::Sampling.build(config, id.0 as u64),
        ));
        id
    }

    #[test]
    fn test_tick_records_sensory_input() {
        let (mut env, encoder, config) = setup(DepositMode::Deferred);
        spawn(&mut env, &config, Vec2::new(100.0, 100.0));
        spawn(&mut env, &config, Vec2::new(150.0, 100.0));

        run_simulation_tick(&mut env, &encoder, &config);

        for agent in &env.agents {
            let spm = agent.last_spm.as_ref().expect("sensed");
            assert_eq!(spm.shape(), (3, 6, 6));
            assert!(spm.total_occupancy() > 0.0);
            assert!(agent.last_precision.is_some());
        }
        assert_eq!(env.current_tick, 1);
    }

    #[test]
    fn test_deposit_then_decay() {
        let (mut env, encoder, config) = setup(DepositMode::Deferred);
        spawn(&mut env, &config, Vec2::new(100.0, 100.0));
        let cell = env.haze.cell_of(Vec2::new(100.0, 100.0));

        run_simulation_tick(&mut env, &encoder, &config);
        assert!((env.haze.get(cell) - 0.1 * 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_deferred_deposits_accumulate_in_shared_cell() {
        let (mut env, encoder, config) = setup(DepositMode::Deferred);
        spawn(&mut env, &config, Vec2::new(101.0, 101.0));
        spawn(&mut env, &config, Vec2::new(119.0, 119.0));
        let cell = env.haze.cell_of(Vec2::new(101.0, 101.0));
        assert_eq!(cell, env.haze.cell_of(Vec2::new(119.0, 119.0)));

        run_simulation_tick(&mut env, &encoder, &config);
        assert!((env.haze.get(cell) - 0.2 * 0.99).abs() < 1e-5);
    }

    #[test]
    fn test_immediate_mode_deposits_per_agent() {
        let (mut env, encoder, config) = setup(DepositMode::Immediate);
        spawn(&mut env, &config, Vec2::new(101.0, 101.0));
        spawn(&mut env, &config, Vec2::new(119.0, 119.0));
        let cell = env.haze.cell_of(Vec2::new(101.0, 101.0));

        run_simulation_tick(&mut env, &encoder, &config);
        assert!((env.haze.get(cell) - 0.2 * 0.99).abs() < 1e-5);
    }

    #[test]
    fn test_goal_reached_clears_goal() {
        let (mut env, encoder, config) = setup(DepositMode::Deferred);
        let id = spawn(&mut env, &config, Vec2::new(100.0, 100.0));
        env.agents[0].goal = Some(Vec2::new(105.0, 100.0));

        let events = run_simulation_tick(&mut env, &encoder, &config);

        assert!(events.contains(&SimulationEvent::GoalReached { agent: id, tick: 0 }));
        assert!(env.agents[0].goal.is_none());
    }

    #[test]
    fn test_stuck_agent_emits_event_once() {
        let (mut env, encoder, mut config) = setup(DepositMode::Deferred);
        // Speed threshold above max speed: every step counts as stuck
        config.self_haze.speed_threshold = 1000.0;
        let id = spawn(&mut env, &config, Vec2::new(100.0, 100.0));

        let mut stuck_events = 0;
        for _ in 0..60 {
            for event in run_simulation_tick(&mut env, &encoder, &config) {
                if let SimulationEvent::AgentStuck { agent, stuck_counter, .. } = event {
                    assert_eq!(agent, id);
                    assert_eq!(stuck_counter, 51);
                    stuck_events += 1;
                }
            }
        }
        assert_eq!(stuck_events, 1);
        assert!(env.agents[0].self_haze.level > 0.0);
    }

    #[test]
    fn test_parallel_path_matches_sequential() {
        let build = |threshold: usize| {
            let mut config = SimulationConfig::default();
            config.parallel_threshold = threshold;
            let mut env = Environment::new(&WorldConfig::default());
            for i in 0..12 {
                let pos = Vec2::new(60.0 + 55.0 * i as f32, 100.0 + 30.0 * (i % 3) as f32);
                spawn(&mut env, &config, pos);
            }
            let encoder = SpmEncoder::from_config(&config);
            for _ in 0..5 {
                run_simulation_tick(&mut env, &encoder, &config);
            }
            env.agents.iter().map(|a| a.position).collect::<Vec<_>>()
        };

        assert_eq!(build(1), build(usize::MAX));
    }
}
