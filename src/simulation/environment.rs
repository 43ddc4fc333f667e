//! World state and per-step kinematics
//!
//! `update()` runs after every agent has decided:
//! 1. decay the haze grid
//! 2. clamp velocities heading into nearby obstacles (margin 1.1x)
//! 3. integrate and wrap positions
//! 4. push overlapping agent pairs apart, half the overlap each
//! 5. push agents out of obstacles and drop any remaining approach velocity
//! 6. wrap again, since corrections can cross the boundary
//!
//! Pair and obstacle passes are O(N^2) / O(N*M).

use crate::core::config::WorldConfig;
use crate::core::types::{AgentId, ObstacleId, Tick, Vec2};
use crate::entity::{Agent, Obstacle};
use crate::haze::HazeGrid;
use crate::perception::{EntitySource, SenseWorld, SensedEntity};
use crate::simulation::tick::SimulationEvent;
use crate::spatial::toroidal::{displacement, wrap_position};

/// Approach velocity is removed inside this multiple of the contact distance
pub const OBSTACLE_CLAMP_MARGIN: f32 = 1.1;

#[derive(Debug)]
pub struct Environment {
    pub width: f32,
    pub height: f32,
    pub dt: f32,
    pub agents: Vec<Agent>,
    pub obstacles: Vec<Obstacle>,
    pub haze: HazeGrid,
    haze_decay: f32,
    /// Simulated seconds
    pub time: f32,
    pub current_tick: Tick,
}

impl Environment {
    pub fn new(world: &WorldConfig) -> Self {
        Self {
            width: world.width,
            height: world.height,
            dt: world.dt,
            agents: Vec::new(),
            obstacles: Vec::new(),
            haze: HazeGrid::new(world.width, world.height, world.haze_cell_size),
            haze_decay: world.haze_decay,
            time: 0.0,
            current_tick: 0,
        }
    }

    pub fn add_agent(&mut self, agent: Agent) {
        self.agents.push(agent);
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) -> ObstacleId {
        self.obstacles.push(obstacle);
        ObstacleId(self.obstacles.len() as u32 - 1)
    }

    /// Id for the next agent, one past the largest in use
    pub fn next_agent_id(&self) -> AgentId {
        let next = self.agents.iter().map(|a| a.id.0 + 1).max().unwrap_or(0);
        AgentId(next)
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Read-only view for the sensing pass: agents first, in list order,
    /// then obstacles at their centres
    pub fn sense_world(&self) -> SenseWorld {
        let agents = self.agents.iter().map(|a| SensedEntity {
            source: EntitySource::Agent(a.id),
            position: a.position,
            velocity: Some(a.velocity()),
        });
        let obstacles = self.obstacles.iter().enumerate().map(|(i, o)| SensedEntity {
            source: EntitySource::Obstacle(ObstacleId(i as u32)),
            position: o.center(),
            velocity: None,
        });

        SenseWorld {
            width: self.width,
            height: self.height,
            entities: agents.chain(obstacles).collect(),
        }
    }

    /// Environmental haze at an agent's current cell
    pub fn haze_at(&self, position: Vec2) -> f32 {
        self.haze.sample(position)
    }

    /// Advance physics one step; returns contact events
    pub fn update(&mut self) -> Vec<SimulationEvent> {
        let mut events = Vec::new();
        let tick = self.current_tick;

        self.time += self.dt;
        self.haze.decay(self.haze_decay);

        self.clamp_obstacle_approach();

        for agent in &mut self.agents {
            agent.integrate(self.dt);
            agent.position = wrap_position(agent.position, self.width, self.height);
        }

        self.resolve_agent_overlaps(tick, &mut events);
        self.resolve_obstacle_overlaps(tick, &mut events);

        for agent in &mut self.agents {
            agent.position = wrap_position(agent.position, self.width, self.height);
        }

        self.current_tick += 1;
        events
    }

    fn clamp_obstacle_approach(&mut self) {
        let (width, height) = (self.width, self.height);
        for agent in &mut self.agents {
            for obstacle in &self.obstacles {
                let contact = obstacle.contact(agent.position, agent.config.radius, width, height);
                if contact.distance < contact.min_distance * OBSTACLE_CLAMP_MARGIN {
                    let v_toward = agent.velocity().dot(contact.normal);
                    if v_toward > 0.0 {
                        agent.remove_velocity_component(contact.normal, v_toward);
                    }
                }
            }
        }
    }

    fn resolve_agent_overlaps(&mut self, tick: Tick, events: &mut Vec<SimulationEvent>) {
        let n = self.agents.len();
        for j in 1..n {
            let (head, tail) = self.agents.split_at_mut(j);
            let b = &mut tail[0];
            for a in head.iter_mut() {
                let d = displacement(a.position, b.position, self.width, self.height);
                let min_dist = a.config.radius + b.config.radius;
                if d.dist >= min_dist || d.dist <= 0.0 {
                    continue;
                }

                let overlap = min_dist - d.dist;
                let push = d.as_vec() / d.dist * (overlap / 2.0);
                a.position -= push;
                b.position += push;

                events.push(SimulationEvent::AgentCollision {
                    a: a.id,
                    b: b.id,
                    tick,
                    overlap,
                });
            }
        }
    }

    fn resolve_obstacle_overlaps(&mut self, tick: Tick, events: &mut Vec<SimulationEvent>) {
        let (width, height) = (self.width, self.height);
        for agent in &mut self.agents {
            for (i, obstacle) in self.obstacles.iter().enumerate() {
                let contact = obstacle.contact(agent.position, agent.config.radius, width, height);
                if !contact.is_overlapping() || contact.normal == Vec2::ZERO {
                    continue;
                }

                let overlap = contact.overlap();
                agent.position -= contact.normal * overlap;

                let v_toward = agent.velocity().dot(contact.normal);
                if v_toward > 0.0 {
                    agent.remove_velocity_component(contact.normal, v_toward);
                }

                events.push(SimulationEvent::ObstacleContact {
                    agent: agent.id,
                    obstacle: ObstacleId(i as u32),
                    tick,
                    overlap,
                });
            }
        }
    }
}
