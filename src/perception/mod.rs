//! Egocentric perception: the saliency polar map and its precision weights
//!
//! Sensing is a pure function of a read-only world view. Each observer gets
//! a fresh 3-channel log-polar tensor plus a radially symmetric precision
//! matrix derived from its personal-space radius.

pub mod precision;
pub mod spm;

pub use precision::PrecisionMatrix;
pub use spm::{SpmEncoder, SpmTensor, OCCUPANCY, RADIAL_VELOCITY, TANGENTIAL_VELOCITY};

use serde::Serialize;

use crate::core::types::{AgentId, ObstacleId, Vec2};

/// Where a sensed entity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntitySource {
    Agent(AgentId),
    Obstacle(ObstacleId),
}

/// One entity as seen by the perception system
#[derive(Debug, Clone, Serialize)]
pub struct SensedEntity {
    pub source: EntitySource,
    pub position: Vec2,
    /// `None` for static obstacles
    pub velocity: Option<Vec2>,
}

/// Read-only view of everything that can be sensed during one step
#[derive(Debug, Clone, Default)]
pub struct SenseWorld {
    pub width: f32,
    pub height: f32,
    pub entities: Vec<SensedEntity>,
}

/// The sensing agent's own state, as needed by the encoder
#[derive(Debug, Clone, Copy)]
pub struct Observer {
    pub id: AgentId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub orientation: f32,
    pub personal_space: f32,
}
