//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// 2D position / velocity in world units
pub use glam::Vec2;

/// Unique identifier for agents (index-stable for the lifetime of a run)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Unique identifier for static obstacles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObstacleId(pub u32);

/// Simulation step counter
pub type Tick = u64;

/// Wrap an angle into [-pi, pi)
pub fn normalize_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Rotate a vector by `angle` radians (counter-clockwise)
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (s, c) = angle.sin_cos();
    Vec2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_ordering() {
        let a = AgentId::new(1);
        let b = AgentId::new(2);
        assert!(a < b);
        assert_eq!(a, AgentId(1));
    }

    #[test]
    fn test_normalize_angle_range() {
        for raw in [-10.0_f32, -PI, -1.0, 0.0, 1.0, PI - 0.001, 7.5, 100.0] {
            let a = normalize_angle(raw);
            assert!(a >= -PI && a < PI, "{} normalized to {}", raw, a);
            // Same direction
            assert!((a.sin() - raw.sin()).abs() < 1e-3);
            assert!((a.cos() - raw.cos()).abs() < 1e-3);
        }
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let v = rotate(Vec2::new(1.0, 0.0), PI / 2.0);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
    }
}
