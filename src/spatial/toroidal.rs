//! Wrap-aware geometry for a finite periodic world

use crate::core::types::Vec2;

/// Shortest displacement from one point to another on the torus
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displacement {
    pub dx: f32,
    pub dy: f32,
    pub dist: f32,
}

impl Displacement {
    pub fn as_vec(&self) -> Vec2 {
        Vec2::new(self.dx, self.dy)
    }
}

/// Displacement from `p1` to `p2`, wrapping each axis at most once
///
/// A raw delta larger than half the extent is shifted by one full extent
/// toward zero. This is exact whenever both points lie inside the world
/// and only approximate for points several extents apart.
pub fn displacement(p1: Vec2, p2: Vec2, width: f32, height: f32) -> Displacement {
    let dx = wrap_delta(p2.x - p1.x, width);
    let dy = wrap_delta(p2.y - p1.y, height);
    Displacement {
        dx,
        dy,
        dist: (dx * dx + dy * dy).sqrt(),
    }
}

#[inline]
fn wrap_delta(delta: f32, extent: f32) -> f32 {
    if delta.abs() > extent / 2.0 {
        delta - delta.signum() * extent
    } else {
        delta
    }
}

/// Map a position back into [0, width) x [0, height)
pub fn wrap_position(p: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(wrap_coord(p.x, width), wrap_coord(p.y, height))
}

#[inline]
fn wrap_coord(v: f32, extent: f32) -> f32 {
    let wrapped = v.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}
