//! Static obstacles

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;
use crate::spatial::toroidal::displacement;

/// A static obstacle; rectangles are axis-aligned
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Obstacle {
    Circle { center: Vec2, radius: f32 },
    Rect { center: Vec2, width: f32, height: f32 },
}

/// Geometric relation between an agent disc and an obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit vector from the agent toward the obstacle (zero if undefined)
    pub normal: Vec2,
    /// Separation measured the same way as `min_distance`
    pub distance: f32,
    /// Separation below which the agent overlaps the obstacle
    pub min_distance: f32,
}

impl Contact {
    pub fn overlap(&self) -> f32 {
        (self.min_distance - self.distance).max(0.0)
    }

    pub fn is_overlapping(&self) -> bool {
        self.distance < self.min_distance
    }
}

impl Obstacle {
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Obstacle::Circle { center, radius }
    }

    pub fn rect(center: Vec2, width: f32, height: f32) -> Self {
        Obstacle::Rect {
            center,
            width,
            height,
        }
    }

    /// Point the perception system senses this obstacle at
    pub fn center(&self) -> Vec2 {
        match *self {
            Obstacle::Circle { center, .. } | Obstacle::Rect { center, .. } => center,
        }
    }

    /// Contact query for an agent disc at `point` in a periodic world
    ///
    /// Circles compare centre distance against the sum of radii. Rectangles
    /// compare the distance to the nearest surface point against the agent
    /// radius; that distance is negative when the centre is inside.
    pub fn contact(&self, point: Vec2, agent_radius: f32, width: f32, height: f32) -> Contact {
        let d = displacement(point, self.center(), width, height);

        match *self {
            Obstacle::Circle { radius, .. } => Contact {
                normal: d.as_vec().normalize_or_zero(),
                distance: d.dist,
                min_distance: agent_radius + radius,
            },
            Obstacle::Rect {
                width: w, height: h, ..
            } => {
                let half = Vec2::new(w / 2.0, h / 2.0);
                // Agent centre in the rectangle's frame
                let local = -d.as_vec();
                let nearest = local.clamp(-half, half);

                if nearest != local {
                    let to_surface = nearest - local;
                    return Contact {
                        normal: to_surface.normalize_or_zero(),
                        distance: to_surface.length(),
                        min_distance: agent_radius,
                    };
                }

                // Inside: leave through the closest face
                let pen_x = half.x - local.x.abs();
                let pen_y = half.y - local.y.abs();
                let normal = if pen_x <= pen_y {
                    Vec2::new(-local.x.signum(), 0.0)
                } else {
                    Vec2::new(0.0, -local.y.signum())
                };
                Contact {
                    normal,
                    distance: -pen_x.min(pen_y),
                    min_distance: agent_radius,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_contact() {
        let obstacle = Obstacle::circle(Vec2::new(50.0, 50.0), 20.0);
        let contact = obstacle.contact(Vec2::new(25.0, 50.0), 10.0, 200.0, 200.0);

        assert_eq!(contact.normal, Vec2::new(1.0, 0.0));
        assert!((contact.distance - 25.0).abs() < 1e-5);
        assert_eq!(contact.min_distance, 30.0);
        assert!(contact.is_overlapping());
        assert!((contact.overlap() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_circle_contact_wraps() {
        let obstacle = Obstacle::circle(Vec2::new(5.0, 100.0), 10.0);
        let contact = obstacle.contact(Vec2::new(195.0, 100.0), 10.0, 200.0, 200.0);

        assert!((contact.distance - 10.0).abs() < 1e-4);
        assert!((contact.normal - Vec2::new(1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_rect_contact_outside() {
        let obstacle = Obstacle::rect(Vec2::new(100.0, 100.0), 20.0, 40.0);

        // Left of the rectangle, level with its centre
        let side = obstacle.contact(Vec2::new(80.0, 100.0), 5.0, 400.0, 400.0);
        assert!((side.distance - 10.0).abs() < 1e-5);
        assert_eq!(side.normal, Vec2::new(1.0, 0.0));
        assert!(!side.is_overlapping());

        // Diagonal from the top-right corner (110, 120)
        let corner = obstacle.contact(Vec2::new(113.0, 124.0), 10.0, 400.0, 400.0);
        assert!((corner.distance - 5.0).abs() < 1e-5);
        assert!((corner.normal - Vec2::new(-0.6, -0.8)).length() < 1e-5);
        assert!(corner.is_overlapping());
    }

    #[test]
    fn test_rect_contact_inside() {
        let obstacle = Obstacle::rect(Vec2::new(100.0, 100.0), 20.0, 40.0);
        let contact = obstacle.contact(Vec2::new(107.0, 95.0), 5.0, 400.0, 400.0);

        // Closest face is x = 110, so the obstacle lies in -x
        assert_eq!(contact.normal, Vec2::new(-1.0, 0.0));
        assert!((contact.distance + 3.0).abs() < 1e-5);
        assert!((contact.overlap() - 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_center() {
        assert_eq!(
            Obstacle::rect(Vec2::new(1.0, 2.0), 3.0, 4.0).center(),
            Vec2::new(1.0, 2.0)
        );
    }
}
