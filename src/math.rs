//! Small 2D vector math used throughout the simulation.
//!
//! The simulation works in plain `f32` world units. Conversions to the
//! physics library's own vector types happen only inside `physics`.

use serde::{Deserialize, Serialize};

/// 2D world-space vector (x = east/west, y = north/south).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance_to(&self, other: Vec2) -> f32 {
        (*self - other).length()
    }

    pub fn dot(&self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Unit-length copy, or zero when the vector is degenerate.
    pub fn normalized(&self) -> Vec2 {
        let len = self.length();
        if len < 1e-4 {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / len, self.y / len)
        }
    }

    /// Heading angle in radians (atan2 convention).
    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn from_angle(angle: f32) -> Vec2 {
        Vec2::new(angle.cos(), angle.sin())
    }

    pub fn scaled(&self, factor: f32) -> Vec2 {
        Vec2::new(self.x * factor, self.y * factor)
    }

    /// Midpoint between two positions.
    pub fn midpoint(a: Vec2, b: Vec2) -> Vec2 {
        Vec2::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        self.scaled(rhs)
    }
}

impl std::ops::Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Solve the interception quadratic for a projectile of speed `proj_speed`
/// fired from the origin of `rel_pos` at a target moving with `target_vel`.
///
/// Solves `|rel_pos + target_vel * t|^2 = (proj_speed * t)^2` and returns the
/// smallest positive root, or `None` when the target outruns the round.
pub fn intercept_time(rel_pos: Vec2, target_vel: Vec2, proj_speed: f32) -> Option<f32> {
    let a = target_vel.length_squared() - proj_speed * proj_speed;
    let b = 2.0 * rel_pos.dot(target_vel);
    let c = rel_pos.length_squared();

    if a.abs() < 1e-3 {
        // Degenerate: closing speed equals projectile speed.
        if b.abs() < 1e-6 {
            return None;
        }
        let t = -c / b;
        return (t > 0.0).then_some(t);
    }

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);

    let mut best = f32::MAX;
    for t in [t1, t2] {
        if t > 0.0 && t < best {
            best = t;
        }
    }
    (best < f32::MAX).then_some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_basics() {
        let v = Vec2::new(3.0, 4.0);
        assert!((v.length() - 5.0).abs() < 1e-6);
        assert!((v.normalized().length() - 1.0).abs() < 1e-6);
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
    }

    #[test]
    fn test_intercept_stationary_target() {
        // Target 100 units away, not moving, projectile at 50 u/s: t = 2 s.
        let t = intercept_time(Vec2::new(100.0, 0.0), Vec2::ZERO, 50.0).unwrap();
        assert!((t - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_intercept_crossing_target() {
        let rel = Vec2::new(100.0, 0.0);
        let vel = Vec2::new(0.0, 30.0);
        let speed = 60.0;
        let t = intercept_time(rel, vel, speed).unwrap();
        // The aim point must be reachable in exactly t.
        let aim = rel + vel * t;
        assert!((aim.length() - speed * t).abs() < 1e-2);
    }

    #[test]
    fn test_intercept_unreachable() {
        // Target receding faster than the projectile travels.
        let t = intercept_time(Vec2::new(100.0, 0.0), Vec2::new(80.0, 0.0), 50.0);
        assert!(t.is_none(), "receding target must have no intercept");
    }

    #[test]
    fn test_intercept_picks_smallest_positive_root() {
        let rel = Vec2::new(200.0, 0.0);
        let vel = Vec2::new(-10.0, 0.0);
        let t = intercept_time(rel, vel, 100.0).unwrap();
        let aim = rel + vel * t;
        assert!((aim.length() - 100.0 * t).abs() < 1e-2);
        // A head-on target must be hit before it passes the shooter.
        assert!(t < 200.0 / 90.0 + 0.1);
    }
}
