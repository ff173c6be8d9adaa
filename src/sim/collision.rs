//! Collision detection and response for circles in a rectangular arena
//!
//! Pure functions over ball bodies: overlap tests, mass-weighted separation,
//! elastic resolution, melee segment tests and wall bounce.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ball::Body;
use crate::settings::Arena;

/// Extra separation added on top of the overlap so contacts don't re-trigger
const SEPARATION_SLOP: f32 = 1.0;

/// Result of a contact check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point (midway between the surfaces)
    pub point: Vec2,
    /// Contact normal pointing from A toward B
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Arena wall identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wall {
    Left,
    Right,
    Top,
    Bottom,
}

#[inline]
pub fn distance_sq(a: Vec2, b: Vec2) -> f32 {
    (b - a).length_squared()
}

/// Strict overlap of two circles
#[inline]
pub fn circle_overlap(a: Vec2, ar: f32, b: Vec2, br: f32) -> bool {
    let min_dist = ar + br;
    distance_sq(a, b) < min_dist * min_dist
}

/// Contact info for two circles (miss when apart or exactly concentric)
pub fn circle_contact(a: Vec2, ar: f32, b: Vec2, br: f32) -> CollisionResult {
    let delta = b - a;
    let dist = delta.length();
    let min_dist = ar + br;
    if dist >= min_dist || dist == 0.0 {
        return CollisionResult::miss();
    }
    let normal = delta / dist;
    CollisionResult {
        hit: true,
        point: a + normal * (ar - (min_dist - dist) / 2.0),
        normal,
        penetration: min_dist - dist,
    }
}

/// Push overlapping bodies apart along the contact normal.
///
/// Each body moves in proportion to the other's mass, so the heavier one
/// moves less. Returns false when there was nothing to separate.
pub fn separate(a: &mut Body, b: &mut Body) -> bool {
    let contact = circle_contact(a.pos, a.radius, b.pos, b.radius);
    if !contact.hit {
        return false;
    }
    let total_mass = a.mass + b.mass;
    let push = contact.penetration + SEPARATION_SLOP;
    a.pos -= contact.normal * push * (b.mass / total_mass);
    b.pos += contact.normal * push * (a.mass / total_mass);
    true
}

/// Mass-weighted elastic collision along the contact normal.
///
/// Tangential velocity is untouched and bodies already moving apart are
/// left alone.
pub fn resolve_elastic(a: &mut Body, b: &mut Body, restitution: f32) {
    let delta = b.pos - a.pos;
    let dist = delta.length();
    if dist == 0.0 {
        return;
    }
    let normal = delta / dist;
    let dv_dot_n = (a.vel - b.vel).dot(normal);
    if dv_dot_n < 0.0 {
        return;
    }
    let j = (1.0 + restitution) * dv_dot_n / (a.mass + b.mass);
    a.vel -= normal * (j * b.mass);
    b.vel += normal * (j * a.mass);
}

/// Line segment p0-p1 against a circle
pub fn segment_circle_hit(p0: Vec2, p1: Vec2, center: Vec2, radius: f32) -> bool {
    let d = p1 - p0;
    let f = p0 - center;
    let a = d.length_squared();
    if a < 1e-8 {
        return f.length_squared() < radius * radius;
    }
    let b = 2.0 * f.dot(d);
    let c = f.length_squared() - radius * radius;
    // p0 inside the circle
    if c <= 0.0 {
        return true;
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return false;
    }
    let root = discriminant.sqrt();
    let t1 = (-b - root) / (2.0 * a);
    let t2 = (-b + root) / (2.0 * a);
    (0.0..=1.0).contains(&t1) || (0.0..=1.0).contains(&t2) || (t1 < 0.0 && t2 > 1.0)
}

/// Reflect velocity off a surface: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Clamp a velocity to a maximum speed
#[inline]
pub fn clamp_speed(vel: Vec2, max_speed: f32) -> Vec2 {
    let speed = vel.length();
    if speed > max_speed && speed > 0.0 {
        vel * (max_speed / speed)
    } else {
        vel
    }
}

/// Bounce a body off the arena walls.
///
/// Each axis is handled independently, so corner hits reflect both x and y
/// in the same call. Reflected speed is multiplied by `restitution` and then
/// clamped to `max_speed` so corners can't pump energy without bound.
/// Returns the wall that was hit (top/bottom wins on corners).
pub fn wall_bounce(body: &mut Body, arena: &Arena, restitution: f32, max_speed: f32) -> Option<Wall> {
    let r = body.radius;
    let mut hit = None;

    if body.pos.x - r < arena.left() {
        body.pos.x = arena.left() + r;
        body.vel.x = body.vel.x.abs() * restitution;
        hit = Some(Wall::Left);
    } else if body.pos.x + r > arena.right() {
        body.pos.x = arena.right() - r;
        body.vel.x = -body.vel.x.abs() * restitution;
        hit = Some(Wall::Right);
    }
    if body.pos.y - r < arena.top() {
        body.pos.y = arena.top() + r;
        body.vel.y = body.vel.y.abs() * restitution;
        hit = Some(Wall::Top);
    } else if body.pos.y + r > arena.bottom() {
        body.pos.y = arena.bottom() - r;
        body.vel.y = -body.vel.y.abs() * restitution;
        hit = Some(Wall::Bottom);
    }

    if hit.is_some() {
        body.vel = clamp_speed(body.vel, max_speed);
    }
    hit
}

/// Direction a body should be pushed when its weapon tip leaves the arena.
///
/// Returns `None` while the tip is inside; otherwise a vector whose
/// components are -1, 0 or 1 per axis.
pub fn weapon_tip_push(tip: Vec2, arena: &Arena) -> Option<Vec2> {
    let mut push = Vec2::ZERO;
    if tip.x < arena.left() {
        push.x = 1.0;
    } else if tip.x > arena.right() {
        push.x = -1.0;
    }
    if tip.y < arena.top() {
        push.y = 1.0;
    } else if tip.y > arena.bottom() {
        push.y = -1.0;
    }
    (push != Vec2::ZERO).then_some(push)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Side;
    use proptest::prelude::*;

    fn body(pos: Vec2, vel: Vec2, radius: f32, mass: f32) -> Body {
        let mut b = Body::new(pos, radius, mass, 100.0, Side::Left, true);
        b.vel = vel;
        b
    }

    #[test]
    fn test_circle_overlap() {
        assert!(circle_overlap(Vec2::ZERO, 10.0, Vec2::new(15.0, 0.0), 10.0));
        assert!(!circle_overlap(Vec2::ZERO, 10.0, Vec2::new(20.0, 0.0), 10.0));
    }

    #[test]
    fn test_separate_moves_heavier_less() {
        let mut a = body(Vec2::ZERO, Vec2::ZERO, 10.0, 4.0);
        let mut b = body(Vec2::new(10.0, 0.0), Vec2::ZERO, 10.0, 1.0);
        assert!(separate(&mut a, &mut b));
        let moved_a = a.pos.length();
        let moved_b = (b.pos - Vec2::new(10.0, 0.0)).length();
        assert!(moved_a < moved_b);
        assert!(!circle_overlap(a.pos, a.radius, b.pos, b.radius));
    }

    #[test]
    fn test_resolve_elastic_equal_masses_swap() {
        let mut a = body(Vec2::ZERO, Vec2::new(5.0, 0.0), 10.0, 1.0);
        let mut b = body(Vec2::new(19.0, 0.0), Vec2::new(-5.0, 0.0), 10.0, 1.0);
        resolve_elastic(&mut a, &mut b, 1.0);
        assert!((a.vel.x + 5.0).abs() < 1e-4);
        assert!((b.vel.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_resolve_elastic_ignores_separating() {
        let mut a = body(Vec2::ZERO, Vec2::new(-5.0, 0.0), 10.0, 1.0);
        let mut b = body(Vec2::new(19.0, 0.0), Vec2::new(5.0, 0.0), 10.0, 1.0);
        resolve_elastic(&mut a, &mut b, 1.0);
        assert_eq!(a.vel, Vec2::new(-5.0, 0.0));
        assert_eq!(b.vel, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_segment_circle_hit() {
        let c = Vec2::new(50.0, 0.0);
        assert!(segment_circle_hit(Vec2::ZERO, Vec2::new(100.0, 0.0), c, 5.0));
        assert!(segment_circle_hit(Vec2::ZERO, Vec2::new(47.0, 0.0), c, 5.0));
        assert!(!segment_circle_hit(Vec2::ZERO, Vec2::new(40.0, 0.0), c, 5.0));
        assert!(!segment_circle_hit(Vec2::new(0.0, 20.0), Vec2::new(100.0, 20.0), c, 5.0));
    }

    #[test]
    fn test_segment_inside_circle_hits() {
        let c = Vec2::new(60.0, 0.0);
        // Blade buried in a touching ball
        assert!(segment_circle_hit(Vec2::new(32.0, 0.0), Vec2::new(80.0, 0.0), c, 30.0));
        // Only the far end inside
        assert!(segment_circle_hit(Vec2::new(0.0, 0.0), Vec2::new(70.0, 0.0), c, 30.0));
        // Pointing away from a circle behind the start
        assert!(!segment_circle_hit(Vec2::new(100.0, 0.0), Vec2::new(150.0, 0.0), c, 30.0));
    }

    #[test]
    fn test_wall_bounce_corner_reflects_both_axes() {
        let arena = Arena::default();
        let mut b = body(
            Vec2::new(arena.left() + 5.0, arena.top() + 5.0),
            Vec2::new(-3.0, -4.0),
            10.0,
            1.0,
        );
        let hit = wall_bounce(&mut b, &arena, 1.0, 100.0);
        assert!(hit.is_some());
        assert!(b.vel.x > 0.0 && b.vel.y > 0.0);
        assert_eq!(b.pos, Vec2::new(arena.left() + 10.0, arena.top() + 10.0));
    }

    #[test]
    fn test_wall_bounce_restitution_clamped() {
        let arena = Arena::default();
        let mut b = body(Vec2::new(arena.right() - 1.0, arena.center().y), Vec2::new(13.0, 0.0), 10.0, 1.0);
        let hit = wall_bounce(&mut b, &arena, 1.12, 14.0);
        assert_eq!(hit, Some(Wall::Right));
        assert!(b.vel.x < 0.0);
        assert!(b.vel.length() <= 14.0 + 1e-4);
    }

    #[test]
    fn test_no_bounce_inside() {
        let arena = Arena::default();
        let mut b = body(arena.center(), Vec2::new(1.0, 1.0), 10.0, 1.0);
        assert_eq!(wall_bounce(&mut b, &arena, 1.12, 14.0), None);
        assert_eq!(b.vel, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_weapon_tip_push() {
        let arena = Arena::default();
        assert_eq!(weapon_tip_push(arena.center(), &arena), None);
        let push = weapon_tip_push(Vec2::new(arena.left() - 5.0, arena.bottom() + 5.0), &arena).unwrap();
        assert_eq!(push, Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_reflect_velocity() {
        let reflected = reflect_velocity(Vec2::new(100.0, 0.0), Vec2::new(-1.0, 0.0));
        assert!((reflected.x + 100.0).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }

    proptest! {
        #[test]
        fn prop_elastic_conserves_momentum(
            ma in 0.2f32..5.0, mb in 0.2f32..5.0,
            vax in -14.0f32..14.0, vay in -14.0f32..14.0,
            vbx in -14.0f32..14.0, vby in -14.0f32..14.0,
            angle in 0.0f32..std::f32::consts::TAU,
        ) {
            let offset = crate::from_angle(angle, 15.0);
            let mut a = body(Vec2::ZERO, Vec2::new(vax, vay), 10.0, ma);
            let mut b = body(offset, Vec2::new(vbx, vby), 10.0, mb);
            let before = a.vel * ma + b.vel * mb;
            resolve_elastic(&mut a, &mut b, 1.0);
            let after = a.vel * ma + b.vel * mb;
            prop_assert!((before - after).length() < 1e-2);
        }
    }
}
