//! Projectiles: arrows, bolts and lightning fired by ranged weapons

use std::collections::BTreeSet;

use glam::Vec2;

use super::collision::{circle_overlap, Wall};
use super::events::{ProjectilePose, Sink};
use super::state::{BallId, Side, Target};
use crate::settings::Arena;

/// A moving damage source owned (by handle) by the ball that fired it
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub pos: Vec2,
    /// Position before the last update (trail rendering)
    pub prev_pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub owner: BallId,
    pub side: Side,
    pub radius: f32,
    /// Frames left before the projectile expires
    pub lifespan: u32,
    /// Wall bounces left; at zero the next wall contact kills it
    pub bounces: u32,
    pub piercing: bool,
    /// Maximum turn toward the nearest enemy per frame (radians)
    pub homing: f32,
    /// Downward acceleration per frame
    pub gravity: f32,
    /// Fraction of damage lost on each wall bounce
    pub damage_falloff: f32,
    /// Balls already damaged since the last bounce
    pub hit: BTreeSet<BallId>,
    pub alive: bool,
}

impl Projectile {
    pub fn new(owner: BallId, side: Side, pos: Vec2, vel: Vec2, damage: f32) -> Self {
        Self {
            pos,
            prev_pos: pos,
            vel,
            damage,
            owner,
            side,
            radius: 3.0,
            lifespan: 120,
            bounces: 0,
            piercing: false,
            homing: 0.0,
            gravity: 0.0,
            damage_falloff: 0.0,
            hit: BTreeSet::new(),
            alive: true,
        }
    }

    pub fn radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn lifespan(mut self, frames: u32) -> Self {
        self.lifespan = frames;
        self
    }

    pub fn bounces(mut self, bounces: u32) -> Self {
        self.bounces = bounces;
        self
    }

    pub fn piercing(mut self, piercing: bool) -> Self {
        self.piercing = piercing;
        self
    }

    pub fn homing(mut self, turn_rate: f32) -> Self {
        self.homing = turn_rate;
        self
    }

    pub fn gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn falloff(mut self, fraction: f32) -> Self {
        self.damage_falloff = fraction;
        self
    }

    /// Advance one frame. Returns the wall touched, if any.
    ///
    /// A projectile with bounces left reflects off the wall and forgets who it
    /// has hit; one without dies on contact and keeps its velocity.
    pub fn update(&mut self, arena: &Arena, targets: &[Target]) -> Option<Wall> {
        if !self.alive {
            return None;
        }
        self.prev_pos = self.pos;

        self.vel.y += self.gravity;
        if self.homing > 0.0 {
            let side = self.side;
            let pos = self.pos;
            let nearest = targets
                .iter()
                .filter(|t| t.alive && t.side != side)
                .min_by(|a, b| (a.pos - pos).length_squared().total_cmp(&(b.pos - pos).length_squared()));
            if let Some(target) = nearest {
                self.steer_toward(target.pos);
            }
        }

        self.pos += self.vel;
        self.lifespan = self.lifespan.saturating_sub(1);
        if self.lifespan == 0 {
            self.alive = false;
            return None;
        }

        let wall = self.touching_wall(arena)?;
        if self.bounces == 0 {
            self.alive = false;
            return Some(wall);
        }

        let r = self.radius;
        match wall {
            Wall::Left => {
                self.pos.x = arena.left() + r;
                self.vel.x = self.vel.x.abs();
            }
            Wall::Right => {
                self.pos.x = arena.right() - r;
                self.vel.x = -self.vel.x.abs();
            }
            Wall::Top => {
                self.pos.y = arena.top() + r;
                self.vel.y = self.vel.y.abs();
            }
            Wall::Bottom => {
                self.pos.y = arena.bottom() - r;
                self.vel.y = -self.vel.y.abs();
            }
        }
        // Corner: fix the other axis too
        self.pos = Vec2::new(
            self.pos.x.clamp(arena.left() + r, arena.right() - r),
            self.pos.y.clamp(arena.top() + r, arena.bottom() - r),
        );
        self.bounces -= 1;
        self.hit.clear();
        self.damage *= 1.0 - self.damage_falloff;
        Some(wall)
    }

    fn touching_wall(&self, arena: &Arena) -> Option<Wall> {
        let r = self.radius;
        if self.pos.x - r < arena.left() {
            Some(Wall::Left)
        } else if self.pos.x + r > arena.right() {
            Some(Wall::Right)
        } else if self.pos.y - r < arena.top() {
            Some(Wall::Top)
        } else if self.pos.y + r > arena.bottom() {
            Some(Wall::Bottom)
        } else {
            None
        }
    }

    /// Whether this projectile may damage `target` this frame
    pub fn can_hit(&self, target: &Target) -> bool {
        self.alive && target.alive && target.side != self.side && !self.hit.contains(&target.id)
    }

    /// Test for contact with `target` and record the hit.
    ///
    /// The caller applies the damage. Non-piercing projectiles die here.
    pub fn check_hit(&mut self, target: &Target) -> bool {
        if !self.can_hit(target) || !circle_overlap(self.pos, self.radius, target.pos, target.radius) {
            return false;
        }
        self.hit.insert(target.id);
        if !self.piercing {
            self.alive = false;
        }
        true
    }

    /// Turn toward `target_pos` by at most `homing` radians, keeping speed
    pub fn steer_toward(&mut self, target_pos: Vec2) {
        let speed = self.vel.length();
        if speed <= f32::EPSILON {
            return;
        }
        let current = crate::heading(self.vel);
        let desired = crate::heading(target_pos - self.pos);
        let diff = crate::normalize_angle(desired - current);
        let turn = diff.clamp(-self.homing, self.homing);
        self.vel = crate::from_angle(current + turn, speed);
    }

    /// Hand the projectile to the other team (shield reflects)
    pub fn reflect(&mut self, new_owner: BallId, new_side: Side, speed_mult: f32, damage_mult: f32) {
        self.vel = -self.vel * speed_mult;
        self.damage *= damage_mult;
        self.owner = new_owner;
        self.side = new_side;
        self.hit.clear();
    }

    pub fn draw(&self, sink: &mut dyn Sink) {
        sink.draw_projectile(&ProjectilePose {
            pos: self.pos,
            vel: self.vel,
            radius: self.radius,
            side: self.side,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(id: u32, side: Side, pos: Vec2) -> Target {
        Target {
            id: BallId(id),
            side,
            pos,
            vel: Vec2::ZERO,
            radius: 30.0,
            alive: true,
        }
    }

    #[test]
    fn test_zero_bounces_dies_on_first_wall_without_reflecting() {
        let arena = Arena::default();
        let start = Vec2::new(arena.right() - 5.0, arena.center().y);
        let mut p = Projectile::new(BallId(1), Side::Left, start, Vec2::new(6.0, 0.0), 2.0);
        let wall = p.update(&arena, &[]);
        assert_eq!(wall, Some(Wall::Right));
        assert!(!p.alive);
        assert_eq!(p.vel, Vec2::new(6.0, 0.0));
    }

    #[test]
    fn test_bounce_reflects_and_clears_hits() {
        let arena = Arena::default();
        let start = Vec2::new(arena.left() + 4.0, arena.center().y);
        let mut p = Projectile::new(BallId(1), Side::Left, start, Vec2::new(-5.0, 1.0), 4.0)
            .bounces(1)
            .falloff(0.25);
        p.hit.insert(BallId(9));
        assert_eq!(p.update(&arena, &[]), Some(Wall::Left));
        assert!(p.alive);
        assert!(p.vel.x > 0.0);
        assert_eq!(p.bounces, 0);
        assert!(p.hit.is_empty());
        assert_eq!(p.damage, 3.0);
    }

    #[test]
    fn test_lifespan_expires() {
        let arena = Arena::default();
        let mut p = Projectile::new(BallId(1), Side::Left, arena.center(), Vec2::new(0.1, 0.0), 1.0).lifespan(2);
        p.update(&arena, &[]);
        assert!(p.alive);
        p.update(&arena, &[]);
        assert!(!p.alive);
    }

    #[test]
    fn test_hits_only_enemies_once() {
        let pos = Vec2::new(100.0, 100.0);
        let mut p = Projectile::new(BallId(1), Side::Left, pos, Vec2::X, 2.0).piercing(true);
        assert!(!p.check_hit(&target(1, Side::Left, pos)));
        let enemy = target(2, Side::Right, pos);
        assert!(p.check_hit(&enemy));
        assert!(!p.check_hit(&enemy));
        assert!(p.alive);
    }

    #[test]
    fn test_non_piercing_dies_on_hit() {
        let pos = Vec2::new(100.0, 100.0);
        let mut p = Projectile::new(BallId(1), Side::Left, pos, Vec2::X, 2.0);
        assert!(p.check_hit(&target(2, Side::Right, pos)));
        assert!(!p.alive);
    }

    #[test]
    fn test_opposite_side_projectiles_each_hit_once() {
        let pos = Vec2::new(100.0, 100.0);
        let victim = target(3, Side::Right, pos);
        let mut from_left = Projectile::new(BallId(1), Side::Left, pos, Vec2::X, 2.0).piercing(true);
        // A right-side projectile never hits its own team
        let mut from_right = Projectile::new(BallId(2), Side::Right, pos, Vec2::X, 2.0).piercing(true);
        let left_target = target(4, Side::Left, pos);

        let mut hits = 0;
        for _ in 0..3 {
            hits += from_left.check_hit(&victim) as u32;
            hits += from_right.check_hit(&left_target) as u32;
        }
        assert_eq!(hits, 2);
    }

    #[test]
    fn test_steer_is_bounded() {
        let mut p = Projectile::new(BallId(1), Side::Left, Vec2::ZERO, Vec2::new(5.0, 0.0), 1.0).homing(0.1);
        p.steer_toward(Vec2::new(0.0, 100.0));
        assert!((crate::heading(p.vel) - 0.1).abs() < 1e-4);
        assert!((p.vel.length() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_reflect_transfers_ownership() {
        let mut p = Projectile::new(BallId(1), Side::Left, Vec2::ZERO, Vec2::new(4.0, 0.0), 2.0);
        p.hit.insert(BallId(2));
        p.reflect(BallId(2), Side::Right, 1.3, 1.4);
        assert_eq!(p.owner, BallId(2));
        assert_eq!(p.side, Side::Right);
        assert!((p.vel.x + 5.2).abs() < 1e-4);
        assert!((p.damage - 2.8).abs() < 1e-4);
        assert!(p.hit.is_empty());
    }
}
