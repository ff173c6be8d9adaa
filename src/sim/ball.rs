//! Ball entity: a physics body carrying exactly one weapon

use glam::Vec2;

use super::collision::{clamp_speed, wall_bounce};
use super::events::{BallPose, BattleEvent, Sink};
use super::state::{BallId, BattleCtx, Side, Target};
use super::weapon::Weapon;
use crate::consts::*;
use crate::settings::BattleConfig;

/// Physical state of a ball, everything except its weapon.
///
/// Weapons receive `&mut Body` for their owner, which keeps the weapon and
/// the body it rides on as disjoint borrows.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub side: Side,
    pub alive: bool,
    /// King ball: its death ends the side even if clones survive
    pub is_original: bool,
    /// Per-ball speed cap (weapons may raise it)
    pub max_speed: f32,
    pub poison_stacks: u32,
    pub poison_timer: u32,
    pub frame_count: u32,
}

impl Body {
    pub fn new(pos: Vec2, radius: f32, mass: f32, hp: f32, side: Side, is_original: bool) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
            mass,
            hp,
            max_hp: hp,
            side,
            alive: hp > 0.0,
            is_original,
            max_speed: BALL_MAX_SPEED,
            poison_stacks: 0,
            poison_timer: 0,
            frame_count: 0,
        }
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Apply damage. Returns true if this damage killed the ball.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        debug_assert!(amount >= 0.0, "negative damage {amount}");
        let was_alive = self.alive;
        self.hp = (self.hp - amount.max(0.0)).max(0.0);
        if self.hp <= 0.0 {
            self.hp = 0.0;
            self.alive = false;
        }
        debug_assert!((0.0..=self.max_hp).contains(&self.hp));
        was_alive && !self.alive
    }

    /// Restore HP up to the maximum. Dead balls stay dead.
    pub fn heal(&mut self, amount: f32) {
        if !self.alive {
            return;
        }
        self.hp = (self.hp + amount).min(self.max_hp);
        debug_assert!((0.0..=self.max_hp).contains(&self.hp));
    }

    /// Knock the body along `dir` (normalized internally)
    pub fn push(&mut self, dir: Vec2, strength: f32) {
        self.vel += dir.normalize_or_zero() * strength;
    }
}

/// Optional overrides for spawning a ball
#[derive(Debug, Clone, Copy, Default)]
pub struct BallOptions {
    pub radius: Option<f32>,
    pub hp: Option<f32>,
    /// Defaults to true (a king)
    pub is_original: Option<bool>,
}

/// A combatant: body plus its exclusively owned weapon
#[derive(Debug)]
pub struct Ball {
    pub id: BallId,
    pub body: Body,
    pub weapon: Weapon,
}

impl Ball {
    pub fn new(
        id: BallId,
        pos: Vec2,
        side: Side,
        mut weapon: Weapon,
        config: &BattleConfig,
        opts: BallOptions,
    ) -> Self {
        let radius = opts.radius.unwrap_or(config.ball_radius);
        let mass = (radius / config.ball_radius) * config.ball_mass;
        let hp = opts.hp.unwrap_or(config.ball_max_hp);
        let mut body = Body::new(pos, radius, mass, hp, side, opts.is_original.unwrap_or(true));
        body.max_speed = config.max_speed;
        weapon.equip(id, &mut body);
        Self { id, body, weapon }
    }

    pub fn side(&self) -> Side {
        self.body.side
    }

    pub fn is_alive(&self) -> bool {
        self.body.alive
    }

    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.body.take_damage(amount)
    }

    /// Frame snapshot for targeting
    pub fn target(&self) -> Target {
        Target {
            id: self.id,
            side: self.body.side,
            pos: self.body.pos,
            vel: self.body.vel,
            radius: self.body.radius,
            alive: self.body.alive,
        }
    }

    /// Advance one frame: integrate, steer, bounce, then run the weapon
    pub fn update(&mut self, ctx: &mut BattleCtx<'_>) {
        let config = ctx.config;
        let body = &mut self.body;
        body.frame_count += 1;

        body.pos += body.vel;
        body.vel += config.gravity_vector();
        body.vel *= config.friction;
        body.vel = clamp_speed(body.vel, body.max_speed);

        // Periodic nudge toward the nearest enemy keeps the fight engaged
        if config.nudge_interval > 0 && body.frame_count % config.nudge_interval == 0 {
            if let Some(enemy) = ctx.nearest_enemy(body.side, body.pos) {
                let toward = (enemy.pos - body.pos).normalize_or_zero();
                let jitter = Vec2::new(
                    ctx.rng.jitter(config.nudge_strength * 0.5),
                    ctx.rng.jitter(config.nudge_strength * 0.5),
                );
                body.vel += toward * config.nudge_strength + jitter;
                body.vel = clamp_speed(body.vel, body.max_speed);
            }
        }

        enforce_min_speed(body, config.min_speed, ctx);

        if let Some(wall) = wall_bounce(body, &config.arena, config.wall_restitution, body.max_speed) {
            let speed = body.speed();
            ctx.emit(BattleEvent::WallBounce {
                ball: self.id,
                wall,
                speed,
            });
        }

        self.weapon.update(body, ctx);

        if body.poison_stacks > 0 && body.alive {
            body.poison_timer += 1;
            if body.poison_timer >= POISON_TICK_FRAMES {
                body.poison_timer = 0;
                let damage = body.poison_stacks as f32 * POISON_DAMAGE_PER_STACK;
                let died = body.take_damage(damage);
                ctx.emit(BattleEvent::PoisonTick { ball: self.id, damage });
                if died {
                    ctx.emit(BattleEvent::Death {
                        ball: self.id,
                        side: body.side,
                    });
                }
            }
        }
    }

    /// Describe this ball and its weapon to a renderer
    pub fn draw(&self, sink: &mut dyn Sink) {
        sink.draw_ball(&BallPose {
            id: self.id,
            side: self.body.side,
            pos: self.body.pos,
            radius: self.body.radius,
            hp: self.body.hp,
            alive: self.body.alive,
            super_active: self.weapon.core.super_active,
        });
        if self.body.alive {
            self.weapon.draw(&self.body, sink);
        }
    }
}

/// Keep the ball from ever stalling
fn enforce_min_speed(body: &mut Body, min_speed: f32, ctx: &mut BattleCtx<'_>) {
    let speed = body.speed();
    if speed >= min_speed {
        return;
    }
    if speed > 1e-3 {
        body.vel *= min_speed / speed;
    } else {
        body.vel = crate::from_angle(ctx.rng.angle(), min_speed);
    }
}
