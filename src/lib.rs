//! Weapon Balls - deterministic two-ball arena combat
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, weapons, projectiles, tick)
//! - `excitement`: Post-hoc battle scoring for ranking batch results
//! - `simulator`: Headless single-battle and batch runners
//! - `settings`: Arena/physics configuration and named stage presets
//! - `bestof`: Ranked collection of saved replay tokens

pub mod bestof;
pub mod error;
pub mod excitement;
pub mod settings;
pub mod sim;
pub mod simulator;

pub use bestof::BestOf;
pub use error::SimError;
pub use excitement::{Excitement, Score};
pub use settings::{Arena, BattleConfig, StagePreset};
pub use simulator::{BattleResult, CancelToken, Simulator};

use glam::Vec2;

/// Simulation constants (defaults for `BattleConfig` and frame-based timings)
pub mod consts {
    /// Simulation frames per second of battle time
    pub const FRAMES_PER_SECOND: u32 = 60;
    /// Hard frame cap per battle (2 minutes)
    pub const MAX_FRAMES: u32 = 7200;

    /// Arena defaults (classic portrait stage)
    pub const ARENA_X: f32 = 20.0;
    pub const ARENA_Y: f32 = 70.0;
    pub const ARENA_WIDTH: f32 = 500.0;
    pub const ARENA_HEIGHT: f32 = 780.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 30.0;
    pub const BALL_MASS: f32 = 1.0;
    pub const BALL_MAX_HP: f32 = 100.0;
    /// Speeds are in pixels per frame
    pub const BALL_MAX_SPEED: f32 = 14.0;
    /// Balls are never allowed to stall below this speed
    pub const BALL_MIN_SPEED: f32 = 1.5;
    /// Velocity multiplier applied every frame
    pub const BALL_FRICTION: f32 = 1.0;
    pub const BALL_RESTITUTION: f32 = 1.0;
    /// Wall bounces add energy (clamped by max speed afterwards)
    pub const WALL_RESTITUTION: f32 = 1.12;
    pub const GRAVITY: f32 = 0.15;
    /// Initial launch velocity spread per axis
    pub const LAUNCH_SPEED: f32 = 14.0;

    /// Weapon defaults
    pub const WEAPON_HIT_COOLDOWN: u32 = 20;
    pub const SUPER_THRESHOLD: u32 = 10;
    pub const WEAPON_WALL_BOUNCE_STRENGTH: f32 = 1.0;
    /// Melee arcs test the segment from this fraction of reach to the tip
    pub const MELEE_ARC_START: f32 = 0.4;

    /// Parry: squared tip distance and the cooldown both weapons receive
    pub const PARRY_DISTANCE_SQ: f32 = 225.0;
    pub const PARRY_COOLDOWN: u32 = 10;

    /// Steering nudge that keeps the balls engaged
    pub const NUDGE_STRENGTH: f32 = 0.6;
    pub const NUDGE_INTERVAL: u32 = 90;

    /// Poison ticks every half second
    pub const POISON_TICK_FRAMES: u32 = 30;
    pub const POISON_DAMAGE_PER_STACK: f32 = 0.5;

    /// Most balls a single side may field (duplicator clones)
    pub const MAX_BALLS_PER_SIDE: usize = 8;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit-length direction vector for an angle, scaled by `len`
#[inline]
pub fn from_angle(angle: f32, len: f32) -> Vec2 {
    Vec2::new(len * angle.cos(), len * angle.sin())
}

/// Heading of a vector in radians
#[inline]
pub fn heading(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Round to one decimal place (score presentation)
#[inline]
pub fn round1(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}
