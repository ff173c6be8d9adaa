//! Battle events and the presentation sink
//!
//! The simulation reports what happened (hits, bounces, supers, parries) to a
//! `Sink`. Sinks are write-only: nothing a sink does can feed back into the
//! battle, so a headless run with `NoopSink` is frame-for-frame identical to a
//! run that renders and plays audio.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Wall;
use super::state::{BallId, Side};

/// Something that happened during a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// A weapon (melee, body contact or projectile) damaged a ball
    Hit {
        attacker: BallId,
        target: BallId,
        side: Side,
        damage: f32,
        hit_count: u32,
        pos: Vec2,
    },
    /// Ball body bounced off a wall
    WallBounce { ball: BallId, wall: Wall, speed: f32 },
    /// Weapon tip poked outside the arena and pushed its owner back
    WeaponWallBounce { ball: BallId, tip: Vec2 },
    /// Two ball bodies collided
    BallClash { a: BallId, b: BallId, speed: f32, pos: Vec2 },
    /// Two weapon tips met and deflected each other
    Parry { a: BallId, b: BallId, pos: Vec2 },
    SuperActivated { ball: BallId, side: Side, kind: String },
    Empowered { ball: BallId, side: Side, kind: String },
    ProjectileFired { owner: BallId, pos: Vec2, count: u32 },
    ProjectileBounce { pos: Vec2, speed: f32 },
    ProjectileReflected { by: BallId, pos: Vec2 },
    /// A duplicator king split its side
    Split { side: Side, clones: u32 },
    PoisonTick { ball: BallId, damage: f32 },
    Death { ball: BallId, side: Side },
}

/// Ball description handed to renderers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallPose {
    pub id: BallId,
    pub side: Side,
    pub pos: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub alive: bool,
    pub super_active: bool,
}

/// Weapon description handed to renderers
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponPose<'a> {
    pub owner: BallId,
    pub kind: &'a str,
    pub origin: Vec2,
    pub angle: f32,
    pub reach: f32,
    pub super_active: bool,
}

/// Projectile description handed to renderers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectilePose {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub side: Side,
}

/// Rendering/audio/VFX collaborator.
///
/// All methods default to doing nothing.
pub trait Sink {
    fn on_event(&mut self, _event: &BattleEvent) {}
    fn draw_ball(&mut self, _ball: &BallPose) {}
    fn draw_weapon(&mut self, _weapon: &WeaponPose<'_>) {}
    fn draw_projectile(&mut self, _projectile: &ProjectilePose) {}
}

/// Headless stand-in for every collaborator
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl Sink for NoopSink {}

/// Records every event (replay inspection and tests)
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<BattleEvent>,
    pub balls_drawn: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&BattleEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl Sink for EventLog {
    fn on_event(&mut self, event: &BattleEvent) {
        self.events.push(event.clone());
    }

    fn draw_ball(&mut self, _ball: &BallPose) {
        self.balls_drawn += 1;
    }
}

/// Writes every event to the `log` facade at trace level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl Sink for LogSink {
    fn on_event(&mut self, event: &BattleEvent) {
        log::trace!("{:?}", event);
    }
}
