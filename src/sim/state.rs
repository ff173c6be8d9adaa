//! Battle state and the per-call context handed to entities
//!
//! Everything one battle owns lives in `BattleState`; nothing outlives it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ball::Ball;
use super::events::{BattleEvent, Sink};
use super::projectile::Projectile;
use super::rng::SimRng;
use crate::excitement::Excitement;
use crate::settings::BattleConfig;

/// Which team a ball fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// 0 for left, 1 for right
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Stable handle of a ball within one battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BallId(pub u32);

/// Read-only snapshot of a ball taken at the start of a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub id: BallId,
    pub side: Side,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub alive: bool,
}

/// Structural changes requested during updates, applied after the update pass
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnRequest {
    /// Every living ball on `side` splits in two
    Split { side: Side, bonus_hp: f32 },
}

/// Complete battle state (deterministic)
#[derive(Debug)]
pub struct BattleState {
    /// Seed the battle RNG was created from
    pub seed: u64,
    /// Frames simulated so far
    pub frame: u32,
    /// All balls, kings first (left king, right king), clones appended
    pub balls: Vec<Ball>,
    pub projectiles: Vec<Projectile>,
    pub rng: SimRng,
    pub spawns: Vec<SpawnRequest>,
    next_id: u32,
}

impl BattleState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            frame: 0,
            balls: Vec::with_capacity(2),
            projectiles: Vec::new(),
            rng: SimRng::seeded(seed),
            spawns: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new ball ID
    pub fn next_ball_id(&mut self) -> BallId {
        let id = BallId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    pub fn index_of(&self, id: BallId) -> Option<usize> {
        self.balls.iter().position(|b| b.id == id)
    }

    /// The king ball of a side
    pub fn king(&self, side: Side) -> Option<&Ball> {
        self.balls.iter().find(|b| b.body.side == side && b.body.is_original)
    }

    pub fn alive_count(&self, side: Side) -> usize {
        self.balls
            .iter()
            .filter(|b| b.body.side == side && b.body.alive)
            .count()
    }

    /// Hits landed by every weapon on a side
    pub fn total_hits(&self, side: Side) -> u32 {
        self.balls
            .iter()
            .filter(|b| b.body.side == side)
            .map(|b| b.weapon.core.hit_count)
            .sum()
    }

    /// Snapshot of every ball for this frame's targeting
    pub fn targets(&self) -> Vec<Target> {
        self.balls.iter().map(Ball::target).collect()
    }
}

/// Mutable borrows of two distinct balls
pub fn pair_mut(balls: &mut [Ball], i: usize, j: usize) -> (&mut Ball, &mut Ball) {
    assert_ne!(i, j, "pair_mut needs two distinct balls");
    if i < j {
        let (head, tail) = balls.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = balls.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

/// Everything an entity may touch while updating or landing a hit.
///
/// Built fresh for each pass of the tick from disjoint borrows of the
/// battle state; there is no global game object.
pub struct BattleCtx<'a> {
    pub config: &'a BattleConfig,
    pub frame: u32,
    pub rng: &'a mut SimRng,
    pub projectiles: &'a mut Vec<Projectile>,
    pub spawns: &'a mut Vec<SpawnRequest>,
    /// Ball snapshot taken at the start of the frame
    pub targets: &'a [Target],
    telemetry: &'a mut Excitement,
    sink: &'a mut dyn Sink,
}

impl<'a> BattleCtx<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &'a BattleConfig,
        frame: u32,
        rng: &'a mut SimRng,
        projectiles: &'a mut Vec<Projectile>,
        spawns: &'a mut Vec<SpawnRequest>,
        targets: &'a [Target],
        telemetry: &'a mut Excitement,
        sink: &'a mut dyn Sink,
    ) -> Self {
        Self {
            config,
            frame,
            rng,
            projectiles,
            spawns,
            targets,
            telemetry,
            sink,
        }
    }

    /// Report an event to telemetry and the presentation sink
    pub fn emit(&mut self, event: BattleEvent) {
        self.telemetry.observe(&event);
        self.sink.on_event(&event);
    }

    /// Closest living enemy of `side` to `pos`, by the frame snapshot
    pub fn nearest_enemy(&self, side: Side, pos: Vec2) -> Option<Target> {
        self.targets
            .iter()
            .filter(|t| t.alive && t.side != side)
            .min_by(|a, b| {
                (a.pos - pos)
                    .length_squared()
                    .total_cmp(&(b.pos - pos).length_squared())
            })
            .copied()
    }

    /// Launch a projectile
    pub fn spawn_projectile(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_helpers() {
        assert_eq!(Side::Left.opponent(), Side::Right);
        assert_eq!(Side::Right.index(), 1);
        assert_eq!(serde_json::to_string(&Side::Left).unwrap(), "\"left\"");
    }

    #[test]
    fn test_ball_ids_increase() {
        let mut state = BattleState::new(1);
        let a = state.next_ball_id();
        let b = state.next_ball_id();
        assert!(b > a);
    }
}
