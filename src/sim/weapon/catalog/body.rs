//! Body weapons: reach 0, damage on contact

use crate::consts::BALL_MAX_SPEED;
use crate::sim::ball::Body;
use crate::sim::state::{BattleCtx, SpawnRequest};
use crate::sim::weapon::{Strike, WeaponBehavior, WeaponConfig, WeaponCore};

use super::Interval;

/// Hits harder the faster the ball moves; each hit raises its speed cap
#[derive(Debug, Default)]
pub struct Unarmed;

impl Unarmed {
    pub fn boxed() -> Box<dyn WeaponBehavior> {
        Box::new(Self)
    }

    /// Extra max speed on top of the arena's cap
    pub fn speed_bonus(core: &WeaponCore) -> f32 {
        if core.super_active {
            100.0
        } else {
            core.hit_count as f32 * 1.5
        }
    }
}

impl WeaponBehavior for Unarmed {
    fn config(&self) -> WeaponConfig {
        WeaponConfig::new("unarmed", 1.0, 0.0, 0.0)
            .super_at(8)
            .no_parry()
            .scaling("Max Spd")
    }

    fn scaling_value(&self, core: &WeaponCore) -> f32 {
        (BALL_MAX_SPEED + Self::speed_bonus(core)).round()
    }

    fn update(&mut self, core: &mut WeaponCore, owner: &mut Body, ctx: &mut BattleCtx<'_>) {
        core.advance();
        owner.max_speed = ctx.config.max_speed + Self::speed_bonus(core);
    }

    fn strike(
        &mut self,
        _core: &mut WeaponCore,
        owner: &mut Body,
        _target: &mut Body,
        _ctx: &mut BattleCtx<'_>,
    ) -> Strike {
        let damage = (owner.speed() * 0.8).floor().max(1.0);
        Strike::damage(damage).with_knockback(3.0)
    }

    fn activate_super(&mut self, _core: &mut WeaponCore, owner: &mut Body, _ctx: &mut BattleCtx<'_>) {
        owner.vel *= 1.5;
    }
}

const SPLIT_INTERVAL: u32 = 480;

/// The king periodically splits every living ally in two
#[derive(Debug)]
pub struct Duplicator {
    split: Interval,
    bonus_hp: f32,
}

impl Duplicator {
    pub fn boxed() -> Box<dyn WeaponBehavior> {
        Box::new(Self {
            split: Interval::new(SPLIT_INTERVAL),
            bonus_hp: 0.0,
        })
    }
}

impl WeaponBehavior for Duplicator {
    fn config(&self) -> WeaponConfig {
        WeaponConfig::new("duplicator", 1.0, 0.0, 0.0)
            .super_at(12)
            .no_parry()
            .aura(8.0)
            .scaling("Copies")
    }

    fn scaling_value(&self, core: &WeaponCore) -> f32 {
        core.hit_count as f32
    }

    fn update(&mut self, core: &mut WeaponCore, owner: &mut Body, ctx: &mut BattleCtx<'_>) {
        core.advance();
        if owner.is_original && owner.alive && self.split.tick() {
            ctx.spawns.push(SpawnRequest::Split {
                side: owner.side,
                bonus_hp: self.bonus_hp,
            });
        }
    }

    fn activate_super(&mut self, _core: &mut WeaponCore, _owner: &mut Body, _ctx: &mut BattleCtx<'_>) {
        self.bonus_hp = 10.0;
    }
}
