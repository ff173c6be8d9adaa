//! Ranged weapons. They never land melee hits; projectiles do the work.

use crate::sim::ball::Body;
use crate::sim::projectile::Projectile;
use crate::sim::state::BattleCtx;
use crate::sim::weapon::{Stats, WeaponBehavior, WeaponConfig, WeaponCore};

use super::{aim_at_nearest, fan, launch, Interval};

const MAX_ARROWS: u32 = 8;

/// Fires a fan of arrows; one more arrow per hit
#[derive(Debug)]
pub struct Bow {
    fire: Interval,
}

impl Bow {
    pub fn boxed() -> Box<dyn WeaponBehavior> {
        Box::new(Self {
            fire: Interval::new(80),
        })
    }

    pub fn arrow_count(core: &WeaponCore) -> u32 {
        (1 + core.hit_count).min(MAX_ARROWS)
    }

    fn shoot(&self, core: &WeaponCore, owner: &Body, ctx: &mut BattleCtx<'_>) {
        let origin = core.tip(owner.pos);
        let drop = ctx.config.gravity_vector().y.max(0.0);
        let shots = fan(core.angle, Self::arrow_count(core), 0.2)
            .map(|angle| {
                Projectile::new(core.owner, core.side, origin, crate::from_angle(angle, 5.0), core.damage())
                    .radius(4.0)
                    .lifespan(150)
                    .gravity(drop)
            })
            .collect();
        launch(core, origin, shots, ctx);
    }
}

impl WeaponBehavior for Bow {
    fn config(&self) -> WeaponConfig {
        WeaponConfig::new("bow", 2.0, 0.03, 68.0)
            .super_at(8)
            .ranged()
            .scaling("Arrows")
    }

    fn scale(&self, core: &WeaponCore) -> Stats {
        let mut stats = core.base;
        if core.super_active {
            stats.damage += 2.0;
        }
        stats
    }

    fn scaling_value(&self, core: &WeaponCore) -> f32 {
        Self::arrow_count(core) as f32
    }

    fn update(&mut self, core: &mut WeaponCore, owner: &mut Body, ctx: &mut BattleCtx<'_>) {
        core.advance();
        if self.fire.tick() {
            self.shoot(core, owner, ctx);
        }
    }

    fn activate_super(&mut self, _core: &mut WeaponCore, _owner: &mut Body, _ctx: &mut BattleCtx<'_>) {
        self.fire.every = 50;
    }
}

/// Fires one fast bolt aimed at the nearest enemy
#[derive(Debug)]
pub struct Crossbow {
    fire: Interval,
}

impl Crossbow {
    pub fn boxed() -> Box<dyn WeaponBehavior> {
        Box::new(Self {
            fire: Interval::new(60),
        })
    }

    fn shoot(&self, core: &WeaponCore, owner: &Body, ctx: &mut BattleCtx<'_>) {
        let origin = core.tip(owner.pos);
        let angle = aim_at_nearest(core, owner.pos, ctx).unwrap_or(core.angle);
        let bolt = Projectile::new(core.owner, core.side, origin, crate::from_angle(angle, 7.0), core.damage())
            .radius(3.0)
            .lifespan(100)
            .piercing(core.super_active);
        launch(core, origin, vec![bolt], ctx);
    }
}

impl WeaponBehavior for Crossbow {
    fn config(&self) -> WeaponConfig {
        WeaponConfig::new("crossbow", 3.0, 0.035, 58.0)
            .super_at(10)
            .ranged()
            .scaling("Bolt Dmg")
    }

    fn scale(&self, core: &WeaponCore) -> Stats {
        let mut stats = core.base;
        stats.damage = core.base.damage + core.hit_count as f32;
        if core.super_active {
            stats.damage += 3.0;
        }
        stats
    }

    fn update(&mut self, core: &mut WeaponCore, owner: &mut Body, ctx: &mut BattleCtx<'_>) {
        core.advance();
        if self.fire.tick() {
            self.shoot(core, owner, ctx);
        }
    }

    fn activate_super(&mut self, _core: &mut WeaponCore, _owner: &mut Body, _ctx: &mut BattleCtx<'_>) {
        self.fire.every = 40;
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use crate::sim::state::{BallId, Side, Target};
    use crate::sim::weapon::test_support::*;

    fn run_frames(kind: &str, frames: u32, harness: &mut Harness) -> crate::sim::weapon::Weapon {
        let mut w = weapon(kind, harness);
        let mut owner = body(Side::Left);
        for _ in 0..frames {
            let mut ctx = harness.ctx();
            w.update(&mut owner, &mut ctx);
        }
        w
    }

    #[test]
    fn test_bow_fires_every_80_frames() {
        let mut harness = Harness::new();
        run_frames("bow", 79, &mut harness);
        assert!(harness.projectiles.is_empty());
        let mut harness = Harness::new();
        run_frames("bow", 80, &mut harness);
        assert_eq!(harness.projectiles.len(), 1);
        let arrow = &harness.projectiles[0];
        assert_eq!(arrow.side, Side::Left);
        assert_eq!(arrow.damage, 2.0);
        assert_eq!(arrow.gravity, 0.0);
    }

    #[test]
    fn test_bow_arrow_count_capped() {
        let mut harness = Harness::new();
        let mut bow = weapon("bow", &mut harness);
        assert_eq!(bow.scaling_value(), 1.0);
        bow.core.hit_count = 3;
        assert_eq!(bow.scaling_value(), 4.0);
        bow.core.hit_count = 20;
        assert_eq!(bow.scaling_value(), 8.0);
        assert_eq!(bow.core.scaling_name, "Arrows");
    }

    #[test]
    fn test_bow_arrows_drop_in_gravity_mode() {
        let mut harness = Harness::new();
        harness.config.gravity_mode = true;
        run_frames("bow", 80, &mut harness);
        assert!(harness.projectiles[0].gravity > 0.0);
    }

    #[test]
    fn test_crossbow_aims_at_enemy() {
        let mut harness = Harness::new();
        let owner = body(Side::Left);
        harness.targets.push(Target {
            id: BallId(2),
            side: Side::Right,
            pos: owner.pos + Vec2::new(0.0, 200.0),
            vel: Vec2::ZERO,
            radius: 30.0,
            alive: true,
        });
        run_frames("crossbow", 60, &mut harness);
        let bolt = &harness.projectiles[0];
        assert!(bolt.vel.y > 6.9);
        assert!(bolt.vel.x.abs() < 0.1);
        assert!(!bolt.piercing);
    }
}
