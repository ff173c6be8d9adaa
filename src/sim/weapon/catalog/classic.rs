//! Classic melee weapons

use crate::sim::ball::Body;
use crate::sim::state::BattleCtx;
use crate::sim::weapon::{Stats, Strike, WeaponBehavior, WeaponConfig, WeaponCore};

/// Damage grows by one per hit. Super doubles the spin.
#[derive(Debug, Default)]
pub struct Sword;

impl Sword {
    pub fn boxed() -> Box<dyn WeaponBehavior> {
        Box::new(Self)
    }
}

impl WeaponBehavior for Sword {
    fn config(&self) -> WeaponConfig {
        WeaponConfig::new("sword", 3.0, 0.06, 80.0).super_at(10)
    }

    fn scale(&self, core: &WeaponCore) -> Stats {
        let mut stats = core.base;
        stats.damage = core.base.damage + core.hit_count as f32;
        if core.super_active {
            stats.rotation_speed *= 2.0;
        }
        stats
    }
}

/// Spins faster with every hit. Super triples the reach.
#[derive(Debug, Default)]
pub struct Dagger;

impl Dagger {
    pub fn boxed() -> Box<dyn WeaponBehavior> {
        Box::new(Self)
    }
}

impl WeaponBehavior for Dagger {
    fn config(&self) -> WeaponConfig {
        WeaponConfig::new("dagger", 2.0, 0.08, 62.0)
            .super_at(10)
            .scaling("Spin")
    }

    fn scale(&self, core: &WeaponCore) -> Stats {
        let mut stats = core.base;
        stats.rotation_speed = core.base.rotation_speed + core.hit_count as f32 * 0.008;
        if core.super_active {
            stats.reach *= 3.0;
            stats.damage += 2.0;
        }
        stats
    }

    fn scaling_value(&self, core: &WeaponCore) -> f32 {
        (core.stats.rotation_speed * 1000.0).round()
    }
}

#[derive(Debug, Default)]
pub struct Spear;

impl Spear {
    pub fn boxed() -> Box<dyn WeaponBehavior> {
        Box::new(Self)
    }
}

impl WeaponBehavior for Spear {
    fn config(&self) -> WeaponConfig {
        WeaponConfig::new("spear", 3.0, 0.045, 95.0)
            .super_at(12)
            .scaling("Reach")
    }

    fn scale(&self, core: &WeaponCore) -> Stats {
        let hits = core.hit_count as f32;
        let mut stats = core.base;
        stats.reach = core.base.reach + hits * 4.0;
        stats.damage = core.base.damage + hits * 0.5;
        if core.super_active {
            stats.rotation_speed *= 1.5;
            stats.damage += 3.0;
        }
        stats
    }

    fn scaling_value(&self, core: &WeaponCore) -> f32 {
        core.stats.reach.round()
    }
}

const HAMMER_MIN_SPIN: f32 = 0.018;
const HAMMER_BASE_MAX_SPIN: f32 = 0.07;

/// Spin swings between a floor and a ceiling that rises with hits.
/// Super makes it unparryable.
#[derive(Debug)]
pub struct Hammer {
    spin: f32,
    accelerating: bool,
}

impl Hammer {
    pub fn boxed() -> Box<dyn WeaponBehavior> {
        Box::new(Self {
            spin: 0.03,
            accelerating: true,
        })
    }

    fn max_spin(core: &WeaponCore) -> f32 {
        HAMMER_BASE_MAX_SPIN + core.hit_count as f32 * 0.005
    }
}

impl WeaponBehavior for Hammer {
    fn config(&self) -> WeaponConfig {
        WeaponConfig::new("hammer", 5.0, 0.03, 78.0)
            .super_at(10)
            .scaling("Spin")
    }

    fn scale(&self, core: &WeaponCore) -> Stats {
        let mut stats = core.base;
        stats.rotation_speed = self.spin;
        if core.super_active {
            stats.damage += 3.0;
        }
        stats
    }

    fn scaling_value(&self, core: &WeaponCore) -> f32 {
        (Self::max_spin(core) * 1000.0).round()
    }

    fn update(&mut self, core: &mut WeaponCore, _owner: &mut Body, _ctx: &mut BattleCtx<'_>) {
        if self.accelerating {
            self.spin += 0.0012;
            if self.spin >= Self::max_spin(core) {
                self.accelerating = false;
            }
        } else {
            self.spin -= 0.0008;
            if self.spin <= HAMMER_MIN_SPIN {
                self.accelerating = true;
            }
        }
        core.stats.rotation_speed = self.spin;
        core.advance();
    }

    fn activate_super(&mut self, core: &mut WeaponCore, _owner: &mut Body, _ctx: &mut BattleCtx<'_>) {
        core.unparryable = true;
    }
}

/// Rolls for critical hits; crit chance climbs with every hit
#[derive(Debug, Default)]
pub struct Axe {
    pub last_hit_was_crit: bool,
}

impl Axe {
    pub fn boxed() -> Box<dyn WeaponBehavior> {
        Box::new(Self::default())
    }

    /// Crit chance in percent
    pub fn crit_chance(core: &WeaponCore) -> f32 {
        let bonus = if core.super_active { 20.0 } else { 0.0 };
        5.0 + core.hit_count as f32 * 2.0 + bonus
    }
}

impl WeaponBehavior for Axe {
    fn config(&self) -> WeaponConfig {
        WeaponConfig::new("axe", 4.0, 0.045, 72.0)
            .super_at(12)
            .scaling("Crit %")
    }

    fn scale(&self, core: &WeaponCore) -> Stats {
        let mut stats = core.base;
        if core.super_active {
            stats.damage += 2.0;
        }
        stats
    }

    fn scaling_value(&self, core: &WeaponCore) -> f32 {
        Self::crit_chance(core)
    }

    fn strike(
        &mut self,
        core: &mut WeaponCore,
        _owner: &mut Body,
        _target: &mut Body,
        ctx: &mut BattleCtx<'_>,
    ) -> Strike {
        let crit = Self::crit_chance(core);
        self.last_hit_was_crit = ctx.rng.chance(crit / 100.0);
        if self.last_hit_was_crit {
            Strike::damage(core.stats.damage + crit * 0.5)
        } else {
            Strike::damage(core.stats.damage)
        }
    }
}

/// Every hit stacks poison on the target
#[derive(Debug, Default)]
pub struct Scythe;

impl Scythe {
    pub fn boxed() -> Box<dyn WeaponBehavior> {
        Box::new(Self)
    }

    pub fn poison_level(core: &WeaponCore) -> u32 {
        1 + core.hit_count
    }
}

impl WeaponBehavior for Scythe {
    fn config(&self) -> WeaponConfig {
        WeaponConfig::new("scythe", 2.0, 0.05, 78.0)
            .super_at(8)
            .scaling("Poison")
    }

    fn scale(&self, core: &WeaponCore) -> Stats {
        let mut stats = core.base;
        if core.super_active {
            stats.rotation_speed *= 1.5;
            stats.damage += 2.0;
        }
        stats
    }

    fn scaling_value(&self, core: &WeaponCore) -> f32 {
        Self::poison_level(core) as f32
    }

    fn strike(
        &mut self,
        core: &mut WeaponCore,
        _owner: &mut Body,
        target: &mut Body,
        _ctx: &mut BattleCtx<'_>,
    ) -> Strike {
        target.poison_stacks += Self::poison_level(core);
        Strike::damage(core.stats.damage)
    }
}
