//! Pantheon weapons: gods with bespoke mechanics

use std::f32::consts::PI;

use crate::sim::ball::Body;
use crate::sim::events::BattleEvent;
use crate::sim::projectile::Projectile;
use crate::sim::state::BattleCtx;
use crate::sim::weapon::{Stats, Strike, WeaponBehavior, WeaponConfig, WeaponCore, WeaponPhase};

use super::{aim_at_nearest, fan, launch, Interval};

/// Frames between bolts of the super volley
const VOLLEY_GAP: u32 = 4;

/// Zeus: aimed, bouncing, mildly homing lightning bolts
#[derive(Debug)]
pub struct Zeus {
    fire: Interval,
    volley_gap: Interval,
    volley_left: u32,
}

impl Zeus {
    pub fn boxed() -> Box<dyn WeaponBehavior> {
        Box::new(Self {
            fire: Interval::new(60),
            volley_gap: Interval::new(VOLLEY_GAP),
            volley_left: 0,
        })
    }

    pub fn bolt_bounces(core: &WeaponCore) -> u32 {
        3 + (core.hit_count as f32 * 0.3).floor() as u32
    }

    pub fn bolt_speed(core: &WeaponCore) -> f32 {
        (7.0 + core.hit_count as f32 * 0.3).min(12.0)
    }

    fn shoot(&self, core: &WeaponCore, owner: &Body, ctx: &mut BattleCtx<'_>) {
        let mut angle = match aim_at_nearest(core, owner.pos, ctx) {
            Some(aim) => aim + ctx.rng.jitter(0.125),
            None => core.angle,
        };
        angle += ctx.rng.jitter(0.075);

        let origin = owner.pos + crate::from_angle(angle, owner.radius + 6.0);
        let bolt = Projectile::new(
            core.owner,
            core.side,
            origin,
            crate::from_angle(angle, Self::bolt_speed(core)),
            core.damage(),
        )
        .radius(4.0)
        .lifespan(100)
        .bounces(Self::bolt_bounces(core))
        .homing(0.02)
        .falloff(0.25);
        launch(core, origin, vec![bolt], ctx);
    }
}

impl WeaponBehavior for Zeus {
    fn config(&self) -> WeaponConfig {
        WeaponConfig::new("zeus", 4.0, 0.04, 50.0)
            .super_at(9)
            .ranged()
            .scaling("Bolts")
    }

    fn scale(&self, core: &WeaponCore) -> Stats {
        let mut stats = core.base;
        stats.damage = core.base.damage + (core.hit_count as f32 * 0.4).floor();
        if core.super_active {
            stats.damage += 3.0;
        }
        stats
    }

    fn scaling_value(&self, core: &WeaponCore) -> f32 {
        Self::bolt_bounces(core) as f32
    }

    fn update(&mut self, core: &mut WeaponCore, owner: &mut Body, ctx: &mut BattleCtx<'_>) {
        core.advance();
        if self.fire.tick() {
            self.shoot(core, owner, ctx);
        }
        if self.volley_left > 0 && self.volley_gap.tick() {
            self.volley_left -= 1;
            self.shoot(core, owner, ctx);
        }
    }

    fn activate_super(&mut self, _core: &mut WeaponCore, _owner: &mut Body, _ctx: &mut BattleCtx<'_>) {
        self.fire.every = 40;
        self.volley_left = 5;
    }
}

const ARES_BASE_SPIN: f32 = 0.035;

/// Ares: spins faster as he bleeds; super goes berserk and fights bare-bodied
#[derive(Debug)]
pub struct Ares {
    rage: u32,
    regen: Interval,
}

impl Ares {
    pub fn boxed() -> Box<dyn WeaponBehavior> {
        Box::new(Self {
            rage: 0,
            regen: Interval::new(90),
        })
    }

    /// One rage point per 5 HP lost
    pub fn rage(owner: &Body) -> u32 {
        ((owner.max_hp - owner.hp) / 5.0).floor().max(0.0) as u32
    }
}

impl WeaponBehavior for Ares {
    fn config(&self) -> WeaponConfig {
        WeaponConfig::new("ares", 7.0, ARES_BASE_SPIN, 88.0)
            .super_at(9)
            .empower_at(5)
            .scaling("Rage")
    }

    fn scale(&self, core: &WeaponCore) -> Stats {
        let mut stats = core.base;
        stats.damage = core.base.damage + (core.hit_count as f32 * 0.6).floor();
        if core.super_active {
            stats.damage += 7.0;
            stats.reach = 0.0;
        }
        stats
    }

    fn scaling_value(&self, _core: &WeaponCore) -> f32 {
        self.rage as f32
    }

    fn update(&mut self, core: &mut WeaponCore, owner: &mut Body, _ctx: &mut BattleCtx<'_>) {
        if core.super_active {
            if self.regen.tick() {
                owner.heal(2.0);
            }
            core.stats.rotation_speed = 0.02;
        } else {
            self.rage = Self::rage(owner);
            let rage_bonus = (self.rage as f32 * 0.006).min(0.05);
            let empowered = if core.phase >= WeaponPhase::Empowered { 0.01 } else { 0.0 };
            core.stats.rotation_speed =
                ARES_BASE_SPIN + rage_bonus + core.hit_count as f32 * 0.003 + empowered;
        }
        core.advance();
    }

    fn strike(
        &mut self,
        core: &mut WeaponCore,
        _owner: &mut Body,
        _target: &mut Body,
        _ctx: &mut BattleCtx<'_>,
    ) -> Strike {
        if core.super_active {
            Strike::damage(core.stats.damage + self.rage as f32 * 2.0).with_knockback(7.0)
        } else {
            Strike::damage(core.stats.damage)
        }
    }

    fn activate_super(&mut self, core: &mut WeaponCore, owner: &mut Body, ctx: &mut BattleCtx<'_>) {
        core.can_parry = false;
        owner.mass *= 1.6;
        owner.max_speed = ctx.config.max_speed * 1.4;
        owner.heal(15.0);
    }
}

const ARTEMIS_MAX_ARROWS: u32 = 5;

/// Artemis: fans of homing arrows
#[derive(Debug)]
pub struct Artemis {
    fire: Interval,
}

impl Artemis {
    pub fn boxed() -> Box<dyn WeaponBehavior> {
        Box::new(Self {
            fire: Interval::new(52),
        })
    }

    pub fn arrow_count(core: &WeaponCore) -> u32 {
        (1 + core.hit_count / 3).min(ARTEMIS_MAX_ARROWS)
    }

    /// Homing turn rate in radians per frame
    pub fn homing(core: &WeaponCore) -> f32 {
        let homing = (0.045 + core.hit_count as f32 * 0.005).min(0.09);
        if core.super_active {
            (homing + 0.03).min(0.12)
        } else {
            homing
        }
    }
}

impl WeaponBehavior for Artemis {
    fn config(&self) -> WeaponConfig {
        WeaponConfig::new("artemis", 3.0, 0.035, 60.0)
            .super_at(12)
            .ranged()
            .scaling("Arrows")
    }

    fn scale(&self, core: &WeaponCore) -> Stats {
        let mut stats = core.base;
        stats.damage = core.base.damage + (core.hit_count as f32 * 0.25).floor();
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
        if !self.fire.tick() {
            return;
        }
        let origin = core.tip(owner.pos);
        let homing = Self::homing(core);
        let shots = fan(core.angle, Self::arrow_count(core), 0.15)
            .map(|angle| {
                Projectile::new(core.owner, core.side, origin, crate::from_angle(angle, 5.0), core.damage())
                    .radius(3.0)
                    .lifespan(90)
                    .homing(homing)
            })
            .collect();
        launch(core, origin, shots, ctx);
    }

    fn activate_super(&mut self, _core: &mut WeaponCore, _owner: &mut Body, _ctx: &mut BattleCtx<'_>) {
        self.fire.every = 42;
    }
}

/// Extra distance beyond the owner's radius the shield covers
const SHIELD_RANGE: f32 = 35.0;
const REFLECT_COOLDOWN: u32 = 10;
const REFLECT_SPEEDUP: f32 = 1.3;

/// Athena: spear melee plus a shield that turns enemy projectiles around
#[derive(Debug, Default)]
pub struct Athena {
    shield_angle: f32,
    reflect_cooldown: u32,
}

impl Athena {
    pub fn boxed() -> Box<dyn WeaponBehavior> {
        Box::new(Self::default())
    }

    /// Damage multiplier applied to reflected projectiles
    pub fn reflect_bonus(core: &WeaponCore) -> f32 {
        let bonus = (1.4 + core.hit_count as f32 * 0.1).min(2.2);
        if core.super_active { bonus + 0.5 } else { bonus }
    }

    /// Full width of the shield cone in radians
    pub fn cone_width(core: &WeaponCore) -> f32 {
        if core.super_active { PI * 1.2 } else { PI * 0.6 }
    }

    pub fn shield_angle(&self) -> f32 {
        self.shield_angle
    }

    fn face_enemy(&mut self, core: &WeaponCore, owner: &Body, ctx: &BattleCtx<'_>) {
        if owner.speed() <= 1.0 {
            return;
        }
        let desired = aim_at_nearest(core, owner.pos, ctx).unwrap_or_else(|| crate::heading(owner.vel));
        let diff = crate::normalize_angle(desired - self.shield_angle);
        self.shield_angle = crate::normalize_angle(self.shield_angle + diff * 0.1);
    }

    /// Reflect at most one enemy projectile per frame
    fn reflect(&mut self, core: &mut WeaponCore, owner: &Body, ctx: &mut BattleCtx<'_>) {
        if self.reflect_cooldown > 0 {
            return;
        }
        let half_cone = Self::cone_width(core) / 2.0;
        let range = owner.radius + SHIELD_RANGE;
        let shield = self.shield_angle;
        let incoming = ctx.projectiles.iter_mut().find(|p| {
            let offset = p.pos - owner.pos;
            p.alive
                && p.side != core.side
                && offset.length() <= range
                && crate::normalize_angle(crate::heading(offset) - shield).abs() < half_cone
        });
        let Some(projectile) = incoming else {
            return;
        };

        projectile.reflect(core.owner, core.side, REFLECT_SPEEDUP, Self::reflect_bonus(core));
        projectile.damage = projectile.damage.ceil();
        let pos = projectile.pos;
        self.reflect_cooldown = REFLECT_COOLDOWN;
        // Settled (rescale + phase check) by Weapon::update
        core.hit_count += 1;
        ctx.emit(BattleEvent::ProjectileReflected { by: core.owner, pos });
    }
}

impl WeaponBehavior for Athena {
    fn config(&self) -> WeaponConfig {
        WeaponConfig::new("athena", 4.0, 0.045, 72.0)
            .super_at(9)
            .hp_multiplier(1.1)
            .scaling("Shield")
    }

    fn scale(&self, core: &WeaponCore) -> Stats {
        let mut stats = core.base;
        stats.damage = core.base.damage + (core.hit_count as f32 * 0.4).floor();
        if core.super_active {
            stats.damage += 3.0;
            stats.rotation_speed = 0.08;
        }
        stats
    }

    fn scaling_value(&self, core: &WeaponCore) -> f32 {
        crate::round1(Self::reflect_bonus(core))
    }

    fn on_equip(&mut self, core: &mut WeaponCore, _owner: &mut Body) {
        self.shield_angle = core.angle;
    }

    fn update(&mut self, core: &mut WeaponCore, owner: &mut Body, ctx: &mut BattleCtx<'_>) {
        self.face_enemy(core, owner, ctx);
        core.advance();
        self.reflect_cooldown = self.reflect_cooldown.saturating_sub(1);
        self.reflect(core, owner, ctx);
    }
}
