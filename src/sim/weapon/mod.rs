//! Weapon framework
//!
//! Every weapon is a `WeaponCore` (state shared by all variants) plus a boxed
//! `WeaponBehavior` (the per-variant hooks). `Weapon` owns the template:
//! rotation, cooldowns, hit bookkeeping, rescaling and the one-way phase
//! machine. Variants only describe how they differ.

pub mod catalog;
pub mod registry;

use std::fmt;

use glam::Vec2;

pub use registry::{WeaponCtor, WeaponRegistry};

use super::ball::Body;
use super::events::{BattleEvent, Sink, WeaponPose};
use super::rng::SimRng;
use super::state::{BallId, BattleCtx, Side};
use crate::consts::*;
use crate::settings::BattleConfig;

/// Power phase, driven purely by hit count. Never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WeaponPhase {
    Normal,
    Empowered,
    Super,
}

/// Damage, reach and spin of a weapon at some point in its life
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub damage: f32,
    pub reach: f32,
    pub rotation_speed: f32,
}

/// Static description of a weapon variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponConfig {
    pub kind: &'static str,
    pub base: Stats,
    /// Overrides the arena's super threshold
    pub super_threshold: Option<u32>,
    pub empower_at: Option<u32>,
    pub can_parry: bool,
    pub is_ranged: bool,
    /// Extra contact range for reach-0 weapons (px)
    pub contact_aura: f32,
    /// HP multiplier applied to the owner on equip
    pub hp_multiplier: f32,
    /// Label for the stat the variant scales (UI only)
    pub scaling_name: &'static str,
}

impl WeaponConfig {
    pub const fn new(kind: &'static str, damage: f32, rotation_speed: f32, reach: f32) -> Self {
        Self {
            kind,
            base: Stats {
                damage,
                reach,
                rotation_speed,
            },
            super_threshold: None,
            empower_at: None,
            can_parry: true,
            is_ranged: false,
            contact_aura: 0.0,
            hp_multiplier: 1.0,
            scaling_name: "Damage",
        }
    }

    pub const fn super_at(mut self, hits: u32) -> Self {
        self.super_threshold = Some(hits);
        self
    }

    pub const fn empower_at(mut self, hits: u32) -> Self {
        self.empower_at = Some(hits);
        self
    }

    pub const fn ranged(mut self) -> Self {
        self.is_ranged = true;
        self
    }

    pub const fn no_parry(mut self) -> Self {
        self.can_parry = false;
        self
    }

    pub const fn aura(mut self, px: f32) -> Self {
        self.contact_aura = px;
        self
    }

    pub const fn hp_multiplier(mut self, factor: f32) -> Self {
        self.hp_multiplier = factor;
        self
    }

    pub const fn scaling(mut self, name: &'static str) -> Self {
        self.scaling_name = name;
        self
    }
}

/// State shared by every weapon variant
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponCore {
    pub kind: &'static str,
    pub owner: BallId,
    pub side: Side,
    pub angle: f32,
    pub base: Stats,
    /// Current stats, derived from `(hit_count, phase)`
    pub stats: Stats,
    pub hit_count: u32,
    pub total_damage_dealt: f32,
    pub cooldown: u32,
    pub super_threshold: u32,
    pub empower_at: Option<u32>,
    pub phase: WeaponPhase,
    pub super_active: bool,
    pub can_parry: bool,
    pub unparryable: bool,
    pub is_ranged: bool,
    pub contact_aura: f32,
    pub scaling_name: &'static str,
}

impl WeaponCore {
    fn new(cfg: &WeaponConfig, angle: f32, default_threshold: u32) -> Self {
        Self {
            kind: cfg.kind,
            owner: BallId(0),
            side: Side::Left,
            angle,
            base: cfg.base,
            stats: cfg.base,
            hit_count: 0,
            total_damage_dealt: 0.0,
            cooldown: 0,
            super_threshold: cfg.super_threshold.unwrap_or(default_threshold),
            empower_at: cfg.empower_at,
            phase: WeaponPhase::Normal,
            super_active: false,
            can_parry: cfg.can_parry,
            unparryable: false,
            is_ranged: cfg.is_ranged,
            contact_aura: cfg.contact_aura,
            scaling_name: cfg.scaling_name,
        }
    }

    pub fn damage(&self) -> f32 {
        self.stats.damage
    }

    pub fn reach(&self) -> f32 {
        self.stats.reach
    }

    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    /// Tip of the blade for a weapon held at `origin`
    pub fn tip(&self, origin: Vec2) -> Vec2 {
        origin + self.direction() * self.stats.reach
    }

    /// Start of the damaging part of the blade
    pub fn arc_start(&self, origin: Vec2) -> Vec2 {
        origin + self.direction() * self.stats.reach * MELEE_ARC_START
    }

    /// Rotate and count down the hit cooldown
    pub fn advance(&mut self) {
        self.angle = crate::normalize_angle(self.angle + self.stats.rotation_speed);
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    pub fn pose(&self, origin: Vec2) -> WeaponPose<'static> {
        WeaponPose {
            owner: self.owner,
            kind: self.kind,
            origin,
            angle: self.angle,
            reach: self.stats.reach,
            super_active: self.super_active,
        }
    }
}

/// Damage dealt by a single strike plus optional knockback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    pub damage: f32,
    pub knockback: f32,
}

impl Strike {
    pub fn damage(damage: f32) -> Self {
        Self {
            damage,
            knockback: 0.0,
        }
    }

    pub fn with_knockback(mut self, knockback: f32) -> Self {
        self.knockback = knockback;
        self
    }
}

/// Per-variant weapon hooks. Everything has a default except `config`.
pub trait WeaponBehavior: fmt::Debug + Send {
    fn config(&self) -> WeaponConfig;

    /// Current stats for the core's `(hit_count, phase)`. Must not mutate
    /// and must give the same answer when called twice in a row. Variants
    /// with per-frame state (an oscillating spin) may read it here.
    fn scale(&self, core: &WeaponCore) -> Stats {
        core.base
    }

    /// Value shown next to the scaling label
    fn scaling_value(&self, core: &WeaponCore) -> f32 {
        core.stats.damage
    }

    fn on_equip(&mut self, _core: &mut WeaponCore, _owner: &mut Body) {}

    /// Per-frame update; the default just rotates and cools down
    fn update(&mut self, core: &mut WeaponCore, _owner: &mut Body, _ctx: &mut BattleCtx<'_>) {
        core.advance();
    }

    fn can_hit(&self, core: &WeaponCore) -> bool {
        core.cooldown == 0
    }

    /// Damage for a landed melee or contact hit. May apply bespoke effects.
    fn strike(
        &mut self,
        core: &mut WeaponCore,
        _owner: &mut Body,
        _target: &mut Body,
        _ctx: &mut BattleCtx<'_>,
    ) -> Strike {
        Strike::damage(core.stats.damage)
    }

    fn on_empower(&mut self, _core: &mut WeaponCore, _owner: &mut Body, _ctx: &mut BattleCtx<'_>) {}

    fn activate_super(&mut self, _core: &mut WeaponCore, _owner: &mut Body, _ctx: &mut BattleCtx<'_>) {}

    fn on_projectile_hit(
        &mut self,
        _core: &mut WeaponCore,
        _owner: &mut Body,
        _target: BallId,
        _ctx: &mut BattleCtx<'_>,
    ) {
    }

    /// Describe the weapon to a renderer. Never mutates anything.
    fn draw(&self, core: &WeaponCore, owner: &Body, sink: &mut dyn Sink) {
        sink.draw_weapon(&core.pose(owner.pos));
    }
}

/// A weapon instance owned by exactly one ball
pub struct Weapon {
    pub core: WeaponCore,
    behavior: Box<dyn WeaponBehavior>,
    ctor: WeaponCtor,
}

impl fmt::Debug for Weapon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Weapon")
            .field("core", &self.core)
            .field("behavior", &self.behavior)
            .finish()
    }
}

impl Weapon {
    /// Build a fresh weapon; its starting angle comes from `rng`
    pub fn new(ctor: WeaponCtor, rng: &mut SimRng, config: &BattleConfig) -> Self {
        let behavior = ctor();
        let cfg = behavior.config();
        let core = WeaponCore::new(&cfg, rng.angle(), config.super_threshold);
        let mut weapon = Self { core, behavior, ctor };
        weapon.apply_scaling();
        weapon
    }

    /// Another unused weapon of the same kind
    pub fn fresh(&self, rng: &mut SimRng, config: &BattleConfig) -> Self {
        Self::new(self.ctor, rng, config)
    }

    pub fn kind(&self) -> &'static str {
        self.core.kind
    }

    pub fn phase(&self) -> WeaponPhase {
        self.core.phase
    }

    pub fn scaling_value(&self) -> f32 {
        self.behavior.scaling_value(&self.core)
    }

    /// Attach to a ball
    pub fn equip(&mut self, owner_id: BallId, owner: &mut Body) {
        self.core.owner = owner_id;
        self.core.side = owner.side;
        let factor = self.behavior.config().hp_multiplier;
        if factor != 1.0 {
            owner.max_hp *= factor;
            owner.hp = owner.max_hp;
        }
        self.behavior.on_equip(&mut self.core, owner);
    }

    /// Per-frame update. Hits a behavior books on its own (reflects, shard
    /// strikes) are settled here.
    pub fn update(&mut self, owner: &mut Body, ctx: &mut BattleCtx<'_>) {
        let hits_before = self.core.hit_count;
        self.behavior.update(&mut self.core, owner, ctx);
        if self.core.hit_count != hits_before {
            self.apply_scaling();
            self.check_phase(owner, ctx);
        }
    }

    pub fn can_hit(&self) -> bool {
        self.behavior.can_hit(&self.core)
    }

    /// Recompute derived stats from `(hit_count, phase)`
    pub fn apply_scaling(&mut self) {
        self.core.stats = self.behavior.scale(&self.core);
    }

    /// Land a melee or contact hit on `target`. Returns the damage dealt.
    pub fn on_hit(
        &mut self,
        owner: &mut Body,
        target_id: BallId,
        target: &mut Body,
        ctx: &mut BattleCtx<'_>,
    ) -> f32 {
        let strike = self.behavior.strike(&mut self.core, owner, target, ctx);
        let damage = strike.damage.max(0.0);
        let died = target.take_damage(damage);
        if strike.knockback > 0.0 {
            target.push(target.pos - owner.pos, strike.knockback);
        }

        self.core.hit_count += 1;
        self.core.cooldown = ctx.config.hit_cooldown;
        self.apply_scaling();
        self.check_phase(owner, ctx);
        self.report_hit(target_id, target, damage, died, ctx);
        damage
    }

    /// Book a hit landed by one of this weapon's projectiles
    pub fn credit_projectile_hit(
        &mut self,
        owner: &mut Body,
        target_id: BallId,
        target: &Body,
        damage: f32,
        died: bool,
        ctx: &mut BattleCtx<'_>,
    ) {
        self.core.hit_count += 1;
        self.apply_scaling();
        self.check_phase(owner, ctx);
        self.behavior.on_projectile_hit(&mut self.core, owner, target_id, ctx);
        self.report_hit(target_id, target, damage, died, ctx);
    }

    /// Hit consequences shared by every hit path
    fn report_hit(
        &mut self,
        target_id: BallId,
        target: &Body,
        damage: f32,
        died: bool,
        ctx: &mut BattleCtx<'_>,
    ) {
        self.core.total_damage_dealt += damage;
        ctx.emit(BattleEvent::Hit {
            attacker: self.core.owner,
            target: target_id,
            side: self.core.side,
            damage,
            hit_count: self.core.hit_count,
            pos: target.pos,
        });
        if died {
            ctx.emit(BattleEvent::Death {
                ball: target_id,
                side: target.side,
            });
        }
    }

    /// Advance the phase machine. Phases only move forward.
    pub fn check_phase(&mut self, owner: &mut Body, ctx: &mut BattleCtx<'_>) {
        let hits = self.core.hit_count;

        if self.core.phase == WeaponPhase::Normal && self.core.empower_at.is_some_and(|n| hits >= n) {
            self.core.phase = WeaponPhase::Empowered;
            self.behavior.on_empower(&mut self.core, owner, ctx);
            self.apply_scaling();
            ctx.emit(BattleEvent::Empowered {
                ball: self.core.owner,
                side: self.core.side,
                kind: self.core.kind.to_string(),
            });
        }

        if ctx.config.supers_enabled && !self.core.super_active && hits >= self.core.super_threshold {
            self.core.super_active = true;
            self.core.phase = WeaponPhase::Super;
            self.behavior.activate_super(&mut self.core, owner, ctx);
            self.apply_scaling();
            log::debug!("{} super activated after {} hits", self.core.kind, hits);
            ctx.emit(BattleEvent::SuperActivated {
                ball: self.core.owner,
                side: self.core.side,
                kind: self.core.kind.to_string(),
            });
        }
    }

    /// Knock the blade aside after a parry
    pub fn deflect(&mut self, delta: f32) {
        self.core.angle = crate::normalize_angle(self.core.angle + delta);
        self.core.cooldown = self.core.cooldown.max(PARRY_COOLDOWN);
    }

    pub fn draw(&self, owner: &Body, sink: &mut dyn Sink) {
        self.behavior.draw(&self.core, owner, sink);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::excitement::Excitement;
    use crate::sim::events::NoopSink;
    use crate::sim::projectile::Projectile;
    use crate::sim::state::{SpawnRequest, Target};

    /// Owned backing storage for a `BattleCtx` in unit tests
    pub struct Harness {
        pub config: BattleConfig,
        pub rng: SimRng,
        pub projectiles: Vec<Projectile>,
        pub spawns: Vec<SpawnRequest>,
        pub targets: Vec<Target>,
        pub telemetry: Excitement,
        pub sink: NoopSink,
    }

    impl Harness {
        pub fn new() -> Self {
            Self {
                config: BattleConfig::default(),
                rng: SimRng::seeded(7),
                projectiles: Vec::new(),
                spawns: Vec::new(),
                targets: Vec::new(),
                telemetry: Excitement::new(),
                sink: NoopSink,
            }
        }

        pub fn ctx(&mut self) -> BattleCtx<'_> {
            BattleCtx::new(
                &self.config,
                0,
                &mut self.rng,
                &mut self.projectiles,
                &mut self.spawns,
                &self.targets,
                &mut self.telemetry,
                &mut self.sink,
            )
        }
    }

    pub fn body(side: Side) -> Body {
        Body::new(Vec2::new(200.0, 300.0), BALL_RADIUS, BALL_MASS, BALL_MAX_HP, side, true)
    }

    pub fn weapon(kind: &str, harness: &mut Harness) -> Weapon {
        let registry = WeaponRegistry::builtin();
        let mut weapon = registry
            .create(kind, &mut harness.rng, &harness.config)
            .unwrap();
        weapon.core.owner = BallId(1);
        weapon
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn land_hits(weapon: &mut Weapon, harness: &mut Harness, n: u32) {
        let mut owner = body(Side::Left);
        let mut target = body(Side::Right);
        target.max_hp = 1.0e6;
        target.hp = 1.0e6;
        for _ in 0..n {
            let mut ctx = harness.ctx();
            weapon.on_hit(&mut owner, BallId(2), &mut target, &mut ctx);
        }
    }

    #[test]
    fn test_hit_count_monotonic_and_cooldown_set() {
        let mut harness = Harness::new();
        let mut sword = weapon("sword", &mut harness);
        assert!(sword.can_hit());
        let mut last = 0;
        for _ in 0..5 {
            land_hits(&mut sword, &mut harness, 1);
            assert!(sword.core.hit_count > last);
            last = sword.core.hit_count;
        }
        assert_eq!(sword.core.cooldown, harness.config.hit_cooldown);
        assert!(!sword.can_hit());
    }

    #[test]
    fn test_scaling_is_idempotent() {
        let mut harness = Harness::new();
        let registry = WeaponRegistry::builtin();
        for kind in registry.types(None) {
            let mut weapon = super::test_support::weapon(kind, &mut harness);
            land_hits(&mut weapon, &mut harness, 12);
            let before = weapon.core.stats;
            weapon.apply_scaling();
            weapon.apply_scaling();
            assert_eq!(weapon.core.stats, before, "{kind} rescaled differently");
        }
    }

    #[test]
    fn test_super_latches_once() {
        let mut harness = Harness::new();
        let mut sword = weapon("sword", &mut harness);
        let threshold = sword.core.super_threshold;
        land_hits(&mut sword, &mut harness, threshold - 1);
        assert!(!sword.core.super_active);
        land_hits(&mut sword, &mut harness, 1);
        assert!(sword.core.super_active);
        assert_eq!(sword.phase(), WeaponPhase::Super);

        land_hits(&mut sword, &mut harness, 10);
        assert!(sword.core.super_active);
        // One SuperActivated event recorded by telemetry
        assert_eq!(harness.telemetry.supers(), 1);
    }

    #[test]
    fn test_supers_disabled() {
        let mut harness = Harness::new();
        harness.config.supers_enabled = false;
        let mut sword = weapon("sword", &mut harness);
        land_hits(&mut sword, &mut harness, 30);
        assert!(!sword.core.super_active);
        assert_eq!(sword.phase(), WeaponPhase::Normal);
    }

    #[test]
    fn test_deflect_raises_cooldown() {
        let mut harness = Harness::new();
        let mut sword = weapon("sword", &mut harness);
        sword.deflect(0.5);
        assert_eq!(sword.core.cooldown, PARRY_COOLDOWN);
        sword.core.cooldown = 15;
        sword.deflect(0.5);
        assert_eq!(sword.core.cooldown, 15);
    }

    #[test]
    fn test_tip_geometry() {
        let mut harness = Harness::new();
        let mut sword = weapon("sword", &mut harness);
        sword.core.angle = 0.0;
        let origin = Vec2::new(10.0, 10.0);
        let tip = sword.core.tip(origin);
        assert!((tip.x - (10.0 + sword.core.reach())).abs() < 1e-4);
        let start = sword.core.arc_start(origin);
        assert!((start.x - (10.0 + sword.core.reach() * 0.4)).abs() < 1e-4);
    }
}
