//! Built-in weapon catalog, grouped by category

mod body;
mod classic;
mod pantheon;
mod ranged;

use glam::Vec2;

pub use body::{Duplicator, Unarmed};
pub use classic::{Axe, Dagger, Hammer, Scythe, Spear, Sword};
pub use pantheon::{Ares, Artemis, Athena, Zeus};
pub use ranged::{Bow, Crossbow};

use super::registry::WeaponRegistry;
use super::WeaponCore;
use crate::sim::events::BattleEvent;
use crate::sim::projectile::Projectile;
use crate::sim::state::BattleCtx;

pub const CLASSIC: &str = "classic";
pub const BODY: &str = "body";
pub const RANGED: &str = "ranged";
pub const PANTHEON: &str = "pantheon";

/// Register every built-in weapon
pub fn register_all(registry: &mut WeaponRegistry) {
    registry.register("sword", CLASSIC, Sword::boxed);
    registry.register("dagger", CLASSIC, Dagger::boxed);
    registry.register("spear", CLASSIC, Spear::boxed);
    registry.register("hammer", CLASSIC, Hammer::boxed);
    registry.register("axe", CLASSIC, Axe::boxed);
    registry.register("scythe", CLASSIC, Scythe::boxed);

    registry.register("unarmed", BODY, Unarmed::boxed);
    registry.register("duplicator", BODY, Duplicator::boxed);

    registry.register("bow", RANGED, Bow::boxed);
    registry.register("crossbow", RANGED, Crossbow::boxed);

    registry.register("zeus", PANTHEON, Zeus::boxed);
    registry.register("ares", PANTHEON, Ares::boxed);
    registry.register("artemis", PANTHEON, Artemis::boxed);
    registry.register("athena", PANTHEON, Athena::boxed);
}

/// Frame counter for periodic actions (firing, splitting)
#[derive(Debug, Clone, Copy, PartialEq)]
struct Interval {
    elapsed: u32,
    every: u32,
}

impl Interval {
    const fn new(every: u32) -> Self {
        Self { elapsed: 0, every }
    }

    /// Count one frame; true when the interval elapses
    fn tick(&mut self) -> bool {
        self.elapsed += 1;
        if self.elapsed >= self.every {
            self.elapsed = 0;
            true
        } else {
            false
        }
    }
}

/// Angles of `count` shots fanned evenly around `center`
fn fan(center: f32, count: u32, spread: f32) -> impl Iterator<Item = f32> {
    let start = center - (count.saturating_sub(1)) as f32 * spread / 2.0;
    (0..count).map(move |i| start + i as f32 * spread)
}

/// Heading from `from` toward the nearest living enemy, if there is one
fn aim_at_nearest(core: &WeaponCore, from: Vec2, ctx: &BattleCtx<'_>) -> Option<f32> {
    ctx.nearest_enemy(core.side, from)
        .map(|enemy| crate::heading(enemy.pos - from))
}

/// Push a volley into the battle and report it
fn launch(core: &WeaponCore, origin: Vec2, shots: Vec<Projectile>, ctx: &mut BattleCtx<'_>) {
    let count = shots.len() as u32;
    if count == 0 {
        return;
    }
    for shot in shots {
        ctx.spawn_projectile(shot);
    }
    ctx.emit(BattleEvent::ProjectileFired {
        owner: core.owner,
        pos: origin,
        count,
    });
}
