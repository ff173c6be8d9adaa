//! Deterministic simulation module
//!
//! All battle logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (balls in spawn order)
//! - No rendering; presentation goes through a `Sink`

pub mod ball;
pub mod collision;
pub mod events;
pub mod projectile;
pub mod rng;
pub mod state;
pub mod tick;
pub mod weapon;

pub use ball::{Ball, BallOptions, Body};
pub use collision::{CollisionResult, Wall};
pub use events::{BallPose, BattleEvent, EventLog, LogSink, NoopSink, ProjectilePose, Sink, WeaponPose};
pub use projectile::Projectile;
pub use rng::{MAX_SEED, SimRng};
pub use state::{BallId, BattleCtx, BattleState, Side, SpawnRequest, Target};
pub use tick::{Outcome, check_outcome, draw, step};
pub use weapon::{Weapon, WeaponBehavior, WeaponCore, WeaponCtor, WeaponPhase, WeaponRegistry};
