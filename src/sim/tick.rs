//! Fixed timestep battle step
//!
//! One call to `step` advances a battle by exactly one frame. The passes run
//! in a fixed order and iterate balls in vector order, so a seed and two
//! weapon names fully determine the trajectory.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ball::{Ball, BallOptions};
use super::collision::{
    circle_overlap, clamp_speed, distance_sq, resolve_elastic, segment_circle_hit, separate,
    weapon_tip_push,
};
use super::events::{BattleEvent, Sink};
use super::state::{pair_mut, BattleCtx, BattleState, Side, SpawnRequest};
use crate::consts::*;
use crate::excitement::{Excitement, Vitals};
use crate::settings::BattleConfig;

/// How a battle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    /// One side was wiped out or lost its king
    Knockout { winner: Side },
    /// Both sides fell in the same frame; a seeded coin flip decided
    DoubleKnockout { winner: Side },
    /// Frame cap reached; king HP, then hits landed, then a coin flip decided
    TimeUp { winner: Side },
}

impl Outcome {
    pub fn winner(self) -> Side {
        match self {
            Outcome::Knockout { winner }
            | Outcome::DoubleKnockout { winner }
            | Outcome::TimeUp { winner } => winner,
        }
    }
}

/// Advance the battle by one frame. Returns the outcome once decided.
pub fn step(
    state: &mut BattleState,
    config: &BattleConfig,
    telemetry: &mut Excitement,
    sink: &mut dyn Sink,
) -> Option<Outcome> {
    state.frame += 1;
    let targets = state.targets();

    // 1. Ball updates (movement, steering, weapon updates, firing)
    {
        let mut ctx = BattleCtx::new(
            config,
            state.frame,
            &mut state.rng,
            &mut state.projectiles,
            &mut state.spawns,
            &targets,
            &mut *telemetry,
            &mut *sink,
        );
        for ball in state.balls.iter_mut().filter(|b| b.body.alive) {
            ball.update(&mut ctx);
        }
    }
    let split_events = apply_spawns(state, config);

    let mut ctx = BattleCtx::new(
        config,
        state.frame,
        &mut state.rng,
        &mut state.projectiles,
        &mut state.spawns,
        &targets,
        &mut *telemetry,
        &mut *sink,
    );
    for event in split_events {
        ctx.emit(event);
    }
    let balls = &mut state.balls;

    // 2. Weapon tips poking through walls push their owners back
    if config.weapon_wall_bounce {
        weapon_wall_pass(balls, &mut ctx);
    }
    // 3. Body collisions and contact weapons
    collision_pass(balls, &mut ctx);
    // 4. Melee arcs
    melee_pass(balls, &mut ctx);
    // 5. Parries
    parry_pass(balls, &mut ctx);
    // 6. Projectiles
    projectile_pass(balls, &mut ctx);
    drop(ctx);

    // 7. Telemetry follows the two kings
    if let (Some(left), Some(right)) = (state.king(Side::Left), state.king(Side::Right)) {
        telemetry.record_frame(Vitals::of(&left.body), Vitals::of(&right.body));
    }

    check_outcome(state, config)
}

/// Describe the current frame to a sink
pub fn draw(state: &BattleState, sink: &mut dyn Sink) {
    for ball in &state.balls {
        ball.draw(sink);
    }
    for projectile in &state.projectiles {
        projectile.draw(sink);
    }
}

/// Apply queued structural changes (duplicator splits)
fn apply_spawns(state: &mut BattleState, config: &BattleConfig) -> Vec<BattleEvent> {
    let requests = std::mem::take(&mut state.spawns);
    let mut events = Vec::new();

    for request in requests {
        match request {
            SpawnRequest::Split { side, bonus_hp } => {
                let parents: Vec<usize> = state
                    .balls
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| b.body.side == side && b.body.alive)
                    .map(|(i, _)| i)
                    .collect();

                let mut clones = 0;
                for idx in parents {
                    if state.alive_count(side) >= MAX_BALLS_PER_SIDE {
                        log::warn!("{} side reached the clone cap", side.as_str());
                        break;
                    }
                    let parent = &mut state.balls[idx].body;
                    let half = (parent.hp / 2.0).floor().max(5.0);
                    let clone_hp = half + bonus_hp;
                    let clone_radius = (parent.radius * 0.75).floor().max(10.0);
                    parent.hp = half.min(parent.max_hp);
                    let spread = parent.radius;
                    let origin = parent.pos;

                    let offset = Vec2::new(state.rng.jitter(spread), state.rng.jitter(spread));
                    let vel = Vec2::new(state.rng.jitter(3.0), state.rng.jitter(3.0));
                    let weapon = state.balls[idx].weapon.fresh(&mut state.rng, config);
                    let id = state.next_ball_id();
                    let mut clone = Ball::new(
                        id,
                        origin + offset,
                        side,
                        weapon,
                        config,
                        BallOptions {
                            radius: Some(clone_radius),
                            hp: Some(clone_hp),
                            is_original: Some(false),
                        },
                    );
                    clone.body.vel = vel;
                    state.balls.push(clone);
                    clones += 1;
                }
                if clones > 0 {
                    events.push(BattleEvent::Split { side, clones });
                }
            }
        }
    }
    events
}

fn weapon_wall_pass(balls: &mut [Ball], ctx: &mut BattleCtx<'_>) {
    let config = ctx.config;
    for ball in balls.iter_mut().filter(|b| b.body.alive) {
        let core = &ball.weapon.core;
        if core.reach() <= 0.0 || core.is_ranged {
            continue;
        }
        let tip = core.tip(ball.body.pos);
        let Some(push) = weapon_tip_push(tip, &config.arena) else {
            continue;
        };
        let strength = if config.weapon_wall_damage_bounce {
            1.0 + core.damage() * 0.5
        } else {
            config.weapon_wall_bounce_strength
        };
        ball.body.vel = clamp_speed(ball.body.vel + push * strength, ball.body.max_speed);
        ctx.emit(BattleEvent::WeaponWallBounce { ball: ball.id, tip });
    }
}

fn collision_pass(balls: &mut [Ball], ctx: &mut BattleCtx<'_>) {
    let restitution = ctx.config.ball_restitution;
    for i in 0..balls.len() {
        for j in (i + 1)..balls.len() {
            let (a, b) = pair_mut(balls, i, j);
            if !a.body.alive || !b.body.alive {
                continue;
            }
            let touching = circle_overlap(a.body.pos, a.body.radius, b.body.pos, b.body.radius);
            if touching {
                let speed = (a.body.vel - b.body.vel).length();
                let pos = (a.body.pos + b.body.pos) * 0.5;
                separate(&mut a.body, &mut b.body);
                resolve_elastic(&mut a.body, &mut b.body, restitution);
                ctx.emit(BattleEvent::BallClash {
                    a: a.id,
                    b: b.id,
                    speed,
                    pos,
                });
            }
            if a.body.side != b.body.side {
                contact_hit(a, b, touching, ctx);
                contact_hit(b, a, touching, ctx);
            }
        }
    }
}

/// Reach-0 weapons damage on contact (or within their aura)
fn contact_hit(attacker: &mut Ball, victim: &mut Ball, touching: bool, ctx: &mut BattleCtx<'_>) {
    let weapon = &attacker.weapon;
    if weapon.core.reach() > 0.0 || !weapon.can_hit() || !attacker.body.alive || !victim.body.alive {
        return;
    }
    let in_range = touching || {
        let aura = weapon.core.contact_aura;
        let reach = attacker.body.radius + victim.body.radius + aura;
        aura > 0.0 && distance_sq(attacker.body.pos, victim.body.pos) < reach * reach
    };
    if in_range {
        attacker
            .weapon
            .on_hit(&mut attacker.body, victim.id, &mut victim.body, ctx);
    }
}

fn melee_pass(balls: &mut [Ball], ctx: &mut BattleCtx<'_>) {
    for i in 0..balls.len() {
        for j in 0..balls.len() {
            if i == j {
                continue;
            }
            let (attacker, victim) = pair_mut(balls, i, j);
            let core = &attacker.weapon.core;
            if !attacker.body.alive
                || core.reach() <= 0.0
                || core.is_ranged
                || !attacker.weapon.can_hit()
            {
                break;
            }
            if !victim.body.alive || victim.body.side == attacker.body.side {
                continue;
            }
            let start = core.arc_start(attacker.body.pos);
            let tip = core.tip(attacker.body.pos);
            if segment_circle_hit(start, tip, victim.body.pos, victim.body.radius) {
                attacker
                    .weapon
                    .on_hit(&mut attacker.body, victim.id, &mut victim.body, ctx);
            }
        }
    }
}

fn parry_pass(balls: &mut [Ball], ctx: &mut BattleCtx<'_>) {
    use std::f32::consts::PI;

    for i in 0..balls.len() {
        for j in (i + 1)..balls.len() {
            let (a, b) = pair_mut(balls, i, j);
            if !a.body.alive || !b.body.alive || a.body.side == b.body.side {
                continue;
            }
            let (wa, wb) = (&a.weapon.core, &b.weapon.core);
            if !wa.can_parry || !wb.can_parry || wa.unparryable || wb.unparryable {
                continue;
            }
            let tip_a = wa.tip(a.body.pos);
            let tip_b = wb.tip(b.body.pos);
            if distance_sq(tip_a, tip_b) >= PARRY_DISTANCE_SQ {
                continue;
            }
            let deflect_a = (ctx.rng.next_f32() - 0.3) * PI * 0.4;
            let deflect_b = (ctx.rng.next_f32() - 0.3) * PI * 0.4;
            a.weapon.deflect(deflect_a);
            b.weapon.deflect(-deflect_b);
            ctx.emit(BattleEvent::Parry {
                a: a.id,
                b: b.id,
                pos: (tip_a + tip_b) * 0.5,
            });
        }
    }
}

fn projectile_pass(balls: &mut [Ball], ctx: &mut BattleCtx<'_>) {
    // Projectiles fired while resolving hits land in the emptied vector
    let mut flying = std::mem::take(&mut *ctx.projectiles);

    for projectile in flying.iter_mut() {
        let wall = projectile.update(&ctx.config.arena, ctx.targets);
        if wall.is_some() && projectile.alive {
            ctx.emit(BattleEvent::ProjectileBounce {
                pos: projectile.pos,
                speed: projectile.vel.length(),
            });
        }
        if !projectile.alive {
            continue;
        }

        let Some(victim) = balls.iter().position(|b| projectile.check_hit(&b.target())) else {
            continue;
        };
        let damage = projectile.damage;
        let died = balls[victim].body.take_damage(damage);
        match balls.iter().position(|b| b.id == projectile.owner) {
            Some(shooter) if shooter != victim => {
                let (owner, target) = pair_mut(balls, shooter, victim);
                owner
                    .weapon
                    .credit_projectile_hit(&mut owner.body, target.id, &target.body, damage, died, ctx);
            }
            _ => {
                log::warn!("Projectile owner {:?} not found", projectile.owner);
                if died {
                    let body = &balls[victim].body;
                    ctx.emit(BattleEvent::Death {
                        ball: balls[victim].id,
                        side: body.side,
                    });
                }
            }
        }
    }

    flying.retain(|p| p.alive);
    flying.append(ctx.projectiles);
    *ctx.projectiles = flying;
}

/// A side is defeated when nobody is left standing or its king has fallen
fn defeated(state: &BattleState, side: Side) -> bool {
    state.alive_count(side) == 0 || state.king(side).is_none_or(|king| !king.body.alive)
}

/// Decide the battle if it is over. Draws never happen.
pub fn check_outcome(state: &mut BattleState, config: &BattleConfig) -> Option<Outcome> {
    let coin = |state: &mut BattleState| {
        if state.rng.coin_flip() {
            Side::Left
        } else {
            Side::Right
        }
    };

    match (defeated(state, Side::Left), defeated(state, Side::Right)) {
        (true, true) => Some(Outcome::DoubleKnockout {
            winner: coin(state),
        }),
        (true, false) => Some(Outcome::Knockout {
            winner: Side::Right,
        }),
        (false, true) => Some(Outcome::Knockout { winner: Side::Left }),
        (false, false) if state.frame >= config.max_frames => {
            let hp = |side| state.king(side).map_or(0.0, |k| k.body.hp);
            let (left_hp, right_hp) = (hp(Side::Left), hp(Side::Right));
            let (left_hits, right_hits) = (state.total_hits(Side::Left), state.total_hits(Side::Right));
            let winner = if left_hp != right_hp {
                if left_hp > right_hp { Side::Left } else { Side::Right }
            } else if left_hits != right_hits {
                if left_hits > right_hits { Side::Left } else { Side::Right }
            } else {
                coin(state)
            };
            Some(Outcome::TimeUp { winner })
        }
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::NoopSink;
    use crate::sim::projectile::Projectile;
    use crate::sim::weapon::WeaponRegistry;

    fn battle(left: &str, right: &str, seed: u64) -> (BattleState, BattleConfig) {
        let config = BattleConfig::default();
        let registry = WeaponRegistry::builtin();
        let mut state = BattleState::new(seed);
        let center = config.arena.center();
        for (side, kind, x) in [
            (Side::Left, left, config.arena.x + config.arena.width * 0.25),
            (Side::Right, right, config.arena.x + config.arena.width * 0.75),
        ] {
            let weapon = registry.create(kind, &mut state.rng, &config).unwrap();
            let id = state.next_ball_id();
            state.balls.push(Ball::new(
                id,
                Vec2::new(x, center.y),
                side,
                weapon,
                &config,
                BallOptions::default(),
            ));
        }
        (state, config)
    }

    #[test]
    fn test_knockout_detected() {
        let (mut state, config) = battle("sword", "sword", 1);
        state.balls[1].body.take_damage(1000.0);
        assert_eq!(
            check_outcome(&mut state, &config),
            Some(Outcome::Knockout { winner: Side::Left })
        );
    }

    #[test]
    fn test_double_knockout_picks_a_winner() {
        let (mut state, config) = battle("sword", "sword", 1);
        state.balls[0].body.take_damage(1000.0);
        state.balls[1].body.take_damage(1000.0);
        let outcome = check_outcome(&mut state, &config).unwrap();
        assert!(matches!(outcome, Outcome::DoubleKnockout { .. }));
    }

    #[test]
    fn test_time_up_prefers_king_hp() {
        let (mut state, config) = battle("sword", "sword", 1);
        state.frame = config.max_frames;
        state.balls[0].body.take_damage(10.0);
        assert_eq!(
            check_outcome(&mut state, &config),
            Some(Outcome::TimeUp {
                winner: Side::Right
            })
        );
    }

    #[test]
    fn test_time_up_then_hits() {
        let (mut state, config) = battle("sword", "sword", 1);
        state.frame = config.max_frames;
        state.balls[0].weapon.core.hit_count = 3;
        assert_eq!(check_outcome(&mut state, &config).map(Outcome::winner), Some(Side::Left));
    }

    #[test]
    fn test_split_creates_clones_and_halves_parents() {
        let (mut state, config) = battle("duplicator", "sword", 3);
        state.spawns.push(SpawnRequest::Split {
            side: Side::Left,
            bonus_hp: 0.0,
        });
        let events = apply_spawns(&mut state, &config);
        assert_eq!(events, vec![BattleEvent::Split { side: Side::Left, clones: 1 }]);
        assert_eq!(state.balls.len(), 3);
        let clone = &state.balls[2];
        assert!(!clone.body.is_original);
        assert_eq!(clone.body.hp, 50.0);
        assert_eq!(clone.body.radius, 22.0);
        assert_eq!(clone.weapon.kind(), "duplicator");
        assert_eq!(state.balls[0].body.hp, 50.0);
    }

    #[test]
    fn test_clone_cap_respected() {
        let (mut state, config) = battle("duplicator", "sword", 3);
        for _ in 0..6 {
            state.spawns.push(SpawnRequest::Split {
                side: Side::Left,
                bonus_hp: 0.0,
            });
            apply_spawns(&mut state, &config);
        }
        assert_eq!(state.alive_count(Side::Left), MAX_BALLS_PER_SIDE);
    }

    #[test]
    fn test_step_is_deterministic() {
        let (mut a, config) = battle("zeus", "ares", 42);
        let (mut b, _) = battle("zeus", "ares", 42);
        let mut ta = Excitement::new();
        let mut tb = Excitement::new();
        for _ in 0..600 {
            let oa = step(&mut a, &config, &mut ta, &mut NoopSink);
            let ob = step(&mut b, &config, &mut tb, &mut NoopSink);
            assert_eq!(oa, ob);
            if oa.is_some() {
                break;
            }
        }
        for (x, y) in a.balls.iter().zip(&b.balls) {
            assert_eq!(x.body, y.body);
        }
        assert_eq!(a.projectiles, b.projectiles);
    }

    #[test]
    fn test_melee_hit_lands() {
        let (mut state, config) = battle("sword", "unarmed", 5);
        // Line the sword up on the right ball
        let target = state.balls[1].body.pos;
        state.balls[0].body.pos = target - Vec2::new(60.0, 0.0);
        state.balls[0].weapon.core.angle = 0.0;
        let mut telemetry = Excitement::new();
        let targets = state.targets();
        let mut sink = NoopSink;
        let mut ctx = BattleCtx::new(
            &config,
            1,
            &mut state.rng,
            &mut state.projectiles,
            &mut state.spawns,
            &targets,
            &mut telemetry,
            &mut sink,
        );
        melee_pass(&mut state.balls, &mut ctx);
        drop(ctx);
        assert_eq!(state.balls[0].weapon.core.hit_count, 1);
        assert_eq!(state.balls[1].body.hp, 97.0);
        assert_eq!(telemetry.total_hits(), 1);
    }

    fn run_pass(state: &mut BattleState, config: &BattleConfig, pass: fn(&mut [Ball], &mut BattleCtx<'_>)) -> Excitement {
        let mut telemetry = Excitement::new();
        let targets = state.targets();
        let mut sink = NoopSink;
        let mut ctx = BattleCtx::new(
            config,
            1,
            &mut state.rng,
            &mut state.projectiles,
            &mut state.spawns,
            &targets,
            &mut telemetry,
            &mut sink,
        );
        pass(&mut state.balls, &mut ctx);
        drop(ctx);
        telemetry
    }

    fn tip_through_left_wall(state: &mut BattleState, config: &BattleConfig) {
        let ball = &mut state.balls[0];
        ball.body.pos = Vec2::new(config.arena.left() + 31.0, config.arena.center().y);
        ball.body.vel = Vec2::ZERO;
        ball.weapon.core.angle = std::f32::consts::PI;
    }

    #[test]
    fn test_weapon_wall_push_skips_ranged() {
        let (mut state, config) = battle("bow", "sword", 3);
        tip_through_left_wall(&mut state, &config);
        assert!(state.balls[0].weapon.core.tip(state.balls[0].body.pos).x < config.arena.left());
        run_pass(&mut state, &config, weapon_wall_pass);
        assert_eq!(state.balls[0].body.vel, Vec2::ZERO);
    }

    #[test]
    fn test_weapon_wall_push_moves_melee() {
        let (mut state, config) = battle("sword", "bow", 3);
        tip_through_left_wall(&mut state, &config);
        run_pass(&mut state, &config, weapon_wall_pass);
        assert!(state.balls[0].body.vel.x > 0.0);
    }

    #[test]
    fn test_two_projectiles_same_target_each_hit_once() {
        let (mut state, config) = battle("bow", "sword", 4);
        let shooter = state.balls[0].id;
        let target = state.balls[1].body.pos;
        for offset in [-1.0, 1.0] {
            state.projectiles.push(
                Projectile::new(
                    shooter,
                    Side::Left,
                    target + Vec2::new(offset * 5.0, 0.0),
                    Vec2::new(-offset * 0.5, 0.0),
                    2.0,
                )
                .lifespan(10),
            );
        }
        let hp_before = state.balls[1].body.hp;
        let telemetry = run_pass(&mut state, &config, projectile_pass);
        assert_eq!(state.balls[1].body.hp, hp_before - 4.0);
        assert_eq!(state.balls[0].weapon.core.hit_count, 2);
        assert_eq!(telemetry.total_hits(), 2);
        assert!(state.projectiles.is_empty());
    }
}
