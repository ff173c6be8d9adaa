//! Battle runner
//!
//! `Battle` drives one fight frame by frame. `Simulator` wraps it with a
//! weapon registry and config, runs single battles headless or through a
//! sink, and runs seeded batches sequentially or on rayon workers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::Vec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::excitement::{Excitement, Score, Vitals};
use crate::settings::BattleConfig;
use crate::sim::ball::{Ball, BallOptions};
use crate::sim::events::{NoopSink, Sink};
use crate::sim::rng::SimRng;
use crate::sim::state::{BattleState, Side};
use crate::sim::tick::{self, Outcome};
use crate::sim::weapon::WeaponRegistry;

/// Persisted summary of one battle; `(seed, weapon_left, weapon_right)` replays it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleResult {
    pub seed: u64,
    pub weapon_left: String,
    pub weapon_right: String,
    pub winner: Side,
    pub winner_weapon: Option<String>,
    pub winner_hp: i32,
    pub score: Score,
    pub frames: u32,
}

/// Shared cancellation flag for batch runs
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One battle in progress
#[derive(Debug)]
pub struct Battle {
    state: BattleState,
    config: BattleConfig,
    telemetry: Excitement,
    weapons: [String; 2],
    outcome: Option<Outcome>,
}

impl Battle {
    /// Set up a battle. Fails before simulating anything on an unknown weapon
    /// or an invalid config.
    pub fn new(
        registry: &WeaponRegistry,
        config: &BattleConfig,
        left: &str,
        right: &str,
        seed: u64,
    ) -> Result<Self> {
        config.validate()?;
        let mut state = BattleState::new(seed);
        let arena = config.arena;
        let y = arena.center().y;

        for (side, kind, x) in [
            (Side::Left, left, arena.x + arena.width * 0.25),
            (Side::Right, right, arena.x + arena.width * 0.75),
        ] {
            let weapon = registry.create(kind, &mut state.rng, config)?;
            let id = state.next_ball_id();
            state.balls.push(Ball::new(
                id,
                Vec2::new(x, y),
                side,
                weapon,
                config,
                BallOptions::default(),
            ));
        }

        for ball in &mut state.balls {
            let vx = (state.rng.next_f32() - 0.5) * config.launch_speed;
            let vy = (state.rng.next_f32() - 0.5) * config.launch_speed;
            ball.body.vel = Vec2::new(vx, vy);
        }

        log::debug!("Battle {} vs {} set up with seed {}", left, right, seed);
        Ok(Self {
            state,
            config: config.clone(),
            telemetry: Excitement::new(),
            weapons: [left.to_string(), right.to_string()],
            outcome: None,
        })
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &Excitement {
        &self.telemetry
    }

    pub fn frame(&self) -> u32 {
        self.state.frame
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Advance one frame and describe it to `sink`
    pub fn step(&mut self, sink: &mut dyn Sink) -> Option<Outcome> {
        if self.outcome.is_none() {
            self.outcome = tick::step(&mut self.state, &self.config, &mut self.telemetry, sink);
            tick::draw(&self.state, sink);
        }
        self.outcome
    }

    /// Run to completion
    pub fn run(mut self, sink: &mut dyn Sink) -> BattleResult {
        let outcome = loop {
            if let Some(outcome) = self.step(sink) {
                break outcome;
            }
        };
        self.summarize(outcome)
    }

    /// Summary of a finished battle
    pub fn result(&self) -> Option<BattleResult> {
        self.outcome.map(|outcome| self.summarize(outcome))
    }

    fn summarize(&self, outcome: Outcome) -> BattleResult {
        let winner = outcome.winner();
        let vitals = |side| {
            self.state
                .king(side)
                .map_or(Vitals::new(0.0, self.config.ball_max_hp), |k| Vitals::of(&k.body))
        };
        let score = self
            .telemetry
            .compute_score(winner, vitals(Side::Left), vitals(Side::Right));

        BattleResult {
            seed: self.state.seed,
            weapon_left: self.weapons[0].clone(),
            weapon_right: self.weapons[1].clone(),
            winner,
            winner_weapon: Some(self.weapons[winner.index()].clone()),
            winner_hp: self.winner_hp(winner),
            score,
            frames: self.state.frame,
        }
    }

    /// Remaining HP of the winning king, or of the healthiest survivor
    fn winner_hp(&self, winner: Side) -> i32 {
        let balls = &self.state.balls;
        let king = balls
            .iter()
            .find(|b| b.body.side == winner && b.body.is_original && b.body.alive);
        let hp = match king {
            Some(king) => king.body.hp,
            None => balls
                .iter()
                .filter(|b| b.body.side == winner && b.body.alive)
                .map(|b| b.body.hp)
                .fold(0.0, f32::max),
        };
        hp.ceil() as i32
    }
}

/// Headless battle runner
#[derive(Debug, Clone)]
pub struct Simulator {
    registry: WeaponRegistry,
    config: BattleConfig,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(BattleConfig::default())
    }
}

impl Simulator {
    pub fn new(config: BattleConfig) -> Self {
        Self::with_registry(WeaponRegistry::builtin(), config)
    }

    pub fn with_registry(registry: WeaponRegistry, config: BattleConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &WeaponRegistry {
        &self.registry
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Replace the config. Takes effect at the next battle setup.
    pub fn set_config(&mut self, config: BattleConfig) {
        log::debug!("Simulator config replaced (preset {})", config.preset.as_str());
        self.config = config;
    }

    pub fn battle(&self, left: &str, right: &str, seed: u64) -> Result<Battle> {
        Battle::new(&self.registry, &self.config, left, right, seed)
    }

    /// Run one battle with no presentation
    pub fn run_battle(&self, left: &str, right: &str, seed: u64) -> Result<BattleResult> {
        self.run_battle_with(left, right, seed, &mut NoopSink)
    }

    /// Run one battle through `sink`. Same trajectory as `run_battle`.
    pub fn run_battle_with(
        &self,
        left: &str,
        right: &str,
        seed: u64,
        sink: &mut dyn Sink,
    ) -> Result<BattleResult> {
        let result = self.battle(left, right, seed)?.run(sink);
        log::debug!(
            "Seed {}: {} wins after {} frames (score {})",
            seed,
            result.winner.as_str(),
            result.frames,
            result.score.total
        );
        Ok(result)
    }

    /// Reject a batch up front instead of failing every battle
    fn check_batch(&self, left: &str, right: &str) -> Result<()> {
        self.config.validate()?;
        for kind in [left, right] {
            if !self.registry.contains(kind) {
                return Err(SimError::UnknownWeapon(kind.to_string()));
            }
        }
        Ok(())
    }

    /// Draw `count` battle seeds before any battle runs
    pub fn draw_seeds(count: usize, seeds: &mut SimRng) -> Vec<u64> {
        (0..count).map(|_| seeds.generate_seed()).collect()
    }

    /// Run `count` seeded battles in order, best score first
    pub fn run_batch(
        &self,
        left: &str,
        right: &str,
        count: usize,
        seeds: &mut SimRng,
    ) -> Result<Vec<BattleResult>> {
        self.check_batch(left, right)?;
        let seeds = Self::draw_seeds(count, seeds);
        let mut results = seeds
            .iter()
            .map(|&seed| self.run_battle(left, right, seed))
            .collect::<Result<Vec<_>>>()?;
        rank(&mut results);
        log::info!("Batch {} vs {}: {} battles", left, right, results.len());
        Ok(results)
    }

    /// Like `run_batch`, spread over the rayon pool.
    ///
    /// Cancellation is checked before each battle starts; finished battles
    /// are still returned.
    pub fn run_batch_parallel(
        &self,
        left: &str,
        right: &str,
        count: usize,
        seeds: &mut SimRng,
        cancel: &CancelToken,
    ) -> Result<Vec<BattleResult>> {
        self.check_batch(left, right)?;
        let seeds = Self::draw_seeds(count, seeds);
        let mut results = seeds
            .par_iter()
            .filter_map(|&seed| {
                if cancel.is_cancelled() {
                    None
                } else {
                    Some(self.run_battle(left, right, seed))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        rank(&mut results);
        if cancel.is_cancelled() {
            log::info!("Batch {} vs {} cancelled after {} of {} battles", left, right, results.len(), count);
        } else {
            log::info!("Batch {} vs {}: {} battles (parallel)", left, right, results.len());
        }
        Ok(results)
    }
}

/// Best score first; equal scores keep seed order
pub fn rank(results: &mut [BattleResult]) {
    results.sort_by(|a, b| b.score.total.total_cmp(&a.score.total).then(a.seed.cmp(&b.seed)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::{BattleEvent, EventLog};
    use crate::sim::rng::MAX_SEED;
    use proptest::prelude::*;

    #[test]
    fn test_zeus_vs_ares_reproducible() {
        let sim = Simulator::default();
        let a = sim.run_battle("zeus", "ares", 42).unwrap();
        let b = sim.run_battle("zeus", "ares", 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.seed, 42);
        assert_eq!(a.weapon_left, "zeus");
        assert!(a.frames > 0 && a.frames <= crate::consts::MAX_FRAMES);
        let expected = match a.winner {
            Side::Left => "zeus",
            Side::Right => "ares",
        };
        assert_eq!(a.winner_weapon.as_deref(), Some(expected));
    }

    #[test]
    fn test_sink_does_not_change_outcome() {
        let sim = Simulator::default();
        let headless = sim.run_battle("bow", "scythe", 7).unwrap();
        let mut log = EventLog::new();
        let watched = sim.run_battle_with("bow", "scythe", 7, &mut log).unwrap();
        assert_eq!(headless, watched);
        assert!(log.balls_drawn > 0);
        let hits = log.count(|e| matches!(e, BattleEvent::Hit { .. }));
        assert_eq!(hits as u32, watched.score.meta.total_hits);
    }

    #[test]
    fn test_unknown_weapon_fails_before_simulating() {
        let sim = Simulator::default();
        let err = sim.run_battle("sword", "laser", 1).unwrap_err();
        assert!(matches!(err, SimError::UnknownWeapon(ref k) if k == "laser"));
        let err = sim
            .run_batch("laser", "sword", 3, &mut SimRng::seeded(1))
            .unwrap_err();
        assert!(matches!(err, SimError::UnknownWeapon(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let sim = Simulator::new(BattleConfig {
            ball_mass: 0.0,
            ..Default::default()
        });
        assert!(matches!(sim.run_battle("sword", "axe", 1), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_batch_ranked_by_score_then_seed() {
        let sim = Simulator::default();
        let results = sim.run_batch("sword", "dagger", 6, &mut SimRng::seeded(11)).unwrap();
        assert_eq!(results.len(), 6);
        for pair in results.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.score.total > b.score.total || (a.score.total == b.score.total && a.seed < b.seed));
        }
    }

    #[test]
    fn test_parallel_batch_matches_sequential() {
        let sim = Simulator::default();
        let sequential = sim.run_batch("spear", "hammer", 6, &mut SimRng::seeded(5)).unwrap();
        let parallel = sim
            .run_batch_parallel("spear", "hammer", 6, &mut SimRng::seeded(5), &CancelToken::new())
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_cancelled_batch_runs_nothing() {
        let sim = Simulator::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let results = sim
            .run_batch_parallel("sword", "axe", 4, &mut SimRng::seeded(5), &cancel)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_set_config_applies_to_next_battle() {
        let mut sim = Simulator::default();
        let mut config = sim.config().clone();
        config.max_frames = 30;
        config.supers_enabled = false;
        sim.set_config(config);
        let result = sim.run_battle("unarmed", "unarmed", 3).unwrap();
        assert!(result.frames <= 30);
    }

    #[test]
    fn test_result_json_shape() {
        let sim = Simulator::default();
        let result = sim.run_battle("sword", "axe", 9).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        for key in ["seed", "weaponLeft", "weaponRight", "winner", "winnerWeapon", "winnerHp", "score", "frames"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json["winner"] == "left" || json["winner"] == "right");
        let back: BattleResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_duplicator_battle_finishes() {
        let sim = Simulator::default();
        let result = sim.run_battle("duplicator", "sword", 21).unwrap();
        assert!(result.winner_hp >= 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn prop_battles_deterministic_and_decisive(seed in 0..=MAX_SEED, l in 0usize..14, r in 0usize..14) {
            let sim = Simulator::default();
            let kinds = sim.registry().types(None);
            let (left, right) = (kinds[l], kinds[r]);
            let a = sim.run_battle(left, right, seed).unwrap();
            let b = sim.run_battle(left, right, seed).unwrap();
            prop_assert_eq!(&a, &b);
            prop_assert!(a.winner == Side::Left || a.winner == Side::Right);
            prop_assert!(a.frames <= crate::consts::MAX_FRAMES);
            prop_assert!(a.winner_hp >= 0);
        }
    }
}
