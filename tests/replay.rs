//! Replay contract: a seed and two weapon names reproduce a battle exactly,
//! whether it runs headless, watched through a sink, or frame by frame.

use weapon_balls::sim::{BattleEvent, EventLog, LogSink, SimRng};
use weapon_balls::{BattleConfig, BestOf, CancelToken, Simulator, StagePreset};

#[test]
fn test_replay_token_reproduces_battle() {
    let sim = Simulator::default();
    let original = sim.run_battle("zeus", "ares", 42).unwrap();

    let json = serde_json::to_string(&original).unwrap();
    let token: weapon_balls::BattleResult = serde_json::from_str(&json).unwrap();
    let replayed = sim
        .run_battle(&token.weapon_left, &token.weapon_right, token.seed)
        .unwrap();
    assert_eq!(original, replayed);
}

#[test]
fn test_watched_replay_matches_headless() {
    let sim = Simulator::default();
    for (left, right, seed) in [("sword", "spear", 3), ("artemis", "athena", 77), ("duplicator", "bow", 1234)] {
        let headless = sim.run_battle(left, right, seed).unwrap();
        let logged = sim.run_battle_with(left, right, seed, &mut LogSink).unwrap();
        let mut log = EventLog::new();
        let recorded = sim.run_battle_with(left, right, seed, &mut log).unwrap();
        assert_eq!(headless, logged);
        assert_eq!(headless, recorded);
        let deaths = log.count(|e| matches!(e, BattleEvent::Death { .. }));
        assert!(deaths > 0 || headless.frames == sim.config().max_frames);
    }
}

#[test]
fn test_stepwise_run_matches_headless() {
    let sim = Simulator::default();
    let headless = sim.run_battle("hammer", "scythe", 9).unwrap();

    let mut battle = sim.battle("hammer", "scythe", 9).unwrap();
    let mut log = EventLog::new();
    while battle.step(&mut log).is_none() {}
    assert!(battle.is_over());
    assert_eq!(battle.result().unwrap(), headless);
    assert_eq!(battle.frame(), headless.frames);
}

#[test]
fn test_presets_change_battles_but_stay_deterministic() {
    for preset in StagePreset::all() {
        let sim = Simulator::new(BattleConfig::from_preset(preset));
        let a = sim.run_battle("dagger", "crossbow", 5).unwrap();
        let b = sim.run_battle("dagger", "crossbow", 5).unwrap();
        assert_eq!(a, b, "preset {}", preset.as_str());
    }
}

#[test]
fn test_batch_tokens_replay_individually() {
    let sim = Simulator::default();
    let batch = sim
        .run_batch_parallel("unarmed", "axe", 4, &mut SimRng::seeded(99), &CancelToken::new())
        .unwrap();
    assert_eq!(batch.len(), 4);

    let mut best = BestOf::new();
    for result in &batch {
        best.save(result.clone());
        let again = sim
            .run_battle(&result.weapon_left, &result.weapon_right, result.seed)
            .unwrap();
        assert_eq!(&again, result);
    }
    assert_eq!(best.entries, batch);
}
