//! Excitement scoring
//!
//! Watches a battle frame by frame and rates how entertaining it was. Used to
//! rank batch results. It only ever reads; nothing here feeds back into the
//! simulation.

use serde::{Deserialize, Serialize};

use crate::consts::FRAMES_PER_SECOND;
use crate::round1;
use crate::sim::ball::Body;
use crate::sim::events::BattleEvent;
use crate::sim::state::Side;

/// Fraction of max HP under which a ball is in the critical zone
const CRITICAL_FRACTION: f32 = 0.3;

/// HP snapshot of one king
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vitals {
    pub hp: f32,
    pub max_hp: f32,
}

impl Vitals {
    pub fn new(hp: f32, max_hp: f32) -> Self {
        Self { hp, max_hp }
    }

    pub fn of(body: &Body) -> Self {
        Self::new(body.hp, body.max_hp)
    }

    fn critical(&self) -> bool {
        self.hp < self.max_hp * CRITICAL_FRACTION
    }
}

/// Per-component scores
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub closeness: f32,
    pub lead_changes: f32,
    pub comeback: f32,
    pub critical_zone: f32,
    pub action_density: f32,
    pub duration: f32,
    pub supers: f32,
}

/// Raw battle statistics reported with a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMeta {
    pub frames: u32,
    pub total_hits: u32,
    pub lead_changes: u32,
    pub winner_hp_remaining: i32,
    pub comeback_deficit: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Score {
    pub total: f32,
    pub breakdown: Breakdown,
    pub meta: ScoreMeta,
}

/// Excitement accumulator for one battle
#[derive(Debug, Clone, Default)]
pub struct Excitement {
    frames: u32,
    total_hits: u32,
    supers: u32,
    lead_changes: u32,
    critical_frames: u32,
    last_leader: Option<Side>,
    /// Largest HP deficit each side has faced (left, right)
    max_deficit: [f32; 2],
}

impl Excitement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn total_hits(&self) -> u32 {
        self.total_hits
    }

    pub fn supers(&self) -> u32 {
        self.supers
    }

    pub fn lead_changes(&self) -> u32 {
        self.lead_changes
    }

    /// Feed a battle event
    pub fn observe(&mut self, event: &BattleEvent) {
        match event {
            BattleEvent::Hit { .. } => self.record_hit(),
            BattleEvent::SuperActivated { .. } => self.record_super(),
            _ => {}
        }
    }

    pub fn record_hit(&mut self) {
        self.total_hits += 1;
    }

    pub fn record_super(&mut self) {
        self.supers += 1;
    }

    /// Sample the two kings once per frame
    pub fn record_frame(&mut self, left: Vitals, right: Vitals) {
        self.frames += 1;

        let leader = if left.hp >= right.hp { Side::Left } else { Side::Right };
        if self.last_leader.is_some_and(|last| last != leader) {
            self.lead_changes += 1;
        }
        self.last_leader = Some(leader);

        let left_deficit = right.hp - left.hp;
        let right_deficit = left.hp - right.hp;
        self.max_deficit[0] = self.max_deficit[0].max(left_deficit);
        self.max_deficit[1] = self.max_deficit[1].max(right_deficit);

        if left.critical() && right.critical() {
            self.critical_frames += 1;
        }
    }

    /// Score the battle from the winner's point of view
    pub fn compute_score(&self, winner: Side, left: Vitals, right: Vitals) -> Score {
        let champion = match winner {
            Side::Left => left,
            Side::Right => right,
        };
        let max_hp = champion.max_hp.max(1.0);
        let frames = self.frames.max(1) as f32;

        let closeness = (1.0 - (champion.hp / max_hp).clamp(0.0, 1.0)) * 30.0;
        let lead = (self.lead_changes as f32 * 5.0).min(25.0);
        let deficit = self.max_deficit[winner.index()];
        let comeback = (deficit / max_hp * 40.0).min(20.0);
        let critical = (self.critical_frames as f32 / frames * 50.0).min(15.0);
        let seconds = (self.frames as f32 / FRAMES_PER_SECOND as f32).max(1.0);
        let action = (self.total_hits as f32 / seconds * 3.0).min(10.0);
        let duration = duration_curve(self.frames);
        let supers = (self.supers as f32 * 2.0).min(5.0);

        let total = closeness + lead + comeback + critical + action + duration + supers;

        Score {
            total: round1(total),
            breakdown: Breakdown {
                closeness: round1(closeness),
                lead_changes: lead,
                comeback: round1(comeback),
                critical_zone: round1(critical),
                action_density: round1(action),
                duration: round1(duration),
                supers,
            },
            meta: ScoreMeta {
                frames: self.frames,
                total_hits: self.total_hits,
                lead_changes: self.lead_changes,
                winner_hp_remaining: champion.hp.ceil() as i32,
                comeback_deficit: deficit.round() as i32,
            },
        }
    }
}

/// Sweet spot between 10 and 30 seconds
fn duration_curve(frames: u32) -> f32 {
    let f = frames as f32;
    match frames {
        0..300 => f / 300.0 * 5.0,
        300..600 => 5.0 + (f - 300.0) / 300.0 * 5.0,
        600..=1800 => 10.0,
        1801..=3600 => 10.0 - (f - 1800.0) / 1800.0 * 10.0,
        _ => 0.0,
    }
}
