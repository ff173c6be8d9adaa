//! Arena and physics configuration
//!
//! A battle reads its `BattleConfig` once at setup. Tuning collaborators may
//! replace the config between battles, never during one.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Result, SimError};

/// Stage size presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StagePreset {
    #[default]
    Classic,
    Square,
    Wide,
    Compact,
}

impl StagePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            StagePreset::Classic => "classic",
            StagePreset::Square => "square",
            StagePreset::Wide => "wide",
            StagePreset::Compact => "compact",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" | "portrait" => Some(StagePreset::Classic),
            "square" => Some(StagePreset::Square),
            "wide" | "landscape" => Some(StagePreset::Wide),
            "compact" | "small" => Some(StagePreset::Compact),
            _ => None,
        }
    }

    pub fn all() -> [StagePreset; 4] {
        [
            StagePreset::Classic,
            StagePreset::Square,
            StagePreset::Wide,
            StagePreset::Compact,
        ]
    }

    /// Arena (width, height) for this preset
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            StagePreset::Classic => (ARENA_WIDTH, ARENA_HEIGHT),
            StagePreset::Square => (600.0, 600.0),
            StagePreset::Wide => (780.0, 500.0),
            StagePreset::Compact => (400.0, 560.0),
        }
    }

    /// Max ball speed tuned per stage (small stages play slower)
    pub fn max_speed(&self) -> f32 {
        match self {
            StagePreset::Classic | StagePreset::Square => BALL_MAX_SPEED,
            StagePreset::Wide => 15.0,
            StagePreset::Compact => 11.0,
        }
    }

    /// Ball radius tuned per stage
    pub fn ball_radius(&self) -> f32 {
        match self {
            StagePreset::Compact => 24.0,
            _ => BALL_RADIUS,
        }
    }
}

/// Axis-aligned arena bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            x: ARENA_X,
            y: ARENA_Y,
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
        }
    }
}

impl Arena {
    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether a point lies inside the bounds (inclusive)
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }
}

/// Everything the core reads from its environment at battle setup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    pub preset: StagePreset,
    pub arena: Arena,

    // === Ball physics ===
    pub friction: f32,
    pub max_speed: f32,
    pub min_speed: f32,
    pub gravity_mode: bool,
    pub gravity: f32,
    /// Gravity direction in radians (π/2 = down)
    pub gravity_angle: f32,
    pub wall_restitution: f32,
    pub ball_restitution: f32,
    pub ball_radius: f32,
    pub ball_mass: f32,
    pub ball_max_hp: f32,
    pub launch_speed: f32,

    // === Weapons ===
    pub hit_cooldown: u32,
    pub super_threshold: u32,
    pub supers_enabled: bool,
    pub weapon_wall_bounce: bool,
    pub weapon_wall_bounce_strength: f32,
    /// Scale the tip bounce with the weapon's current damage
    pub weapon_wall_damage_bounce: bool,

    // === Engagement ===
    pub nudge_strength: f32,
    pub nudge_interval: u32,

    /// Safety bound against battles that never end
    pub max_frames: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            preset: StagePreset::Classic,
            arena: Arena::default(),

            friction: BALL_FRICTION,
            max_speed: BALL_MAX_SPEED,
            min_speed: BALL_MIN_SPEED,
            gravity_mode: false,
            gravity: GRAVITY,
            gravity_angle: std::f32::consts::FRAC_PI_2,
            wall_restitution: WALL_RESTITUTION,
            ball_restitution: BALL_RESTITUTION,
            ball_radius: BALL_RADIUS,
            ball_mass: BALL_MASS,
            ball_max_hp: BALL_MAX_HP,
            launch_speed: LAUNCH_SPEED,

            hit_cooldown: WEAPON_HIT_COOLDOWN,
            super_threshold: SUPER_THRESHOLD,
            supers_enabled: true,
            weapon_wall_bounce: true,
            weapon_wall_bounce_strength: WEAPON_WALL_BOUNCE_STRENGTH,
            weapon_wall_damage_bounce: false,

            nudge_strength: NUDGE_STRENGTH,
            nudge_interval: NUDGE_INTERVAL,

            max_frames: MAX_FRAMES,
        }
    }
}

impl BattleConfig {
    /// Create a config from a stage preset (applies preset defaults)
    pub fn from_preset(preset: StagePreset) -> Self {
        let mut config = Self::default();
        config.apply_preset(preset);
        config
    }

    /// Apply a stage preset (updates stage-dependent values)
    pub fn apply_preset(&mut self, preset: StagePreset) {
        let (width, height) = preset.dimensions();
        self.preset = preset;
        self.arena = Arena {
            x: ARENA_X,
            y: ARENA_Y,
            width,
            height,
        };
        self.max_speed = preset.max_speed();
        self.ball_radius = preset.ball_radius();
        log::debug!("Applied stage preset {}: {}x{}", preset.as_str(), width, height);
    }

    /// Gravity acceleration vector per frame (zero when gravity mode is off)
    pub fn gravity_vector(&self) -> Vec2 {
        if self.gravity_mode {
            crate::from_angle(self.gravity_angle, self.gravity)
        } else {
            Vec2::ZERO
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(SimError::InvalidConfig(msg.to_string()));
        if !(self.arena.width > 0.0 && self.arena.height > 0.0) {
            return invalid("arena must have positive width and height");
        }
        if !(self.ball_radius > 0.0) || self.ball_radius * 4.0 > self.arena.width.min(self.arena.height) {
            return invalid("ball radius must be positive and fit the arena");
        }
        if !(self.ball_mass > 0.0) {
            return invalid("ball mass must be positive");
        }
        if !(self.ball_max_hp > 0.0) {
            return invalid("ball max hp must be positive");
        }
        if !(self.max_speed > 0.0) || self.min_speed < 0.0 || self.min_speed >= self.max_speed {
            return invalid("speed limits must satisfy 0 <= min_speed < max_speed");
        }
        if !(0.0..=1.0).contains(&self.friction) {
            return invalid("friction must be within [0, 1]");
        }
        if !(self.wall_restitution > 0.0) {
            return invalid("wall restitution must be positive");
        }
        if self.max_frames == 0 {
            return invalid("frame cap must be non-zero");
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a config file written by `save`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded battle config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Battle config saved to {}", path.as_ref().display());
        Ok(())
    }
}
