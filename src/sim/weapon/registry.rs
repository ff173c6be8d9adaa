//! Weapon registry: maps type names to constructors

use std::collections::BTreeMap;

use super::{Weapon, WeaponBehavior};
use crate::error::{Result, SimError};
use crate::settings::BattleConfig;
use crate::sim::rng::SimRng;

/// Builds a fresh behavior for one weapon instance
pub type WeaponCtor = fn() -> Box<dyn WeaponBehavior>;

#[derive(Debug, Clone, Copy)]
struct Entry {
    category: &'static str,
    ctor: WeaponCtor,
}

/// Read-only after construction; safe to share between concurrent battles.
#[derive(Debug, Clone, Default)]
pub struct WeaponRegistry {
    entries: BTreeMap<&'static str, Entry>,
}

impl WeaponRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in catalog
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        super::catalog::register_all(&mut registry);
        registry
    }

    /// Add a weapon type. Re-registering a name replaces it.
    pub fn register(&mut self, kind: &'static str, category: &'static str, ctor: WeaponCtor) {
        if self.entries.insert(kind, Entry { category, ctor }).is_some() {
            log::warn!("Weapon type {} registered twice, keeping the latest", kind);
        }
    }

    /// Instantiate a weapon by type name
    pub fn create(&self, kind: &str, rng: &mut SimRng, config: &BattleConfig) -> Result<Weapon> {
        let entry = self
            .entries
            .get(kind)
            .ok_or_else(|| SimError::UnknownWeapon(kind.to_string()))?;
        Ok(Weapon::new(entry.ctor, rng, config))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.entries.contains_key(kind)
    }

    /// Registered type names, optionally filtered to one category
    pub fn types(&self, category: Option<&str>) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, e)| category.is_none_or(|c| e.category == c))
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn category_of(&self, kind: &str) -> Option<&'static str> {
        self.entries.get(kind).map(|e| e.category)
    }

    pub fn categories(&self) -> Vec<&'static str> {
        let mut categories: Vec<&'static str> = self.entries.values().map(|e| e.category).collect();
        categories.sort_unstable();
        categories.dedup();
        categories
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
