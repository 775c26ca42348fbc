use serde::{Deserialize, Serialize};

use crate::error::CoreResult;

/// Broad location type. Drives default day-pass tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// The home farm.
    Farm,
    /// Indoor growing space, always in season.
    Greenhouse,
    /// Any other outdoor map.
    #[default]
    Outdoors,
    /// Any other interior.
    Indoors,
}

impl LocationKind {
    /// Chance an unplanted tilled tile reverts overnight.
    pub fn default_dirt_decay_chance(self) -> f64 {
        match self {
            LocationKind::Farm => 0.1,
            LocationKind::Greenhouse => 0.0,
            LocationKind::Outdoors => 0.5,
            LocationKind::Indoors => 1.0,
        }
    }

    /// `true` if seasons do not affect crops or trees here.
    pub fn ignores_seasons(self) -> bool {
        matches!(self, LocationKind::Greenhouse | LocationKind::Indoors)
    }

    /// `true` if weather reaches this location.
    pub fn is_outdoors(self) -> bool {
        matches!(self, LocationKind::Farm | LocationKind::Outdoors)
    }
}

/// Per-location tuning for spawning, decay and growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationRules {
    /// Broad type.
    pub kind: LocationKind,
    /// Forage objects the location may hold at once.
    pub forage_cap: usize,
    /// Random tiles tried per day when spawning forage.
    pub daily_spawn_attempts: u32,
    /// Overrides the kind's default when set.
    pub dirt_decay_chance: Option<f64>,
    /// Chance each grass patch spreads to a neighbour overnight.
    pub grass_spread_chance: f64,
    /// Chance a tree advances one growth stage overnight.
    pub tree_growth_chance: f64,
    /// Chance per frame an ambient critter appears.
    pub critter_spawn_chance: f64,
    /// Ambient critters alive at once.
    pub critter_cap: usize,
}

impl Default for LocationRules {
    fn default() -> Self {
        Self::for_kind(LocationKind::default())
    }
}

impl LocationRules {
    /// Defaults for a location kind.
    pub fn for_kind(kind: LocationKind) -> Self {
        let outdoors = kind.is_outdoors();
        Self {
            kind,
            forage_cap: if outdoors { 6 } else { 0 },
            daily_spawn_attempts: if outdoors { 8 } else { 0 },
            dirt_decay_chance: None,
            grass_spread_chance: if outdoors { 0.65 } else { 0.0 },
            tree_growth_chance: 0.2,
            critter_spawn_chance: if outdoors { 0.002 } else { 0.0 },
            critter_cap: if outdoors { 4 } else { 0 },
        }
    }

    /// Parse from JSON; missing fields take defaults.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Override the overnight dirt decay chance.
    pub fn with_dirt_decay_chance(mut self, chance: f64) -> Self {
        self.dirt_decay_chance = Some(chance);
        self
    }

    /// Set the forage cap and daily spawn attempts.
    pub fn with_forage(mut self, cap: usize, attempts: u32) -> Self {
        self.forage_cap = cap;
        self.daily_spawn_attempts = attempts;
        self
    }

    /// Set the daily grass spread chance.
    pub fn with_grass_spread_chance(mut self, chance: f64) -> Self {
        self.grass_spread_chance = chance;
        self
    }

    /// Set the critter spawn chance and cap.
    pub fn with_critters(mut self, chance: f64, cap: usize) -> Self {
        self.critter_spawn_chance = chance;
        self.critter_cap = cap;
        self
    }

    /// Effective dirt decay chance, clamped to `[0, 1]`.
    pub fn dirt_decay(&self) -> f64 {
        self.dirt_decay_chance
            .unwrap_or_else(|| self.kind.default_dirt_decay_chance())
            .clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_defaults_follow_kind() {
        assert_eq!(LocationRules::for_kind(LocationKind::Farm).dirt_decay(), 0.1);
        assert_eq!(LocationRules::for_kind(LocationKind::Greenhouse).dirt_decay(), 0.0);
        assert_eq!(LocationRules::for_kind(LocationKind::Indoors).dirt_decay(), 1.0);
        let custom = LocationRules::for_kind(LocationKind::Farm).with_dirt_decay_chance(3.0);
        assert_eq!(custom.dirt_decay(), 1.0);
    }

    #[test]
    fn json_fills_missing_fields() {
        let rules = LocationRules::from_json_str(r#"{"kind": "greenhouse", "forage_cap": 2}"#).unwrap();
        assert_eq!(rules.kind, LocationKind::Greenhouse);
        assert_eq!(rules.forage_cap, 2);
        assert_eq!(rules.daily_spawn_attempts, LocationRules::default().daily_spawn_attempts);
    }
}
