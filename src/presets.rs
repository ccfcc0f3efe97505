//! Map presets: named parameter bundles selecting a terrain style.
//!
//! The JSON shape matches the preset files shipped with the map editor
//! (`riverMult`, `biomeThresholds.beachRounded`, ...), so presets can be
//! exchanged with it unchanged.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

pub const NORMAL: &str = "normal";
pub const ISLANDS: &str = "islands";

/// Elevation bands used by the biome classifier. Bands are evaluated in order
/// and the first match wins.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiomeThresholds {
    /// Below this elevation a tile is a lake.
    pub lake: f64,
    /// Elevation (rounded to two decimals) that marks a beach.
    pub beach_rounded: f64,
    pub river_min: f64,
    pub river_max: f64,
    pub grass_min: f64,
    pub grass_max: f64,
    pub forest_min: f64,
    pub forest_max: f64,
    pub mountain_min: f64,
    pub mountain_max: f64,
    pub snow_min: f64,
}

impl Default for BiomeThresholds {
    fn default() -> Self {
        Self {
            lake: 0.31,
            beach_rounded: 0.32,
            river_min: 0.33,
            river_max: 0.35,
            grass_min: 0.35,
            grass_max: 0.50,
            forest_min: 0.50,
            forest_max: 0.60,
            mountain_min: 0.60,
            mountain_max: 0.70,
            snow_min: 0.70,
        }
    }
}

impl BiomeThresholds {
    fn values(&self) -> [f64; 11] {
        [
            self.lake,
            self.beach_rounded,
            self.river_min,
            self.river_max,
            self.grass_min,
            self.grass_max,
            self.forest_min,
            self.forest_max,
            self.mountain_min,
            self.mountain_max,
            self.snow_min,
        ]
    }
}

/// Noise parameters for the elevation and moisture fields.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoiseShape {
    pub elevation_octaves: u32,
    pub elevation_scale: f64,
    /// Weight of the `(1 - distance from centre)` term.
    pub center_weight: f64,
    /// Amplitude of the per-cell hash jitter.
    pub jitter: f64,
    pub moisture_octaves: u32,
    pub moisture_scale: f64,
}

impl NoiseShape {
    pub fn normal() -> Self {
        Self {
            elevation_octaves: 5,
            elevation_scale: 12.0,
            center_weight: 0.5,
            jitter: 0.08,
            moisture_octaves: 4,
            moisture_scale: 18.0,
        }
    }

    /// Larger features and a stronger pull toward the centre.
    pub fn islands() -> Self {
        Self {
            elevation_octaves: 6,
            elevation_scale: 16.0,
            center_weight: 0.75,
            jitter: 0.06,
            moisture_octaves: 3,
            moisture_scale: 20.0,
        }
    }
}

impl Default for NoiseShape {
    fn default() -> Self {
        Self::normal()
    }
}

/// How snow spreads from existing snow cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnowRule {
    /// Spread to cells at or above `snowMin`.
    #[default]
    Threshold,
    /// Peaks above 0.86 become snow first, then spread to cells above 0.72.
    Legacy,
}

fn default_river_mult() -> f64 {
    0.28
}

fn default_lake_mult() -> f64 {
    0.6
}

fn default_forest_mult() -> f64 {
    0.8
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub difficulty: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Higher means more rivers (lower accumulation threshold).
    #[serde(default = "default_river_mult")]
    pub river_mult: f64,
    /// Higher means larger lakes are accepted.
    #[serde(default = "default_lake_mult")]
    pub lake_mult: f64,
    #[serde(default = "default_forest_mult")]
    pub forest_mult: f64,
    /// Skip the stochastic forest passes and keep pure elevation bands.
    #[serde(default)]
    pub force_elevation_biomes: bool,
    /// Apply the radial island falloff to the elevation field.
    #[serde(default)]
    pub island_mode: bool,
    #[serde(default)]
    pub biome_thresholds: BiomeThresholds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise: Option<NoiseShape>,
    #[serde(default)]
    pub snow_rule: SnowRule,
}

impl Preset {
    pub fn normal() -> Self {
        Self {
            id: NORMAL.to_string(),
            title: "Normal".to_string(),
            difficulty: "Easy".to_string(),
            description: "Balanced continents for regular play".to_string(),
            river_mult: 0.28,
            lake_mult: 0.6,
            forest_mult: 0.8,
            force_elevation_biomes: true,
            island_mode: false,
            biome_thresholds: BiomeThresholds::default(),
            noise: Some(NoiseShape::normal()),
            snow_rule: SnowRule::Threshold,
        }
    }

    /// Fewer rivers, smaller lakes and an archipelago falloff.
    pub fn islands() -> Self {
        Self {
            id: ISLANDS.to_string(),
            title: "Islands".to_string(),
            difficulty: "Medium".to_string(),
            description: "Scattered islands for naval play".to_string(),
            river_mult: 0.12,
            lake_mult: 0.45,
            forest_mult: 0.6,
            force_elevation_biomes: false,
            island_mode: true,
            biome_thresholds: BiomeThresholds {
                lake: 0.30,
                grass_min: 0.34,
                ..BiomeThresholds::default()
            },
            noise: Some(NoiseShape::islands()),
            snow_rule: SnowRule::Threshold,
        }
    }

    /// Noise shape for this preset. Presets without an explicit `noise` block
    /// get the islands shape when their id is `islands`, the normal one otherwise.
    pub fn noise_shape(&self) -> NoiseShape {
        match self.noise {
            Some(shape) => shape,
            None if self.id == ISLANDS => NoiseShape::islands(),
            None => NoiseShape::normal(),
        }
    }

    /// Reject presets whose numbers cannot drive generation.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("riverMult", self.river_mult),
            ("lakeMult", self.lake_mult),
            ("forestMult", self.forest_mult),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(MapError::InvalidPreset(format!(
                    "{}: {} must be a non-negative number, got {}",
                    self.id, name, value
                )));
            }
        }
        if self.biome_thresholds.values().iter().any(|v| !v.is_finite()) {
            return Err(MapError::InvalidPreset(format!(
                "{}: biome thresholds must be finite",
                self.id
            )));
        }
        let shape = self.noise_shape();
        if shape.elevation_scale <= 0.0 || shape.moisture_scale <= 0.0 {
            return Err(MapError::InvalidPreset(format!(
                "{}: noise scales must be positive",
                self.id
            )));
        }
        Ok(())
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::normal()
    }
}

/// Registry of presets by id. Always contains the built-in presets.
#[derive(Clone, Debug)]
pub struct PresetRegistry {
    presets: HashMap<String, Preset>,
}

impl PresetRegistry {
    pub fn with_builtins() -> Self {
        let mut presets = HashMap::new();
        for preset in [Preset::normal(), Preset::islands()] {
            presets.insert(preset.id.clone(), preset);
        }
        Self { presets }
    }

    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.presets.get(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.presets.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Register a preset, replacing any preset with the same id.
    pub fn insert(&mut self, preset: Preset) -> Result<()> {
        Self::check(&preset)?;
        self.presets.insert(preset.id.clone(), preset);
        Ok(())
    }

    fn check(preset: &Preset) -> Result<()> {
        if preset.id.is_empty() {
            return Err(MapError::InvalidPreset("preset has no id".to_string()));
        }
        preset.validate()
    }

    /// Import presets from a JSON file; see [`PresetRegistry::import_json`].
    pub fn import_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let json = fs::read_to_string(path)?;
        self.import_json(&json)
    }

    /// Look up a preset by id, falling back to `normal` when the id is missing
    /// or unknown.
    pub fn resolve(&self, id: Option<&str>) -> Preset {
        if let Some(id) = id {
            if let Some(preset) = self.presets.get(id) {
                return preset.clone();
            }
            log::warn!("unknown preset {:?}, falling back to {}", id, NORMAL);
        }
        self.presets
            .get(NORMAL)
            .cloned()
            .unwrap_or_else(Preset::normal)
    }

    /// Import presets from JSON. Accepts either a single preset object with an
    /// `id`, or an object mapping ids to presets. Returns the imported ids.
    pub fn import_json(&mut self, json: &str) -> Result<Vec<String>> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let is_single = value
            .get("id")
            .map(serde_json::Value::is_string)
            .unwrap_or(false);

        let presets: Vec<Preset> = if is_single {
            vec![serde_json::from_value(value)?]
        } else {
            let by_id: HashMap<String, Preset> = serde_json::from_value(value)?;
            let mut entries: Vec<(String, Preset)> = by_id.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            entries
                .into_iter()
                .map(|(key, mut preset)| {
                    if preset.id.is_empty() {
                        preset.id = key;
                    }
                    preset
                })
                .collect()
        };

        // Validate everything first so a bad entry leaves the registry untouched.
        for preset in &presets {
            Self::check(preset)?;
        }
        let mut imported = Vec::with_capacity(presets.len());
        for preset in presets {
            imported.push(preset.id.clone());
            self.presets.insert(preset.id.clone(), preset);
        }
        log::debug!("imported presets {:?}", imported);
        Ok(imported)
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
