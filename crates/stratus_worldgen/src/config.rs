//! # World Configuration
//!
//! Every tunable the generation pipeline reads, deserialized from TOML.
//! Defaults reproduce the reference world: a 150x150 grid in a 3x3 region
//! partition, four height bands, and a sparse initial water seeding.
//!
//! Configs are data only. The seed is deliberately NOT part of the config;
//! callers pass it explicitly so the same tuning file can generate any
//! number of distinct worlds.

use std::path::Path;

use serde::{Deserialize, Serialize};
use stratus_core::GridLayout;

use crate::error::{WorldGenError, WorldGenResult};
use crate::map::{Color, HeightCurve, LandType, RegionTransform};
use crate::noise::FractalParams;

/// Grid shape and partitioning.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cells per side (the grid is square).
    pub size: usize,
    /// Region partition rows.
    pub region_rows: usize,
    /// Region partition columns.
    pub region_cols: usize,
    /// Cell edge length in world units.
    pub cell_size: f32,
}

impl GridConfig {
    /// Builds the validated layout for this config.
    ///
    /// # Errors
    ///
    /// Returns an error if the region partition does not tile the grid.
    pub fn layout(&self) -> WorldGenResult<GridLayout> {
        Ok(GridLayout::new(
            self.size,
            self.size,
            self.region_rows,
            self.region_cols,
            self.cell_size,
        )?)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 150,
            region_rows: 3,
            region_cols: 3,
            cell_size: 1.0,
        }
    }
}

/// Height band upper bounds, ascending. A cell belongs to the first band
/// whose bound its height does not exceed.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthBands {
    /// Deep band favoring snow melt into water.
    pub snow: f32,
    /// Rocky mid-low band.
    pub rock: f32,
    /// Fertile mid-high band.
    pub plants: f32,
    /// Highest band, pooling water.
    pub water: f32,
}

impl Default for DepthBands {
    fn default() -> Self {
        Self {
            snow: 0.3,
            rock: 0.5,
            plants: 0.7,
            water: 1.0,
        }
    }
}

/// Display color per land type.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LandColors {
    /// Snow cells.
    pub snow: Color,
    /// Rock cells.
    pub rock: Color,
    /// Plant cells.
    pub plants: Color,
    /// Water cells.
    pub water: Color,
}

impl LandColors {
    /// Color for a land type.
    #[inline]
    #[must_use]
    pub const fn color_for(&self, land: LandType) -> Color {
        match land {
            LandType::Snow => self.snow,
            LandType::Rock => self.rock,
            LandType::Plants => self.plants,
            LandType::Water => self.water,
        }
    }
}

impl Default for LandColors {
    fn default() -> Self {
        Self {
            snow: Color::new(0.93, 0.95, 0.97),
            rock: Color::new(0.45, 0.41, 0.39),
            plants: Color::new(0.22, 0.55, 0.24),
            water: Color::new(0.15, 0.35, 0.70),
        }
    }
}

/// Kind of decoration placed on terrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecorationKind {
    /// Boulder prop.
    Rock,
    /// Grass tuft.
    Grass,
    /// Tree.
    Tree,
}

/// One ordered decoration condition: the first rule whose threshold exceeds
/// the cell's humidity wins.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DecorationRule {
    /// Humidity upper bound (exclusive) for this rule to fire.
    pub threshold: f32,
    /// What to place when it fires.
    pub kind: DecorationKind,
}

/// Per-land-type decoration rule lists.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationTable {
    /// Rules for snow cells.
    pub snow: Vec<DecorationRule>,
    /// Rules for rock cells.
    pub rock: Vec<DecorationRule>,
    /// Rules for plant cells.
    pub plants: Vec<DecorationRule>,
    /// Rules for water cells.
    pub water: Vec<DecorationRule>,
}

impl DecorationTable {
    /// Ordered rules for a land type.
    #[must_use]
    pub fn rules_for(&self, land: LandType) -> &[DecorationRule] {
        match land {
            LandType::Snow => &self.snow,
            LandType::Rock => &self.rock,
            LandType::Plants => &self.plants,
            LandType::Water => &self.water,
        }
    }
}

impl Default for DecorationTable {
    fn default() -> Self {
        Self {
            snow: vec![DecorationRule {
                threshold: 0.02,
                kind: DecorationKind::Rock,
            }],
            rock: vec![
                DecorationRule {
                    threshold: 0.05,
                    kind: DecorationKind::Rock,
                },
                DecorationRule {
                    threshold: 0.08,
                    kind: DecorationKind::Grass,
                },
            ],
            plants: vec![
                DecorationRule {
                    threshold: 0.06,
                    kind: DecorationKind::Tree,
                },
                DecorationRule {
                    threshold: 0.30,
                    kind: DecorationKind::Grass,
                },
            ],
            water: Vec::new(),
        }
    }
}

/// Terrain simulation tunables.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Height band bounds.
    pub bands: DepthBands,
    /// Land type colors.
    pub colors: LandColors,
    /// Per-cell chance of seeding water into the starting map.
    pub water_seed_chance: f32,
    /// Cap on seeded water cells.
    pub max_water_seeds: u32,
    /// Decoration placement rules.
    pub decorations: DecorationTable,
}

/// Cloud simulation tunables.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// World-space height of the cloud layer.
    pub layer_height: f32,
    /// Chance a saturated cell actually condenses into a cloud.
    pub spawn_chance: f32,
    /// Humidity threshold above which condensation can happen.
    pub wet_level: f32,
    /// Per-cell humidity gain range, sampled once at startup.
    pub gain_min: f32,
    /// Upper bound of the gain range.
    pub gain_max: f32,
    /// Per-cell humidity loss range, sampled once at startup.
    pub loss_min: f32,
    /// Upper bound of the loss range.
    pub loss_max: f32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            layer_height: 35.0,
            spawn_chance: 0.3,
            wet_level: 0.8,
            gain_min: 0.0001,
            gain_max: 0.001,
            loss_min: 0.01,
            loss_max: 0.08,
        }
    }
}

/// Height-to-mesh mapping.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightConfig {
    /// Vertical scale applied after the curve.
    pub multiplier: f32,
    /// Remapping curve flattening or exaggerating bands.
    pub curve: HeightCurve,
}

impl Default for HeightConfig {
    fn default() -> Self {
        Self {
            multiplier: 10.0,
            curve: HeightCurve::linear(),
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            bands: DepthBands::default(),
            colors: LandColors::default(),
            water_seed_chance: 0.0005,
            max_water_seeds: 10,
            decorations: DecorationTable::default(),
        }
    }
}

/// The full generation config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Grid shape.
    pub grid: GridConfig,
    /// Fractal noise parameters for the height field.
    pub noise: FractalParams,
    /// Extra offset added to every octave's sample window.
    pub noise_offset: (f32, f32),
    /// Height-to-mesh mapping.
    pub height: HeightConfig,
    /// Terrain simulation tunables.
    pub terrain: TerrainConfig,
    /// Cloud simulation tunables.
    pub cloud: CloudConfig,
    /// Mesh-to-world transform.
    pub transform: RegionTransform,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            noise: FractalParams::default(),
            noise_offset: (0.0, 0.0),
            height: HeightConfig::default(),
            terrain: TerrainConfig::default(),
            cloud: CloudConfig::default(),
            transform: RegionTransform::default(),
        }
    }
}

impl WorldConfig {
    /// Parses a config from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed TOML, or a validation error for
    /// configs that describe an unusable world.
    pub fn from_toml_str(text: &str) -> WorldGenResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns an error for unreadable files, malformed TOML, or invalid
    /// settings.
    pub fn load(path: impl AsRef<Path>) -> WorldGenResult<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Validates cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`WorldGenError::InvalidConfig`] naming the first violated
    /// constraint.
    pub fn validate(&self) -> WorldGenResult<()> {
        let bands = &self.terrain.bands;
        if !(bands.snow < bands.rock && bands.rock < bands.plants && bands.plants <= bands.water) {
            return Err(WorldGenError::InvalidConfig {
                reason: "depth bands must ascend: snow < rock < plants <= water".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.terrain.water_seed_chance) {
            return Err(WorldGenError::InvalidConfig {
                reason: "water_seed_chance must be in [0, 1]".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.cloud.spawn_chance)
            || !(0.0..=1.0).contains(&self.cloud.wet_level)
        {
            return Err(WorldGenError::InvalidConfig {
                reason: "cloud chances must be in [0, 1]".into(),
            });
        }
        if self.cloud.gain_min >= self.cloud.gain_max {
            return Err(WorldGenError::InvalidConfig {
                reason: "cloud gain range must be non-empty".into(),
            });
        }
        if self.cloud.loss_min >= self.cloud.loss_max {
            return Err(WorldGenError::InvalidConfig {
                reason: "cloud loss range must be non-empty".into(),
            });
        }
        if self.transform.scale <= 0.0 {
            return Err(WorldGenError::InvalidConfig {
                reason: "transform scale must be positive".into(),
            });
        }

        // surfaces partition errors at load time rather than first use
        self.grid.layout()?;
        Ok(())
    }
}
