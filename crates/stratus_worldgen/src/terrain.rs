//! # Terrain Rule
//!
//! The land-type automaton: each cell scores the four land types from its
//! neighborhood, shapes the scores by its height band, and draws its next
//! type by roulette selection over the positive scores. A zero score total
//! leaves the cell unchanged, which is what eventually freezes the map into
//! a stable landscape.

use std::sync::Arc;

use stratus_core::{GridLayout, PassError, Seed, SeededRng, WorkerPool};
use tracing::debug;

use crate::automaton::{AutomatonEngine, CellRule};
use crate::config::{DecorationKind, DecorationTable, DepthBands, WorldConfig};
use crate::map::{LandType, MapData};
use crate::noise::uniform_noise_map;

const PURPOSE_HUMIDITY: u64 = 0x5445_5231;

/// Neighborhood scoring rule for land types.
pub struct TerrainRule {
    bands: DepthBands,
    heights: Arc<Vec<f32>>,
}

impl TerrainRule {
    /// Creates the rule over a fixed height field.
    #[must_use]
    pub fn new(bands: DepthBands, heights: Arc<Vec<f32>>) -> Self {
        Self { bands, heights }
    }

    /// Scores the four land types for one cell, indexed by `LandType`.
    fn score(
        &self,
        snapshot: &[LandType],
        layout: GridLayout,
        row: usize,
        col: usize,
    ) -> [f32; 4] {
        let current = snapshot[layout.index(row, col)];

        let mut counts = [0u32; 4];
        layout.for_each_neighbor(row, col, |index| {
            counts[snapshot[index] as usize] += 1;
        });
        let (n_snow, n_rock, n_plants, n_water) = (
            counts[LandType::Snow as usize],
            counts[LandType::Rock as usize],
            counts[LandType::Plants as usize],
            counts[LandType::Water as usize],
        );

        #[allow(clippy::cast_precision_loss)]
        let (mut snow, mut rock, mut plants, mut water) = (
            n_snow as f32,
            n_rock as f32,
            n_plants as f32,
            n_water as f32,
        );

        // neighborhood pressure on top of the raw counts
        match current {
            LandType::Rock => {
                if n_plants > 2 {
                    snow += 2.0;
                } else if n_snow > 0 {
                    water += 1.0;
                }
            }
            LandType::Plants => {
                if (4..=5).contains(&n_plants) && (n_water > 0 || n_snow > 0) {
                    plants += 1.0;
                } else {
                    snow += 1.0;
                }
            }
            LandType::Water => {
                if n_rock == 8 {
                    water += 1.0;
                }
                if n_rock > 3 {
                    plants += 2.0;
                }
            }
            LandType::Snow => {}
        }

        // height band shaping
        let height = self.heights[layout.index(row, col)];
        if height <= self.bands.snow {
            water = 0.0;
            plants *= 0.1;
            rock *= 0.5;
            snow *= 2.0;
        } else if height <= self.bands.rock {
            water = 0.0;
            rock *= 2.0;
            plants *= 0.4;
            snow *= 0.2;
        } else if height <= self.bands.plants {
            snow = 0.0;
            water *= 0.3;
            plants *= 1.5;
            rock *= 0.1;
        } else if height <= self.bands.water {
            snow = 0.0;
            rock = 0.0;
            plants *= 0.2;
            water *= 2.0;
        }

        [snow, rock, plants, water]
    }
}

/// Roulette selection over the positive weights. The cell keeps `current`
/// when the roll reaches the end without landing; a roll exactly on a
/// cumulative bound falls to the next candidate.
fn select_land(weights: [f32; 4], mut roll: f32, current: LandType) -> LandType {
    let candidates = [
        (weights[LandType::Snow as usize], LandType::Snow),
        (weights[LandType::Rock as usize], LandType::Rock),
        (weights[LandType::Plants as usize], LandType::Plants),
        (weights[LandType::Water as usize], LandType::Water),
    ];
    for (weight, land) in candidates {
        if weight <= 0.0 {
            continue;
        }
        roll -= weight;
        if roll < 0.0 {
            return land;
        }
    }
    current
}

impl CellRule for TerrainRule {
    type Cell = LandType;

    fn next_cell(
        &self,
        snapshot: &[LandType],
        layout: GridLayout,
        row: usize,
        col: usize,
        rng: &mut SeededRng,
    ) -> LandType {
        let current = snapshot[layout.index(row, col)];
        let weights = self.score(snapshot, layout, row, col);

        let total: f32 = weights.iter().sum();
        if total <= 0.0 {
            return current;
        }

        select_land(weights, rng.range_f32(0.0, total), current)
    }
}

/// Drives the terrain automaton and keeps a [`MapData`] in sync with it.
pub struct TerrainSimulator {
    engine: AutomatonEngine<TerrainRule>,
}

impl TerrainSimulator {
    /// Creates a simulator seeded from the map's current land state.
    #[must_use]
    pub fn new(map: &MapData, config: &WorldConfig, pool: Arc<WorkerPool>, seed: Seed) -> Self {
        let rule = TerrainRule::new(config.terrain.bands, Arc::new(map.heights().to_vec()));
        let engine = AutomatonEngine::new(
            Arc::new(rule),
            pool,
            map.layout(),
            seed,
            map.land().to_vec(),
        );
        Self { engine }
    }

    /// Number of completed passes.
    #[inline]
    #[must_use]
    pub const fn pass_count(&self) -> u64 {
        self.engine.pass_count()
    }

    /// The current land map.
    #[inline]
    #[must_use]
    pub fn land(&self) -> &[LandType] {
        self.engine.state()
    }

    /// Runs one pass and writes the result (land and colors) back into the
    /// map.
    ///
    /// # Errors
    ///
    /// Propagates pass failures; the map keeps its previous state.
    pub fn step(&mut self, map: &mut MapData, config: &WorldConfig) -> Result<(), PassError> {
        self.engine.step()?;
        map.set_land(self.engine.state().to_vec());
        map.refresh_colors(config);
        debug!(pass = self.engine.pass_count(), "terrain pass applied");
        Ok(())
    }
}

/// Chooses a decoration for every cell.
///
/// A seeded humidity channel is drawn over the grid; each cell walks its
/// land type's ordered rules and places the first decoration whose humidity
/// threshold the cell falls under. Most cells match no rule and stay bare.
#[must_use]
pub fn place_decorations(
    map: &MapData,
    table: &DecorationTable,
    seed: Seed,
) -> Vec<Option<DecorationKind>> {
    let layout = map.layout();
    let humidity = uniform_noise_map(layout.cols(), layout.rows(), seed.derive(PURPOSE_HUMIDITY));

    map.land()
        .iter()
        .zip(&humidity)
        .map(|(land, humidity)| {
            table
                .rules_for(*land)
                .iter()
                .find(|rule| *humidity < rule.threshold)
                .map(|rule| rule.kind)
        })
        .collect()
}
