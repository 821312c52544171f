//! # Wave Spawner
//!
//! Turns the current formation string into world-space spawn requests. The
//! placement work runs on its own producer thread and streams requests
//! through a single-producer single-consumer channel; the main loop drains
//! a few per frame and treats the wave as done only when the producer has
//! exited AND the queue is empty.
//!
//! Placement rejection-samples grid cells until it finds dry land, with a
//! hard attempt bound so a flooded map degrades to a logged skip instead of
//! a spin.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver};
use stratus_core::{Coordinate, Seed, SeededRng};
use stratus_worldgen::{LandType, MapData, Vec3, WorldConfig};
use tracing::{debug, warn};

use crate::error::ContentResult;
use crate::grammar::{StochasticGrammar, FORMATION_START};

/// Rejection-sampling bound before a placement gives up.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 10_000;

/// Extra height so objects drop onto the surface instead of clipping it.
const SPAWN_DROP_HEIGHT: f32 = 1.5;

const PURPOSE_FORMATION: u64 = 0x5350_4e31;
const PURPOSE_PLACEMENT: u64 = 0x5350_4e32;

/// What a formation symbol spawns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnKind {
    /// Regular enemy.
    Enemy,
    /// Enemy-summoning circle.
    SummoningCircle,
    /// Item chest.
    ItemChest,
}

impl SpawnKind {
    /// Maps a formation symbol to its spawn kind. Silent symbols and
    /// intermediate grammar symbols map to nothing.
    #[must_use]
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'E' => Some(Self::Enemy),
            'C' => Some(Self::SummoningCircle),
            'I' => Some(Self::ItemChest),
            _ => None,
        }
    }
}

/// One object to place in the world.
#[derive(Clone, Copy, Debug)]
pub struct SpawnRequest {
    /// What to spawn.
    pub kind: SpawnKind,
    /// Where, in world space.
    pub position: Vec3,
}

/// Draws random cells until one is dry, bounded by
/// [`MAX_PLACEMENT_ATTEMPTS`].
#[must_use]
pub fn sample_dry_cell(map: &MapData, rng: &mut SeededRng) -> Option<Coordinate> {
    let layout = map.layout();
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let col = rng.range_usize(0, layout.cols() - 1);
        let row = rng.range_usize(0, layout.rows() - 1);
        if map.land_at(row, col) != LandType::Water {
            return Some(Coordinate::new(row, col));
        }
    }
    None
}

/// Owns the formation string and dispatches placement waves.
pub struct WaveSpawner {
    grammar: StochasticGrammar,
    formation: String,
    rng: SeededRng,
    seed: Seed,
    wave: u64,
}

impl WaveSpawner {
    /// Creates a spawner using the reference formation grammar.
    #[must_use]
    pub fn new(seed: Seed) -> Self {
        Self::with_grammar(seed, StochasticGrammar::formation())
    }

    /// Creates a spawner over a custom formation grammar.
    #[must_use]
    pub fn with_grammar(seed: Seed, grammar: StochasticGrammar) -> Self {
        Self {
            grammar,
            formation: String::new(),
            rng: SeededRng::from_seed(seed.derive(PURPOSE_FORMATION)),
            seed,
            wave: 0,
        }
    }

    /// The current formation string.
    #[inline]
    #[must_use]
    pub fn formation(&self) -> &str {
        &self.formation
    }

    /// Number of waves advanced so far.
    #[inline]
    #[must_use]
    pub const fn wave(&self) -> u64 {
        self.wave
    }

    /// Advances the formation one generation: the first call expands the
    /// start symbol, later calls rewrite the previous formation.
    ///
    /// # Errors
    ///
    /// Propagates grammar expansion failures.
    pub fn next_wave(&mut self) -> ContentResult<&str> {
        self.formation = if self.formation.is_empty() {
            self.grammar.expand(FORMATION_START, &mut self.rng)?
        } else {
            self.grammar.step(&self.formation, &mut self.rng)?
        };
        self.wave += 1;
        debug!(wave = self.wave, formation = %self.formation, "formation advanced");
        Ok(&self.formation)
    }

    /// Dispatches placement of the current formation onto a producer
    /// thread.
    ///
    /// The map snapshot is shared read-only; placement draws from a stream
    /// derived per wave, so replaying a wave reproduces its positions.
    #[must_use]
    pub fn dispatch(&self, map: Arc<MapData>, config: &WorldConfig) -> SpawnWave {
        let formation = self.formation.clone();
        let config = config.clone();
        let placement_seed = self.seed.derive(PURPOSE_PLACEMENT).derive(self.wave);
        let (request_tx, request_rx) = unbounded();

        let worker = std::thread::Builder::new()
            .name("stratus-spawner".into())
            .spawn(move || {
                let mut rng = SeededRng::from_seed(placement_seed);
                for symbol in formation.chars() {
                    let Some(kind) = SpawnKind::from_symbol(symbol) else {
                        continue;
                    };
                    let Some(coord) = sample_dry_cell(&map, &mut rng) else {
                        warn!(%symbol, "no dry cell found; spawn skipped");
                        continue;
                    };

                    let mut position = map.surface_position(&config, coord.row, coord.col);
                    position.y += SPAWN_DROP_HEIGHT;
                    if request_tx.send(SpawnRequest { kind, position }).is_err() {
                        return;
                    }
                }
            })
            .expect("spawn placement thread");

        SpawnWave {
            requests: request_rx,
            worker: Some(worker),
        }
    }
}

/// An in-flight placement wave: the consumer half of the spawn queue.
pub struct SpawnWave {
    requests: Receiver<SpawnRequest>,
    worker: Option<JoinHandle<()>>,
}

impl SpawnWave {
    /// Takes the next request if one is ready.
    #[must_use]
    pub fn try_next(&mut self) -> Option<SpawnRequest> {
        self.requests.try_recv().ok()
    }

    /// Whether the producer has exited and every request was drained.
    /// An empty queue alone does not complete a wave; the producer may
    /// still be placing.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let finished = self.worker.as_ref().map_or(true, JoinHandle::is_finished);
        finished && self.requests.is_empty()
    }

    /// Blocks until the producer exits, then drains every pending request.
    #[must_use]
    pub fn wait(mut self) -> Vec<SpawnRequest> {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.requests.try_iter().collect()
    }
}
