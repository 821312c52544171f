//! # Cloud Rule
//!
//! The weather automaton: every cell carries a humidity level with its own
//! gain and loss rates, and cycles through clear, cloud, and rain-cloud
//! states driven by its neighborhood. State transitions that need a visual
//! object emit activation or deactivation requests into a channel; the main
//! loop drains the channel after each pass and services it from a recycled
//! visual pool.
//!
//! ## Determinism Guarantee
//!
//! Cell states and humidity values are fully seed-deterministic. Visual
//! *slot numbers* are not part of that surface: requests from concurrent
//! region jobs interleave in channel order, so the same seed may park a
//! cloud in a different pool slot while every cell still holds the same
//! state.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use stratus_core::{GridLayout, Handle, HandlePool, PassError, Seed, SeededRng, WorkerPool};
use tracing::debug;

use crate::automaton::{AutomatonEngine, CellRule};
use crate::config::CloudConfig;
use crate::map::Vec3;

const PURPOSE_INIT: u64 = 0x434c_4431;
const PURPOSE_PASS: u64 = 0x434c_4432;

/// Weather state of one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloudState {
    /// Clear sky; humidity accumulates.
    NoCloud,
    /// Condensed cloud; may grow into rain or dissipate.
    Cloud,
    /// Raining; humidity drains until the cloud collapses.
    RainCloud,
}

/// One cell of the weather grid.
#[derive(Clone, Copy, Debug)]
pub struct CloudCell {
    /// Current weather state.
    pub state: CloudState,
    /// Accumulated humidity.
    pub humidity: f32,
    /// Per-step humidity gain, fixed at startup.
    pub gain: f32,
    /// Per-step humidity loss, fixed at startup.
    pub loss: f32,
    /// Visual slot backing this cell while it is not clear.
    pub handle: Option<Handle>,
}

/// Visual-object request emitted by the rule.
#[derive(Clone, Copy, Debug)]
pub enum CloudRequest {
    /// A cell condensed and needs a visual.
    Activate {
        /// Flat index of the condensing cell.
        cell: usize,
    },
    /// A cell cleared; its visual goes back to the pool.
    Deactivate {
        /// The released visual slot.
        handle: Handle,
    },
}

/// A pooled cloud visual.
#[derive(Clone, Copy, Debug)]
pub struct CloudVisual {
    /// World-space position at the cloud layer.
    pub position: Vec3,
}

/// Humidity-cycle rule.
pub struct CloudRule {
    config: CloudConfig,
    requests: Sender<CloudRequest>,
}

impl CellRule for CloudRule {
    type Cell = CloudCell;

    fn next_cell(
        &self,
        snapshot: &[CloudCell],
        layout: GridLayout,
        row: usize,
        col: usize,
        rng: &mut SeededRng,
    ) -> CloudCell {
        let index = layout.index(row, col);
        let mut cell = snapshot[index];

        let mut clouds = 0u32;
        let mut rain = 0u32;
        layout.for_each_neighbor(row, col, |i| match snapshot[i].state {
            CloudState::Cloud => clouds += 1,
            CloudState::RainCloud => rain += 1,
            CloudState::NoCloud => {}
        });

        match cell.state {
            CloudState::NoCloud => {
                if clouds == 0 && rain == 0 {
                    cell.humidity += cell.gain;
                } else if clouds > 4 || rain > 4 || clouds + rain > 4 {
                    // crowded skies starve new condensation
                    cell.humidity += cell.gain * 0.2;
                } else {
                    cell.humidity += cell.gain * 0.5;
                }

                if cell.humidity > self.config.wet_level
                    && rng.next_f32() < self.config.spawn_chance
                {
                    cell.state = CloudState::Cloud;
                    let _ = self.requests.send(CloudRequest::Activate { cell: index });
                }
            }
            CloudState::Cloud => {
                if rain > 6 || clouds > 6 || clouds + rain > 6 {
                    cell.humidity = 1.0;
                } else if rain > 3 {
                    cell.humidity += cell.gain * 4.0;
                } else if rain > 1 {
                    cell.humidity += cell.gain * 2.0;
                } else if clouds + rain < 1 {
                    cell.humidity -= cell.loss * 0.2;
                } else if clouds < 4 {
                    cell.humidity += cell.gain;
                }

                if cell.humidity >= 1.0 {
                    cell.state = CloudState::RainCloud;
                } else if cell.humidity < 0.2 {
                    cell.state = CloudState::NoCloud;
                    if let Some(handle) = cell.handle.take() {
                        let _ = self.requests.send(CloudRequest::Deactivate { handle });
                    }
                }
            }
            CloudState::RainCloud => {
                if rain == 8 {
                    cell.humidity -= cell.loss * 10.0;
                }
                if rain > 5 {
                    cell.humidity -= cell.loss * 7.0;
                } else if rain > 3 {
                    cell.humidity -= cell.loss * 2.0;
                } else if rain > 0 {
                    cell.humidity -= cell.loss;
                }

                if cell.humidity <= 0.2 {
                    cell.state = CloudState::NoCloud;
                    if let Some(handle) = cell.handle.take() {
                        let _ = self.requests.send(CloudRequest::Deactivate { handle });
                    }
                }
            }
        }

        cell
    }
}

/// The weather simulation: automaton, request channel, and visual pool.
pub struct CloudSystem {
    engine: AutomatonEngine<CloudRule>,
    requests: Receiver<CloudRequest>,
    visuals: HandlePool<CloudVisual>,
    layer_height: f32,
}

impl CloudSystem {
    /// Creates the system with seeded per-cell humidity and rates.
    ///
    /// Cells starting wet enough may condense immediately; their visuals are
    /// allocated before the call returns.
    #[must_use]
    pub fn new(layout: GridLayout, config: CloudConfig, pool: Arc<WorkerPool>, seed: Seed) -> Self {
        let (request_tx, request_rx) = unbounded();

        let mut rng = SeededRng::from_seed(seed.derive(PURPOSE_INIT));
        let cells: Vec<CloudCell> = (0..layout.len())
            .map(|_| {
                let humidity = rng.next_f32();
                let gain = rng.range_f32(config.gain_min, config.gain_max);
                let loss = rng.range_f32(config.loss_min, config.loss_max);
                let state = if humidity >= config.wet_level
                    && rng.next_f32() < config.spawn_chance
                {
                    CloudState::Cloud
                } else {
                    CloudState::NoCloud
                };
                CloudCell {
                    state,
                    humidity,
                    gain,
                    loss,
                    handle: None,
                }
            })
            .collect();

        for (index, cell) in cells.iter().enumerate() {
            if cell.state == CloudState::Cloud {
                let _ = request_tx.send(CloudRequest::Activate { cell: index });
            }
        }

        let rule = CloudRule {
            config,
            requests: request_tx,
        };
        let engine = AutomatonEngine::new(
            Arc::new(rule),
            pool,
            layout,
            seed.derive(PURPOSE_PASS),
            cells,
        );

        let mut system = Self {
            engine,
            requests: request_rx,
            visuals: HandlePool::new(),
            layer_height: config.layer_height,
        };
        system.drain_requests();
        debug!(
            initial_clouds = system.visuals.live_count(),
            "cloud system initialized"
        );
        system
    }

    /// The weather grid.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[CloudCell] {
        self.engine.state()
    }

    /// The visual pool, live and parked slots included.
    #[inline]
    #[must_use]
    pub fn visuals(&self) -> &HandlePool<CloudVisual> {
        &self.visuals
    }

    /// Number of cells currently backed by a visual.
    #[inline]
    #[must_use]
    pub fn active_clouds(&self) -> usize {
        self.visuals.live_count()
    }

    /// Runs one weather pass and services the resulting visual requests.
    ///
    /// # Errors
    ///
    /// Propagates pass failures. Requests queued by the failed pass are
    /// discarded along with its outputs.
    pub fn step(&mut self) -> Result<(), PassError> {
        if let Err(error) = self.engine.step() {
            while self.requests.try_recv().is_ok() {}
            return Err(error);
        }
        self.drain_requests();
        Ok(())
    }

    fn drain_requests(&mut self) {
        while let Ok(request) = self.requests.try_recv() {
            match request {
                CloudRequest::Activate { cell } => {
                    let layout = self.engine.layout();
                    let coord = layout.coordinate(cell);
                    let (x, z) = layout.world_center(coord.row, coord.col);
                    let position = Vec3::new(x, self.layer_height, z);

                    let handle = self.visuals.acquire_with(|| CloudVisual { position });
                    if let Some(visual) = self.visuals.get_mut(handle) {
                        // recycled slots keep their old position
                        visual.position = position;
                    }
                    self.engine.state_mut()[cell].handle = Some(handle);
                }
                CloudRequest::Deactivate { handle } => {
                    self.visuals.release(handle);
                }
            }
        }
    }
}
