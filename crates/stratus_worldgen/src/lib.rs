//! # STRATUS Worldgen
//!
//! Terrain and weather generation: seeded fractal noise, the starting map
//! bootstrap, and two region-parallel cellular automata (land types and
//! clouds) driven by a shared worker pool.
//!
//! Everything here is data in, data out. Same seed, same config, same world.

pub mod automaton;
pub mod cloud;
pub mod config;
pub mod error;
pub mod map;
pub mod noise;
pub mod terrain;

pub use automaton::{AutomatonEngine, CellRule};
pub use cloud::{CloudCell, CloudState, CloudSystem, CloudVisual};
pub use config::{CloudConfig, DecorationKind, DepthBands, GridConfig, WorldConfig};
pub use error::{WorldGenError, WorldGenResult};
pub use map::{Color, HeightCurve, LandType, MapData, RegionTransform, Vec3};
pub use noise::{FractalParams, GradientNoise};
pub use terrain::{place_decorations, TerrainRule, TerrainSimulator};
