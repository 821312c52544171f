//! # STRATUS Content
//!
//! Gameplay content generation on top of the worldgen data: stochastic
//! spawning grammars, L-system mission sequencing, the bounded mission
//! board, and formation-to-world object placement.
//!
//! Producers run on their own threads and hand results to the main loop
//! through channels; nothing here mutates the world.

pub mod error;
pub mod grammar;
pub mod lsystem;
pub mod mission;
pub mod spawner;

pub use error::{ContentError, ContentResult};
pub use grammar::{
    describe_symbol, Production, RewardItems, StochasticGrammar, FORMATION_START,
};
pub use lsystem::{
    default_rules, default_templates, MissionGenerator, MissionInfo, MissionLevel, MissionType,
    TargetType,
};
pub use mission::{
    BattleMission, Mission, MissionDirector, ReconnaissanceMission, MAX_ACTIVE_MISSIONS,
};
pub use spawner::{
    sample_dry_cell, SpawnKind, SpawnRequest, SpawnWave, WaveSpawner, MAX_PLACEMENT_ATTEMPTS,
};
