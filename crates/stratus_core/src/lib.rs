//! # STRATUS Core
//!
//! Deterministic foundations shared by every generation subsystem.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: every random stream derives from one [`Seed`]
//! 2. **Partitioned**: concurrent work is bounded by static grid regions
//! 3. **Recyclable**: pooled handles are reused, never reallocated
//! 4. **Barriered**: no pass output is visible until every worker finished
//!
//! ## Core Components
//!
//! - [`Seed`] / [`SeededRng`]: reseedable deterministic randomness
//! - [`GridLayout`]: pure coordinate/index/region/world-position mapping
//! - [`HandlePool`]: grow-only pool of recyclable object slots
//! - [`WorkerPool`]: long-lived workers with whole-pass failure semantics

pub mod error;
pub mod grid;
pub mod pool;
pub mod seed;
pub mod worker;

pub use error::{CoreError, CoreResult};
pub use grid::{Coordinate, GridLayout};
pub use pool::{Handle, HandlePool};
pub use seed::{Seed, SeededRng};
pub use worker::{PassError, WorkerPool};
