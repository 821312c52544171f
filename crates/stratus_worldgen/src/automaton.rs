//! # Automaton Engine
//!
//! Region-parallel cellular automaton stepping. The engine owns the grid
//! state; each pass hands every region to the worker pool as one job, and
//! every job reads the *previous* generation through a shared snapshot while
//! producing its region's next cells into an owned buffer. Writes land only
//! after the pass barrier, so no rule ever observes a half-updated grid.
//!
//! ## Determinism Guarantee
//!
//! Each region job gets its own random stream, derived from the engine seed
//! by pass number and region index. Streams never depend on which worker
//! thread ran the job or in what order, so a seed reproduces the same world
//! on any pool size.
//!
//! ## Failure semantics
//!
//! A panicking rule fails the whole pass: the engine keeps the previous
//! state untouched and surfaces [`PassError::RegionFailed`]. The pass
//! counter does not advance, so a retry replays the identical streams.

use std::sync::Arc;

use stratus_core::{GridLayout, PassError, Seed, SeededRng, WorkerPool};

/// A local update rule for one automaton.
///
/// `next_cell` must depend only on the snapshot, the cell position, and the
/// provided random stream. Rules are shared across worker threads.
pub trait CellRule: Send + Sync + 'static {
    /// Per-cell state.
    type Cell: Clone + Send + Sync + 'static;

    /// Computes a cell's next state from the previous generation.
    fn next_cell(
        &self,
        snapshot: &[Self::Cell],
        layout: GridLayout,
        row: usize,
        col: usize,
        rng: &mut SeededRng,
    ) -> Self::Cell;
}

/// A stepping automaton over one grid.
pub struct AutomatonEngine<R: CellRule> {
    rule: Arc<R>,
    pool: Arc<WorkerPool>,
    layout: GridLayout,
    seed: Seed,
    pass: u64,
    state: Vec<R::Cell>,
}

impl<R: CellRule> AutomatonEngine<R> {
    /// Creates an engine over an initial state.
    ///
    /// # Panics
    ///
    /// Panics if `state` does not match the layout's cell count.
    #[must_use]
    pub fn new(
        rule: Arc<R>,
        pool: Arc<WorkerPool>,
        layout: GridLayout,
        seed: Seed,
        state: Vec<R::Cell>,
    ) -> Self {
        assert_eq!(state.len(), layout.len(), "state size mismatch");
        Self {
            rule,
            pool,
            layout,
            seed,
            pass: 0,
            state,
        }
    }

    /// The grid layout.
    #[inline]
    #[must_use]
    pub const fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Number of completed passes.
    #[inline]
    #[must_use]
    pub const fn pass_count(&self) -> u64 {
        self.pass
    }

    /// The current generation.
    #[inline]
    #[must_use]
    pub fn state(&self) -> &[R::Cell] {
        &self.state
    }

    /// Mutable access to the current generation, for out-of-band updates
    /// between passes (e.g. stamping handles onto cells).
    #[inline]
    pub fn state_mut(&mut self) -> &mut [R::Cell] {
        &mut self.state
    }

    /// Runs one pass over every region.
    ///
    /// # Errors
    ///
    /// Propagates pass failures from the pool; the state is unchanged on
    /// error.
    pub fn step(&mut self) -> Result<(), PassError> {
        let snapshot: Arc<Vec<R::Cell>> = Arc::new(self.state.clone());
        let pass_seed = self.seed.derive(self.pass);

        let jobs: Vec<_> = (0..self.layout.region_count())
            .map(|region| {
                let snapshot = Arc::clone(&snapshot);
                let rule = Arc::clone(&self.rule);
                let layout = self.layout;
                let region_seed = pass_seed.derive(region as u64);

                move || {
                    let mut rng = SeededRng::from_seed(region_seed);
                    let (rows, cols) = layout.region_bounds(region);
                    let mut cells = Vec::with_capacity(rows.len() * cols.len());
                    for row in rows {
                        for col in cols.clone() {
                            cells.push(rule.next_cell(&snapshot, layout, row, col, &mut rng));
                        }
                    }
                    cells
                }
            })
            .collect();

        let outputs = self.pool.run_pass(jobs)?;

        for (region, cells) in outputs.into_iter().enumerate() {
            let (rows, cols) = self.layout.region_bounds(region);
            let mut next = cells.into_iter();
            for row in rows {
                for col in cols.clone() {
                    self.state[self.layout.index(row, col)] =
                        next.next().expect("region buffer covers its bounds");
                }
            }
        }

        self.pass += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Copies the previous generation's left neighbor, shifting values one
    /// column to the right each pass. Distinguishes snapshot reads from
    /// in-place reads.
    struct ShiftRight;

    impl CellRule for ShiftRight {
        type Cell = u32;

        fn next_cell(
            &self,
            snapshot: &[u32],
            layout: GridLayout,
            row: usize,
            col: usize,
            _rng: &mut SeededRng,
        ) -> u32 {
            if col == 0 {
                0
            } else {
                snapshot[layout.index(row, col - 1)]
            }
        }
    }

    /// Adds one random value per cell, exercising the per-region streams.
    struct Jitter;

    impl CellRule for Jitter {
        type Cell = u32;

        fn next_cell(
            &self,
            snapshot: &[u32],
            layout: GridLayout,
            row: usize,
            col: usize,
            rng: &mut SeededRng,
        ) -> u32 {
            snapshot[layout.index(row, col)] + rng.range_i32(0, 100) as u32
        }
    }

    fn layout() -> GridLayout {
        GridLayout::new(12, 12, 3, 3, 1.0).unwrap()
    }

    #[test]
    fn test_rules_read_the_snapshot_not_the_working_state() {
        let layout = layout();
        let mut initial = vec![0u32; layout.len()];
        initial[layout.index(5, 0)] = 7;

        let pool = Arc::new(WorkerPool::new(4));
        let mut engine =
            AutomatonEngine::new(Arc::new(ShiftRight), pool, layout, Seed::new(1), initial);

        for _ in 0..3 {
            engine.step().unwrap();
        }

        // after 3 passes the value moved exactly 3 columns, no smearing
        for col in 0..12 {
            let expected = u32::from(col == 3);
            assert_eq!(engine.state()[layout.index(5, col)], expected * 7);
        }
    }

    #[test]
    fn test_thread_count_does_not_change_the_result() {
        let layout = layout();
        let initial = vec![1u32; layout.len()];

        let run = |threads: usize| {
            let pool = Arc::new(WorkerPool::new(threads));
            let mut engine = AutomatonEngine::new(
                Arc::new(Jitter),
                pool,
                layout,
                Seed::new(42),
                initial.clone(),
            );
            for _ in 0..5 {
                engine.step().unwrap();
            }
            engine.state().to_vec()
        };

        assert_eq!(run(1), run(4));
        assert_eq!(run(4), run(9));
    }

    #[test]
    fn test_failed_pass_keeps_previous_state() {
        struct Explode;
        impl CellRule for Explode {
            type Cell = u32;
            fn next_cell(
                &self,
                _snapshot: &[u32],
                _layout: GridLayout,
                row: usize,
                col: usize,
                _rng: &mut SeededRng,
            ) -> u32 {
                assert!(!(row == 4 && col == 4), "boom");
                99
            }
        }

        let layout = layout();
        let initial = vec![5u32; layout.len()];
        let pool = Arc::new(WorkerPool::new(2));
        let mut engine =
            AutomatonEngine::new(Arc::new(Explode), pool, layout, Seed::new(3), initial.clone());

        let err = engine.step().unwrap_err();
        assert!(matches!(err, PassError::RegionFailed { .. }));
        assert_eq!(engine.state(), initial.as_slice());
        assert_eq!(engine.pass_count(), 0);
    }
}
