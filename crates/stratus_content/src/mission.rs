//! # Mission Director
//!
//! The consumer side of the mission pipeline. A producer thread generates
//! mission outlines through the L-system and parks them in a channel; the
//! director drains outlines on the main loop, but only once the producer
//! has finished, and keeps at most [`MAX_ACTIVE_MISSIONS`] materialized at
//! a time. Materialization rolls the concrete numbers: target counts, item
//! quantities parsed from the reward grammar, time limits for minor
//! missions, and a dry-land target location for reconnaissance.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver};
use stratus_core::{Seed, SeededRng};
use stratus_worldgen::{MapData, WorldConfig};
use tracing::{debug, warn};

use crate::error::ContentResult;
use crate::grammar::{RewardItems, StochasticGrammar};
use crate::lsystem::{MissionGenerator, MissionInfo, MissionLevel, MissionType, TargetType};
use crate::spawner::sample_dry_cell;

/// Cap on simultaneously active missions.
pub const MAX_ACTIVE_MISSIONS: usize = 3;

const PURPOSE_OUTLINE: u64 = 0x4d53_4e31;
const PURPOSE_MATERIALIZE: u64 = 0x4d53_4e32;

/// A materialized battle mission.
#[derive(Clone, Debug)]
pub struct BattleMission {
    /// Briefing text.
    pub description: String,
    /// What counts toward completion.
    pub target: TargetType,
    /// Kills remaining.
    pub remaining: u32,
    /// Item quantities from the reward grammar.
    pub reward: RewardItems,
    /// Deadline, absent for major missions.
    pub time_limit: Option<Duration>,
}

impl BattleMission {
    /// Records a destroyed object; returns whether the mission is done.
    pub fn notify_target_down(&mut self, target: TargetType) -> bool {
        if target == self.target && self.remaining > 0 {
            self.remaining -= 1;
        }
        self.remaining == 0
    }
}

/// A materialized reconnaissance mission.
#[derive(Clone, Debug)]
pub struct ReconnaissanceMission {
    /// Briefing text.
    pub description: String,
    /// World-space (x, z) target, floored to whole units.
    pub location: (i32, i32),
    /// Item quantities from the reward grammar.
    pub reward: RewardItems,
    /// Deadline, absent for major missions.
    pub time_limit: Option<Duration>,
}

/// Any active mission.
#[derive(Clone, Debug)]
pub enum Mission {
    /// Destroy targets.
    Battle(BattleMission),
    /// Visit a location.
    Reconnaissance(ReconnaissanceMission),
}

impl Mission {
    /// Briefing text.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::Battle(m) => &m.description,
            Self::Reconnaissance(m) => &m.description,
        }
    }

    /// Item quantities granted on completion.
    #[must_use]
    pub const fn reward(&self) -> RewardItems {
        match self {
            Self::Battle(m) => m.reward,
            Self::Reconnaissance(m) => m.reward,
        }
    }

    /// Deadline, absent for major missions.
    #[must_use]
    pub const fn time_limit(&self) -> Option<Duration> {
        match self {
            Self::Battle(m) => m.time_limit,
            Self::Reconnaissance(m) => m.time_limit,
        }
    }
}

/// Drains mission outlines and keeps the active board filled.
pub struct MissionDirector {
    outlines: Receiver<MissionInfo>,
    generator: Option<JoinHandle<()>>,
    active: Vec<Mission>,
    rng: SeededRng,
    reward: StochasticGrammar,
}

impl MissionDirector {
    /// Creates the director and starts outline generation in the
    /// background, with the reference rules and templates.
    #[must_use]
    pub fn new(mission_count: usize, seed: Seed) -> Self {
        Self::with_generator(MissionGenerator::new(mission_count), seed)
    }

    /// Creates the director over a custom outline generator.
    #[must_use]
    pub fn with_generator(generator: MissionGenerator, seed: Seed) -> Self {
        let (outline_tx, outline_rx) = unbounded();
        let mut generator_rng = SeededRng::from_seed(seed.derive(PURPOSE_OUTLINE));

        let handle = std::thread::Builder::new()
            .name("stratus-missions".into())
            .spawn(move || generator.generate(&mut generator_rng, &outline_tx))
            .expect("spawn mission thread");

        Self {
            outlines: outline_rx,
            generator: Some(handle),
            active: Vec::new(),
            rng: SeededRng::from_seed(seed.derive(PURPOSE_MATERIALIZE)),
            reward: StochasticGrammar::reward(),
        }
    }

    /// Whether outline generation has finished. Reaps the producer thread
    /// on first observation.
    pub fn generation_finished(&mut self) -> bool {
        match &self.generator {
            None => true,
            Some(handle) if handle.is_finished() => {
                if let Some(handle) = self.generator.take() {
                    let _ = handle.join();
                }
                true
            }
            Some(_) => false,
        }
    }

    /// Currently active missions, at most [`MAX_ACTIVE_MISSIONS`].
    #[inline]
    #[must_use]
    pub fn active(&self) -> &[Mission] {
        &self.active
    }

    /// Refills the active board from pending outlines.
    ///
    /// Does nothing while the producer is still generating; outlines are
    /// consumed only after the batch is complete.
    ///
    /// # Errors
    ///
    /// Propagates reward grammar failures.
    pub fn update(&mut self, map: &MapData, config: &WorldConfig) -> ContentResult<()> {
        if !self.generation_finished() {
            return Ok(());
        }

        while self.active.len() < MAX_ACTIVE_MISSIONS {
            let Ok(outline) = self.outlines.try_recv() else {
                break;
            };
            if let Some(mission) = self.materialize(outline, map, config)? {
                debug!(description = mission.description(), "mission activated");
                self.active.push(mission);
            }
        }
        Ok(())
    }

    /// Records a destroyed object on every matching battle mission and
    /// removes the ones it completed. Returns how many completed.
    pub fn notify_target_down(&mut self, target: TargetType) -> usize {
        let before = self.active.len();
        self.active.retain_mut(|mission| match mission {
            Mission::Battle(battle) => !battle.notify_target_down(target),
            Mission::Reconnaissance(_) => true,
        });
        before - self.active.len()
    }

    /// Removes one active mission, e.g. on completion or timeout.
    pub fn resolve(&mut self, index: usize) -> Option<Mission> {
        (index < self.active.len()).then(|| self.active.remove(index))
    }

    /// Whether every mission has been generated, activated, and resolved.
    pub fn all_complete(&mut self) -> bool {
        self.generation_finished() && self.outlines.is_empty() && self.active.is_empty()
    }

    /// Drops every pending outline and active mission.
    pub fn clear(&mut self) {
        while self.outlines.try_recv().is_ok() {}
        self.active.clear();
    }

    fn materialize(
        &mut self,
        outline: MissionInfo,
        map: &MapData,
        config: &WorldConfig,
    ) -> ContentResult<Option<Mission>> {
        #[allow(clippy::cast_sign_loss)]
        let target_count = self.rng.range_i32(5, 10) as u32;
        let reward = RewardItems::materialize(&self.reward, &mut self.rng)?;
        let time_limit = match outline.level {
            MissionLevel::Major => None,
            MissionLevel::Minor => {
                #[allow(clippy::cast_sign_loss)]
                let minutes = self.rng.range_i32(2, 5) as u64;
                Some(Duration::from_secs(minutes * 60))
            }
        };

        let mission = match outline.mission_type {
            MissionType::Battle => Mission::Battle(BattleMission {
                description: outline.description,
                target: outline.target.unwrap_or(TargetType::Enemy),
                remaining: target_count,
                reward,
                time_limit,
            }),
            MissionType::Reconnaissance => {
                let Some(coord) = sample_dry_cell(map, &mut self.rng) else {
                    warn!("no dry cell for reconnaissance target; outline dropped");
                    return Ok(None);
                };
                let world = map.surface_position(config, coord.row, coord.col);
                #[allow(clippy::cast_possible_truncation)]
                let location = (world.x.floor() as i32, world.z.floor() as i32);
                Mission::Reconnaissance(ReconnaissanceMission {
                    description: outline.description,
                    location,
                    reward,
                    time_limit,
                })
            }
        };
        Ok(Some(mission))
    }
}
