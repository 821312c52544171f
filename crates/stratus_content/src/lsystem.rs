//! # L-System Mission Sequencing
//!
//! Mission outlines come from a deterministic two-symbol L-system: the axiom
//! `A` rewrites through `A -> AB`, `B -> BA` for a fixed number of
//! iterations, and a random window cut from the result drives one mission
//! per character. `A` positions carry major missions, `B` positions minor
//! ones; the mission template itself is drawn uniformly per character.
//!
//! The axiom, the rewriting rules, and the template set are plain data:
//! [`MissionGenerator::new`] carries the reference content, and
//! [`MissionGenerator::from_parts`] accepts custom sets (e.g. loaded from
//! config).
//!
//! The producer side of the mission pipeline lives here: outlines are pushed
//! into a channel as they are generated, and the director drains them on the
//! main loop.

use std::collections::HashMap;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use stratus_core::SeededRng;
use tracing::debug;

/// Rewriting depth; the reference rule set yields `2^10` characters.
const MAX_ITERATIONS: usize = 10;

/// What a mission asks the player to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionType {
    /// Visit and survey a location.
    Reconnaissance,
    /// Destroy a number of targets.
    Battle,
}

/// Mission importance, mapped from the L-system symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionLevel {
    /// Untimed story mission.
    Major,
    /// Timed side mission.
    Minor,
}

/// Battle mission target category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetType {
    /// Regular enemies.
    Enemy,
    /// Summoning circles.
    MagicCircle,
}

/// A mission outline before materialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionInfo {
    /// What kind of mission.
    pub mission_type: MissionType,
    /// Major or minor.
    pub level: MissionLevel,
    /// Battle target, absent for reconnaissance.
    pub target: Option<TargetType>,
    /// Briefing text.
    pub description: String,
}

/// The reference rewriting rules: `A -> AB`, `B -> BA`.
#[must_use]
pub fn default_rules() -> HashMap<char, String> {
    HashMap::from([('A', "AB".to_owned()), ('B', "BA".to_owned())])
}

/// The three reference mission templates.
#[must_use]
pub fn default_templates() -> Vec<MissionInfo> {
    vec![
        MissionInfo {
            mission_type: MissionType::Battle,
            level: MissionLevel::Minor,
            target: Some(TargetType::Enemy),
            description: "Eliminate space invader.".to_owned(),
        },
        MissionInfo {
            mission_type: MissionType::Battle,
            level: MissionLevel::Minor,
            target: Some(TargetType::MagicCircle),
            description: "Destroy summoning magic circles.".to_owned(),
        },
        MissionInfo {
            mission_type: MissionType::Reconnaissance,
            level: MissionLevel::Minor,
            target: None,
            description:
                "Head over to target location and investigate the operational environment."
                    .to_owned(),
        },
    ]
}

/// Generates mission outlines from the L-system.
#[derive(Clone, Debug)]
pub struct MissionGenerator {
    mission_count: usize,
    axiom: String,
    rules: HashMap<char, String>,
    templates: Vec<MissionInfo>,
}

impl MissionGenerator {
    /// Creates a generator producing `mission_count` outlines per run, with
    /// the reference rules and templates.
    #[must_use]
    pub fn new(mission_count: usize) -> Self {
        Self::from_parts(
            mission_count,
            "A".to_owned(),
            default_rules(),
            default_templates(),
        )
    }

    /// Creates a generator over a custom axiom, rule table, and template
    /// set. Symbols without a rule are copied through unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `axiom` or `templates` is empty.
    #[must_use]
    pub fn from_parts(
        mission_count: usize,
        axiom: String,
        rules: HashMap<char, String>,
        templates: Vec<MissionInfo>,
    ) -> Self {
        assert!(!axiom.is_empty(), "axiom must be non-empty");
        assert!(!templates.is_empty(), "template set must be non-empty");
        Self {
            mission_count,
            axiom,
            rules,
            templates,
        }
    }

    /// Number of outlines produced per run.
    #[inline]
    #[must_use]
    pub fn mission_count(&self) -> usize {
        self.mission_count
    }

    /// Generates one batch of outlines into `sink`.
    ///
    /// # Panics
    ///
    /// Panics if `mission_count` exceeds the rewritten string length.
    pub fn generate(&self, rng: &mut SeededRng, sink: &Sender<MissionInfo>) {
        let sequence = self.rewrite();
        assert!(
            self.mission_count < sequence.len(),
            "mission count exceeds the sequence"
        );

        let start = rng.range_usize(0, sequence.len() - self.mission_count);
        let window = &sequence[start..start + self.mission_count];
        debug!(start, window, "mission window cut");

        for symbol in window.chars() {
            let mut mission = self.templates[rng.range_usize(0, self.templates.len())].clone();
            mission.level = if symbol == 'A' {
                MissionLevel::Major
            } else {
                MissionLevel::Minor
            };
            // director side hung up; nothing left to produce for
            if sink.send(mission).is_err() {
                return;
            }
        }
    }

    /// Runs the rewriting from the axiom for [`MAX_ITERATIONS`] rounds.
    fn rewrite(&self) -> String {
        let mut current = self.axiom.clone();
        for _ in 0..MAX_ITERATIONS {
            let mut next = String::with_capacity(current.len() * 2);
            for symbol in current.chars() {
                match self.rules.get(&symbol) {
                    Some(replacement) => next.push_str(replacement),
                    None => next.push(symbol),
                }
            }
            current = next;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use stratus_core::Seed;

    #[test]
    fn test_rewrite_doubles_per_iteration() {
        let sequence = MissionGenerator::new(1).rewrite();
        assert_eq!(sequence.len(), 1 << MAX_ITERATIONS);
        assert!(sequence.starts_with("ABBABAAB"));
        assert!(sequence.chars().all(|c| c == 'A' || c == 'B'));
    }

    #[test]
    fn test_generates_requested_count() {
        let generator = MissionGenerator::new(12);
        let mut rng = SeededRng::from_seed(Seed::new(1));
        let (tx, rx) = unbounded();

        generator.generate(&mut rng, &tx);
        drop(tx);

        let missions: Vec<_> = rx.iter().collect();
        assert_eq!(missions.len(), 12);
        for mission in &missions {
            match mission.mission_type {
                MissionType::Battle => assert!(mission.target.is_some()),
                MissionType::Reconnaissance => assert!(mission.target.is_none()),
            }
        }
    }

    #[test]
    fn test_levels_follow_the_sequence_window() {
        let generator = MissionGenerator::new(20);
        let mut rng = SeededRng::from_seed(Seed::new(42));
        let (tx, rx) = unbounded();
        generator.generate(&mut rng, &tx);
        drop(tx);

        // replay the window cut with the same stream
        let sequence = generator.rewrite();
        let mut replay = SeededRng::from_seed(Seed::new(42));
        let start = replay.range_usize(0, sequence.len() - 20);

        for (mission, symbol) in rx.iter().zip(sequence[start..start + 20].chars()) {
            let expected = if symbol == 'A' {
                MissionLevel::Major
            } else {
                MissionLevel::Minor
            };
            assert_eq!(mission.level, expected);
        }
    }

    #[test]
    fn test_batches_are_seed_deterministic() {
        let generator = MissionGenerator::new(8);

        let run = || {
            let mut rng = SeededRng::from_seed(Seed::new(7));
            let (tx, rx) = unbounded();
            generator.generate(&mut rng, &tx);
            drop(tx);
            rx.iter().collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_custom_rules_and_templates_are_honored() {
        let rules = HashMap::from([('A', "AA".to_owned())]);
        let templates = vec![MissionInfo {
            mission_type: MissionType::Reconnaissance,
            level: MissionLevel::Minor,
            target: None,
            description: "Survey the crater.".to_owned(),
        }];
        let generator = MissionGenerator::from_parts(6, "A".to_owned(), rules, templates);

        let sequence = generator.rewrite();
        assert_eq!(sequence.len(), 1 << MAX_ITERATIONS);
        assert!(sequence.chars().all(|c| c == 'A'));

        let mut rng = SeededRng::from_seed(Seed::new(3));
        let (tx, rx) = unbounded();
        generator.generate(&mut rng, &tx);
        drop(tx);

        let missions: Vec<_> = rx.iter().collect();
        assert_eq!(missions.len(), 6);
        for mission in &missions {
            // an all-A sequence makes every outline major
            assert_eq!(mission.level, MissionLevel::Major);
            assert_eq!(mission.description, "Survey the crater.");
        }
    }

    #[test]
    fn test_unruled_symbols_copy_through() {
        let rules = HashMap::from([('A', "AX".to_owned())]);
        let generator = MissionGenerator::from_parts(
            1,
            "A".to_owned(),
            rules,
            default_templates(),
        );

        let sequence = generator.rewrite();
        // one X per iteration, appended after the surviving A
        assert_eq!(sequence.len(), 1 + MAX_ITERATIONS);
        assert!(sequence.starts_with('A'));
        assert!(sequence[1..].chars().all(|c| c == 'X'));
    }

    #[test]
    fn test_templates_load_from_toml() {
        let templates: Vec<MissionInfo> = toml::from_str::<HashMap<String, Vec<MissionInfo>>>(
            r#"
            [[templates]]
            mission_type = "Battle"
            level = "Minor"
            target = "Enemy"
            description = "Clear the landing zone."

            [[templates]]
            mission_type = "Reconnaissance"
            level = "Minor"
            description = "Scout the ridge."
            "#,
        )
        .unwrap()
        .remove("templates")
        .unwrap();

        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].target, Some(TargetType::Enemy));
        assert_eq!(templates[1].target, None);

        let generator =
            MissionGenerator::from_parts(4, "A".to_owned(), default_rules(), templates);
        let mut rng = SeededRng::from_seed(Seed::new(5));
        let (tx, rx) = unbounded();
        generator.generate(&mut rng, &tx);
        drop(tx);
        assert_eq!(rx.iter().count(), 4);
    }
}
