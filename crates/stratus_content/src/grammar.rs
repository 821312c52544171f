//! # Stochastic Grammars
//!
//! Weighted string-rewriting grammars behind enemy formations and mission
//! rewards. Expansion picks one production per symbol by roulette selection
//! over the production weights; silent symbols expand to nothing, which is
//! how terminals age out of a formation between waves.
//!
//! The built-in tables are the reference content set. Custom grammars go
//! through [`StochasticGrammar::new`], which validates that every rule list
//! can actually be selected from.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use stratus_core::SeededRng;

use crate::error::{ContentError, ContentResult};

/// Symbols the formation grammar retires instead of rewriting.
pub const FORMATION_TERMINATORS: [char; 4] = ['I', 'A', 'F', '_'];

/// Start symbol for formation generation.
pub const FORMATION_START: char = 'S';

/// One weighted production.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Production {
    /// Replacement string.
    pub successor: String,
    /// Relative selection weight.
    pub weight: f32,
}

impl Production {
    /// Creates a production.
    #[must_use]
    pub fn new(successor: &str, weight: f32) -> Self {
        Self {
            successor: successor.to_owned(),
            weight,
        }
    }
}

/// A weighted rewriting grammar over single-character symbols.
///
/// Grammars deserialized from config data skip the constructor; call
/// [`StochasticGrammar::validate`] on them before first use.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StochasticGrammar {
    rules: HashMap<char, Vec<Production>>,
    #[serde(default)]
    silent: Vec<char>,
}

impl StochasticGrammar {
    /// Creates a grammar and validates its weight tables.
    ///
    /// Symbols listed in `silent` expand to the empty string without
    /// consuming randomness.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::EmptyWeightTable`] for any symbol whose
    /// productions cannot be selected from.
    pub fn new(
        rules: HashMap<char, Vec<Production>>,
        silent: Vec<char>,
    ) -> ContentResult<Self> {
        let grammar = Self { rules, silent };
        grammar.validate()?;
        Ok(grammar)
    }

    /// Checks that every rule list can be selected from.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::EmptyWeightTable`] for any symbol whose
    /// productions are empty or sum to zero weight.
    pub fn validate(&self) -> ContentResult<()> {
        for (symbol, productions) in &self.rules {
            let total: f32 = productions.iter().map(|p| p.weight).sum();
            if productions.is_empty() || total <= 0.0 {
                return Err(ContentError::EmptyWeightTable { symbol: *symbol });
            }
        }
        Ok(())
    }

    /// The reference formation grammar: waves of enemies and summoning
    /// circles growing out of the `S` start symbol.
    #[must_use]
    pub fn formation() -> Self {
        let rules = HashMap::from([
            (
                'S',
                vec![
                    Production::new("EEEEEEEEEEEEEEEEEEEE", 0.25),
                    Production::new("EEECEEECEEECEEECEEECEE", 0.25),
                    Production::new("EECEECEECEECEECEECECEEEE", 0.25),
                    Production::new("CEEEEEEEEECEEEEEEEEE", 0.25),
                ],
            ),
            (
                'E',
                vec![
                    Production::new("EC", 0.3),
                    Production::new("EE", 0.1),
                    Production::new("EI", 0.1),
                    Production::new("E", 0.4),
                    Production::new("_", 0.1),
                ],
            ),
            (
                'C',
                vec![
                    Production::new("E", 0.35),
                    Production::new("I", 0.25),
                    Production::new("EE", 0.2),
                    Production::new("_", 0.2),
                ],
            ),
        ]);
        Self {
            rules,
            silent: FORMATION_TERMINATORS.to_vec(),
        }
    }

    /// The reference reward grammar, expanding an item chest into first-aid
    /// and ammo quantities.
    #[must_use]
    pub fn reward() -> Self {
        let rules = HashMap::from([
            (
                'E',
                vec![Production::new("I", 0.7), Production::new("_", 0.3)],
            ),
            (
                'C',
                vec![
                    Production::new("EEEEE", 0.1),
                    Production::new("II", 0.3),
                    Production::new("I", 0.3),
                    Production::new("E", 0.2),
                    Production::new("_", 0.1),
                ],
            ),
            (
                'I',
                vec![
                    Production::new("FA", 0.25),
                    Production::new("A", 0.5),
                    Production::new("AA", 0.25),
                ],
            ),
            (
                'F',
                vec![
                    Production::new("1", 0.6),
                    Production::new("2", 0.3),
                    Production::new("3", 0.1),
                ],
            ),
            (
                'A',
                vec![
                    Production::new("10", 0.3),
                    Production::new("20", 0.4),
                    Production::new("30", 0.2),
                    Production::new("40", 0.1),
                ],
            ),
        ]);
        Self {
            rules,
            silent: vec!['_'],
        }
    }

    /// Whether a symbol expands silently.
    #[must_use]
    pub fn is_silent(&self, symbol: char) -> bool {
        self.silent.contains(&symbol)
    }

    /// Expands one symbol into its replacement.
    ///
    /// Selection draws one uniform value scaled by the total weight and
    /// walks the productions, keeping the first whose cumulative weight
    /// reaches the draw.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::UnknownSymbol`] for a symbol with no rule.
    pub fn expand(&self, symbol: char, rng: &mut SeededRng) -> ContentResult<String> {
        if self.is_silent(symbol) {
            return Ok(String::new());
        }

        let productions = self
            .rules
            .get(&symbol)
            .ok_or(ContentError::UnknownSymbol { symbol })?;

        let total: f32 = productions.iter().map(|p| p.weight).sum();
        let choice = rng.next_f32() * total;
        Ok(select_production(productions, choice).successor.clone())
    }

    /// Rewrites a whole string, one expansion per symbol.
    ///
    /// # Errors
    ///
    /// Fails on the first symbol without a rule.
    pub fn step(&self, input: &str, rng: &mut SeededRng) -> ContentResult<String> {
        let mut next = String::with_capacity(input.len() * 2);
        for symbol in input.chars() {
            next.push_str(&self.expand(symbol, rng)?);
        }
        Ok(next)
    }
}

/// Walks `productions` subtracting weights from `choice` and keeps the
/// first production whose cumulative weight reaches it. A draw landing
/// exactly on a cumulative bound picks the production that completed it.
fn select_production(productions: &[Production], mut choice: f32) -> &Production {
    for production in productions {
        choice -= production.weight;
        if choice <= 0.0 {
            return production;
        }
    }
    // float roundoff can leave an epsilon after the last subtraction
    &productions[productions.len() - 1]
}

/// Concrete item quantities parsed out of a reward expansion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardItems {
    /// First-aid kits granted.
    pub first_aid: u32,
    /// Ammo rounds granted.
    pub ammo: u32,
}

impl RewardItems {
    /// Materializes an item chest into quantities: expands `I` into item
    /// symbols, expands each symbol one step further into its digit-run
    /// terminal, and parses the totals.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::InvalidQuantity`] when an item symbol
    /// expands to something non-numeric, [`ContentError::UnknownSymbol`]
    /// when the chest expands to a symbol that is neither `F` nor `A`.
    pub fn materialize(
        grammar: &StochasticGrammar,
        rng: &mut SeededRng,
    ) -> ContentResult<Self> {
        let mut items = Self::default();
        for symbol in grammar.expand('I', rng)?.chars() {
            let text = grammar.expand(symbol, rng)?;
            let amount: u32 = text
                .parse()
                .map_err(|_| ContentError::InvalidQuantity {
                    symbol,
                    text: text.clone(),
                })?;
            match symbol {
                'F' => items.first_aid += amount,
                'A' => items.ammo += amount,
                _ => return Err(ContentError::UnknownSymbol { symbol }),
            }
        }
        Ok(items)
    }
}

/// Human-readable name of a formation symbol.
#[must_use]
pub const fn describe_symbol(symbol: char) -> Option<&'static str> {
    match symbol {
        'E' => Some("Enemy"),
        'C' => Some("Summoning Magic Circle"),
        'I' => Some("Item Chest"),
        'F' => Some("First-aid Kit"),
        'A' => Some("Ammo"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_core::Seed;

    #[test]
    fn test_start_symbol_yields_a_reference_opening() {
        let grammar = StochasticGrammar::formation();
        let mut rng = SeededRng::from_seed(Seed::new(1));

        let openings = [
            "EEEEEEEEEEEEEEEEEEEE",
            "EEECEEECEEECEEECEEECEE",
            "EECEECEECEECEECEECECEEEE",
            "CEEEEEEEEECEEEEEEEEE",
        ];
        for _ in 0..100 {
            let opening = grammar.expand(FORMATION_START, &mut rng).unwrap();
            assert!(openings.contains(&opening.as_str()), "got {opening}");
        }
    }

    #[test]
    fn test_terminators_expand_silently() {
        let grammar = StochasticGrammar::formation();
        let mut rng = SeededRng::from_seed(Seed::new(2));

        for symbol in FORMATION_TERMINATORS {
            assert_eq!(grammar.expand(symbol, &mut rng).unwrap(), "");
        }
    }

    #[test]
    fn test_unknown_symbol_is_an_error() {
        let grammar = StochasticGrammar::formation();
        let mut rng = SeededRng::from_seed(Seed::new(3));
        assert_eq!(
            grammar.expand('X', &mut rng),
            Err(ContentError::UnknownSymbol { symbol: 'X' })
        );

        let reward = StochasticGrammar::reward();
        assert_eq!(
            reward.step("I2", &mut rng),
            Err(ContentError::UnknownSymbol { symbol: '2' })
        );
    }

    #[test]
    fn test_zero_weight_table_rejected_at_construction() {
        let rules = HashMap::from([('E', vec![Production::new("EE", 0.0)])]);
        assert_eq!(
            StochasticGrammar::new(rules, Vec::new()).unwrap_err(),
            ContentError::EmptyWeightTable { symbol: 'E' }
        );

        let empty = HashMap::from([('E', Vec::new())]);
        assert!(StochasticGrammar::new(empty, Vec::new()).is_err());
    }

    #[test]
    fn test_expansion_is_seed_deterministic() {
        let grammar = StochasticGrammar::formation();

        let run = |seed: u64| {
            let mut rng = SeededRng::from_seed(Seed::new(seed));
            let mut formation = grammar.expand(FORMATION_START, &mut rng).unwrap();
            for _ in 0..5 {
                formation = grammar.step(&formation, &mut rng).unwrap();
            }
            formation
        };

        assert_eq!(run(77), run(77));
    }

    #[test]
    fn test_selection_frequencies_follow_weights() {
        // 'E' in the reward grammar splits 0.7 item / 0.3 nothing
        let grammar = StochasticGrammar::reward();
        let mut rng = SeededRng::from_seed(Seed::new(5));

        let mut items = 0u32;
        let draws = 10_000;
        for _ in 0..draws {
            if grammar.expand('E', &mut rng).unwrap() == "I" {
                items += 1;
            }
        }

        let ratio = f64::from(items) / f64::from(draws);
        assert!((0.67..0.73).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn test_reward_chain_ends_in_quantities() {
        let grammar = StochasticGrammar::reward();
        let mut rng = SeededRng::from_seed(Seed::new(8));

        for _ in 0..100 {
            let expansion = grammar.expand('I', &mut rng).unwrap();
            assert!(
                ["FA", "A", "AA"].contains(&expansion.as_str()),
                "got {expansion}"
            );
            // every item symbol terminates in a parseable digit run
            for symbol in expansion.chars() {
                let quantity = grammar.expand(symbol, &mut rng).unwrap();
                assert!(quantity.parse::<u32>().is_ok(), "got {quantity}");
            }
        }
    }

    #[test]
    fn test_reward_items_come_from_the_quantity_tables() {
        let grammar = StochasticGrammar::reward();
        let mut rng = SeededRng::from_seed(Seed::new(21));

        for _ in 0..500 {
            let items = RewardItems::materialize(&grammar, &mut rng).unwrap();
            // chests hold 1-2 ammo stacks of 10/20/30/40 and at most
            // one first-aid stack of 1/2/3
            assert!(items.ammo >= 10 && items.ammo <= 80, "ammo {}", items.ammo);
            assert_eq!(items.ammo % 10, 0);
            assert!(items.first_aid <= 3);
        }
    }

    #[test]
    fn test_reward_items_are_seed_deterministic() {
        let grammar = StochasticGrammar::reward();
        let run = || {
            let mut rng = SeededRng::from_seed(Seed::new(44));
            (0..32)
                .map(|_| RewardItems::materialize(&grammar, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_roulette_boundary_keeps_the_earlier_production() {
        let productions = vec![
            Production::new("first", 0.25),
            Production::new("second", 0.5),
            Production::new("third", 0.25),
        ];

        // a draw exactly on a cumulative bound belongs to the production
        // that completed it, not the next one
        assert_eq!(select_production(&productions, 0.25).successor, "first");
        assert_eq!(select_production(&productions, 0.75).successor, "second");
        assert_eq!(select_production(&productions, 0.0).successor, "first");
        assert_eq!(select_production(&productions, 0.26).successor, "second");
        assert_eq!(select_production(&productions, 1.0).successor, "third");
        // roundoff past the total still lands on the last entry
        assert_eq!(select_production(&productions, 1.001).successor, "third");
    }

    #[test]
    fn test_grammar_loads_from_toml() {
        let grammar: StochasticGrammar = toml::from_str(
            r#"
            silent = ["_"]

            [rules]
            E = [
                { successor = "EE", weight = 0.5 },
                { successor = "_", weight = 0.5 },
            ]
            "#,
        )
        .unwrap();
        grammar.validate().unwrap();

        let mut rng = SeededRng::from_seed(Seed::new(9));
        for _ in 0..50 {
            let expansion = grammar.expand('E', &mut rng).unwrap();
            assert!(expansion == "EE" || expansion == "_", "got {expansion}");
        }
        assert_eq!(grammar.expand('_', &mut rng).unwrap(), "");
    }

    #[test]
    fn test_loaded_zero_weight_table_fails_validation() {
        let grammar: StochasticGrammar = toml::from_str(
            r#"
            [rules]
            E = [{ successor = "EE", weight = 0.0 }]
            "#,
        )
        .unwrap();
        assert_eq!(
            grammar.validate().unwrap_err(),
            ContentError::EmptyWeightTable { symbol: 'E' }
        );
    }
}
