// src/synth/mod.rs

//! Message synthesis: `(message, expected_action)` pairs with known ground truth.

use crate::error::SynthesisError;
use crate::protocol::{Domain, Mode, ProtocolDefinition};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

/// A synthetic incoming message and the record a correct reply must contain.
#[derive(Clone, Debug, PartialEq)]
pub struct Synthesized {
    pub message: String,
    pub expected_action: Value,
}

/// Produces one message of `category` for `domain`.
pub fn generate(
    domain: Domain,
    category: &str,
    mode: Mode,
    rng: &mut dyn RngCore,
) -> Result<Synthesized, SynthesisError> {
    domain
        .definition()
        .generate(category, mode, rng)
        .map(|(message, expected_action)| Synthesized {
            message,
            expected_action,
        })
        .ok_or_else(|| SynthesisError::UnknownCategory {
            domain: domain.name(),
            category: category.to_string(),
        })
}

/// Synthesizer bound to one domain and an owned random source.
pub struct Synthesizer<R = ChaCha8Rng> {
    domain: Domain,
    rng: R,
}

impl Synthesizer<ChaCha8Rng> {
    /// Reproducible stream of messages.
    pub fn seeded(domain: Domain, seed: u64) -> Self {
        Self::new(domain, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy(domain: Domain) -> Self {
        Self::new(domain, ChaCha8Rng::from_entropy())
    }
}

impl<R: RngCore> Synthesizer<R> {
    pub fn new(domain: Domain, rng: R) -> Self {
        Self { domain, rng }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn definition(&self) -> &'static ProtocolDefinition {
        self.domain.definition()
    }

    pub fn generate(&mut self, category: &str, mode: Mode) -> Result<Synthesized, SynthesisError> {
        generate(self.domain, category, mode, &mut self.rng)
    }

    /// Picks a category uniformly (including `bad`) and synthesizes a message
    /// for it. Categories are equally likely regardless of how often they
    /// would occur in real play.
    pub fn random_category(
        &mut self,
        mode: Mode,
    ) -> Result<(Synthesized, &'static str), SynthesisError> {
        let categories = self.definition().categories;
        let category = categories[self.rng.gen_range(0..categories.len())];
        let synthesized = self.generate(category, mode)?;
        Ok((synthesized, category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{BAD_CATEGORY, REPEAT_ACTION};
    use std::collections::HashMap;

    #[test]
    fn seeded_synthesizers_repeat_themselves() {
        let mut a = Synthesizer::seeded(Domain::DeepSpace, 42);
        let mut b = Synthesizer::seeded(Domain::DeepSpace, 42);
        for mode in Mode::ALL {
            for _ in 0..25 {
                assert_eq!(a.random_category(mode), b.random_category(mode));
            }
        }
    }

    #[test]
    fn unknown_category_is_a_synthesis_error() {
        let mut synth = Synthesizer::seeded(Domain::Resource, 0);
        assert_eq!(
            synth.generate("dance", Mode::Structured),
            Err(SynthesisError::UnknownCategory {
                domain: "resource",
                category: "dance".into()
            })
        );
    }

    #[test]
    fn bad_always_expects_repeat_with_blank_fields() {
        for domain in Domain::ALL {
            let mut synth = Synthesizer::seeded(domain, 99);
            let blank = domain.definition().repeat_action();
            for mode in Mode::ALL {
                for _ in 0..30 {
                    let s = synth.generate(BAD_CATEGORY, mode).unwrap();
                    assert_eq!(s.expected_action["ACTION"], REPEAT_ACTION);
                    assert_eq!(s.expected_action, blank);
                }
            }
        }
    }

    #[test]
    fn category_selection_covers_every_category() {
        let mut synth = Synthesizer::seeded(Domain::Minecraft, 5);
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for _ in 0..1000 {
            let (_, category) = synth.random_category(Mode::NaturalLanguage).unwrap();
            *seen.entry(category).or_default() += 1;
        }
        assert_eq!(seen.len(), 5);
        // Uniform: 200 expected per category.
        assert!(seen.values().all(|&n| (120..=280).contains(&n)), "{seen:?}");
    }
}
