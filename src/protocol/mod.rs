// src/protocol/mod.rs

//! Protocol definitions: one per game domain, each with a command grammar,
//! a canonical action schema, and the instruction text given to the model.

pub mod deep_space;
pub mod minecraft;
pub mod resource;

use crate::normalize::to_literal;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// How an incoming message is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mode {
    /// Terse command syntax, e.g. `GTHR:WOOD 42`.
    #[serde(rename = "structured")]
    Structured,
    /// Free-text phrasing carrying the same values.
    #[serde(rename = "unstructured")]
    NaturalLanguage,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Structured, Mode::NaturalLanguage];

    pub fn label(self) -> &'static str {
        match self {
            Mode::Structured => "structured",
            Mode::NaturalLanguage => "unstructured",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Resource gathering and exploration commands.
    Resource,
    /// Deep-space mission commands.
    DeepSpace,
    /// Minecraft-themed commands.
    Minecraft,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Resource, Domain::DeepSpace, Domain::Minecraft];

    pub fn name(self) -> &'static str {
        match self {
            Domain::Resource => "resource",
            Domain::DeepSpace => "deep_space",
            Domain::Minecraft => "minecraft",
        }
    }

    pub fn definition(self) -> &'static ProtocolDefinition {
        match self {
            Domain::Resource => &resource::DEFINITION,
            Domain::DeepSpace => &deep_space::DEFINITION,
            Domain::Minecraft => &minecraft::DEFINITION,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "resource" | "game1" | "game_1" => Ok(Domain::Resource),
            "deep_space" | "deep-space" | "game2" | "game_2" => Ok(Domain::DeepSpace),
            "minecraft" | "game3" | "game_3" => Ok(Domain::Minecraft),
            other => Err(format!("unknown domain '{other}'")),
        }
    }
}

/// Category name of the malformed-input generator in every domain.
pub const BAD_CATEGORY: &str = "bad";

/// Action every `bad` message expects.
pub const REPEAT_ACTION: &str = "REPEAT";

type Generator = fn(&str, Mode, &mut dyn RngCore) -> Option<(String, Value)>;

/// Immutable description of one domain's protocol.
pub struct ProtocolDefinition {
    pub domain: Domain,
    pub command_grammar: &'static str,
    pub action_requirement: &'static str,
    /// Message categories; the last one is always [`BAD_CATEGORY`].
    pub categories: &'static [&'static str],
    default_preamble: &'static str,
    protocol_preamble: &'static str,
    schema: fn() -> Value,
    blank: fn() -> Value,
    generator: Generator,
}

impl ProtocolDefinition {
    /// The action template shown to the model.
    pub fn action_schema(&self) -> Value {
        (self.schema)()
    }

    /// A record with every field at its sentinel value (`""` or `-1`).
    pub fn blank_action(&self) -> Value {
        (self.blank)()
    }

    /// The expectation for malformed input: `REPEAT` with sentinel fields.
    pub fn repeat_action(&self) -> Value {
        let mut record = self.blank_action();
        if let Some(map) = record.as_object_mut() {
            map.insert("ACTION".into(), Value::String(REPEAT_ACTION.into()));
        }
        record
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains(&category)
    }

    /// System instructions for one mode, embedding the action template and
    /// field requirements verbatim.
    pub fn system_instructions(&self, mode: Mode) -> String {
        let head = match mode {
            Mode::Structured => format!("{}{}", self.protocol_preamble, self.command_grammar),
            Mode::NaturalLanguage => self.default_preamble.to_string(),
        };
        format!(
            "\n{head}\nYour response must strictly adhere to the following action template:\nACTION_TEMPLATE = {}, with requirement: {}\nEnsure that every response you generate conforms exactly to this template.\n",
            to_literal(&self.action_schema()),
            self.action_requirement,
        )
    }

    pub(crate) fn generate(
        &self,
        category: &str,
        mode: Mode,
        rng: &mut dyn RngCore,
    ) -> Option<(String, Value)> {
        (self.generator)(category, mode, rng)
    }
}

impl fmt::Debug for ProtocolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolDefinition")
            .field("domain", &self.domain)
            .field("categories", &self.categories)
            .finish_non_exhaustive()
    }
}

pub(crate) fn pick<'a>(rng: &mut dyn RngCore, items: &[&'a str]) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

pub(crate) fn one_of(rng: &mut dyn RngCore, mut phrasings: Vec<String>) -> String {
    let index = rng.gen_range(0..phrasings.len());
    phrasings.swap_remove(index)
}

/// `"(x, y)"` with both components in `0..=max`.
pub(crate) fn coordinate(rng: &mut dyn RngCore, max: i64) -> String {
    let x = rng.gen_range(0..=max);
    let y = rng.gen_range(0..=max);
    format!("({x}, {y})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn same_shape(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Object(x), Value::Object(y)) => {
                x.len() == y.len()
                    && x.iter()
                        .zip(y.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && same_shape(va, vb))
            }
            (Value::Object(_), _) | (_, Value::Object(_)) => false,
            _ => true,
        }
    }

    #[test]
    fn every_generated_record_matches_the_schema_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for domain in Domain::ALL {
            let def = domain.definition();
            assert_eq!(def.categories.last(), Some(&BAD_CATEGORY));
            for category in def.categories {
                for mode in Mode::ALL {
                    for _ in 0..20 {
                        let (message, expected) = def.generate(category, mode, &mut rng).unwrap();
                        assert!(!message.is_empty());
                        assert!(
                            same_shape(&def.action_schema(), &expected),
                            "{domain}/{category}: {expected}"
                        );
                    }
                }
            }
            assert!(def.generate("nope", Mode::Structured, &mut rng).is_none());
        }
    }

    #[test]
    fn repeat_action_is_blank_apart_from_the_action() {
        let def = Domain::DeepSpace.definition();
        let repeat = def.repeat_action();
        assert_eq!(repeat["ACTION"], REPEAT_ACTION);
        assert_eq!(repeat["TARGET"]["COORDINATE"], "");
        assert_eq!(repeat["MATERIAL_DETAIL"]["VALUE"], -1);
        assert_eq!(repeat["SURFACE_TYPE"], "");
    }

    #[test]
    fn domains_parse_from_names_and_aliases() {
        assert_eq!("resource".parse::<Domain>(), Ok(Domain::Resource));
        assert_eq!("GAME2".parse::<Domain>(), Ok(Domain::DeepSpace));
        assert_eq!("minecraft".parse::<Domain>(), Ok(Domain::Minecraft));
        assert!("chess".parse::<Domain>().is_err());
    }

    #[test]
    fn coordinates_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..200 {
            let c = coordinate(&mut rng, 10);
            let inner = c.trim_start_matches('(').trim_end_matches(')');
            let (x, y) = inner.split_once(", ").unwrap();
            assert!((0..=10).contains(&x.parse::<i64>().unwrap()));
            assert!((0..=10).contains(&y.parse::<i64>().unwrap()));
        }
    }
}
