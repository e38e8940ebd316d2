// src/protocol/minecraft.rs

//! Minecraft-themed commands (`MINE`, `CRAFT`, `BLD`, `EXPL`).

use super::{Domain, Mode, ProtocolDefinition, coordinate, one_of, pick};
use rand::{Rng, RngCore};
use serde_json::{Value, json};

const COMMAND_GRAMMAR: &str = r#"
Message Format:
[CMD_CODE] [Optional: Extended Parameters]

CMD_CODES and Guidelines:

- MINE: Mine Resources  
   Usage: "MINE:<RESOURCE_TYPE> [UNITS]"  
   • RESOURCE_TYPE must be one of: COAL, IRON, GOLD, DIAMOND

- CRAFT: Craft Items  
   Usage: "CRAFT:<ITEM_NAME>|<QUANTITY>"  
   • ITEM_NAME examples: PICKAXE, SWORD, AXE, CHEST, FURNACE

- BLD: Build Structures  
   Usage: "BLD:<STRUCTURE_NAME>|<COORDINATES>"  
   • STRUCTURE_NAME examples: HOUSE, BRIDGE, FARM, WALL

- EXPL: Explore Biome  
   Usage: "EXPL:<BIOME_NAME>|<COORDINATES>"  
   • BIOME_NAME must be one of: FOREST, DESERT, PLAINS, MOUNTAIN, CAVE
"#;

const ACTION_REQUIREMENT: &str = r#"
For ACTION, select one of: "MINE", "CRAFT", "BLD", "EXPL", "REPEAT". If the message is unclear or specifies an impossible action (e.g., a negative resource quantity), use "REPEAT".
For COORDINATE, provide a tuple in the form "(x, y)", leaving it blank if not applicable.
For AREA, specify the biome name when EXPL; leave blank otherwise.
For RESOURCE.TYPE, indicate resource/item; for RESOURCE.QUANTITY, an integer or -1 if not applicable.
For STRUCTURE, specify the structure name when BLD; leave blank otherwise.
"#;

// WOOD is not in the grammar's list but is still sampled.
const MINE_RESOURCES: &[&str] = &["COAL", "IRON", "GOLD", "DIAMOND", "WOOD"];
const ITEMS: &[&str] = &["PICKAXE", "SWORD", "AXE", "CHEST", "FURNACE"];
const STRUCTURES: &[&str] = &["HOUSE", "BRIDGE", "FARM", "WALL"];
const BIOMES: &[&str] = &["FOREST", "DESERT", "PLAINS", "MOUNTAIN", "CAVE"];

const MALFORMED: &[&str] = &[
    "MINE",
    "MINE | COAL|ten",
    "CRAFT:WOOD",
    "BLD: house",
    "EXPL:|()",
    "Gather wood",
    "Make random sword",
    "Go there",
];

const WELCOME: &str = "Welcome to the Minecraft-themed cooperative game! You'll receive messages from your teammate and must decide your next action.";

pub static DEFINITION: ProtocolDefinition = ProtocolDefinition {
    domain: Domain::Minecraft,
    command_grammar: COMMAND_GRAMMAR,
    action_requirement: ACTION_REQUIREMENT,
    categories: &["mine", "craft", "build", "explore", "bad"],
    default_preamble: WELCOME,
    protocol_preamble: "Welcome to the Minecraft-themed cooperative game! You'll receive messages from your teammate and must decide your next action.\nAll incoming messages will follow the protocol format: ",
    schema: || record("", "", "", "", 1, ""),
    blank: || record("", "", "", "", -1, ""),
    generator: generate,
};

fn record(
    action: &str,
    coordinate: &str,
    area: &str,
    kind: &str,
    quantity: i64,
    structure: &str,
) -> Value {
    json!({
        "ACTION": action,
        "LOCATION": {
            "COORDINATE": coordinate,
            "AREA": area,
        },
        "RESOURCE": {
            "TYPE": kind,
            "QUANTITY": quantity,
        },
        "STRUCTURE": structure
    })
}

fn generate(category: &str, mode: Mode, rng: &mut dyn RngCore) -> Option<(String, Value)> {
    let pair = match category {
        "mine" => mine(mode, rng),
        "craft" => craft(mode, rng),
        "build" => build(mode, rng),
        "explore" => explore(mode, rng),
        "bad" => bad(rng),
        _ => return None,
    };
    Some(pair)
}

fn mine(mode: Mode, rng: &mut dyn RngCore) -> (String, Value) {
    let quantity = rng.gen_range(1..=64);
    let resource = pick(rng, MINE_RESOURCES);
    let message = match mode {
        Mode::Structured => format!("MINE:{resource} {quantity}"),
        Mode::NaturalLanguage => one_of(
            rng,
            vec![
                format!("Mine {quantity} units of {resource}."),
                format!("Please mine {quantity} {resource}."),
                format!("Get {quantity} {resource} from the veins."),
            ],
        ),
    };
    (message, record("MINE", "", "", resource, quantity, ""))
}

fn craft(mode: Mode, rng: &mut dyn RngCore) -> (String, Value) {
    let quantity = rng.gen_range(1..=10);
    let item = pick(rng, ITEMS);
    let message = match mode {
        Mode::Structured => format!("CRAFT:{item}|{quantity}"),
        Mode::NaturalLanguage => one_of(
            rng,
            vec![
                format!("Craft {quantity} {item}(s)."),
                format!("I need {quantity} {item}."),
                format!("Please make {quantity} {item}."),
            ],
        ),
    };
    (message, record("CRAFT", "", "", item, quantity, ""))
}

fn build(mode: Mode, rng: &mut dyn RngCore) -> (String, Value) {
    let structure = pick(rng, STRUCTURES);
    let at = coordinate(rng, 100);
    let message = match mode {
        Mode::Structured => format!("BLD:{structure}|{at}"),
        Mode::NaturalLanguage => one_of(
            rng,
            vec![
                format!("Build a {structure} at {at}."),
                format!("Construct {structure} on {at}."),
                format!("Please build {structure} at {at}."),
            ],
        ),
    };
    (message, record("BLD", &at, "", "", -1, structure))
}

fn explore(mode: Mode, rng: &mut dyn RngCore) -> (String, Value) {
    let biome = pick(rng, BIOMES);
    let at = coordinate(rng, 100);
    let message = match mode {
        Mode::Structured => format!("EXPL:{biome}|{at}"),
        Mode::NaturalLanguage => one_of(
            rng,
            vec![
                format!("Explore the {biome} at {at}."),
                format!("Investigate {biome} region {at}."),
                format!("Check out the {biome} around {at}."),
            ],
        ),
    };
    (message, record("EXPL", &at, biome, "", -1, ""))
}

// Same malformed inputs in both modes.
fn bad(rng: &mut dyn RngCore) -> (String, Value) {
    (pick(rng, MALFORMED).to_string(), DEFINITION.repeat_action())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn build_and_explore_use_the_short_action_codes() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let (_, built) = build(Mode::NaturalLanguage, &mut rng);
        assert_eq!(built["ACTION"], "BLD");
        assert!(STRUCTURES.contains(&built["STRUCTURE"].as_str().unwrap()));

        let (message, explored) = explore(Mode::Structured, &mut rng);
        let biome = explored["LOCATION"]["AREA"].as_str().unwrap();
        assert_eq!(explored["ACTION"], "EXPL");
        assert!(message.starts_with(&format!("EXPL:{biome}|")));
    }

    #[test]
    fn bad_messages_ignore_mode() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for mode in Mode::ALL {
            let (message, expected) = generate("bad", mode, &mut rng).unwrap();
            assert!(MALFORMED.contains(&message.as_str()));
            assert_eq!(expected, DEFINITION.repeat_action());
        }
    }
}
