// src/protocol/resource.rs

//! Resource gathering and exploration commands (`GTHR`, `SEND`, `MOVE`, `EXPL`).

use super::{Domain, Mode, ProtocolDefinition, coordinate, one_of, pick};
use rand::{Rng, RngCore};
use serde_json::{Value, json};

const COMMAND_GRAMMAR: &str = r#"
Message Format:
[CMD_CODE] [Optional: Extended Parameters]

CMD_CODES and Guidelines:

- GTHR: Gather Resources  
   Usage: "GTHR:<RESOURCE_TYPE> [UNITS]"  
   • RESOURCE_TYPE must be one of: WOOD, STONE, FOOD, WEAPON

- EXPL: Explore Unknown Areas  
   Usage: "EXPL:<AREA_NAME>|<COORDINATES>"  
   • AREA_NAME is mandatory unless explicit coordinates are provided  
   • COORDINATES can be provided as (x,y)

- SEND: Dispatch Resources to Ally  
   Usage: "SEND:<RESOURCE_TYPE>|<UNITS>|<DESTINATION>"  
   • DESTINATION must be specified as a coordinate tuple, e.g., (x,y)

- MOVE: Relocate the Unit  
   Usage: "MOVE:<COORDINATES>"  
   • COORDINATES can be (x,y)
"#;

const ACTION_REQUIREMENT: &str = r#"
For action, Select one of: "MOVE", "COLLECT", "EXPLORE", "SEND". If the message is unclear (e.g. move without a given coordinate) or specifies an impossible action (e.g., a negative resource quantity), use "REPEAT".
For coordinate, Provide a coordinate tuple in the form "(x, y)", for area, only provide the number.
For quantity of resource required for the task, Provide an integer value representing the resource quantity; use -1 if not applicable.
RESOURCE_TYPE must be one of: WOOD, STONE, FOOD, WEAPON.
For irrelevant field, leave it blank as '', do not write anything
"#;

const RESOURCE_TYPES: &[&str] = &["WOOD", "STONE", "FOOD", "WEAPON"];

pub static DEFINITION: ProtocolDefinition = ProtocolDefinition {
    domain: Domain::Resource,
    command_grammar: COMMAND_GRAMMAR,
    action_requirement: ACTION_REQUIREMENT,
    categories: &["gather", "send", "move", "explore", "bad"],
    default_preamble: "Welcome to the cooperative game! You'll receive messages from your teammate and must decide your next action. ",
    protocol_preamble: "Welcome to the cooperative game! You'll receive messages from your teammate and must decide your next action. \nAll incoming messages will follow the protocol format: ",
    schema: || record("", "", "", "", 1),
    blank: || record("", "", "", "", -1),
    generator: generate,
};

fn record(action: &str, coordinate: &str, area: &str, kind: &str, quantity: i64) -> Value {
    json!({
        "ACTION": action,
        "LOCATION": {
            "COORDINATE": coordinate,
            "AREA": area,
        },
        "RESOURCE": {
            "TYPE": kind,
            "QUANTITY": quantity,
        }
    })
}

fn generate(category: &str, mode: Mode, rng: &mut dyn RngCore) -> Option<(String, Value)> {
    let pair = match category {
        "gather" => gather(mode, rng),
        "send" => send(mode, rng),
        "move" => relocate(mode, rng),
        "explore" => explore(mode, rng),
        "bad" => bad(mode, rng),
        _ => return None,
    };
    Some(pair)
}

fn gather(mode: Mode, rng: &mut dyn RngCore) -> (String, Value) {
    let quantity = rng.gen_range(1..=100);
    let kind = pick(rng, RESOURCE_TYPES);
    let message = match mode {
        Mode::Structured => format!("GTHR:{kind} {quantity}"),
        Mode::NaturalLanguage => one_of(
            rng,
            vec![
                format!("Collect {quantity} units of {kind}."),
                format!("Please gather {quantity} {kind}."),
                format!("Get {quantity} {kind}"),
            ],
        ),
    };
    (message, record("COLLECT", "", "", kind, quantity))
}

fn send(mode: Mode, rng: &mut dyn RngCore) -> (String, Value) {
    let quantity = rng.gen_range(1..=10);
    let kind = pick(rng, RESOURCE_TYPES);
    let destination = coordinate(rng, 10);
    let message = match mode {
        Mode::Structured => format!("SEND:{kind}|{quantity}|{destination}"),
        Mode::NaturalLanguage => one_of(
            rng,
            vec![
                format!("Send {quantity} units of {kind} to {destination}."),
                format!("I want {quantity} {kind} at {destination}."),
                format!("I need {quantity} {kind} at {destination}."),
            ],
        ),
    };
    (message, record("SEND", &destination, "", kind, quantity))
}

fn relocate(mode: Mode, rng: &mut dyn RngCore) -> (String, Value) {
    let destination = coordinate(rng, 10);
    let message = match mode {
        Mode::Structured => format!("MOVE:{destination}"),
        Mode::NaturalLanguage => one_of(
            rng,
            vec![
                format!("Move to {destination}."),
                format!("Relocate to {destination}."),
                format!("Go to coordinate {destination}"),
            ],
        ),
    };
    (message, record("MOVE", &destination, "", "", -1))
}

// AREA carries only the area number.
fn explore(mode: Mode, rng: &mut dyn RngCore) -> (String, Value) {
    let destination = coordinate(rng, 10);
    let area_number: i64 = rng.gen_range(1..=10);
    let area = format!("Area {area_number}");
    let message = match mode {
        Mode::Structured => format!("EXPL:{area}|{destination}"),
        Mode::NaturalLanguage => one_of(
            rng,
            vec![
                format!("Explore {area} at {destination}."),
                format!("Investigate {area} at {destination}."),
                format!("Check out {area} at {destination}"),
            ],
        ),
    };
    (
        message,
        record("EXPLORE", &destination, &area_number.to_string(), "", -1),
    )
}

fn bad(mode: Mode, rng: &mut dyn RngCore) -> (String, Value) {
    let destination = coordinate(rng, 10);
    let quantity: i64 = rng.gen_range(-10..=10);
    let negative = -quantity.abs();
    let message = match mode {
        Mode::Structured => one_of(
            rng,
            vec![
                "MOVE".to_string(),
                "MOVE |(1,2,3,4)".to_string(),
                "EXPL forest |||".to_string(),
                format!("EXPL | {destination}"),
                format!("GTHR: {destination}"),
                format!("GTHR: fish {quantity}"),
                format!("GTHR WOOD {negative}"),
                format!("SEND: WOOD | {quantity}"),
                format!("SEND: WOOD | {destination}"),
            ],
        ),
        Mode::NaturalLanguage => one_of(
            rng,
            vec![
                "Move to me.".to_string(),
                "Move to (1,2,3,4).".to_string(),
                format!("Collect {negative} units of wood."),
                format!("Gather at {destination}."),
                format!("Please gather {quantity} fish"),
                format!("Send {quantity} units of food to me"),
                format!("Send {quantity} units of wood"),
                "Explore the forest".to_string(),
                "Check out this place ".to_string(),
                "Gather resource".to_string(),
                "Collect wood".to_string(),
            ],
        ),
    };
    (message, DEFINITION.repeat_action())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn structured_move_uses_the_command_syntax() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let (message, expected) = relocate(Mode::Structured, &mut rng);
        let destination = expected["LOCATION"]["COORDINATE"].as_str().unwrap();
        assert_eq!(message, format!("MOVE:{destination}"));
        assert_eq!(expected["ACTION"], "MOVE");
        assert_eq!(expected["RESOURCE"]["QUANTITY"], -1);
    }

    #[test]
    fn gather_values_appear_in_the_message() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for mode in Mode::ALL {
            for _ in 0..50 {
                let (message, expected) = gather(mode, &mut rng);
                let kind = expected["RESOURCE"]["TYPE"].as_str().unwrap();
                let quantity = expected["RESOURCE"]["QUANTITY"].as_i64().unwrap();
                assert!(RESOURCE_TYPES.contains(&kind));
                assert!((1..=100).contains(&quantity));
                assert!(message.contains(kind) && message.contains(&quantity.to_string()));
                assert_eq!(expected["ACTION"], "COLLECT");
            }
        }
    }

    #[test]
    fn explore_keeps_only_the_area_number() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let (message, expected) = explore(Mode::Structured, &mut rng);
        let area = expected["LOCATION"]["AREA"].as_str().unwrap();
        assert!(area.parse::<u32>().is_ok());
        assert!(message.starts_with(&format!("EXPL:Area {area}|(")));
    }
}
