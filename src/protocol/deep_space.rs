// src/protocol/deep_space.rs

//! Deep-space mission commands (`SCAN`, `LAND`, `SAMPLE`, `COMM`).

use super::{Domain, Mode, ProtocolDefinition, coordinate, one_of, pick};
use rand::{Rng, RngCore};
use serde_json::{Value, json};

const COMMAND_GRAMMAR: &str = r#"
Message Format:
[CMD_CODE] [Optional: Extended Parameters]

CMD_CODES and Guidelines:

- SCAN: Scan a celestial object  
   Usage: "SCAN:<OBJECT_TYPE> [COORDINATES]"  
   • OBJECT_TYPE must be one of: PLANET, ASTEROID, COMET, STAR

- LAND: Initiate landing sequence  
   Usage: "LAND:<SURFACE_TYPE>|<COORDINATES>"  
   • SURFACE_TYPE must be one of: ROCKY, SANDY, ICY

- SAMPLE: Collect sample from surface  
   Usage: "SAMPLE:<MATERIAL_TYPE>|<UNITS>|<COORDINATES>"  
   • MATERIAL_TYPE must be one of: ROCK, ICE, DUST, GAS

- COMM: Send communication to mission control  
   Usage: "COMM:<STATUS>|<BASE_COORDINATES>"  
   • STATUS can be: SUCCESS, CRITICAL, NEED_SUPPORT
"#;

const ACTION_REQUIREMENT: &str = r#"
Your response must follow this exact structure:

- "ACTION": 
  • Choose one of the following: "SCAN", "LAND", "SAMPLE", "COMM". 
  • If the message is unclear (e.g., missing essential information like coordinates) or specifies an impossible action (e.g., a negative quantity), respond with "REPEAT", and put all other fields as default.

- "TARGET": 
  • "COORDINATE": Provide a coordinate tuple in the form "(x, y)" that indicates the target location. If not applicable, leave it as an empty string ''.
  • "OBJECT": OBJECT_TYPE must be one of: PLANET, ASTEROID, COMET, STAR. If this information is not applicable, leave it as an empty string ''.

- "MATERIAL_DETAIL": 
  • "MATERIAL_TYPE": For SAMPLE commands, include the material type (must be one of: ROCK, ICE, DUST, GAS). For other actions, leave it as an empty string ''.
  • "VALUE": Provide an integer value associated with the material detail (for example, the sample quantity). If this value is not applicable, use -1.

- "SURFACE_TYPE": 
  • For LAND commands, provide the surface type (must be one of: ROCKY, SANDY, ICY). For other actions, leave it as an empty string ''.

For any field that does not apply to the current action, leave it as an empty string '' or -1 where indicated.
"#;

const OBJECT_TYPES: &[&str] = &["PLANET", "ASTEROID", "COMET", "STAR"];
const SURFACE_TYPES: &[&str] = &["ROCKY", "SANDY", "ICY"];
const MATERIAL_TYPES: &[&str] = &["ROCK", "ICE", "DUST", "GAS"];
const STATUSES: &[&str] = &["SUCCESS", "CRITICAL", "NEED_SUPPORT"];

pub static DEFINITION: ProtocolDefinition = ProtocolDefinition {
    domain: Domain::DeepSpace,
    command_grammar: COMMAND_GRAMMAR,
    action_requirement: ACTION_REQUIREMENT,
    categories: &["scan", "land", "sample", "comm", "bad"],
    default_preamble: "Welcome to the deep space mission! You'll receive messages from mission control and must decide your next action. ",
    protocol_preamble: "Welcome to the deep space mission! You'll receive messages following the protocol format below:\n",
    schema: || record("", "", "", "", -1, ""),
    blank: || record("", "", "", "", -1, ""),
    generator: generate,
};

fn record(
    action: &str,
    coordinate: &str,
    object: &str,
    material: &str,
    value: i64,
    surface: &str,
) -> Value {
    json!({
        "ACTION": action,
        "TARGET": {
            "COORDINATE": coordinate,
            "OBJECT": object,
        },
        "MATERIAL_DETAIL": {
            "MATERIAL_TYPE": material,
            "VALUE": value,
        },
        "SURFACE_TYPE": surface
    })
}

fn generate(category: &str, mode: Mode, rng: &mut dyn RngCore) -> Option<(String, Value)> {
    let pair = match category {
        "scan" => scan(mode, rng),
        "land" => land(mode, rng),
        "sample" => sample(mode, rng),
        "comm" => comm(mode, rng),
        "bad" => bad(mode, rng),
        _ => return None,
    };
    Some(pair)
}

fn scan(mode: Mode, rng: &mut dyn RngCore) -> (String, Value) {
    let object = pick(rng, OBJECT_TYPES);
    let at = coordinate(rng, 100);
    let message = match mode {
        Mode::Structured => format!("SCAN:{object} {at}"),
        Mode::NaturalLanguage => one_of(
            rng,
            vec![
                format!("Please scan the {object} located at {at}."),
                format!("Initiate scan on {object} near {at}."),
                format!("Scan {object} at {at}."),
                format!("Could you check out that {object} around {at}?"),
                format!("I need a scan on something that looks like a {object} at {at}."),
                format!("Run a scan on coordinates {at} for any sign of a {object}."),
            ],
        ),
    };
    (message, record("SCAN", &at, object, "", -1, ""))
}

fn land(mode: Mode, rng: &mut dyn RngCore) -> (String, Value) {
    let surface = pick(rng, SURFACE_TYPES);
    let at = coordinate(rng, 100);
    let message = match mode {
        Mode::Structured => format!("LAND:{surface}|{at}"),
        Mode::NaturalLanguage => one_of(
            rng,
            vec![
                format!("Prepare to land on a {surface} surface at {at}."),
                format!("Initiate landing sequence on {surface} terrain, coordinate {at}."),
                format!("Land at {at} on a {surface} area."),
                format!("Set course for a {surface} landing near {at}."),
                format!("Attempt descent onto {surface} ground at {at}."),
                format!("Touch down on {at} where the surface is {surface}."),
            ],
        ),
    };
    (message, record("LAND", &at, "", "", -1, surface))
}

fn sample(mode: Mode, rng: &mut dyn RngCore) -> (String, Value) {
    let material = pick(rng, MATERIAL_TYPES);
    let quantity = rng.gen_range(1..=50);
    let at = coordinate(rng, 100);
    let message = match mode {
        Mode::Structured => format!("SAMPLE:{material}|{quantity}|{at}"),
        Mode::NaturalLanguage => one_of(
            rng,
            vec![
                format!("We need {quantity} units of {material} from {at}."),
                format!("Sample {material} at {at} in quantity {quantity}."),
                format!("Request {quantity} {material} samples from {at}."),
                format!("Collect some {material} around {at}—about {quantity} units, I guess."),
                format!("Could you get me roughly {quantity} units of {material} from near {at}?"),
                format!("Check {at} for {material} samples, probably {quantity} of them."),
            ],
        ),
    };
    (message, record("SAMPLE", &at, "", material, quantity, ""))
}

fn comm(mode: Mode, rng: &mut dyn RngCore) -> (String, Value) {
    let status = pick(rng, STATUSES);
    let base = coordinate(rng, 100);
    let message = match mode {
        Mode::Structured => format!("COMM:{status}|{base}"),
        Mode::NaturalLanguage => one_of(
            rng,
            vec![
                format!("Send update: {status} at base coordinates {base}."),
                format!("Communication to mission control: {status}, located at {base}."),
                format!("Status report: {status} from {base}."),
                format!("Message HQ that we're at {base} with a status of {status}."),
                format!("Notify mission control: {status} at {base}."),
                format!("Relay {status} from our position at {base}."),
            ],
        ),
    };
    // The status itself has no slot in the action template.
    (message, record("COMM", &base, "", "", -1, ""))
}

fn bad(mode: Mode, rng: &mut dyn RngCore) -> (String, Value) {
    let at = coordinate(rng, 100);
    let quantity: i64 = rng.gen_range(-10..=10);
    let message = match mode {
        Mode::Structured => one_of(
            rng,
            vec![
                "SCAN".to_string(),
                format!("LAND |{at}"),
                "SAMPLE:| |".to_string(),
                format!("COMM: |{at}"),
                format!("SAMPLE:METAL|{quantity}|{at}"),
                format!("LAND:UNKNOWN|{at}"),
                "ASDHDKJK".to_string(),
                "LAND|||SCAM".to_string(),
            ],
        ),
        Mode::NaturalLanguage => one_of(
            rng,
            vec![
                "Scans".to_string(),
                format!("Land on {at}"),
                format!("Communication missing status at {at}."),
                format!("Request to collect {} units of GAS.", -quantity.abs()),
                format!("Send a communication from {at}."),
                format!("Request metal sample with {quantity} units at {at}."),
                format!("Maybe sample something near {at}?"),
                "What is our status?".to_string(),
                format!("Land and scan {at}"),
            ],
        ),
    };
    (message, DEFINITION.repeat_action())
}
