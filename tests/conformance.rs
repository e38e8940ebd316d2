use protocol_harness::agent::Respondent;
use protocol_harness::normalize::{Normalizer, to_literal};
use protocol_harness::protocol::{BAD_CATEGORY, REPEAT_ACTION};
use protocol_harness::runner::TrialRunner;
use protocol_harness::validation::{Verdict, verify, verify_reply};
use protocol_harness::{Domain, Mode, Synthesizer, TransportError};
use serde_json::json;
use std::cell::RefCell;
use std::collections::BTreeMap;

#[test]
fn instructions_match_recorded_fixtures() {
    let fixtures = [
        (Domain::Resource, Mode::Structured, include_str!("fixtures/resource_structured.txt")),
        (Domain::Resource, Mode::NaturalLanguage, include_str!("fixtures/resource_unstructured.txt")),
        (Domain::DeepSpace, Mode::Structured, include_str!("fixtures/deep_space_structured.txt")),
        (Domain::DeepSpace, Mode::NaturalLanguage, include_str!("fixtures/deep_space_unstructured.txt")),
        (Domain::Minecraft, Mode::Structured, include_str!("fixtures/minecraft_structured.txt")),
        (Domain::Minecraft, Mode::NaturalLanguage, include_str!("fixtures/minecraft_unstructured.txt")),
    ];
    for (domain, mode, fixture) in fixtures {
        assert_eq!(
            domain.definition().system_instructions(mode),
            fixture,
            "{domain} / {mode}"
        );
    }
}

#[test]
fn move_reply_with_assignment_prefix_verifies() {
    let expected = json!({
        "ACTION": "MOVE",
        "LOCATION": {"COORDINATE": "(3, 4)", "AREA": ""},
        "RESOURCE": {"TYPE": "", "QUANTITY": -1}
    });
    let reply = "ACTION_TEMPLATE = {'ACTION': 'MOVE', 'LOCATION': {'COORDINATE': '(3, 4)', \
                 'AREA': ''}, 'RESOURCE': {'TYPE': '', 'QUANTITY': -1}}";
    assert!(verify_reply(&Normalizer::new(), &expected, reply).is_success());
}

#[test]
fn material_type_compares_without_case() {
    let expected = json!({
        "ACTION": "SAMPLE",
        "TARGET": {"COORDINATE": "(12, 40)", "OBJECT": ""},
        "MATERIAL_DETAIL": {"MATERIAL_TYPE": "ROCK", "VALUE": 7},
        "SURFACE_TYPE": ""
    });
    let lower = "```python\n{'action': 'sample', 'target': {'coordinate': '(12, 40)', 'object': ''}, \
                 'material_detail': {'material_type': 'rock', 'value': 7}, 'surface_type': ''}\n```";
    assert!(verify_reply(&Normalizer::new(), &expected, lower).is_success());

    let wrong = "{'ACTION': 'SAMPLE', 'TARGET': {'COORDINATE': '(12, 40)', 'OBJECT': ''}, \
                 'MATERIAL_DETAIL': {'MATERIAL_TYPE': 'ICE', 'VALUE': 7}, 'SURFACE_TYPE': ''}";
    assert!(matches!(
        verify_reply(&Normalizer::new(), &expected, wrong),
        Verdict::Mismatch(_)
    ));
}

#[test]
fn rendered_expected_records_verify_in_every_domain() {
    let normalizer = Normalizer::new();
    for domain in Domain::ALL {
        let mut synthesizer = Synthesizer::seeded(domain, 99);
        for &category in domain.definition().categories {
            for mode in Mode::ALL {
                for _ in 0..10 {
                    let synthesized = synthesizer.generate(category, mode).unwrap();
                    let reply = format!("ACTION_TEMPLATE = {}", to_literal(&synthesized.expected_action));
                    assert!(
                        verify_reply(&normalizer, &synthesized.expected_action, &reply).is_success(),
                        "{domain} {category} {mode}: {reply}"
                    );
                }
            }
        }
    }
}

#[test]
fn bad_messages_always_expect_repeat() {
    for domain in Domain::ALL {
        let mut synthesizer = Synthesizer::seeded(domain, 5);
        for mode in Mode::ALL {
            let synthesized = synthesizer.generate(BAD_CATEGORY, mode).unwrap();
            assert_eq!(synthesized.expected_action, domain.definition().repeat_action());
            assert_eq!(synthesized.expected_action["ACTION"], REPEAT_ACTION);
        }
    }
}

#[test]
fn absent_reply_never_verifies() {
    assert!(!verify(&json!({"ACTION": "MOVE"}), None));
}

#[test]
fn tallies_account_for_every_trial() {
    let respondent = |message: &str, _: Mode| -> Result<String, TransportError> {
        match message.len() % 3 {
            0 => Ok("{'ACTION': 'REPEAT'}".into()),
            1 => Err(TransportError::MissingContent),
            _ => Ok("no literal here".into()),
        }
    };
    for domain in Domain::ALL {
        let outcome = TrialRunner::new(Synthesizer::seeded(domain, 3), &respondent)
            .capture_failures(true)
            .run(60, Mode::NaturalLanguage)
            .unwrap();
        let totals = outcome.aggregate.totals();
        assert_eq!(totals.total(), 60);
        assert_eq!(totals.failure as usize, outcome.failures.len());

        // The same seed yields the same category sequence.
        let mut replay = Synthesizer::seeded(domain, 3);
        let mut observed: BTreeMap<&str, u32> = BTreeMap::new();
        for _ in 0..60 {
            let (_, category) = replay.random_category(Mode::NaturalLanguage).unwrap();
            *observed.entry(category).or_default() += 1;
        }
        for (category, tally) in outcome.aggregate.iter() {
            assert!(domain.definition().has_category(category));
            assert_eq!(tally.total(), observed[category], "{domain} {category}");
        }
        for (category, count) in &observed {
            assert_eq!(outcome.aggregate.get(category).unwrap().total(), *count);
        }
    }
}

// Answers with the exact record a second, identically seeded synthesizer
// expects for the same trial.
struct Oracle {
    shadow: RefCell<Synthesizer>,
}

impl Respondent for Oracle {
    fn respond(&self, _message: &str, mode: Mode) -> Result<String, TransportError> {
        let (synthesized, _) = self.shadow.borrow_mut().random_category(mode).unwrap();
        Ok(to_literal(&synthesized.expected_action))
    }
}

#[test]
fn perfect_respondent_scores_every_category() {
    let oracle = Oracle {
        shadow: RefCell::new(Synthesizer::seeded(Domain::Minecraft, 11)),
    };
    let outcome = TrialRunner::new(Synthesizer::seeded(Domain::Minecraft, 11), &oracle)
        .capture_failures(true)
        .run(50, Mode::Structured)
        .unwrap();
    assert_eq!(outcome.aggregate.totals().failure, 0);
    assert_eq!(outcome.aggregate.totals().success, 50);
    assert!(outcome.failures.is_empty());
    assert!(
        outcome
            .aggregate
            .iter()
            .all(|(_, tally)| tally.accuracy() == Some(100.0))
    );
}
