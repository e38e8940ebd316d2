use protocol_harness::analysis::{AccuracyTable, Encoding, UNKNOWN_ACTION, analyze, analyze_file, classify};
use protocol_harness::memory::{FailureRecord, write_failure_log};
use protocol_harness::runner::{AggregateResult, DomainResults, read_results, write_results};
use protocol_harness::Mode;
use serde_json::{Value, json};

fn resource(action: &str, coordinate: &str, kind: &str, quantity: i64) -> Value {
    json!({
        "ACTION": action,
        "LOCATION": {"COORDINATE": coordinate, "AREA": ""},
        "RESOURCE": {"TYPE": kind, "QUANTITY": quantity}
    })
}

fn failure(message_type: &str, incoming: &str, expected: Value, got: Value) -> FailureRecord {
    FailureRecord {
        message_type: message_type.into(),
        incoming: incoming.into(),
        expected,
        got,
    }
}

fn sample_log() -> Vec<FailureRecord> {
    vec![
        // Right action, wrong quantity.
        failure(
            "gather",
            "GTHR:WOOD 42",
            resource("COLLECT", "", "WOOD", 42),
            json!({"ACTION": "collect", "LOCATION": {"COORDINATE": "", "AREA": ""},
                   "RESOURCE": {"TYPE": "wood", "QUANTITY": 24}}),
        ),
        // Wrong action, reply stored as template text.
        failure(
            "send",
            "SEND:STONE|3|(1, 2)",
            resource("SEND", "(1, 2)", "STONE", 3),
            json!("ACTION_TEMPLATE = {'ACTION': 'MOVE', 'LOCATION': {'COORDINATE': '(1, 2)', 'AREA': ''}}"),
        ),
        failure(
            "bad",
            "Move to the place",
            resource("REPEAT", "", "", -1),
            json!("{'ACTION': 'MOVE'}"),
        ),
        failure(
            "bad",
            "move there now",
            resource("REPEAT", "", "", -1),
            json!({"ACTION": "MOVE"}),
        ),
        failure(
            "bad",
            "Collect the wood",
            resource("REPEAT", "", "", -1),
            json!("I'm not sure what you mean."),
        ),
    ]
}

#[test]
fn failure_log_report_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resource_structured_failures_gpt-4o.json");
    write_failure_log(&path, &sample_log()).unwrap();

    let report = analyze_file(&path).unwrap();
    assert_eq!(report.total_failures, 5);
    assert_eq!(report.unparsed, 1);

    assert_eq!(report.by_category[0].label, "bad");
    assert_eq!(report.by_category[0].count, 3);
    assert_eq!(report.by_category[0].percentage, 60.0);
    assert_eq!(report.by_category.last().unwrap().cumulative_percentage, 100.0);

    let table = &report.contingency;
    assert_eq!(table.total(), 5);
    assert_eq!(table.count("REPEAT", "MOVE"), 2);
    assert_eq!(table.count("REPEAT", UNKNOWN_ACTION), 1);
    assert_eq!(table.count("SEND", "MOVE"), 1);
    assert_eq!(table.count("COLLECT", "COLLECT"), 1);
    assert_eq!(table.row_total("REPEAT"), 3);
    assert_eq!(table.column_total("MOVE"), 3);

    assert_eq!(report.field_mismatches.get("RESOURCE.QUANTITY"), Some(&1));
    assert!(!report.field_mismatches.contains_key("RESOURCE.TYPE"));
    assert!(!report.field_mismatches.contains_key("ACTION"));
    assert_eq!(
        report.field_examples["RESOURCE.QUANTITY"],
        "RESOURCE.QUANTITY: expected 42, got 24"
    );

    let repeat_as_move = report
        .repeat_errors
        .iter()
        .find(|e| e.produced == "MOVE")
        .unwrap();
    assert_eq!(repeat_as_move.count, 2);
    assert_eq!(repeat_as_move.common_words[0], ("move".to_string(), 2));

    let pair = report
        .examples
        .iter()
        .find(|p| p.expected == "SEND" && p.produced == "MOVE")
        .unwrap();
    assert_eq!(pair.messages, vec!["SEND:STONE|3|(1, 2)".to_string()]);

    let rendered = report.to_string();
    assert!(rendered.contains("Total failures: 5"));
    assert!(rendered.contains("REPEAT misclassifications"));
    assert!(rendered.contains("e.g. RESOURCE.QUANTITY: expected 42, got 24"));
}

#[test]
fn encoding_breakdown_covers_every_record() {
    let log = sample_log();
    let report = analyze(&log);
    let counted: usize = report.by_encoding.iter().map(|r| r.count).sum();
    assert_eq!(counted, log.len());
    assert_eq!(classify(&log[1].got), Encoding::Template);
    assert_eq!(classify(&log[2].got), Encoding::DictString);
    assert_eq!(classify(&log[4].got), Encoding::Other);
}

#[test]
fn results_round_trip_into_accuracy_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test_results_resource_gpt-4o.json");

    let mut results = DomainResults::default();
    let mut structured = AggregateResult::new();
    for success in [true, true, true, false] {
        structured.record("send", success);
    }
    results.set(Mode::Structured, structured);
    write_results(&path, "gpt-4o", &results).unwrap();

    let file = read_results(&path).unwrap();
    let table = AccuracyTable::from_results(&file);
    assert_eq!(table.cell("gpt-4o", "send", Mode::Structured), Some(75.0));
    assert_eq!(table.cell("gpt-4o", "send", Mode::NaturalLanguage), None);
}
