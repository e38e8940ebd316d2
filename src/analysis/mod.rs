// src/analysis/mod.rs

//! Offline analysis of persisted failure logs.

pub mod table;

use crate::error::{HarnessError, ParseError};
use crate::memory::{FailureRecord, load_failure_log};
use crate::normalize::Normalizer;
use crate::protocol::REPEAT_ACTION;
use crate::validation::mismatches;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use tracing::warn;

pub use table::AccuracyTable;

/// Produced-action label used when a reply could not be read.
pub const UNKNOWN_ACTION: &str = "unknown";

const EXAMPLES_PER_PAIR: usize = 5;
const COMMON_WORDS: usize = 10;

/// How a recorded reply was encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Already a mapping in the log.
    DictObject,
    /// Text holding a bare or fenced literal.
    DictString,
    /// Text with an assignment prefix, e.g. `ACTION_TEMPLATE = {...}`.
    Template,
    /// Any other text.
    Other,
    /// Not text and not a mapping.
    Unknown,
}

impl Encoding {
    pub fn label(self) -> &'static str {
        match self {
            Encoding::DictObject => "dict_object",
            Encoding::DictString => "dict_string",
            Encoding::Template => "template",
            Encoding::Other => "other",
            Encoding::Unknown => "unknown",
        }
    }
}

fn template_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\s*=").expect("valid template regex"))
}

pub fn classify(got: &Value) -> Encoding {
    match got {
        Value::Object(_) => Encoding::DictObject,
        Value::String(text) => {
            let text = text.trim();
            if text.starts_with('{') || text.starts_with("```") {
                Encoding::DictString
            } else if template_prefix().is_match(text) {
                Encoding::Template
            } else {
                Encoding::Other
            }
        }
        _ => Encoding::Unknown,
    }
}

/// A labelled count with its share of the total.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CountRow {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
    pub cumulative_percentage: f64,
}

/// Expected action (rows) against produced action (columns).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ContingencyTable {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl ContingencyTable {
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut rows: Vec<String> = pairs.iter().map(|(e, _)| e.clone()).collect();
        let mut columns: Vec<String> = pairs.iter().map(|(_, p)| p.clone()).collect();
        rows.sort();
        rows.dedup();
        columns.sort();
        columns.dedup();

        let mut counts = vec![vec![0; columns.len()]; rows.len()];
        for (expected, produced) in pairs {
            if let (Ok(r), Ok(c)) = (rows.binary_search(expected), columns.binary_search(produced)) {
                counts[r][c] += 1;
            }
        }
        Self { rows, columns, counts }
    }

    pub fn count(&self, expected: &str, produced: &str) -> usize {
        match (
            self.rows.iter().position(|r| r == expected),
            self.columns.iter().position(|c| c == produced),
        ) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    pub fn row_total(&self, expected: &str) -> usize {
        self.rows
            .iter()
            .position(|r| r == expected)
            .map(|r| self.counts[r].iter().sum())
            .unwrap_or(0)
    }

    pub fn column_total(&self, produced: &str) -> usize {
        self.columns
            .iter()
            .position(|c| c == produced)
            .map(|c| self.counts.iter().map(|row| row[c]).sum())
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Each row as percentages of that row's total, to two decimals.
    pub fn row_percentages(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .map(|row| {
                let total: usize = row.iter().sum();
                row.iter()
                    .map(|&n| if total == 0 { 0.0 } else { round2(n as f64 * 100.0 / total as f64) })
                    .collect()
            })
            .collect()
    }
}

/// Messages behind one (expected, produced) pair.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PairExamples {
    pub expected: String,
    pub produced: String,
    pub count: usize,
    pub messages: Vec<String>,
}

/// What `REPEAT` messages were mistaken for.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RepeatError {
    pub produced: String,
    pub count: usize,
    pub percentage: f64,
    pub common_words: Vec<(String, usize)>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Report {
    pub total_failures: usize,
    pub by_category: Vec<CountRow>,
    pub by_encoding: Vec<CountRow>,
    pub contingency: ContingencyTable,
    /// Field path to the number of same-action replies that got it wrong.
    pub field_mismatches: BTreeMap<String, usize>,
    /// First mismatch seen per field path, as a one-line description.
    pub field_examples: BTreeMap<String, String>,
    pub examples: Vec<PairExamples>,
    pub repeat_errors: Vec<RepeatError>,
    /// Records whose reply could not be read.
    pub unparsed: usize,
}

/// Builds a report from failure records without modifying them.
pub fn analyze(records: &[FailureRecord]) -> Report {
    let normalizer = Normalizer::new();
    let mut pairs: Vec<(String, String)> = Vec::with_capacity(records.len());
    let mut field_mismatches: BTreeMap<String, usize> = BTreeMap::new();
    let mut field_examples: BTreeMap<String, String> = BTreeMap::new();
    let mut unparsed = 0;

    for record in records {
        let expected_action = action_of(&record.expected).unwrap_or_else(|| UNKNOWN_ACTION.to_string());
        let produced = match produced_record(&normalizer, record) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(
                    message_type = %record.message_type,
                    incoming = %record.incoming,
                    error = %e,
                    "could not parse recorded reply"
                );
                unparsed += 1;
                pairs.push((expected_action, UNKNOWN_ACTION.to_string()));
                continue;
            }
        };

        let produced_action = action_of(&produced).unwrap_or_else(|| UNKNOWN_ACTION.to_string());
        if produced_action == expected_action {
            for mismatch in mismatches(&record.expected, &produced) {
                let path = mismatch.path();
                if !path.eq_ignore_ascii_case("ACTION") {
                    *field_mismatches.entry(path.to_string()).or_default() += 1;
                    field_examples
                        .entry(path.to_string())
                        .or_insert_with(|| mismatch.hint());
                }
            }
        }
        pairs.push((expected_action, produced_action));
    }

    let total = records.len();
    Report {
        total_failures: total,
        by_category: count_rows(records.iter().map(|r| r.message_type.clone()), total),
        by_encoding: count_rows(records.iter().map(|r| classify(&r.got).label().to_string()), total),
        contingency: ContingencyTable::from_pairs(&pairs),
        field_mismatches,
        field_examples,
        examples: pair_examples(records, &pairs),
        repeat_errors: repeat_errors(records, &pairs),
        unparsed,
    }
}

pub fn analyze_file(path: &Path) -> Result<Report, HarnessError> {
    let records = load_failure_log(path)?;
    Ok(analyze(&records))
}

fn produced_record(normalizer: &Normalizer, record: &FailureRecord) -> Result<Value, ParseError> {
    normalizer.normalize_value(&record.got)
}

// Upper-cased so that `move` and `MOVE` land in the same column.
fn action_of(record: &Value) -> Option<String> {
    record
        .as_object()?
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("ACTION"))
        .and_then(|(_, v)| v.as_str())
        .map(|s| s.trim().to_uppercase())
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// Descending by count, ties by label.
fn count_rows(labels: impl Iterator<Item = String>, total: usize) -> Vec<CountRow> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut cumulative = 0.0;
    sorted
        .into_iter()
        .map(|(label, count)| {
            let percentage = if total == 0 { 0.0 } else { round2(count as f64 * 100.0 / total as f64) };
            cumulative = round2(cumulative + percentage);
            CountRow {
                label,
                count,
                percentage,
                cumulative_percentage: cumulative,
            }
        })
        .collect()
}

fn pair_examples(records: &[FailureRecord], pairs: &[(String, String)]) -> Vec<PairExamples> {
    let mut grouped: BTreeMap<(&str, &str), PairExamples> = BTreeMap::new();
    for (record, (expected, produced)) in records.iter().zip(pairs) {
        if expected == produced {
            continue;
        }
        let entry = grouped
            .entry((expected.as_str(), produced.as_str()))
            .or_insert_with(|| PairExamples {
                expected: expected.clone(),
                produced: produced.clone(),
                count: 0,
                messages: Vec::new(),
            });
        entry.count += 1;
        if entry.messages.len() < EXAMPLES_PER_PAIR {
            entry.messages.push(record.incoming.clone());
        }
    }
    grouped.into_values().collect()
}

fn repeat_errors(records: &[FailureRecord], pairs: &[(String, String)]) -> Vec<RepeatError> {
    let mut by_action: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (record, (expected, produced)) in records.iter().zip(pairs) {
        if expected == REPEAT_ACTION && produced != REPEAT_ACTION {
            by_action.entry(produced.as_str()).or_default().push(&record.incoming);
        }
    }
    let total: usize = by_action.values().map(Vec::len).sum();

    by_action
        .into_iter()
        .map(|(produced, messages)| RepeatError {
            produced: produced.to_string(),
            count: messages.len(),
            percentage: round2(messages.len() as f64 * 100.0 / total as f64),
            common_words: common_words(&messages, COMMON_WORDS),
        })
        .collect()
}

// Most frequent lower-cased words; ties keep first-seen order.
fn common_words(messages: &[&str], limit: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for word in messages.iter().flat_map(|m| m.split_whitespace()) {
        let word = word.to_lowercase();
        match counts.iter_mut().find(|(w, _)| *w == word) {
            Some((_, n)) => *n += 1,
            None => counts.push((word, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total failures: {}", self.total_failures)?;
        if self.unparsed > 0 {
            writeln!(f, "Unreadable replies: {}", self.unparsed)?;
        }

        writeln!(f, "\nFailures by message type:")?;
        for row in &self.by_category {
            writeln!(
                f,
                "  {:<12} {:>5} {:>7.2}% {:>7.2}%",
                row.label, row.count, row.percentage, row.cumulative_percentage
            )?;
        }

        writeln!(f, "\nFailures by response format:")?;
        for row in &self.by_encoding {
            writeln!(f, "  {:<12} {:>5} {:>7.2}%", row.label, row.count, row.percentage)?;
        }

        let table = &self.contingency;
        if !table.rows.is_empty() {
            writeln!(f, "\nExpected vs. produced action:")?;
            write!(f, "  {:<14}", "")?;
            for column in &table.columns {
                write!(f, "{column:>14}")?;
            }
            writeln!(f, "{:>8}", "Total")?;
            for (row, counts) in table.rows.iter().zip(&table.counts) {
                write!(f, "  {row:<14}")?;
                for n in counts {
                    write!(f, "{n:>14}")?;
                }
                writeln!(f, "{:>8}", table.row_total(row))?;
            }
            write!(f, "  {:<14}", "Total")?;
            for column in &table.columns {
                write!(f, "{:>14}", table.column_total(column))?;
            }
            writeln!(f, "{:>8}", table.total())?;

            writeln!(f, "\nRow percentages:")?;
            for (row, percentages) in table.rows.iter().zip(table.row_percentages()) {
                write!(f, "  {row:<14}")?;
                for p in percentages {
                    write!(f, "{p:>13.2}%")?;
                }
                writeln!(f)?;
            }
        }

        if !self.field_mismatches.is_empty() {
            writeln!(f, "\nField mismatches (action correct):")?;
            for (path, n) in &self.field_mismatches {
                match self.field_examples.get(path) {
                    Some(hint) => writeln!(f, "  {path:<28} {n:>5}  e.g. {hint}")?,
                    None => writeln!(f, "  {path:<28} {n:>5}")?,
                }
            }
        }

        for pair in &self.examples {
            writeln!(
                f,
                "\nExpected {}, got {} ({} instances):",
                pair.expected, pair.produced, pair.count
            )?;
            for message in &pair.messages {
                writeln!(f, "  - '{message}'")?;
            }
        }

        if !self.repeat_errors.is_empty() {
            writeln!(f, "\nREPEAT misclassifications:")?;
            for error in &self.repeat_errors {
                writeln!(
                    f,
                    "  as {:<12} {:>5} {:>7.2}%  common words: {:?}",
                    error.produced, error.count, error.percentage, error.common_words
                )?;
            }
        }
        Ok(())
    }
}
