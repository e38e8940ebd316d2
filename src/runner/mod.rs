// src/runner/mod.rs

//! Drives synthetic trials against a respondent and tallies the outcomes.

use crate::agent::Respondent;
use crate::error::{HarnessError, ParseError, SynthesisError, TransportError};
use crate::memory::{FailureLog, FailureRecord, InMemoryFailureLog};
use crate::normalize::Normalizer;
use crate::protocol::{Domain, Mode};
use crate::synth::Synthesizer;
use crate::validation::{Verdict, verify_reply};
use rand::RngCore;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub success: u32,
    pub failure: u32,
}

impl CategoryTally {
    pub fn total(&self) -> u32 {
        self.success + self.failure
    }

    /// Success percentage, `None` when nothing was observed.
    pub fn accuracy(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(f64::from(self.success) * 100.0 / f64::from(total)),
        }
    }
}

/// Per-category success and failure counts for one run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateResult {
    categories: BTreeMap<String, CategoryTally>,
}

impl AggregateResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, category: &str, success: bool) {
        let tally = self.categories.entry(category.to_string()).or_default();
        if success {
            tally.success += 1;
        } else {
            tally.failure += 1;
        }
    }

    pub fn get(&self, category: &str) -> Option<&CategoryTally> {
        self.categories.get(category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryTally)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn totals(&self) -> CategoryTally {
        self.categories
            .values()
            .fold(CategoryTally::default(), |acc, t| CategoryTally {
                success: acc.success + t.success,
                failure: acc.failure + t.failure,
            })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FailureKind {
    Transport(TransportError),
    Parse(ParseError),
    Mismatch,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Success,
    Failure(FailureKind),
}

/// Everything known about one trial. Short-lived: folded into the aggregate
/// and, on failure, into the failure log.
#[derive(Clone, Debug)]
pub struct Trial {
    pub message_type: &'static str,
    pub message: String,
    pub expected_action: Value,
    pub raw_reply: Option<String>,
    pub parsed_reply: Option<Value>,
    pub outcome: Outcome,
}

impl Trial {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// What the failure log stores as `got`: the parsed reply when there is
    /// one, else the raw text, else the transport error.
    pub fn recorded_reply(&self) -> Value {
        if let Some(parsed) = &self.parsed_reply {
            return parsed.clone();
        }
        if let Some(raw) = &self.raw_reply {
            return Value::String(raw.clone());
        }
        match &self.outcome {
            Outcome::Failure(FailureKind::Transport(e)) => Value::String(format!("transport error: {e}")),
            _ => Value::Null,
        }
    }

    fn failure_record(&self) -> FailureRecord {
        FailureRecord {
            message_type: self.message_type.to_string(),
            incoming: self.message.clone(),
            expected: self.expected_action.clone(),
            got: self.recorded_reply(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RunOutcome {
    pub aggregate: AggregateResult,
    pub failures: InMemoryFailureLog,
}

pub struct TrialRunner<'a, R = ChaCha8Rng> {
    synthesizer: Synthesizer<R>,
    respondent: &'a dyn Respondent,
    normalizer: Normalizer,
    capture_failures: bool,
}

impl<'a, R: RngCore> TrialRunner<'a, R> {
    pub fn new(synthesizer: Synthesizer<R>, respondent: &'a dyn Respondent) -> Self {
        Self {
            synthesizer,
            respondent,
            normalizer: Normalizer::new(),
            capture_failures: false,
        }
    }

    pub fn capture_failures(mut self, enabled: bool) -> Self {
        self.capture_failures = enabled;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Synthesizes one message, asks the respondent once, and verifies the reply.
    pub fn run_trial(&mut self, mode: Mode) -> Result<Trial, SynthesisError> {
        let (synthesized, category) = self.synthesizer.random_category(mode)?;
        let mut trial = Trial {
            message_type: category,
            message: synthesized.message,
            expected_action: synthesized.expected_action,
            raw_reply: None,
            parsed_reply: None,
            outcome: Outcome::Success,
        };

        match self.respondent.respond(&trial.message, mode) {
            Err(e) => {
                warn!(category, error = %e, "respondent produced no reply");
                trial.outcome = Outcome::Failure(FailureKind::Transport(e));
            }
            Ok(reply) => {
                let verdict = verify_reply(&self.normalizer, &trial.expected_action, &reply);
                trial.raw_reply = Some(reply);
                match verdict {
                    Verdict::Match(parsed) => trial.parsed_reply = Some(parsed),
                    Verdict::Mismatch(parsed) => {
                        trial.parsed_reply = Some(parsed);
                        trial.outcome = Outcome::Failure(FailureKind::Mismatch);
                    }
                    Verdict::Unparseable(e) => {
                        debug!(category, error = %e, "reply could not be parsed");
                        trial.outcome = Outcome::Failure(FailureKind::Parse(e));
                    }
                }
            }
        }

        debug!(
            category,
            incoming = %trial.message,
            outcome = ?trial.outcome,
            "trial finished"
        );
        Ok(trial)
    }

    /// Runs `trial_count` sequential trials in `mode`.
    pub fn run(&mut self, trial_count: usize, mode: Mode) -> Result<RunOutcome, SynthesisError> {
        let domain = self.synthesizer.domain();
        let mut outcome = RunOutcome::default();

        for _ in 0..trial_count {
            let trial = self.run_trial(mode)?;
            outcome.aggregate.record(trial.message_type, trial.is_success());
            if !trial.is_success() && self.capture_failures {
                outcome.failures.log(trial.failure_record());
            }
        }

        let totals = outcome.aggregate.totals();
        info!(
            %domain,
            %mode,
            trials = trial_count,
            success = totals.success,
            failure = totals.failure,
            "run complete"
        );
        Ok(outcome)
    }
}

/// One-call entry point: builds a synthesizer (seeded when `seed` is given)
/// and runs the trials.
pub fn run(
    domain: Domain,
    respondent: &dyn Respondent,
    trial_count: usize,
    mode: Mode,
    capture_failures: bool,
    seed: Option<u64>,
) -> Result<RunOutcome, SynthesisError> {
    let synthesizer = match seed {
        Some(seed) => Synthesizer::seeded(domain, seed),
        None => Synthesizer::from_entropy(domain),
    };
    TrialRunner::new(synthesizer, respondent)
        .capture_failures(capture_failures)
        .run(trial_count, mode)
}

/// Both modes of one domain for one model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainResults {
    pub structured: AggregateResult,
    pub unstructured: AggregateResult,
}

impl DomainResults {
    pub fn get(&self, mode: Mode) -> &AggregateResult {
        match mode {
            Mode::Structured => &self.structured,
            Mode::NaturalLanguage => &self.unstructured,
        }
    }

    pub fn set(&mut self, mode: Mode, aggregate: AggregateResult) {
        match mode {
            Mode::Structured => self.structured = aggregate,
            Mode::NaturalLanguage => self.unstructured = aggregate,
        }
    }
}

/// Results file contents: model identifier to per-mode aggregates.
pub type ResultsFile = BTreeMap<String, DomainResults>;

pub fn write_results(path: &Path, model: &str, results: &DomainResults) -> Result<(), HarnessError> {
    let mut file = ResultsFile::new();
    file.insert(model.to_string(), results.clone());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(&file)?;
    fs::write(path, json).map_err(|e| HarnessError::io(path, e))
}

pub fn read_results(path: &Path) -> Result<ResultsFile, HarnessError> {
    let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}
