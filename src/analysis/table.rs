// src/analysis/table.rs

use crate::protocol::Mode;
use crate::runner::ResultsFile;
use std::collections::BTreeSet;
use std::fmt;

/// Success percentage per model for every (category, mode) pair.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccuracyTable {
    pub categories: Vec<String>,
    pub rows: Vec<AccuracyRow>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AccuracyRow {
    pub model: String,
    /// One cell per category and mode, in `categories` x `Mode::ALL` order.
    /// `None` when that pair was never observed.
    pub cells: Vec<Option<f64>>,
}

impl AccuracyTable {
    pub fn from_results(results: &ResultsFile) -> Self {
        let categories: BTreeSet<String> = results
            .values()
            .flat_map(|r| Mode::ALL.into_iter().flat_map(move |m| r.get(m).iter().map(|(c, _)| c.to_string())))
            .collect();
        let categories: Vec<String> = categories.into_iter().collect();

        let rows = results
            .iter()
            .map(|(model, domain_results)| AccuracyRow {
                model: model.clone(),
                cells: categories
                    .iter()
                    .flat_map(|category| {
                        Mode::ALL.into_iter().map(move |mode| {
                            domain_results
                                .get(mode)
                                .get(category)
                                .and_then(|tally| tally.accuracy())
                                .map(|acc| (acc * 100.0).round() / 100.0)
                        })
                    })
                    .collect(),
            })
            .collect();

        Self { categories, rows }
    }

    pub fn cell(&self, model: &str, category: &str, mode: Mode) -> Option<f64> {
        let row = self.rows.iter().find(|r| r.model == model)?;
        let c = self.categories.iter().position(|c| c == category)?;
        let m = Mode::ALL.iter().position(|&x| x == mode)?;
        row.cells[c * Mode::ALL.len() + m]
    }
}

impl fmt::Display for AccuracyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.rows.iter().map(|r| r.model.len()).max().unwrap_or(5).max(5);
        write!(f, "{:<width$}", "model")?;
        for category in &self.categories {
            for mode in Mode::ALL {
                write!(f, " {:>22}", format!("{category}/{mode}"))?;
            }
        }
        writeln!(f)?;
        for row in &self.rows {
            write!(f, "{:<width$}", row.model)?;
            for cell in &row.cells {
                match cell {
                    Some(acc) => write!(f, " {acc:>22.2}")?,
                    None => write!(f, " {:>22}", "-")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
