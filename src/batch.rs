// 📦 Batch replay - run a CSV script of what-if transactions through an engine
//
// Script headers: Counterparty,Product,Direction,Amount
// Rows that fail validation are reported and skipped; the run continues.

use crate::engine::SimulationEngine;
use crate::error::ValidationError;
use crate::model::TransactionRequest;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct ScriptRow {
    #[serde(rename = "Counterparty", default)]
    counterparty: Option<String>,

    #[serde(rename = "Product", default)]
    product: Option<String>,

    #[serde(rename = "Direction", default)]
    direction: Option<String>,

    #[serde(rename = "Amount", default)]
    amount: Option<String>,
}

/// A script row that did not make it into the log
#[derive(Debug, Clone, PartialEq)]
pub enum RowFailure {
    Invalid(ValidationError),
    /// Amount text that is not a number at all
    Unparseable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// 1-based line in the script (header is line 1)
    pub line: usize,
    pub failure: RowFailure,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub applied: usize,
    pub rejected: Vec<RejectedRow>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.applied + self.rejected.len()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ScriptRow {
    fn into_request(self) -> Result<TransactionRequest, RowFailure> {
        let amount = match non_empty(self.amount) {
            Some(text) => Some(
                Decimal::from_str(text.trim()).map_err(|_| RowFailure::Unparseable(text))?,
            ),
            None => None,
        };

        Ok(TransactionRequest {
            counterparty: non_empty(self.counterparty),
            product: non_empty(self.product),
            direction: non_empty(self.direction),
            amount,
        })
    }
}

/// Replay every row of `reader` into `engine`, in order
pub fn replay<R: Read>(engine: &mut SimulationEngine, reader: R) -> Result<BatchReport> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut report = BatchReport::default();

    for (index, result) in rdr.deserialize::<ScriptRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("Failed to read script line {}", line))?;

        let outcome = row
            .into_request()
            .and_then(|request| engine.apply(&request).map_err(RowFailure::Invalid));

        match outcome {
            Ok(_) => report.applied += 1,
            Err(failure) => {
                warn!(line, ?failure, "script row rejected");
                report.rejected.push(RejectedRow { line, failure });
            }
        }
    }

    Ok(report)
}

pub fn replay_file(engine: &mut SimulationEngine, path: &Path) -> Result<BatchReport> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open transaction script: {:?}", path))?;
    replay(engine, file)
}

// ============================================================================
// TESTS
// ============================================================================
