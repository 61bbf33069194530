// 🏦 Baseline Store - Reference balance sheet + original LCR metrics
// Built once at process start, immutable afterwards

use crate::config::BaselineConfig;
use crate::model::{BalanceSheetEntry, LcrMetrics, ProductType};
use anyhow::{anyhow, bail, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

// ============================================================================
// BASELINE STORE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct BaselineStore {
    balance_sheet: Vec<BalanceSheetEntry>,
    metrics: LcrMetrics,
}

impl BaselineStore {
    /// Build a store from explicit data, rejecting inconsistent baselines
    pub fn new(balance_sheet: Vec<BalanceSheetEntry>, metrics: LcrMetrics) -> Result<Self> {
        validate_metrics(&metrics)?;

        if let Some(entry) = balance_sheet.iter().find(|e| e.amount < Decimal::ZERO) {
            bail!(
                "Balance sheet amount must not be negative: {} / {} = {}",
                entry.counterparty,
                entry.product,
                entry.amount
            );
        }

        Ok(BaselineStore {
            balance_sheet,
            metrics,
        })
    }

    /// Load from configuration; anything not configured falls back to the built-in data
    pub fn load(config: &BaselineConfig) -> Result<Self> {
        let balance_sheet = match &config.balance_sheet_csv {
            Some(path) => load_balance_sheet_csv(path)?,
            None => default_balance_sheet(),
        };
        let metrics = config.metrics.unwrap_or_else(default_metrics);

        let store = BaselineStore::new(balance_sheet, metrics)?;
        info!(
            entries = store.balance_sheet.len(),
            lcr_percent = %store.metrics.lcr_percent,
            "baseline loaded"
        );
        Ok(store)
    }

    /// Balance sheet in fixed display order
    pub fn balance_sheet(&self) -> &[BalanceSheetEntry] {
        &self.balance_sheet
    }

    /// Original metrics. Returned by value so callers can never touch the baseline.
    pub fn baseline_metrics(&self) -> LcrMetrics {
        self.metrics
    }

    /// Distinct counterparties in first-seen order
    pub fn counterparties(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for entry in &self.balance_sheet {
            if !seen.contains(&entry.counterparty) {
                seen.push(entry.counterparty.clone());
            }
        }
        seen
    }

    /// Distinct products in first-seen order
    pub fn products(&self) -> Vec<ProductType> {
        let mut seen: Vec<ProductType> = Vec::new();
        for entry in &self.balance_sheet {
            if !seen.contains(&entry.product) {
                seen.push(entry.product);
            }
        }
        seen
    }
}

impl Default for BaselineStore {
    fn default() -> Self {
        BaselineStore {
            balance_sheet: default_balance_sheet(),
            metrics: default_metrics(),
        }
    }
}

// ============================================================================
// BUILT-IN DATA
// ============================================================================

pub fn default_balance_sheet() -> Vec<BalanceSheetEntry> {
    vec![
        BalanceSheetEntry::new("Bank A", ProductType::Loans, Decimal::from(500)),
        BalanceSheetEntry::new("Bank A", ProductType::Deposits, Decimal::from(400)),
        BalanceSheetEntry::new("Bank B", ProductType::Bonds, Decimal::from(300)),
        BalanceSheetEntry::new("Bank B", ProductType::Borrowings, Decimal::from(200)),
        BalanceSheetEntry::new("Bank C", ProductType::Derivatives, Decimal::from(150)),
        BalanceSheetEntry::new("Bank C", ProductType::CentralBankReserves, Decimal::from(300)),
    ]
}

pub fn default_metrics() -> LcrMetrics {
    LcrMetrics {
        hqla: Decimal::from(1300),
        inflows: Decimal::from(300),
        outflows: Decimal::from(1100),
        net_cash_outflows: Decimal::from(800),
        // 162.5
        lcr_percent: Decimal::new(1625, 1),
    }
}

fn validate_metrics(metrics: &LcrMetrics) -> Result<()> {
    for (label, value) in metrics.rows() {
        if value < Decimal::ZERO {
            bail!("Baseline metric {} must not be negative, got {}", label, value);
        }
    }
    if metrics.net_cash_outflows <= Decimal::ZERO {
        bail!(
            "Baseline net cash outflows must be positive, got {}",
            metrics.net_cash_outflows
        );
    }
    Ok(())
}

// ============================================================================
// CSV LOADING
// ============================================================================

#[derive(Debug, Deserialize)]
struct BalanceSheetRow {
    #[serde(rename = "Counterparty")]
    counterparty: String,

    #[serde(rename = "Product")]
    product: String,

    #[serde(rename = "Amount")]
    amount: String,
}

/// Read a balance sheet from CSV with headers `Counterparty,Product,Amount`
pub fn load_balance_sheet_csv(csv_path: &Path) -> Result<Vec<BalanceSheetEntry>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open balance sheet CSV: {:?}", csv_path))?;

    let mut entries = Vec::new();

    for (index, result) in rdr.deserialize().enumerate() {
        // header is line 1
        let line = index + 2;
        let row: BalanceSheetRow =
            result.with_context(|| format!("Failed to deserialize balance sheet line {}", line))?;

        let product = ProductType::from_str(&row.product)
            .map_err(|e| anyhow!("Balance sheet line {}: {}", line, e))?;
        let amount = Decimal::from_str(row.amount.trim())
            .with_context(|| format!("Balance sheet line {}: invalid amount {:?}", line, row.amount))?;

        entries.push(BalanceSheetEntry::new(row.counterparty.trim(), product, amount));
    }

    if entries.is_empty() {
        bail!("Balance sheet CSV {:?} contains no entries", csv_path);
    }

    Ok(entries)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_baseline() {
        let store = BaselineStore::default();

        assert_eq!(store.balance_sheet().len(), 6);
        assert_eq!(store.balance_sheet()[0].counterparty, "Bank A");
        assert_eq!(store.balance_sheet()[5].product, ProductType::CentralBankReserves);
        assert_eq!(store.baseline_metrics().lcr_percent, dec!(162.5));
        assert_eq!(store.baseline_metrics().net_cash_outflows, dec!(800));
    }

    #[test]
    fn test_counterparties_first_seen_order() {
        let store = BaselineStore::default();
        assert_eq!(store.counterparties(), vec!["Bank A", "Bank B", "Bank C"]);
        assert_eq!(store.products(), ProductType::ALL.to_vec());
    }

    #[test]
    fn test_baseline_metrics_is_a_copy() {
        let store = BaselineStore::default();
        let mut metrics = store.baseline_metrics();
        metrics.lcr_percent = dec!(0);

        assert_eq!(store.baseline_metrics().lcr_percent, dec!(162.5));
    }

    #[test]
    fn test_load_defaults_when_unconfigured() {
        let store = BaselineStore::load(&BaselineConfig::default()).unwrap();
        assert_eq!(store, BaselineStore::default());
    }

    #[test]
    fn test_load_balance_sheet_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("balance_sheet.csv");
        fs::write(
            &path,
            "Counterparty,Product,Amount\nBank X,Bonds,250.75\nBank Y,Central Bank Reserves,10\n",
        )
        .unwrap();

        let config = BaselineConfig {
            balance_sheet_csv: Some(path),
            metrics: None,
        };
        let store = BaselineStore::load(&config).unwrap();

        assert_eq!(store.balance_sheet().len(), 2);
        assert_eq!(store.balance_sheet()[0].amount, dec!(250.75));
        assert_eq!(store.balance_sheet()[1].product, ProductType::CentralBankReserves);
        assert_eq!(store.counterparties(), vec!["Bank X", "Bank Y"]);
    }

    #[test]
    fn test_load_csv_rejects_unknown_product() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("balance_sheet.csv");
        fs::write(&path, "Counterparty,Product,Amount\nBank X,Equities,100\n").unwrap();

        let err = load_balance_sheet_csv(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(err.to_string().contains("Equities"));
    }

    #[test]
    fn test_load_csv_rejects_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("balance_sheet.csv");
        fs::write(&path, "Counterparty,Product,Amount\n").unwrap();

        assert!(load_balance_sheet_csv(&path).is_err());
    }

    #[test]
    fn test_rejects_non_positive_net_cash_outflows() {
        let metrics = LcrMetrics {
            net_cash_outflows: dec!(0),
            ..default_metrics()
        };
        assert!(BaselineStore::new(default_balance_sheet(), metrics).is_err());
    }

    #[test]
    fn test_rejects_negative_balance_sheet_amount() {
        let sheet = vec![BalanceSheetEntry::new("Bank A", ProductType::Loans, dec!(-1))];
        assert!(BaselineStore::new(sheet, default_metrics()).is_err());
    }
}
