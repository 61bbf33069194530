// ⚙️ Simulation Engine - Categorization, ratio arithmetic, append-only log
//
// Two logical states:
//   Baseline  - log empty, metrics == baseline
//   Simulated - log non-empty, metrics carry the cumulative deltas
// `apply` moves Baseline -> Simulated (or stays in Simulated), `reset` goes back.

use crate::baseline::BaselineStore;
use crate::error::ValidationError;
use crate::model::{
    BalanceSheetEntry, Category, Direction, LcrMetrics, ProductType, SimulationRecord, Transaction,
    TransactionRequest,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ============================================================================
// PURE RULES
// ============================================================================

/// Which LCR bucket a transaction lands in.
///
/// HQLA products hit HQLA regardless of direction; everything else is an
/// inflow on a debit and an outflow on a credit.
pub fn classify(product: ProductType, direction: Direction) -> Category {
    if product.is_hqla() {
        Category::Hqla
    } else if direction == Direction::Debit {
        Category::Inflows
    } else {
        Category::Outflows
    }
}

/// Apply one transaction to a metric set without touching any log.
///
/// Only `lcr_percent` moves, by the raw amount: down on a debit, up on a credit.
/// A result outside the decimal range is rejected as `AmountOutOfRange`.
pub fn simulate(current: &LcrMetrics, tx: &Transaction) -> Result<(LcrMetrics, Category), ValidationError> {
    let category = classify(tx.product, tx.direction);

    let lcr_percent = match tx.direction {
        Direction::Debit => current.lcr_percent.checked_sub(tx.amount),
        Direction::Credit => current.lcr_percent.checked_add(tx.amount),
    }
    .ok_or(ValidationError::AmountOutOfRange { amount: tx.amount })?;

    Ok((
        LcrMetrics {
            lcr_percent,
            ..*current
        },
        category,
    ))
}

// ============================================================================
// ENGINE STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Baseline,
    Simulated,
}

/// Outcome of a successful `apply`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applied {
    pub metrics: LcrMetrics,
    pub record: SimulationRecord,
}

/// Current metrics plus the log since the last reset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationState {
    pub metrics: LcrMetrics,
    pub records: Vec<SimulationRecord>,
}

/// Everything an adapter needs to redraw after a reset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResetSnapshot {
    pub baseline_balance_sheet: Vec<BalanceSheetEntry>,
    pub metrics: LcrMetrics,
    pub records: Vec<SimulationRecord>,
}

// ============================================================================
// SIMULATION ENGINE
// ============================================================================

/// One simulation session: current metrics and the log, reset together
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    store: Arc<BaselineStore>,
    metrics: LcrMetrics,
    log: Vec<SimulationRecord>,
}

impl SimulationEngine {
    /// New session starting at the baseline
    pub fn new(store: Arc<BaselineStore>) -> Self {
        let metrics = store.baseline_metrics();
        SimulationEngine {
            store,
            metrics,
            log: Vec::new(),
        }
    }

    /// Validate and apply a request. On error nothing changes.
    pub fn apply(&mut self, request: &TransactionRequest) -> Result<Applied, ValidationError> {
        let tx = request.validate().map_err(|e| {
            warn!(error = %e, "transaction rejected");
            e
        })?;

        let (metrics, category) = simulate(&self.metrics, &tx).map_err(|e| {
            warn!(error = %e, "transaction rejected");
            e
        })?;
        debug!(product = %tx.product, direction = %tx.direction, category = %category, "classified");

        let record = SimulationRecord {
            id: Uuid::new_v4(),
            sequence: self.log.len() as u64 + 1,
            counterparty: tx.counterparty,
            product: tx.product,
            amount: tx.amount,
            direction: tx.direction,
            resulting_lcr_percent: metrics.lcr_percent,
            affected_category: category,
            applied_at: Utc::now(),
        };

        // Nothing fallible below this line: metrics and log move together
        self.metrics = metrics;
        self.log.push(record.clone());

        info!(
            sequence = record.sequence,
            counterparty = %record.counterparty,
            amount = %record.amount,
            lcr_percent = %metrics.lcr_percent,
            "transaction applied"
        );

        Ok(Applied { metrics, record })
    }

    /// Clear the log and restore the baseline metrics
    pub fn reset(&mut self) -> LcrMetrics {
        let cleared = self.log.len();
        self.log.clear();
        self.metrics = self.store.baseline_metrics();

        info!(cleared, "simulation reset");
        self.metrics
    }

    /// Reset and return the full baseline view (balance sheet, metrics, empty log)
    pub fn reset_snapshot(&mut self) -> ResetSnapshot {
        let metrics = self.reset();
        ResetSnapshot {
            baseline_balance_sheet: self.store.balance_sheet().to_vec(),
            metrics,
            records: Vec::new(),
        }
    }

    pub fn metrics(&self) -> LcrMetrics {
        self.metrics
    }

    /// Records applied since the last reset, in application order
    pub fn log(&self) -> &[SimulationRecord] {
        &self.log
    }

    pub fn state(&self) -> SimulationState {
        SimulationState {
            metrics: self.metrics,
            records: self.log.clone(),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.log.is_empty() {
            Phase::Baseline
        } else {
            Phase::Simulated
        }
    }

    pub fn balance_sheet(&self) -> &[BalanceSheetEntry] {
        self.store.balance_sheet()
    }

    pub fn baseline(&self) -> &BaselineStore {
        &self.store
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(Arc::new(BaselineStore::default()))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn request(counterparty: &str, product: ProductType, direction: Direction, amount: Decimal) -> TransactionRequest {
        TransactionRequest::new(counterparty, product, direction, amount)
    }

    #[test]
    fn test_classify_rule_table() {
        assert_eq!(classify(ProductType::Bonds, Direction::Debit), Category::Hqla);
        assert_eq!(classify(ProductType::Bonds, Direction::Credit), Category::Hqla);
        assert_eq!(classify(ProductType::CentralBankReserves, Direction::Debit), Category::Hqla);
        assert_eq!(classify(ProductType::CentralBankReserves, Direction::Credit), Category::Hqla);

        assert_eq!(classify(ProductType::Loans, Direction::Debit), Category::Inflows);
        assert_eq!(classify(ProductType::Deposits, Direction::Debit), Category::Inflows);
        assert_eq!(classify(ProductType::Borrowings, Direction::Credit), Category::Outflows);
        assert_eq!(classify(ProductType::Derivatives, Direction::Credit), Category::Outflows);
    }

    #[test]
    fn test_reference_scenario() {
        let mut engine = SimulationEngine::default();
        assert_eq!(engine.metrics().lcr_percent, dec!(162.5));
        assert_eq!(engine.phase(), Phase::Baseline);

        let first = engine
            .apply(&request("Bank A", ProductType::Loans, Direction::Debit, dec!(50)))
            .unwrap();
        assert_eq!(first.record.affected_category, Category::Inflows);
        assert_eq!(first.record.resulting_lcr_percent, dec!(112.5));
        assert_eq!(first.record.sequence, 1);
        assert_eq!(engine.log().len(), 1);
        assert_eq!(engine.phase(), Phase::Simulated);

        let second = engine
            .apply(&request("Bank C", ProductType::Bonds, Direction::Credit, dec!(20)))
            .unwrap();
        assert_eq!(second.record.affected_category, Category::Hqla);
        assert_eq!(second.record.resulting_lcr_percent, dec!(132.5));
        assert_eq!(second.metrics.lcr_percent, dec!(132.5));
        assert_eq!(engine.log().len(), 2);

        let metrics = engine.reset();
        assert_eq!(metrics.lcr_percent, dec!(162.5));
        assert!(engine.log().is_empty());
        assert_eq!(engine.phase(), Phase::Baseline);
    }

    #[test]
    fn test_apply_only_moves_lcr_percent() {
        let mut engine = SimulationEngine::default();
        let before = engine.metrics();

        let applied = engine
            .apply(&request("Bank B", ProductType::Borrowings, Direction::Credit, dec!(7.25)))
            .unwrap();

        assert_eq!(applied.metrics.hqla, before.hqla);
        assert_eq!(applied.metrics.inflows, before.inflows);
        assert_eq!(applied.metrics.outflows, before.outflows);
        assert_eq!(applied.metrics.net_cash_outflows, before.net_cash_outflows);
        assert_eq!(applied.metrics.lcr_percent, dec!(169.75));
    }

    #[test]
    fn test_record_keeps_inputs() {
        let mut engine = SimulationEngine::default();
        let applied = engine
            .apply(&request("Bank C", ProductType::Derivatives, Direction::Debit, dec!(15)))
            .unwrap();

        let record = &engine.log()[0];
        assert_eq!(record, &applied.record);
        assert_eq!(record.counterparty, "Bank C");
        assert_eq!(record.product, ProductType::Derivatives);
        assert_eq!(record.direction, Direction::Debit);
        assert_eq!(record.amount, dec!(15));
    }

    #[test]
    fn test_rejected_request_leaves_state_untouched() {
        let mut engine = SimulationEngine::default();
        engine
            .apply(&request("Bank A", ProductType::Loans, Direction::Debit, dec!(10)))
            .unwrap();
        let before = engine.state();

        let zero = request("Bank A", ProductType::Loans, Direction::Debit, dec!(0));
        assert_eq!(
            engine.apply(&zero),
            Err(ValidationError::NonPositiveAmount { amount: dec!(0) })
        );

        let mut no_direction = request("Bank A", ProductType::Loans, Direction::Debit, dec!(10));
        no_direction.direction = None;
        assert_eq!(
            engine.apply(&no_direction),
            Err(ValidationError::MissingField { field: "direction" })
        );

        let mut bad_product = request("Bank A", ProductType::Loans, Direction::Debit, dec!(10));
        bad_product.product = Some("Gold".to_string());
        assert!(matches!(
            engine.apply(&bad_product),
            Err(ValidationError::UnknownProduct { .. })
        ));

        assert_eq!(engine.state(), before);
    }

    #[test]
    fn test_overflowing_amount_is_rejected_without_state_change() {
        let mut engine = SimulationEngine::default();
        engine
            .apply(&request("Bank A", ProductType::Loans, Direction::Debit, dec!(10)))
            .unwrap();
        let before = engine.state();

        let credit = request("Bank A", ProductType::Loans, Direction::Credit, Decimal::MAX);
        assert_eq!(
            engine.apply(&credit),
            Err(ValidationError::AmountOutOfRange { amount: Decimal::MAX })
        );
        assert_eq!(engine.state(), before);

    }

    #[test]
    fn test_simulate_debit_below_range_fails() {
        let floor = LcrMetrics {
            lcr_percent: Decimal::MIN + Decimal::ONE,
            ..BaselineStore::default().baseline_metrics()
        };
        let tx = request("Bank B", ProductType::Bonds, Direction::Debit, dec!(2))
            .validate()
            .unwrap();

        assert_eq!(
            simulate(&floor, &tx),
            Err(ValidationError::AmountOutOfRange { amount: dec!(2) })
        );
    }

    #[test]
    fn test_simulate_is_pure() {
        let metrics = BaselineStore::default().baseline_metrics();
        let tx = request("Bank C", ProductType::Derivatives, Direction::Credit, dec!(2.5))
            .validate()
            .unwrap();

        let (next, category) = simulate(&metrics, &tx).unwrap();
        assert_eq!(category, Category::Outflows);
        assert_eq!(next.lcr_percent, dec!(165.0));
        assert_eq!(metrics.lcr_percent, dec!(162.5));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut engine = SimulationEngine::default();
        engine
            .apply(&request("Bank A", ProductType::Deposits, Direction::Credit, dec!(40)))
            .unwrap();

        let first = engine.reset_snapshot();
        let second = engine.reset_snapshot();

        assert_eq!(first, second);
        assert_eq!(first.metrics, engine.baseline().baseline_metrics());
        assert!(first.records.is_empty());
        assert_eq!(first.baseline_balance_sheet.len(), 6);
        assert!(engine.log().is_empty());
    }

    #[test]
    fn test_sequence_restarts_after_reset() {
        let mut engine = SimulationEngine::default();
        let tx = request("Bank A", ProductType::Loans, Direction::Debit, dec!(1));
        engine.apply(&tx).unwrap();
        engine.apply(&tx).unwrap();
        engine.reset();

        let applied = engine.apply(&tx).unwrap();
        assert_eq!(applied.record.sequence, 1);
    }

    #[test]
    fn test_sessions_do_not_share_state() {
        let store = Arc::new(BaselineStore::default());
        let mut a = SimulationEngine::new(store.clone());
        let b = SimulationEngine::new(store);

        a.apply(&request("Bank A", ProductType::Loans, Direction::Debit, dec!(5)))
            .unwrap();

        assert_eq!(a.log().len(), 1);
        assert!(b.log().is_empty());
        assert_eq!(b.metrics().lcr_percent, dec!(162.5));
    }

    fn product_strategy() -> impl Strategy<Value = ProductType> {
        prop::sample::select(ProductType::ALL.to_vec())
    }

    fn direction_strategy() -> impl Strategy<Value = Direction> {
        prop_oneof![Just(Direction::Debit), Just(Direction::Credit)]
    }

    // amounts in cents, 0.01 ..= 1_000_000.00
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    proptest! {
        #[test]
        fn prop_classify_is_deterministic(product in product_strategy(), direction in direction_strategy()) {
            let category = classify(product, direction);
            prop_assert_eq!(category, classify(product, direction));
            if product.is_hqla() {
                prop_assert_eq!(category, Category::Hqla);
            }
        }

        #[test]
        fn prop_debit_then_credit_restores_ratio(
            product in product_strategy(),
            amount in amount_strategy(),
        ) {
            let mut engine = SimulationEngine::default();
            let before = engine.metrics().lcr_percent;

            engine.apply(&request("Bank A", product, Direction::Debit, amount)).unwrap();
            let after = engine.apply(&request("Bank A", product, Direction::Credit, amount)).unwrap();

            prop_assert_eq!(after.metrics.lcr_percent, before);
            prop_assert_eq!(engine.log().len(), 2);
            prop_assert_ne!(engine.log()[0].id, engine.log()[1].id);
        }

        #[test]
        fn prop_each_apply_appends_one_record_and_reset_restores_baseline(
            steps in prop::collection::vec((product_strategy(), direction_strategy(), amount_strategy()), 0..20),
        ) {
            let mut engine = SimulationEngine::default();
            for (i, (product, direction, amount)) in steps.iter().enumerate() {
                engine.apply(&request("Bank B", *product, *direction, *amount)).unwrap();
                prop_assert_eq!(engine.log().len(), i + 1);
            }

            engine.reset();
            prop_assert_eq!(engine.metrics(), engine.baseline().baseline_metrics());
            prop_assert!(engine.log().is_empty());
        }
    }
}
