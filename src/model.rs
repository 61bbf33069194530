// 🧾 Data Model - Balance sheet, LCR metrics, transactions
// Typed values shared by the baseline store, the engine and the adapters

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// PRODUCT TYPE
// ============================================================================

/// Balance-sheet product. Closed set, no dynamic extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    Loans,
    Deposits,
    Bonds,
    Borrowings,
    Derivatives,
    CentralBankReserves,
}

impl ProductType {
    pub const ALL: [ProductType; 6] = [
        ProductType::Loans,
        ProductType::Deposits,
        ProductType::Bonds,
        ProductType::Borrowings,
        ProductType::Derivatives,
        ProductType::CentralBankReserves,
    ];

    /// Display label, as shown on the dashboard
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Loans => "Loans",
            ProductType::Deposits => "Deposits",
            ProductType::Bonds => "Bonds",
            ProductType::Borrowings => "Borrowings",
            ProductType::Derivatives => "Derivatives",
            ProductType::CentralBankReserves => "Central Bank Reserves",
        }
    }

    /// Products that always count towards high-quality liquid assets
    pub fn is_hqla(&self) -> bool {
        matches!(self, ProductType::Bonds | ProductType::CentralBankReserves)
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = ValidationError;

    /// Accepts the display label or the identifier, ignoring case and spacing
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_lowercase();

        ProductType::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().replace(' ', "").to_lowercase() == key)
            .ok_or_else(|| ValidationError::UnknownProduct {
                value: s.to_string(),
            })
    }
}

// ============================================================================
// DIRECTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Debit => "Debit",
            Direction::Credit => "Credit",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Direction::Debit => Direction::Credit,
            Direction::Credit => Direction::Debit,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debit" | "dr" => Ok(Direction::Debit),
            "credit" | "cr" => Ok(Direction::Credit),
            _ => Err(ValidationError::UnknownDirection {
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// CATEGORY
// ============================================================================

/// LCR bucket affected by a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "HQLA")]
    Hqla,
    Inflows,
    Outflows,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hqla => "HQLA",
            Category::Inflows => "Inflows",
            Category::Outflows => "Outflows",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// BALANCE SHEET
// ============================================================================

/// One line of the reference balance sheet. Read-only after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetEntry {
    pub counterparty: String,
    pub product: ProductType,
    pub amount: Decimal,
}

impl BalanceSheetEntry {
    pub fn new(counterparty: impl Into<String>, product: ProductType, amount: Decimal) -> Self {
        BalanceSheetEntry {
            counterparty: counterparty.into(),
            product,
            amount,
        }
    }
}

// ============================================================================
// LCR METRICS
// ============================================================================

/// Current (possibly simulated) state of the ratio and its components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LcrMetrics {
    pub hqla: Decimal,
    pub inflows: Decimal,
    pub outflows: Decimal,
    pub net_cash_outflows: Decimal,
    pub lcr_percent: Decimal,
}

impl LcrMetrics {
    /// Ratio implied by the components (HQLA / net cash outflows).
    ///
    /// Informational only: the simulated `lcr_percent` moves by direct
    /// delta and is never re-derived from this.
    pub fn implied_lcr_percent(&self) -> Option<Decimal> {
        if self.net_cash_outflows.is_zero() {
            return None;
        }
        Some(self.hqla / self.net_cash_outflows * Decimal::ONE_HUNDRED)
    }

    /// (label, value) rows in KPI-table order
    pub fn rows(&self) -> [(&'static str, Decimal); 5] {
        [
            ("HQLA", self.hqla),
            ("Inflows", self.inflows),
            ("Outflows", self.outflows),
            ("Net Cash Outflows", self.net_cash_outflows),
            ("Liquidity Coverage Ratio (LCR) %", self.lcr_percent),
        ]
    }
}

// ============================================================================
// TRANSACTION REQUEST
// ============================================================================

/// Operator input as entered, before validation.
///
/// Every field is optional so a half-filled form or a sparse API body can
/// be represented and rejected with a precise error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

impl TransactionRequest {
    /// Fully-populated request from typed values
    pub fn new(
        counterparty: impl Into<String>,
        product: ProductType,
        direction: Direction,
        amount: Decimal,
    ) -> Self {
        TransactionRequest {
            counterparty: Some(counterparty.into()),
            product: Some(product.as_str().to_string()),
            direction: Some(direction.as_str().to_string()),
            amount: Some(amount),
        }
    }

    /// Validate into a typed transaction. First failure wins:
    /// missing field, unknown product, unknown direction, non-positive amount.
    pub fn validate(&self) -> Result<Transaction, ValidationError> {
        let counterparty = self
            .counterparty
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(ValidationError::MissingField { field: "counterparty" })?;
        let product = present(&self.product).ok_or(ValidationError::MissingField { field: "product" })?;
        let direction = present(&self.direction).ok_or(ValidationError::MissingField { field: "direction" })?;
        let amount = self.amount.ok_or(ValidationError::MissingField { field: "amount" })?;

        let product: ProductType = product.parse()?;
        let direction: Direction = direction.parse()?;

        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount { amount });
        }

        Ok(Transaction {
            counterparty: counterparty.to_string(),
            product,
            direction,
            amount,
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// A validated transaction. Only constructed through `TransactionRequest::validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub counterparty: String,
    pub product: ProductType,
    pub direction: Direction,
    pub amount: Decimal,
}

// ============================================================================
// SIMULATION RECORD
// ============================================================================

/// One applied transaction in the simulation log. Never mutated after append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    /// Stable identity for display and API clients
    pub id: Uuid,

    /// 1-based position in the log since the last reset
    pub sequence: u64,

    pub counterparty: String,
    pub product: ProductType,
    pub amount: Decimal,
    pub direction: Direction,
    pub resulting_lcr_percent: Decimal,
    pub affected_category: Category,

    pub applied_at: DateTime<Utc>,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_product_parsing_accepts_label_and_identifier() {
        assert_eq!("Central Bank Reserves".parse::<ProductType>().unwrap(), ProductType::CentralBankReserves);
        assert_eq!("CentralBankReserves".parse::<ProductType>().unwrap(), ProductType::CentralBankReserves);
        assert_eq!("central_bank_reserves".parse::<ProductType>().unwrap(), ProductType::CentralBankReserves);
        assert_eq!("  loans ".parse::<ProductType>().unwrap(), ProductType::Loans);

        let err = "Equities".parse::<ProductType>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownProduct { value: "Equities".to_string() });
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("Debit".parse::<Direction>().unwrap(), Direction::Debit);
        assert_eq!("CREDIT".parse::<Direction>().unwrap(), Direction::Credit);
        assert!(matches!(
            "Sideways".parse::<Direction>(),
            Err(ValidationError::UnknownDirection { .. })
        ));
    }

    #[test]
    fn test_hqla_products() {
        let hqla: Vec<_> = ProductType::ALL.iter().filter(|p| p.is_hqla()).collect();
        assert_eq!(hqla, vec![&ProductType::Bonds, &ProductType::CentralBankReserves]);
    }

    #[test]
    fn test_validate_missing_fields_in_order() {
        let mut request = TransactionRequest::default();
        assert_eq!(request.validate(), Err(ValidationError::MissingField { field: "counterparty" }));

        request.counterparty = Some("   ".to_string());
        assert_eq!(request.validate(), Err(ValidationError::MissingField { field: "counterparty" }));

        request.counterparty = Some("Bank A".to_string());
        assert_eq!(request.validate(), Err(ValidationError::MissingField { field: "product" }));

        request.product = Some("Loans".to_string());
        assert_eq!(request.validate(), Err(ValidationError::MissingField { field: "direction" }));

        request.direction = Some("Debit".to_string());
        assert_eq!(request.validate(), Err(ValidationError::MissingField { field: "amount" }));

        request.amount = Some(dec!(10));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_amount() {
        let zero = TransactionRequest::new("Bank A", ProductType::Loans, Direction::Debit, dec!(0));
        assert_eq!(zero.validate(), Err(ValidationError::NonPositiveAmount { amount: dec!(0) }));

        let negative = TransactionRequest::new("Bank A", ProductType::Loans, Direction::Debit, dec!(-5));
        assert_eq!(negative.validate(), Err(ValidationError::NonPositiveAmount { amount: dec!(-5) }));
    }

    #[test]
    fn test_validate_unknown_product_before_amount() {
        let request = TransactionRequest {
            counterparty: Some("Bank A".to_string()),
            product: Some("Swaps".to_string()),
            direction: Some("Debit".to_string()),
            amount: Some(dec!(-1)),
        };
        assert!(matches!(request.validate(), Err(ValidationError::UnknownProduct { .. })));
    }

    #[test]
    fn test_implied_ratio_matches_baseline() {
        let metrics = LcrMetrics {
            hqla: dec!(1300),
            inflows: dec!(300),
            outflows: dec!(1100),
            net_cash_outflows: dec!(800),
            lcr_percent: dec!(162.5),
        };
        assert_eq!(metrics.implied_lcr_percent(), Some(dec!(162.5)));

        let degenerate = LcrMetrics { net_cash_outflows: Decimal::ZERO, ..metrics };
        assert_eq!(degenerate.implied_lcr_percent(), None);
    }
}
