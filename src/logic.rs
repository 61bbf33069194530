// 📋 Simulation Logic - documented per-product impact, next to the applied rule
//
// The documented impacts are reference text for operators. Only `engine::classify`
// decides the recorded category; each row carries both so the two can be compared.

use crate::engine::classify;
use crate::model::{Category, Direction, ProductType};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactRow {
    pub product: ProductType,
    pub documented_debit: &'static str,
    pub documented_credit: &'static str,
    pub applied_debit: Category,
    pub applied_credit: Category,
}

fn documented(product: ProductType) -> (&'static str, &'static str) {
    match product {
        ProductType::Loans => ("Increases Inflows", "Decreases Inflows"),
        ProductType::Deposits => ("Decreases Outflows", "Increases Outflows"),
        ProductType::Bonds => ("Increases HQLA", "Decreases HQLA"),
        ProductType::Borrowings => ("Decreases Inflows", "Increases Inflows"),
        ProductType::Derivatives => ("Varies", "Varies"),
        ProductType::CentralBankReserves => ("Increases HQLA", "Decreases HQLA"),
    }
}

/// One row per product, in product order
pub fn impact_table() -> Vec<ImpactRow> {
    ProductType::ALL
        .iter()
        .map(|&product| {
            let (documented_debit, documented_credit) = documented(product);
            ImpactRow {
                product,
                documented_debit,
                documented_credit,
                applied_debit: classify(product, Direction::Debit),
                applied_credit: classify(product, Direction::Credit),
            }
        })
        .collect()
}
