// LCR Simulator - Core Library
// Exposes all modules for use in the TUI, API server, and tests

pub mod model;
pub mod error;
pub mod baseline;   // Reference balance sheet + original metrics
pub mod engine;     // Classification, ratio arithmetic, simulation log
pub mod logic;      // Documented impact table shown to operators
pub mod session;    // Independent engines per session
pub mod config;
pub mod logging;
pub mod batch;      // CSV script replay

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use model::{
    BalanceSheetEntry, Category, Direction, LcrMetrics, ProductType,
    SimulationRecord, Transaction, TransactionRequest,
};
pub use error::ValidationError;
pub use baseline::{BaselineStore, load_balance_sheet_csv};
pub use engine::{
    classify, simulate, Applied, Phase, ResetSnapshot, SimulationEngine, SimulationState,
};
pub use logic::{impact_table, ImpactRow};
pub use session::{SessionLimits, SessionRegistry, SharedEngine};
pub use config::{AppConfig, BaselineConfig, LogConfig, LogFormat, ServerConfig};
pub use batch::{replay, replay_file, BatchReport, RejectedRow, RowFailure};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
