pub mod config;
pub mod types;

pub use config::EngineConfig;
pub use types::{
    AccountingStandard, Amount, ConsolidationScope, CurrentPeriodType, NullReason, PeriodBucket,
    PeriodKind, ReportType, RuleScope, StatementType, ValueType,
};
