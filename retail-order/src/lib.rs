pub mod cooldown;
pub mod manager;
pub mod models;
pub mod reporting;

pub use cooldown::{CooldownPolicy, CooldownStatus};
pub use manager::{CommitStep, LookupStep, OrderError, OrderManager};
pub use models::{OrderSummary, PlaceOrderRequest};
pub use reporting::{
    ComprehensiveStats, CustomerSummary, HistoryQuery, ReportingError, ReportingService,
    StatsPeriod, TransactionView,
};
