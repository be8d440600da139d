pub mod analytics;
pub mod cooldown;
pub mod customer;
pub mod order;
pub mod product;
pub mod transaction;

pub use analytics::{top_selling, BusinessStats, CustomerTransactionSummary, ProductSales, TimeRange};
pub use cooldown::CustomerCooldown;
pub use customer::Customer;
pub use order::{Order, OrderDetails};
pub use product::Product;
pub use transaction::{Transaction, TransactionType};
