use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::transaction::{Transaction, TransactionType};

/// Half-open reporting window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: String,
    pub product_name: Option<String>,
    pub quantity_sold: i64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BusinessStats {
    pub total_revenue: f64,
    pub order_count: i64,
    pub average_order_value: f64,
    pub total_quantity_sold: i64,
    pub unique_customers: i64,
    pub top_selling_products: Vec<ProductSales>,
}

impl BusinessStats {
    /// Aggregate `order` transactions inside `range` (all of them when `None`).
    /// Product names are left unresolved.
    pub fn from_transactions<'a, I>(transactions: I, range: Option<TimeRange>, top_n: usize) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let orders: Vec<&Transaction> = transactions
            .into_iter()
            .filter(|t| t.kind == TransactionType::Order)
            .filter(|t| range.map_or(true, |r| r.contains(t.transaction_at)))
            .collect();

        let total_revenue: f64 = orders.iter().map(|t| t.amount).sum();
        let order_count = orders.len() as i64;
        let total_quantity_sold: i64 = orders.iter().map(|t| t.quantity as i64).sum();
        let unique_customers = orders
            .iter()
            .map(|t| t.customer_id.as_str())
            .collect::<HashSet<_>>()
            .len() as i64;
        let average_order_value = if order_count > 0 {
            total_revenue / order_count as f64
        } else {
            0.0
        };

        Self {
            total_revenue,
            order_count,
            average_order_value,
            total_quantity_sold,
            unique_customers,
            top_selling_products: top_selling(orders, top_n),
        }
    }
}

/// Rank products by quantity sold, revenue breaking ties, then product ID.
pub fn top_selling<'a, I>(transactions: I, limit: usize) -> Vec<ProductSales>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut by_product: HashMap<&str, (i64, f64)> = HashMap::new();
    for t in transactions {
        if t.kind != TransactionType::Order {
            continue;
        }
        let entry = by_product.entry(t.product_id.as_str()).or_default();
        entry.0 += t.quantity as i64;
        entry.1 += t.amount;
    }

    let mut sales: Vec<ProductSales> = by_product
        .into_iter()
        .map(|(product_id, (quantity_sold, total_revenue))| ProductSales {
            product_id: product_id.to_string(),
            product_name: None,
            quantity_sold,
            total_revenue,
        })
        .collect();
    sales.sort_by(|a, b| {
        b.quantity_sold
            .cmp(&a.quantity_sold)
            .then(b.total_revenue.total_cmp(&a.total_revenue))
            .then(a.product_id.cmp(&b.product_id))
    });
    sales.truncate(limit);
    sales
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomerTransactionSummary {
    pub customer_id: String,
    pub total_transactions: i64,
    pub total_spent: f64,
    pub first_transaction_at: Option<DateTime<Utc>>,
    pub last_transaction_at: Option<DateTime<Utc>>,
}

impl CustomerTransactionSummary {
    pub fn from_transactions<'a, I>(customer_id: &str, transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut summary = Self {
            customer_id: customer_id.to_string(),
            ..Default::default()
        };
        for t in transactions.into_iter().filter(|t| t.customer_id == customer_id) {
            summary.total_transactions += 1;
            summary.total_spent += t.revenue_amount();
            summary.first_transaction_at = Some(match summary.first_transaction_at {
                Some(first) => first.min(t.transaction_at),
                None => t.transaction_at,
            });
            summary.last_transaction_at = Some(match summary.last_transaction_at {
                Some(last) => last.max(t.transaction_at),
                None => t.transaction_at,
            });
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Order;
    use chrono::Duration;

    fn txn(id: &str, customer: &str, product: &str, qty: i32, price: f64, at: DateTime<Utc>) -> Transaction {
        let order = Order::new(format!("ORD{}", id), customer, product, qty, price, at).unwrap();
        Transaction::for_order(format!("TXN{}", id), &order, at)
    }

    #[test]
    fn test_stats_over_range() {
        let now = Utc::now();
        let old = now - Duration::days(10);
        let txns = vec![
            txn("10001", "CUST10001", "PROD10001", 2, 10.0, now),
            txn("10002", "CUST10002", "PROD10002", 5, 1.0, now),
            txn("10003", "CUST10001", "PROD10001", 1, 10.0, old),
        ];

        let range = TimeRange::new(now - Duration::days(1), now + Duration::seconds(1));
        let stats = BusinessStats::from_transactions(&txns, Some(range), 5);
        assert_eq!(stats.order_count, 2);
        assert_eq!(stats.total_revenue, 25.0);
        assert_eq!(stats.average_order_value, 12.5);
        assert_eq!(stats.total_quantity_sold, 7);
        assert_eq!(stats.unique_customers, 2);
        assert_eq!(stats.top_selling_products[0].product_id, "PROD10002");

        let all = BusinessStats::from_transactions(&txns, None, 1);
        assert_eq!(all.order_count, 3);
        assert_eq!(all.top_selling_products.len(), 1);
    }

    #[test]
    fn test_empty_stats_have_zero_average() {
        let stats = BusinessStats::from_transactions(&Vec::<Transaction>::new(), None, 5);
        assert_eq!(stats, BusinessStats::default());
    }

    #[test]
    fn test_customer_summary() {
        let now = Utc::now();
        let earlier = now - Duration::hours(3);
        let txns = vec![
            txn("10001", "CUST10001", "PROD10001", 2, 10.0, now),
            txn("10002", "CUST10001", "PROD10002", 1, 4.5, earlier),
            txn("10003", "CUST10002", "PROD10001", 1, 10.0, now),
        ];
        let summary = CustomerTransactionSummary::from_transactions("CUST10001", &txns);
        assert_eq!(summary.total_transactions, 2);
        assert_eq!(summary.total_spent, 24.5);
        assert_eq!(summary.first_transaction_at, Some(earlier));
        assert_eq!(summary.last_transaction_at, Some(now));
    }
}
