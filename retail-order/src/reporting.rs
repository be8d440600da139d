use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc};
use retail_core::{
    BusinessStats, CustomerRepository, ProductRepository, StoreError, TimeRange, Transaction,
    TransactionFilter, TransactionRepository, TransactionType, ValidationError,
};
use retail_shared::Page;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

const TOP_PRODUCTS: usize = 5;

pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsPeriod {
    Today,
    ThisWeek,
    ThisMonth,
    AllTime,
}

impl StatsPeriod {
    /// Window covering the current period; weeks start on Sunday.
    /// `None` means unbounded.
    pub fn range(&self, now: DateTime<Utc>) -> Option<TimeRange> {
        let today = now.date_naive();
        match self {
            StatsPeriod::Today => Some(TimeRange::new(
                midnight(today),
                midnight(today) + Duration::days(1),
            )),
            StatsPeriod::ThisWeek => {
                let start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
                Some(TimeRange::new(midnight(start), midnight(start) + Duration::days(7)))
            }
            StatsPeriod::ThisMonth => {
                let start = today - Duration::days(today.day0() as i64);
                let end = start.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX);
                Some(TimeRange::new(midnight(start), midnight(end)))
            }
            StatsPeriod::AllTime => None,
        }
    }
}

impl FromStr for StatsPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(StatsPeriod::Today),
            "this_week" => Ok(StatsPeriod::ThisWeek),
            "this_month" => Ok(StatsPeriod::ThisMonth),
            "all_time" => Ok(StatsPeriod::AllTime),
            other => Err(ValidationError::Invalid {
                field: "period",
                value: other.to_string(),
            }),
        }
    }
}

/// History filters. Only the first present one applies, in field order;
/// the date range needs both ends.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl HistoryQuery {
    pub fn to_filter(&self) -> Result<TransactionFilter, ValidationError> {
        let present = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from);

        if let Some(id) = present(&self.customer_id) {
            return Ok(TransactionFilter::Customer(id));
        }
        if let Some(id) = present(&self.product_id) {
            return Ok(TransactionFilter::Product(id));
        }
        if let Some(kind) = present(&self.kind) {
            return Ok(TransactionFilter::Kind(kind.parse::<TransactionType>()?));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            // End date is inclusive.
            return Ok(TransactionFilter::Range(TimeRange::new(
                midnight(start),
                midnight(end) + Duration::days(1),
            )));
        }
        Ok(TransactionFilter::All)
    }
}

/// Audit record with display names resolved where possible
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub customer_name: Option<String>,
    pub product_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComprehensiveStats {
    pub all_time: BusinessStats,
    pub today: BusinessStats,
    pub this_week: BusinessStats,
    pub this_month: BusinessStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSummary {
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_since: DateTime<Utc>,
    pub total_transactions: i64,
    pub total_spent: f64,
    pub first_transaction_at: Option<DateTime<Utc>>,
    pub last_transaction_at: Option<DateTime<Utc>>,
}

/// Read-only analytics over the audit trail
pub struct ReportingService {
    transactions: Arc<dyn TransactionRepository>,
    customers: Arc<dyn CustomerRepository>,
    products: Arc<dyn ProductRepository>,
    default_page_limit: i64,
}

impl ReportingService {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        customers: Arc<dyn CustomerRepository>,
        products: Arc<dyn ProductRepository>,
        default_page_limit: i64,
    ) -> Self {
        Self {
            transactions,
            customers,
            products,
            default_page_limit,
        }
    }

    pub async fn transaction_history(
        &self,
        query: &HistoryQuery,
        page: Page,
    ) -> Result<Vec<TransactionView>, ReportingError> {
        let filter = query.to_filter()?;
        let page = page.normalized(self.default_page_limit);
        let transactions = self.transactions.list_transactions(filter, page).await?;

        let mut views = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            views.push(self.enrich(transaction).await);
        }
        Ok(views)
    }

    /// Name lookups are best effort; a failed lookup leaves the name empty.
    async fn enrich(&self, transaction: Transaction) -> TransactionView {
        let customer_name = match self.customers.get_customer(&transaction.customer_id).await {
            Ok(found) => found.map(|c| c.name),
            Err(e) => {
                tracing::debug!(error = %e, "customer lookup failed while enriching transaction");
                None
            }
        };
        let product_name = match self.products.get_product(&transaction.product_id).await {
            Ok(found) => found.map(|p| p.name),
            Err(e) => {
                tracing::debug!(error = %e, "product lookup failed while enriching transaction");
                None
            }
        };
        TransactionView {
            transaction,
            customer_name,
            product_name,
        }
    }

    pub async fn business_stats(&self, period: StatsPeriod) -> Result<BusinessStats, ReportingError> {
        let range = period.range(Utc::now());
        let mut stats = self.transactions.business_stats(range, TOP_PRODUCTS).await?;
        for sales in stats.top_selling_products.iter_mut() {
            if sales.product_name.is_none() {
                sales.product_name = self.products.get_product(&sales.product_id).await?.map(|p| p.name);
            }
        }
        Ok(stats)
    }

    pub async fn comprehensive_stats(&self) -> Result<ComprehensiveStats, ReportingError> {
        Ok(ComprehensiveStats {
            all_time: self.business_stats(StatsPeriod::AllTime).await?,
            today: self.business_stats(StatsPeriod::Today).await?,
            this_week: self.business_stats(StatsPeriod::ThisWeek).await?,
            this_month: self.business_stats(StatsPeriod::ThisMonth).await?,
        })
    }

    pub async fn customer_summary(&self, customer_id: &str) -> Result<CustomerSummary, ReportingError> {
        retail_core::validation::require_text("customer ID", customer_id)?;
        let customer = self
            .customers
            .get_customer(customer_id)
            .await?
            .ok_or_else(|| ReportingError::CustomerNotFound(customer_id.to_string()))?;
        let summary = self.transactions.customer_summary(customer_id).await?;

        Ok(CustomerSummary {
            customer_id: customer.id.clone(),
            customer_name: customer.name.clone(),
            customer_email: customer.email().to_string(),
            customer_since: customer.created_at,
            total_transactions: summary.total_transactions,
            total_spent: summary.total_spent,
            first_transaction_at: summary.first_transaction_at,
            last_transaction_at: summary.last_transaction_at,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportingError {
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
