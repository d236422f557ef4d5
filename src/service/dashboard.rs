//! Dashboard aggregation: financial KPIs, status histogram, trailing six-month series and
//! the upcoming-events feed, derived from three independent reads.
//!
//! The reads are a best-effort snapshot. They run one after another without a transaction,
//! so a write landing between them can show up in one part of the payload and not another
//! (read skew possible). Nothing is cached; every call recomputes from the store.

use crate::model::OrderStatus;
use crate::sql::{format_timestamp, parse_timestamp};
use crate::store::{Row, StoreAdapter};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

/// Number of calendar months in the financial series, ending with the current month.
pub const SERIES_MONTHS: u32 = 6;
/// Maximum number of entries in the upcoming-events feed.
pub const UPCOMING_LIMIT: usize = 5;

const ACTIVE_ORDERS_SQL: &str = "SELECT id, status, agreed_price, paid_price, cost_price, created_at \
     FROM orders WHERE is_active = $1 AND status <> $2";

const OPEN_TASKS_SQL: &str = "SELECT t.id, t.client_id, t.task_datetime, c.name AS client_name \
     FROM measurement_tasks t JOIN clients c ON c.id = t.client_id \
     WHERE t.is_completed = $1";

/// Active, dated orders not in a terminal status. `$1` is `is_active`; the terminal statuses follow.
fn open_deliveries_query() -> (String, Vec<Value>) {
    let mut params = vec![Value::Bool(true)];
    params.extend(
        OrderStatus::ALL
            .iter()
            .filter(|s| s.is_terminal())
            .map(|s| Value::from(s.as_str())),
    );
    let placeholders: Vec<String> = (2..=params.len()).map(|n| format!("${}", n)).collect();
    let sql = format!(
        "SELECT o.id, o.client_id, o.due_datetime, c.name AS client_name \
         FROM orders o JOIN clients c ON c.id = o.client_id \
         WHERE o.is_active = $1 AND o.status NOT IN ({}) AND o.due_datetime IS NOT NULL",
        placeholders.join(", ")
    );
    (sql, params)
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_paid: f64,
    pub total_costs: f64,
    pub total_debt: f64,
    pub net_profit: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct MonthlyFinancials {
    /// Short month and two-digit year, e.g. `Oct 26`.
    pub month: String,
    pub agreed: f64,
    pub paid: f64,
    pub cost: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub enum EventKind {
    Delivery,
    Measurement,
}

impl EventKind {
    pub fn icon(&self) -> &'static str {
        match self {
            EventKind::Delivery => "truck",
            EventKind::Measurement => "ruler",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEvent {
    /// Id of the originating order or measurement task.
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub icon: String,
    pub date: String,
    pub client_name: String,
    pub client_id: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPayload {
    pub kpis: Kpis,
    pub status_summary: Vec<StatusCount>,
    pub monthly_financials: Vec<MonthlyFinancials>,
    pub upcoming_tasks: Vec<UpcomingEvent>,
}

/// An active (is_active, not cancelled) order as read for the dashboard.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActiveOrder {
    pub status: String,
    pub agreed_price: Option<f64>,
    pub paid_price: Option<f64>,
    pub cost_price: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A dated item owned by a client: an order's due date or a measurement task's slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Scheduled {
    pub id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub at: Option<DateTime<Utc>>,
}

fn get_f64(row: &Row, key: &str) -> Option<f64> {
    row.get(key).and_then(Value::as_f64)
}

fn get_i64(row: &Row, key: &str) -> i64 {
    row.get(key).and_then(Value::as_i64).unwrap_or_default()
}

fn get_str(row: &Row, key: &str) -> String {
    row.get(key)
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_default()
}

fn get_ts(row: &Row, key: &str) -> Option<DateTime<Utc>> {
    row.get(key).and_then(Value::as_str).and_then(parse_timestamp)
}

impl ActiveOrder {
    pub fn from_row(row: &Row) -> Self {
        ActiveOrder {
            status: get_str(row, "status"),
            agreed_price: get_f64(row, "agreed_price"),
            paid_price: get_f64(row, "paid_price"),
            cost_price: get_f64(row, "cost_price"),
            created_at: get_ts(row, "created_at"),
        }
    }
}

impl Scheduled {
    pub fn from_row(row: &Row, date_column: &str) -> Self {
        Scheduled {
            id: get_i64(row, "id"),
            client_id: get_i64(row, "client_id"),
            client_name: get_str(row, "client_name"),
            at: get_ts(row, date_column),
        }
    }
}

/// Computes the dashboard payload from the current store contents.
#[derive(Clone)]
pub struct AggregationEngine {
    store: StoreAdapter,
}

impl AggregationEngine {
    pub fn new(store: StoreAdapter) -> Self {
        AggregationEngine { store }
    }

    pub async fn compute(&self) -> Result<DashboardPayload, sqlx::Error> {
        self.compute_at(Utc::now()).await
    }

    /// Any failing read fails the whole aggregation.
    pub async fn compute_at(&self, now: DateTime<Utc>) -> Result<DashboardPayload, sqlx::Error> {
        let orders: Vec<ActiveOrder> = self
            .store
            .fetch_many(
                ACTIVE_ORDERS_SQL,
                &[Value::Bool(true), Value::from(OrderStatus::Cancelled.as_str())],
            )
            .await?
            .iter()
            .map(ActiveOrder::from_row)
            .collect();

        let tasks: Vec<Scheduled> = self
            .store
            .fetch_many(OPEN_TASKS_SQL, &[Value::Bool(false)])
            .await?
            .iter()
            .map(|r| Scheduled::from_row(r, "task_datetime"))
            .collect();

        let (deliveries_sql, deliveries_params) = open_deliveries_query();
        let deliveries: Vec<Scheduled> = self
            .store
            .fetch_many(&deliveries_sql, &deliveries_params)
            .await?
            .iter()
            .map(|r| Scheduled::from_row(r, "due_datetime"))
            .collect();

        tracing::debug!(
            orders = orders.len(),
            tasks = tasks.len(),
            deliveries = deliveries.len(),
            "dashboard inputs read"
        );
        Ok(aggregate(&orders, &deliveries, &tasks, now))
    }
}

pub fn aggregate(
    orders: &[ActiveOrder],
    deliveries: &[Scheduled],
    tasks: &[Scheduled],
    now: DateTime<Utc>,
) -> DashboardPayload {
    DashboardPayload {
        kpis: compute_kpis(orders),
        status_summary: status_histogram(orders),
        monthly_financials: monthly_series(orders, now),
        upcoming_tasks: upcoming_events(deliveries, tasks, now),
    }
}

/// Missing prices count as 0.
pub fn compute_kpis(orders: &[ActiveOrder]) -> Kpis {
    let total_agreed: f64 = orders.iter().map(|o| o.agreed_price.unwrap_or(0.0)).sum();
    let total_paid: f64 = orders.iter().map(|o| o.paid_price.unwrap_or(0.0)).sum();
    let total_costs: f64 = orders.iter().map(|o| o.cost_price.unwrap_or(0.0)).sum();
    Kpis {
        total_paid,
        total_costs,
        total_debt: total_agreed - total_paid,
        net_profit: total_paid - total_costs,
    }
}

/// Count per status present in the data, descending by count; ties keep first-seen order.
pub fn status_histogram(orders: &[ActiveOrder]) -> Vec<StatusCount> {
    let mut counts: Vec<StatusCount> = Vec::new();
    for order in orders {
        match counts.iter_mut().find(|c| c.status == order.status) {
            Some(c) => c.count += 1,
            None => counts.push(StatusCount {
                status: order.status.clone(),
                count: 1,
            }),
        }
    }
    // sort_by is stable
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// (year, month) `back` calendar months before the given one.
fn months_back(year: i32, month: u32, back: u32) -> (i32, u32) {
    let idx = year * 12 + month as i32 - 1 - back as i32;
    (idx.div_euclid(12), idx.rem_euclid(12) as u32 + 1)
}

/// Six calendar-month buckets, oldest first, ending with the month of `now`.
pub fn monthly_series(orders: &[ActiveOrder], now: DateTime<Utc>) -> Vec<MonthlyFinancials> {
    (0..SERIES_MONTHS)
        .rev()
        .map(|back| {
            let (year, month) = months_back(now.year(), now.month(), back);
            let in_month = orders.iter().filter(|o| {
                o.created_at
                    .map(|ts| ts.year() == year && ts.month() == month)
                    .unwrap_or(false)
            });
            let mut bucket = MonthlyFinancials {
                month: month_label(year, month),
                agreed: 0.0,
                paid: 0.0,
                cost: 0.0,
            };
            for o in in_month {
                bucket.agreed += o.agreed_price.unwrap_or(0.0);
                bucket.paid += o.paid_price.unwrap_or(0.0);
                bucket.cost += o.cost_price.unwrap_or(0.0);
            }
            bucket
        })
        .collect()
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%b %y").to_string())
        .unwrap_or_else(|| format!("{:02}/{:02}", month, year.rem_euclid(100)))
}

/// Deliveries and measurements at or after `now`, earliest first, at most five.
pub fn upcoming_events(deliveries: &[Scheduled], tasks: &[Scheduled], now: DateTime<Utc>) -> Vec<UpcomingEvent> {
    let tagged = deliveries
        .iter()
        .map(|d| (EventKind::Delivery, d))
        .chain(tasks.iter().map(|t| (EventKind::Measurement, t)));

    let mut events: Vec<(DateTime<Utc>, UpcomingEvent)> = tagged
        .filter_map(|(kind, item)| {
            let at = item.at.filter(|at| *at >= now)?;
            Some((
                at,
                UpcomingEvent {
                    id: item.id,
                    kind,
                    icon: kind.icon().to_string(),
                    date: format_timestamp(&at),
                    client_name: item.client_name.clone(),
                    client_id: item.client_id,
                },
            ))
        })
        .collect();

    events.sort_by_key(|(at, _)| *at);
    events.truncate(UPCOMING_LIMIT);
    events.into_iter().map(|(_, e)| e).collect()
}
