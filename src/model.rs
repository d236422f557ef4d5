//! Entity descriptors and the order status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    InProduction,
    Installed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::InProduction,
        OrderStatus::Installed,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::InProduction => "InProduction",
            OrderStatus::Installed => "Installed",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// No further deliveries are expected once an order is completed or cancelled.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .iter()
            .find(|st| st.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown order status: {}", s))
    }
}

/// Static description of one CRUD-exposed table.
#[derive(Debug)]
pub struct EntityDef {
    /// Human label used in error messages ("order", "client", ...).
    pub label: &'static str,
    pub table: &'static str,
    pub alias: &'static str,
    /// Columns selected from the table itself, in response order.
    pub columns: &'static [&'static str],
    /// Columns a client may set on create/update.
    pub writable: &'static [&'static str],
    /// Join `clients` and expose its name as `client_name`.
    pub joins_client: bool,
    /// Date-time columns; client text for these is normalised before binding.
    pub timestamps: &'static [&'static str],
    /// Columns accepted as exact-match list filters.
    pub filterable: &'static [&'static str],
    pub order_by: &'static str,
}

pub const CLIENTS: EntityDef = EntityDef {
    label: "client",
    table: "clients",
    alias: "c",
    columns: &["id", "name", "address", "email", "phone", "created_at"],
    writable: &["name", "address", "email", "phone"],
    joins_client: false,
    timestamps: &["created_at"],
    filterable: &[],
    order_by: "name ASC",
};

pub const ORDERS: EntityDef = EntityDef {
    label: "order",
    table: "orders",
    alias: "o",
    columns: &[
        "id",
        "client_id",
        "description",
        "status",
        "agreed_price",
        "paid_price",
        "cost_price",
        "is_active",
        "due_datetime",
        "last_admin_responder",
        "created_at",
        "updated_at",
    ],
    writable: &[
        "client_id",
        "description",
        "status",
        "agreed_price",
        "paid_price",
        "cost_price",
        "is_active",
        "due_datetime",
        "last_admin_responder",
    ],
    joins_client: true,
    timestamps: &["due_datetime", "created_at", "updated_at"],
    filterable: &["client_id", "status"],
    order_by: "created_at DESC",
};

pub const MEASUREMENT_TASKS: EntityDef = EntityDef {
    label: "measurement task",
    table: "measurement_tasks",
    alias: "t",
    columns: &[
        "id",
        "client_id",
        "task_datetime",
        "is_completed",
        "address",
        "description",
        "created_at",
    ],
    writable: &["client_id", "task_datetime", "is_completed", "address", "description"],
    joins_client: true,
    timestamps: &["task_datetime", "created_at"],
    filterable: &["client_id", "is_completed"],
    order_by: "task_datetime ASC",
};

/// Resolves the URL segment under `/api` to its entity.
pub fn entity_by_path(path_segment: &str) -> Option<&'static EntityDef> {
    match path_segment {
        "clients" => Some(&CLIENTS),
        "orders" => Some(&ORDERS),
        "tasks" => Some(&MEASUREMENT_TASKS),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for st in OrderStatus::ALL {
            assert_eq!(st.as_str().parse::<OrderStatus>().unwrap(), st);
        }
        assert!("Shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn only_completed_and_cancelled_are_terminal() {
        let terminal: Vec<_> = OrderStatus::ALL.iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![&OrderStatus::Completed, &OrderStatus::Cancelled]);
    }

    #[test]
    fn path_segments_resolve() {
        assert_eq!(entity_by_path("tasks").map(|e| e.table), Some("measurement_tasks"));
        assert!(entity_by_path("dashboard").is_none());
    }

    #[test]
    fn writable_columns_are_selected_columns() {
        for def in [&CLIENTS, &ORDERS, &MEASUREMENT_TASKS] {
            for col in def.writable.iter().chain(def.filterable).chain(def.timestamps) {
                assert!(def.columns.contains(col), "{}.{}", def.table, col);
            }
        }
    }
}
