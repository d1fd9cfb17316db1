use super::{Snapshot, UserIdentifier, IDENTIFIER_LENGTH};
use crate::library::helpers::short_identifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const IDENTIFIER_PREFIX: &str = "o";

/// Unique identifier of an order, e.g. `o_Zt93kA`
pub type OrderIdentifier = String;

/// Order placed on behalf of a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique identifier
    pub id: OrderIdentifier,
    /// User who placed the order
    pub user_id: UserIdentifier,
    /// Line items, stored as provided by the client
    pub items: Vec<Value>,
    /// Total price
    pub total: f64,
    /// Point in time at which the order has been placed
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order with a freshly generated identifier
    pub fn new(user_id: UserIdentifier, items: Vec<Value>, total: f64) -> Self {
        Self {
            id: short_identifier(IDENTIFIER_PREFIX, IDENTIFIER_LENGTH),
            user_id,
            items,
            total,
            created_at: Utc::now(),
        }
    }
}

impl Snapshot for Order {
    fn id(&self) -> &str {
        &self.id
    }
}
