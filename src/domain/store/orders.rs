use super::{parse_timestamp, StoreError};
use crate::domain::Order;
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::{debug, instrument};

/// Persistent collection of [`Order`] entities
#[derive(Clone)]
pub struct OrderStore {
    pool: SqlitePool,
}

impl OrderStore {
    /// Creates a new store on top of the pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the schema if it does not exist yet
    pub async fn setup(&self) -> Result<(), StoreError> {
        sqlx::query(include_str!("sql/orders.sql"))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// All orders in order of placement
    pub async fn list(&self) -> Result<Vec<Order>, StoreError> {
        sqlx::query(
            "SELECT Id, UserId, Items, Total, CreatedAt FROM Orders ORDER BY CreatedAt, rowid",
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(order_from_row)
        .collect()
    }

    /// Stores a new order
    #[instrument(skip(self, order), fields(id = order.id.as_str()))]
    pub async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let items = serde_json::to_string(&order.items)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        sqlx::query(
            "INSERT INTO Orders ( Id, UserId, Items, Total, CreatedAt ) VALUES ( ?, ?, ?, ?, ? )",
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(items)
        .bind(order.total)
        .bind(order.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!("Inserted order");
        Ok(())
    }

    /// Deletes an order and returns its last state
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<Order, StoreError> {
        let mut transaction = self.pool.begin().await?;

        let row = sqlx::query("SELECT Id, UserId, Items, Total, CreatedAt FROM Orders WHERE Id = ?")
            .bind(id)
            .fetch_optional(&mut *transaction)
            .await?
            .ok_or(StoreError::NotFound)?;
        let order = order_from_row(&row)?;

        sqlx::query("DELETE FROM Orders WHERE Id = ?")
            .bind(id)
            .execute(&mut *transaction)
            .await?;

        transaction.commit().await?;

        debug!("Removed order");
        Ok(order)
    }
}

fn order_from_row(row: &SqliteRow) -> Result<Order, StoreError> {
    let items: String = row.try_get("Items")?;
    let created_at: String = row.try_get("CreatedAt")?;

    let items: Vec<Value> = serde_json::from_str(&items)
        .map_err(|e| StoreError::Malformed(format!("invalid items: {}", e)))?;

    Ok(Order {
        id: row.try_get("Id")?,
        user_id: row.try_get("UserId")?,
        items,
        total: row.try_get("Total")?,
        created_at: parse_timestamp(&created_at)?,
    })
}
