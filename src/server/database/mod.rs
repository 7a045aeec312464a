//! Persistence seams: the connection pool, the unit of work handed to the
//! services, and the row level operations they are allowed to run.

use crate::server::model::cart::{AppetizerSelection, DrinkSelection, MealSelection};
use crate::server::model::inventory::{InventoryItem, MenuCategory, MenuEntry, RecipeIngredient};
use crate::server::model::receipt::{LineItemRow, ReceiptRow, ReceiptStatus};
use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use log::warn;
use rust_decimal::Decimal;

pub(crate) mod pool;
pub(crate) mod postgres;

#[cfg(test)]
pub(crate) mod memory;

#[derive(Debug, Display, Error)]
pub(crate) enum DbError {
    #[display("postgres error: {source}")]
    Postgres { source: tokio_postgres::Error },
    #[display("timed out acquiring a connection from pool `{pool}`")]
    PoolTimeout { pool: String },
    #[display("pool `{pool}` is closed")]
    PoolClosed { pool: String },
    #[display("failed to decode column `{column}`: {message}")]
    Decode { column: &'static str, message: String },
    #[display("constraint violated: {constraint}")]
    Constraint { constraint: String },
}

impl From<tokio_postgres::Error> for DbError {
    fn from(source: tokio_postgres::Error) -> Self {
        let constraint = source
            .as_db_error()
            .and_then(|e| e.constraint())
            .map(str::to_string);
        match constraint {
            Some(constraint) => DbError::Constraint { constraint },
            None => DbError::Postgres { source },
        }
    }
}

/// A database client that can open units of work.
pub(crate) trait DbClient: Send + Sync + 'static {
    type Txn<'a>: UnitOfWork
    where
        Self: 'a;

    async fn transaction(&mut self) -> Result<Self::Txn<'_>, DbError>;

    /// Closed clients are dropped instead of being returned to the pool.
    fn is_closed(&self) -> bool {
        false
    }
}

/// An open transaction. Dropping it without `commit` rolls it back.
pub(crate) trait UnitOfWork: OrderStore + Sized {
    async fn commit(self) -> Result<(), DbError>;
    async fn rollback(self) -> Result<(), DbError>;
}

/// Commit on success, roll back on failure. A failed rollback is only logged;
/// the original error is what the caller sees.
pub(crate) async fn finish<U, T, E>(txn: U, result: Result<T, E>) -> Result<T, E>
where
    U: UnitOfWork,
    E: From<DbError>,
{
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!("rollback failed, {}", rollback_err);
            }
            Err(e)
        }
    }
}

/// Every statement the order workflows issue.
pub(crate) trait OrderStore {
    async fn insert_receipt(
        &self,
        created_at: DateTime<Utc>,
        order_time: DateTime<Utc>,
        total: Decimal,
        status: ReceiptStatus,
    ) -> Result<i64, DbError>;

    async fn insert_line_item(&self, receipt_id: i64, price: Decimal) -> Result<i64, DbError>;

    async fn insert_meal_item(&self, line_item_id: i64, meal: &MealSelection) -> Result<(), DbError>;

    async fn insert_drink_item(&self, line_item_id: i64, drink: &DrinkSelection) -> Result<(), DbError>;

    async fn insert_appetizer_item(
        &self,
        line_item_id: i64,
        appetizer: &AppetizerSelection,
    ) -> Result<(), DbError>;

    async fn recipe_for(&self, menu_name: &str) -> Result<Vec<RecipeIngredient>, DbError>;

    /// Subtract `amount` in place and return the new on-hand quantity,
    /// `None` when the item does not exist.
    async fn decrement_inventory(
        &self,
        inventory_id: i32,
        amount: Decimal,
    ) -> Result<Option<Decimal>, DbError>;

    async fn set_inventory_quantity(&self, inventory_id: i32, quantity: Decimal) -> Result<u64, DbError>;

    async fn find_receipt(&self, receipt_id: i64) -> Result<Option<ReceiptRow>, DbError>;

    /// Newest first.
    async fn list_receipts(
        &self,
        offset: i64,
        limit: i64,
        status: Option<ReceiptStatus>,
    ) -> Result<Vec<ReceiptRow>, DbError>;

    async fn line_items_of(&self, receipt_id: i64) -> Result<Vec<LineItemRow>, DbError>;

    async fn find_meal_item(&self, line_item_id: i64) -> Result<Option<MealSelection>, DbError>;

    async fn find_drink_item(&self, line_item_id: i64) -> Result<Option<DrinkSelection>, DbError>;

    async fn find_appetizer_item(&self, line_item_id: i64) -> Result<Option<AppetizerSelection>, DbError>;

    /// Removes the variant rows and then the line items of a receipt.
    async fn delete_line_items(&self, receipt_id: i64) -> Result<u64, DbError>;

    async fn update_receipt(
        &self,
        receipt_id: i64,
        status: ReceiptStatus,
        total: Option<Decimal>,
    ) -> Result<u64, DbError>;

    async fn delete_receipt(&self, receipt_id: i64) -> Result<u64, DbError>;

    async fn list_inventory(&self) -> Result<Vec<InventoryItem>, DbError>;

    async fn list_menu(&self, category: Option<MenuCategory>) -> Result<Vec<MenuEntry>, DbError>;
}
