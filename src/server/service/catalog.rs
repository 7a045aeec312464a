//! Read-only views over the menu and the stock room.

use crate::server::database::{finish, DbClient, DbError, OrderStore};
use crate::server::model::inventory::{InventoryItem, MenuCategory, MenuEntry, RestockSeverity};

pub(crate) async fn menu<C: DbClient>(
    client: &mut C,
    category: Option<MenuCategory>,
) -> Result<Vec<MenuEntry>, DbError> {
    let txn = client.transaction().await?;
    let result = txn.list_menu(category).await;
    finish(txn, result).await
}

pub(crate) async fn inventory_levels<C: DbClient>(client: &mut C) -> Result<Vec<InventoryItem>, DbError> {
    let txn = client.transaction().await?;
    let result = txn.list_inventory().await;
    finish(txn, result).await
}

pub(crate) async fn critical_items<C: DbClient>(client: &mut C) -> Result<Vec<InventoryItem>, DbError> {
    Ok(inventory_levels(client)
        .await?
        .into_iter()
        .filter(|item| item.severity == RestockSeverity::Critical)
        .collect())
}
