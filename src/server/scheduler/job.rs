use crate::server::database::pool::Pool;
use crate::server::database::{DbClient, DbError};
use crate::server::model::inventory::InventoryItem;
use crate::server::service::catalog;
use log::{error, info, warn};
use std::time::Duration;
use tokio::{pin, select, time};
use tokio_util::sync::CancellationToken;

/// One pass over the stock room; returns the items that need a restock now.
pub(crate) async fn restock_sweep<C: DbClient>(
    pool: &Pool<C>,
    acquire_timeout: Duration,
) -> Result<Vec<InventoryItem>, DbError> {
    let mut conn = pool.acquire(acquire_timeout).await?;
    let critical = catalog::critical_items(&mut *conn).await?;
    for item in &critical {
        warn!(
            "inventory item {} is critically low, {} {} left",
            item.name, item.quantity, item.unit
        );
    }
    Ok(critical)
}

/// Log critically low inventory every `period` until cancelled.
pub(crate) async fn restock_monitor<C: DbClient>(
    pool: Pool<C>,
    period: Duration,
    acquire_timeout: Duration,
    cancel_token: CancellationToken,
) {
    let interval = time::interval(period);
    pin!(interval);
    loop {
        select! {
            _ = interval.tick() => {},
            _ = cancel_token.cancelled() => {
                info!("received cancel signal, returning gracefully");
                return;
            }
        }

        match restock_sweep(&pool, acquire_timeout).await {
            Ok(critical) if critical.is_empty() => {}
            Ok(critical) => info!("{} inventory items need restocking", critical.len()),
            Err(e) => error!("restock sweep failed, {}", e),
        }
    }
}
