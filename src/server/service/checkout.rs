use crate::server::database::{finish, DbClient, DbError, OrderStore};
use crate::server::model::cart::{
    lines_total, CartEntryError, CheckoutRequest, LineItemKind, OrderLine,
};
use crate::server::model::config::InventoryFloorPolicy;
use crate::server::model::receipt::ReceiptStatus;
use crate::server::service::inventory;
use crate::server::util::time::get_utc_now;
use derive_more::{Display, Error};
use log::{info, warn};
use rust_decimal::Decimal;

#[derive(Debug, Display, Error)]
pub(crate) enum CheckoutError {
    #[display("order has no items")]
    EmptyOrder,
    #[display("invalid cart entry #{index}: {source}")]
    InvalidEntry {
        index: usize,
        source: CartEntryError,
    },
    #[display("inventory item {inventory_id} would drop to {remaining}")]
    InsufficientInventory { inventory_id: i32, remaining: Decimal },
    #[display("consumption of inventory item {inventory_id} overflowed")]
    ConsumptionOverflow { inventory_id: i32 },
    #[display("{source}")]
    Db { source: DbError },
}

impl From<DbError> for CheckoutError {
    fn from(source: DbError) -> Self {
        CheckoutError::Db { source }
    }
}

/// Parse every cart entry up front so a bad entry never opens a transaction.
pub(crate) fn order_lines(request: CheckoutRequest) -> Result<Vec<OrderLine>, CheckoutError> {
    let lines = request
        .order_list
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            OrderLine::try_from(entry).map_err(|source| CheckoutError::InvalidEntry { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if lines.is_empty() {
        return Err(CheckoutError::EmptyOrder);
    }
    Ok(lines)
}

/// Record a sale and consume its ingredients as one unit of work.
///
/// The receipt, every line item with its variant row, and every inventory
/// decrement commit together or not at all. The caller's `totalPrice` is
/// stored as is; a disagreement with the line prices is only logged.
/// Resubmitting the same cart records a second receipt.
pub(crate) async fn place_order<C: DbClient>(
    client: &mut C,
    request: CheckoutRequest,
    policy: InventoryFloorPolicy,
) -> Result<i64, CheckoutError> {
    let claimed_total = request.total_price;
    let lines = order_lines(request)?;

    match lines_total(&lines) {
        Some(computed_total) if computed_total != claimed_total => warn!(
            "order total mismatch, claimed={} computed={}",
            claimed_total, computed_total
        ),
        Some(_) => {}
        None => warn!("computed total overflowed, claimed={}", claimed_total),
    }

    let txn = client.transaction().await?;
    let result = record_sale(&txn, &lines, claimed_total, policy).await;
    let receipt_id = finish(txn, result).await?;
    let summary: Vec<String> = lines
        .iter()
        .map(|line| format!("{}x{}", line.quantity, line.kind.label()))
        .collect();
    info!("receipt {} recorded, {}", receipt_id, summary.join(" "));
    Ok(receipt_id)
}

async fn record_sale<S: OrderStore>(
    store: &S,
    lines: &[OrderLine],
    total: Decimal,
    policy: InventoryFloorPolicy,
) -> Result<i64, CheckoutError> {
    let now = get_utc_now();
    let receipt_id = store
        .insert_receipt(now, now, total, ReceiptStatus::Pending)
        .await?;

    // one row per unit, in cart order
    for line in lines {
        for _ in 0..line.quantity {
            insert_line(store, receipt_id, &line.kind, line.price).await?;
        }
    }

    for line in lines {
        let consumed = inventory::consumption_for(store, line).await?;
        inventory::apply_consumption(store, &consumed, policy).await?;
    }

    Ok(receipt_id)
}

/// Insert a line item and exactly one variant row for it.
pub(crate) async fn insert_line<S: OrderStore>(
    store: &S,
    receipt_id: i64,
    kind: &LineItemKind,
    price: Decimal,
) -> Result<i64, DbError> {
    let line_item_id = store.insert_line_item(receipt_id, price).await?;
    match kind {
        LineItemKind::Meal(meal) => store.insert_meal_item(line_item_id, meal).await?,
        LineItemKind::Drink(drink) => store.insert_drink_item(line_item_id, drink).await?,
        LineItemKind::Appetizer(appetizer) => {
            store.insert_appetizer_item(line_item_id, appetizer).await?
        }
    }
    Ok(line_item_id)
}
