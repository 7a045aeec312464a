use crate::server::database::{finish, DbClient, DbError, OrderStore};
use crate::server::model::cart::{CartEntryError, LineItemKind, OrderLine};
use crate::server::model::receipt::{
    LineItemView, PutReceiptRequest, Receipt, ReceiptRow, ReceiptStatus,
};
use crate::server::service::checkout::insert_line;
use derive_more::{Display, Error};
use log::{info, warn};

#[derive(Debug, Display, Error)]
pub(crate) enum ReceiptError {
    #[display("receipt {receipt_id} not found")]
    NotFound { receipt_id: i64 },
    #[display("invalid line item #{index}: {source}")]
    InvalidLineItem {
        index: usize,
        source: CartEntryError,
    },
    #[display("{source}")]
    Db { source: DbError },
}

impl From<DbError> for ReceiptError {
    fn from(source: DbError) -> Self {
        ReceiptError::Db { source }
    }
}

pub(crate) async fn fetch_receipt<C: DbClient>(
    client: &mut C,
    receipt_id: i64,
) -> Result<Receipt, ReceiptError> {
    let txn = client.transaction().await?;
    let result = load_receipt(&txn, receipt_id).await;
    finish(txn, result).await
}

async fn load_receipt<S: OrderStore>(store: &S, receipt_id: i64) -> Result<Receipt, ReceiptError> {
    let header = store
        .find_receipt(receipt_id)
        .await?
        .ok_or(ReceiptError::NotFound { receipt_id })?;

    let mut line_items = Vec::new();
    for row in store.line_items_of(receipt_id).await? {
        match resolve_variant(store, row.line_item_id).await? {
            Some(kind) => line_items.push(LineItemView {
                line_item_id: row.line_item_id,
                price: row.price,
                kind,
            }),
            None => warn!(
                "line item {} of receipt {} has no variant row",
                row.line_item_id, receipt_id
            ),
        }
    }

    Ok(Receipt { header, line_items })
}

/// A line item belongs to exactly one variant table; the first hit wins.
async fn resolve_variant<S: OrderStore>(
    store: &S,
    line_item_id: i64,
) -> Result<Option<LineItemKind>, DbError> {
    if let Some(meal) = store.find_meal_item(line_item_id).await? {
        return Ok(Some(LineItemKind::Meal(meal)));
    }
    if let Some(drink) = store.find_drink_item(line_item_id).await? {
        return Ok(Some(LineItemKind::Drink(drink)));
    }
    Ok(store
        .find_appetizer_item(line_item_id)
        .await?
        .map(LineItemKind::Appetizer))
}

pub(crate) async fn list_receipts<C: DbClient>(
    client: &mut C,
    offset: i64,
    limit: i64,
    status: Option<ReceiptStatus>,
) -> Result<Vec<ReceiptRow>, ReceiptError> {
    let txn = client.transaction().await?;
    let result = txn
        .list_receipts(offset, limit, status)
        .await
        .map_err(ReceiptError::from);
    finish(txn, result).await
}

/// Swap every line item of a receipt for `request.line_items` and set its
/// status. Inventory is left alone.
pub(crate) async fn replace_receipt<C: DbClient>(
    client: &mut C,
    receipt_id: i64,
    request: PutReceiptRequest,
) -> Result<(), ReceiptError> {
    let lines = request
        .line_items
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            OrderLine::try_from(entry).map_err(|source| ReceiptError::InvalidLineItem { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let (status, total) = (request.status, request.totalamount);

    let txn = client.transaction().await?;
    let result = async {
        if txn.find_receipt(receipt_id).await?.is_none() {
            return Err(ReceiptError::NotFound { receipt_id });
        }
        let removed = txn.delete_line_items(receipt_id).await?;
        for line in &lines {
            for _ in 0..line.quantity {
                insert_line(&txn, receipt_id, &line.kind, line.price).await?;
            }
        }
        txn.update_receipt(receipt_id, status, total).await?;
        Ok::<_, ReceiptError>(removed)
    }
    .await;
    let removed = finish(txn, result).await?;
    info!(
        "receipt {} replaced, {} line items removed, {} entries written",
        receipt_id,
        removed,
        lines.len()
    );
    Ok(())
}

pub(crate) async fn update_status<C: DbClient>(
    client: &mut C,
    receipt_id: i64,
    status: ReceiptStatus,
) -> Result<(), ReceiptError> {
    let txn = client.transaction().await?;
    let result = match txn.update_receipt(receipt_id, status, None).await {
        Ok(0) => Err(ReceiptError::NotFound { receipt_id }),
        Ok(_) => Ok(()),
        Err(e) => Err(e.into()),
    };
    finish(txn, result).await
}

/// Variant rows, then line items, then the receipt itself.
pub(crate) async fn delete_receipt<C: DbClient>(
    client: &mut C,
    receipt_id: i64,
) -> Result<(), ReceiptError> {
    let txn = client.transaction().await?;
    let result = async {
        let removed = txn.delete_line_items(receipt_id).await?;
        match txn.delete_receipt(receipt_id).await? {
            0 => Err(ReceiptError::NotFound { receipt_id }),
            _ => Ok::<_, ReceiptError>(removed),
        }
    }
    .await;
    let removed = finish(txn, result).await?;
    info!("receipt {} deleted with {} line items", receipt_id, removed);
    Ok(())
}
