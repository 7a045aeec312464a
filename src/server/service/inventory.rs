//! Translates sold menu entries into raw ingredient consumption.

use crate::server::database::OrderStore;
use crate::server::model::cart::OrderLine;
use crate::server::model::config::InventoryFloorPolicy;
use crate::server::service::checkout::CheckoutError;
use log::warn;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Ingredients consumed by one cart entry, keyed by inventory id.
///
/// Every menu entry the line names is looked up once and its recipe scaled
/// by the entry's quantity; ingredients shared between entries of the same
/// line (e.g. rice in two sides) are summed.
pub(crate) async fn consumption_for<S: OrderStore>(
    store: &S,
    line: &OrderLine,
) -> Result<BTreeMap<i32, Decimal>, CheckoutError> {
    let units = Decimal::from(line.quantity);
    let mut consumed = BTreeMap::new();
    for name in line.kind.menu_names() {
        for ingredient in store.recipe_for(name).await? {
            let inventory_id = ingredient.inventory_id;
            let total = consumed.entry(inventory_id).or_insert(Decimal::ZERO);
            let so_far = *total;
            *total = ingredient
                .quantity
                .checked_mul(units)
                .and_then(|amount| so_far.checked_add(amount))
                .ok_or(CheckoutError::ConsumptionOverflow { inventory_id })?;
        }
    }
    Ok(consumed)
}

/// One `UPDATE` per ingredient, in inventory id order.
pub(crate) async fn apply_consumption<S: OrderStore>(
    store: &S,
    consumed: &BTreeMap<i32, Decimal>,
    policy: InventoryFloorPolicy,
) -> Result<(), CheckoutError> {
    for (&inventory_id, &amount) in consumed {
        let Some(remaining) = store.decrement_inventory(inventory_id, amount).await? else {
            warn!("inventory item {} vanished, skipping decrement", inventory_id);
            continue;
        };
        if remaining >= Decimal::ZERO {
            continue;
        }
        match policy {
            InventoryFloorPolicy::Allow => {}
            InventoryFloorPolicy::Warn => {
                warn!(
                    "inventory item {} dropped below zero, remaining={}",
                    inventory_id, remaining
                );
            }
            InventoryFloorPolicy::Clamp => {
                warn!(
                    "inventory item {} clamped to zero, short by {}",
                    inventory_id, -remaining
                );
                store.set_inventory_quantity(inventory_id, Decimal::ZERO).await?;
            }
            InventoryFloorPolicy::Reject => {
                return Err(CheckoutError::InsufficientInventory {
                    inventory_id,
                    remaining,
                });
            }
        }
    }
    Ok(())
}
