//! In-memory unit of work for tests. Writes are staged on a private copy and
//! journaled; commit replays the journal onto the shared tables, so inventory
//! decrements land as deltas like `quantity = quantity - $1` does.

use crate::server::database::{DbClient, DbError, OrderStore, UnitOfWork};
use crate::server::model::cart::{AppetizerSelection, DrinkSelection, MealSelection};
use crate::server::model::inventory::{
    InventoryItem, MenuCategory, MenuEntry, RecipeIngredient, RestockSeverity,
};
use crate::server::model::receipt::{LineItemRow, ReceiptRow, ReceiptStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StockRow {
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub menu: BTreeMap<String, MenuEntry>,
    pub inventory: BTreeMap<i32, StockRow>,
    pub recipes: BTreeMap<String, Vec<RecipeIngredient>>,
    pub receipts: BTreeMap<i64, ReceiptRow>,
    /// line item id -> (receipt id, price)
    pub line_items: BTreeMap<i64, (i64, Decimal)>,
    pub meals: BTreeMap<i64, MealSelection>,
    pub drinks: BTreeMap<i64, DrinkSelection>,
    pub appetizers: BTreeMap<i64, AppetizerSelection>,
}

#[derive(Debug, Clone)]
enum Write {
    Receipt(ReceiptRow),
    LineItem { id: i64, receipt_id: i64, price: Decimal },
    Meal(i64, MealSelection),
    Drink(i64, DrinkSelection),
    Appetizer(i64, AppetizerSelection),
    Decrement { inventory_id: i32, amount: Decimal },
    SetQuantity { inventory_id: i32, quantity: Decimal },
    DeleteLineItems { receipt_id: i64 },
    UpdateReceipt { receipt_id: i64, status: ReceiptStatus, total: Option<Decimal> },
    DeleteReceipt { receipt_id: i64 },
}

fn violation(constraint: impl Into<String>) -> DbError {
    DbError::Constraint {
        constraint: constraint.into(),
    }
}

impl Tables {
    fn require_menu(&self, name: &str, constraint: &str) -> Result<(), DbError> {
        if self.menu.contains_key(name) {
            Ok(())
        } else {
            Err(violation(format!("{constraint}: `{name}` is not on the menu")))
        }
    }

    fn require_line_item(&self, id: i64, table: &str) -> Result<(), DbError> {
        if !self.line_items.contains_key(&id) {
            return Err(violation(format!("{table}_line_item_id_fkey")));
        }
        if self.meals.contains_key(&id) || self.drinks.contains_key(&id) || self.appetizers.contains_key(&id) {
            return Err(violation(format!("{table}_pkey")));
        }
        Ok(())
    }

    /// Apply one write, returning the affected row count.
    fn apply(&mut self, write: &Write) -> Result<u64, DbError> {
        match write {
            Write::Receipt(row) => {
                self.receipts.insert(row.receipt_id, row.clone());
                Ok(1)
            }
            Write::LineItem { id, receipt_id, price } => {
                if !self.receipts.contains_key(receipt_id) {
                    return Err(violation("line_item_receipt_id_fkey"));
                }
                self.line_items.insert(*id, (*receipt_id, *price));
                Ok(1)
            }
            Write::Meal(id, meal) => {
                self.require_line_item(*id, "meal")?;
                for name in meal.entrees.iter().flatten() {
                    self.require_menu(name, "meal_line_item_entree_fkey")?;
                }
                self.require_menu(&meal.side, "meal_line_item_side_fkey")?;
                self.meals.insert(*id, meal.clone());
                Ok(1)
            }
            Write::Drink(id, drink) => {
                self.require_line_item(*id, "drink")?;
                self.require_menu(&drink.name, "drink_line_item_name_fkey")?;
                self.drinks.insert(*id, drink.clone());
                Ok(1)
            }
            Write::Appetizer(id, appetizer) => {
                self.require_line_item(*id, "appetizer")?;
                self.require_menu(&appetizer.name, "appetizer_line_item_name_fkey")?;
                self.appetizers.insert(*id, appetizer.clone());
                Ok(1)
            }
            Write::Decrement { inventory_id, amount } => match self.inventory.get_mut(inventory_id) {
                Some(stock) => {
                    stock.quantity -= *amount;
                    Ok(1)
                }
                None => Ok(0),
            },
            Write::SetQuantity { inventory_id, quantity } => match self.inventory.get_mut(inventory_id) {
                Some(stock) => {
                    stock.quantity = *quantity;
                    Ok(1)
                }
                None => Ok(0),
            },
            Write::DeleteLineItems { receipt_id } => {
                let ids: Vec<i64> = self
                    .line_items
                    .iter()
                    .filter(|(_, (owner, _))| owner == receipt_id)
                    .map(|(id, _)| *id)
                    .collect();
                for id in &ids {
                    self.meals.remove(id);
                    self.drinks.remove(id);
                    self.appetizers.remove(id);
                    self.line_items.remove(id);
                }
                Ok(ids.len() as u64)
            }
            Write::UpdateReceipt { receipt_id, status, total } => match self.receipts.get_mut(receipt_id) {
                Some(receipt) => {
                    receipt.status = *status;
                    if let Some(total) = total {
                        receipt.totalamount = *total;
                    }
                    Ok(1)
                }
                None => Ok(0),
            },
            Write::DeleteReceipt { receipt_id } => {
                if self.line_items.values().any(|(owner, _)| owner == receipt_id) {
                    return Err(violation("line_item_receipt_id_fkey"));
                }
                Ok(self.receipts.remove(receipt_id).map_or(0, |_| 1))
            }
        }
    }
}

/// Shared state behind every [`MemoryClient`] of one test.
#[derive(Debug, Default)]
pub(crate) struct MemoryBackend {
    committed: Mutex<Tables>,
    recipe_lookups: Mutex<Vec<String>>,
    next_receipt_id: AtomicI64,
    next_line_item_id: AtomicI64,
    /// bumped by [`MemoryBackend::restart`]; older clients report closed
    generation: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_tables(tables: Tables) -> Arc<Self> {
        Arc::new(Self {
            committed: Mutex::new(tables),
            ..Self::default()
        })
    }

    /// Menu, stock and recipes used across the checkout tests.
    pub fn seeded() -> Arc<Self> {
        let mut tables = Tables::default();
        let menu = [
            ("Plate", MenuCategory::Meal, "9.99", 0),
            ("Orange Chicken", MenuCategory::Entree, "0", 490),
            ("Broccoli Beef", MenuCategory::Entree, "0", 150),
            ("Fried Rice", MenuCategory::Side, "0", 520),
            ("White Rice", MenuCategory::Side, "0", 380),
            ("Medium Drink", MenuCategory::Drink, "1.99", 200),
            ("Cream Cheese Rangoon", MenuCategory::Appetizer, "2.49", 190),
        ];
        for (name, category, price, calories) in menu {
            tables.menu.insert(
                name.to_string(),
                MenuEntry {
                    name: name.to_string(),
                    category,
                    price: price.parse().unwrap(),
                    calories,
                },
            );
        }
        let stock = [
            (1, "Chicken", "100", "lb"),
            (2, "Beef", "80", "lb"),
            (3, "Broccoli", "60", "lb"),
            (4, "Rice", "200", "lb"),
            (5, "Egg", "120", "each"),
            (6, "Cup", "300", "each"),
            (7, "Wonton Wrapper", "15", "each"),
            (8, "Orange Sauce", "40", "oz"),
        ];
        for (id, name, quantity, unit) in stock {
            tables.inventory.insert(
                id,
                StockRow {
                    name: name.to_string(),
                    quantity: quantity.parse().unwrap(),
                    unit: unit.to_string(),
                },
            );
        }
        let recipes: [(&str, &[(i32, &str)]); 6] = [
            ("Orange Chicken", &[(1, "2"), (8, "1.5")]),
            ("Broccoli Beef", &[(2, "1"), (3, "0.5")]),
            ("Fried Rice", &[(4, "1"), (5, "1")]),
            ("White Rice", &[(4, "1")]),
            ("Medium Drink", &[(6, "1")]),
            ("Cream Cheese Rangoon", &[(7, "3")]),
        ];
        for (menu_name, ingredients) in recipes {
            tables.recipes.insert(
                menu_name.to_string(),
                ingredients
                    .iter()
                    .map(|(inventory_id, quantity)| RecipeIngredient {
                        inventory_id: *inventory_id,
                        quantity: quantity.parse().unwrap(),
                    })
                    .collect(),
            );
        }
        Self::with_tables(tables)
    }

    pub fn snapshot(&self) -> Tables {
        self.tables().clone()
    }

    pub fn quantity_of(&self, inventory_id: i32) -> Decimal {
        self.tables().inventory[&inventory_id].quantity
    }

    pub fn recipe_lookups(&self) -> Vec<String> {
        self.recipe_lookups.lock().unwrap().clone()
    }

    /// Simulate a server restart: every client opened so far is closed.
    pub fn restart(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.committed.lock().unwrap()
    }
}

pub(crate) struct MemoryClient {
    backend: Arc<MemoryBackend>,
    generation: u64,
    closed: bool,
}

impl MemoryClient {
    pub fn new(backend: Arc<MemoryBackend>) -> Self {
        Self {
            generation: backend.generation.load(Ordering::SeqCst),
            backend,
            closed: false,
        }
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl DbClient for MemoryClient {
    type Txn<'a> = MemoryTxn;

    async fn transaction(&mut self) -> Result<MemoryTxn, DbError> {
        Ok(MemoryTxn {
            staged: RefCell::new(self.backend.snapshot()),
            journal: RefCell::new(Vec::new()),
            backend: self.backend.clone(),
        })
    }

    fn is_closed(&self) -> bool {
        self.closed || self.generation != self.backend.generation.load(Ordering::SeqCst)
    }
}

pub(crate) struct MemoryTxn {
    backend: Arc<MemoryBackend>,
    staged: RefCell<Tables>,
    journal: RefCell<Vec<Write>>,
}

impl MemoryTxn {
    /// Every statement is a suspension point, like a round trip to the server.
    async fn write(&self, write: Write) -> Result<u64, DbError> {
        tokio::task::yield_now().await;
        let affected = self.staged.borrow_mut().apply(&write)?;
        self.journal.borrow_mut().push(write);
        Ok(affected)
    }

    async fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        tokio::task::yield_now().await;
        f(&self.staged.borrow())
    }
}

impl UnitOfWork for MemoryTxn {
    async fn commit(self) -> Result<(), DbError> {
        tokio::task::yield_now().await;
        let mut committed = self.backend.tables();
        let mut next = committed.clone();
        for write in self.journal.borrow().iter() {
            next.apply(write)?;
        }
        *committed = next;
        Ok(())
    }

    async fn rollback(self) -> Result<(), DbError> {
        Ok(())
    }
}

impl OrderStore for MemoryTxn {
    async fn insert_receipt(
        &self,
        created_at: DateTime<Utc>,
        order_time: DateTime<Utc>,
        total: Decimal,
        status: ReceiptStatus,
    ) -> Result<i64, DbError> {
        let receipt_id = self.backend.next_receipt_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.write(Write::Receipt(ReceiptRow {
            receipt_id,
            date: created_at,
            order_time,
            totalamount: total,
            status,
        }))
        .await?;
        Ok(receipt_id)
    }

    async fn insert_line_item(&self, receipt_id: i64, price: Decimal) -> Result<i64, DbError> {
        let id = self.backend.next_line_item_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.write(Write::LineItem { id, receipt_id, price }).await?;
        Ok(id)
    }

    async fn insert_meal_item(&self, line_item_id: i64, meal: &MealSelection) -> Result<(), DbError> {
        self.write(Write::Meal(line_item_id, meal.clone())).await.map(|_| ())
    }

    async fn insert_drink_item(&self, line_item_id: i64, drink: &DrinkSelection) -> Result<(), DbError> {
        self.write(Write::Drink(line_item_id, drink.clone())).await.map(|_| ())
    }

    async fn insert_appetizer_item(
        &self,
        line_item_id: i64,
        appetizer: &AppetizerSelection,
    ) -> Result<(), DbError> {
        self.write(Write::Appetizer(line_item_id, appetizer.clone()))
            .await
            .map(|_| ())
    }

    async fn recipe_for(&self, menu_name: &str) -> Result<Vec<RecipeIngredient>, DbError> {
        self.backend
            .recipe_lookups
            .lock()
            .unwrap()
            .push(menu_name.to_string());
        Ok(self
            .read(|t| t.recipes.get(menu_name).cloned().unwrap_or_default())
            .await)
    }

    async fn decrement_inventory(
        &self,
        inventory_id: i32,
        amount: Decimal,
    ) -> Result<Option<Decimal>, DbError> {
        match self.write(Write::Decrement { inventory_id, amount }).await? {
            0 => Ok(None),
            _ => Ok(self
                .read(|t| t.inventory.get(&inventory_id).map(|s| s.quantity))
                .await),
        }
    }

    async fn set_inventory_quantity(&self, inventory_id: i32, quantity: Decimal) -> Result<u64, DbError> {
        self.write(Write::SetQuantity { inventory_id, quantity }).await
    }

    async fn find_receipt(&self, receipt_id: i64) -> Result<Option<ReceiptRow>, DbError> {
        Ok(self.read(|t| t.receipts.get(&receipt_id).cloned()).await)
    }

    async fn list_receipts(
        &self,
        offset: i64,
        limit: i64,
        status: Option<ReceiptStatus>,
    ) -> Result<Vec<ReceiptRow>, DbError> {
        Ok(self
            .read(|t| {
                let mut rows: Vec<ReceiptRow> = t
                    .receipts
                    .values()
                    .filter(|r| status.map_or(true, |s| r.status == s))
                    .cloned()
                    .collect();
                rows.sort_by(|a, b| (b.date, b.receipt_id).cmp(&(a.date, a.receipt_id)));
                rows.into_iter()
                    .skip(offset as usize)
                    .take(limit as usize)
                    .collect()
            })
            .await)
    }

    async fn line_items_of(&self, receipt_id: i64) -> Result<Vec<LineItemRow>, DbError> {
        Ok(self
            .read(|t| {
                t.line_items
                    .iter()
                    .filter(|(_, (owner, _))| *owner == receipt_id)
                    .map(|(id, (_, price))| LineItemRow {
                        line_item_id: *id,
                        price: *price,
                    })
                    .collect()
            })
            .await)
    }

    async fn find_meal_item(&self, line_item_id: i64) -> Result<Option<MealSelection>, DbError> {
        Ok(self.read(|t| t.meals.get(&line_item_id).cloned()).await)
    }

    async fn find_drink_item(&self, line_item_id: i64) -> Result<Option<DrinkSelection>, DbError> {
        Ok(self.read(|t| t.drinks.get(&line_item_id).cloned()).await)
    }

    async fn find_appetizer_item(&self, line_item_id: i64) -> Result<Option<AppetizerSelection>, DbError> {
        Ok(self.read(|t| t.appetizers.get(&line_item_id).cloned()).await)
    }

    async fn delete_line_items(&self, receipt_id: i64) -> Result<u64, DbError> {
        self.write(Write::DeleteLineItems { receipt_id }).await
    }

    async fn update_receipt(
        &self,
        receipt_id: i64,
        status: ReceiptStatus,
        total: Option<Decimal>,
    ) -> Result<u64, DbError> {
        self.write(Write::UpdateReceipt {
            receipt_id,
            status,
            total,
        })
        .await
    }

    async fn delete_receipt(&self, receipt_id: i64) -> Result<u64, DbError> {
        self.write(Write::DeleteReceipt { receipt_id }).await
    }

    async fn list_inventory(&self) -> Result<Vec<InventoryItem>, DbError> {
        Ok(self
            .read(|t| {
                let mut items: Vec<InventoryItem> = t
                    .inventory
                    .iter()
                    .map(|(id, stock)| InventoryItem {
                        id: *id,
                        name: stock.name.clone(),
                        quantity: stock.quantity,
                        unit: stock.unit.clone(),
                        severity: RestockSeverity::from_quantity(stock.quantity),
                    })
                    .collect();
                items.sort_by(|a, b| a.name.cmp(&b.name));
                items
            })
            .await)
    }

    async fn list_menu(&self, category: Option<MenuCategory>) -> Result<Vec<MenuEntry>, DbError> {
        Ok(self
            .read(|t| {
                let mut entries: Vec<MenuEntry> = t
                    .menu
                    .values()
                    .filter(|m| category.map_or(true, |c| m.category == c))
                    .cloned()
                    .collect();
                entries.sort_by(|a, b| (a.category.as_str(), &a.name).cmp(&(b.category.as_str(), &b.name)));
                entries
            })
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn dropped_transaction_leaves_no_trace() {
        let backend = MemoryBackend::seeded();
        let mut client = MemoryClient::new(backend.clone());
        {
            let txn = client.transaction().await.unwrap();
            txn.insert_receipt(Utc::now(), Utc::now(), dec!(1), ReceiptStatus::Pending)
                .await
                .unwrap();
            txn.decrement_inventory(1, dec!(10)).await.unwrap();
        }
        assert!(backend.snapshot().receipts.is_empty());
        assert_eq!(backend.quantity_of(1), dec!(100));
    }

    #[tokio::test]
    async fn variant_rows_require_menu_names() {
        let backend = MemoryBackend::seeded();
        let mut client = MemoryClient::new(backend);
        let txn = client.transaction().await.unwrap();
        let receipt_id = txn
            .insert_receipt(Utc::now(), Utc::now(), dec!(1), ReceiptStatus::Pending)
            .await
            .unwrap();
        let line_item_id = txn.insert_line_item(receipt_id, dec!(1)).await.unwrap();
        let err = txn
            .insert_drink_item(
                line_item_id,
                &DrinkSelection {
                    name: "Mystery Soda".to_string(),
                    size: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Constraint { .. }));
    }

    #[tokio::test]
    async fn interleaved_commits_both_apply_their_decrements() {
        let backend = MemoryBackend::seeded();
        let (mut a, mut b) = (
            MemoryClient::new(backend.clone()),
            MemoryClient::new(backend.clone()),
        );
        let (first, second) = (a.transaction().await.unwrap(), b.transaction().await.unwrap());
        first.decrement_inventory(4, dec!(3)).await.unwrap();
        second.decrement_inventory(4, dec!(5)).await.unwrap();
        first.commit().await.unwrap();
        second.commit().await.unwrap();
        assert_eq!(backend.quantity_of(4), dec!(192));
    }
}
