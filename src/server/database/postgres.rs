use crate::server::database::pool::Pool;
use crate::server::database::{DbClient, DbError, OrderStore, UnitOfWork};
use crate::server::model::cart::{AppetizerSelection, DrinkSelection, MealSelection};
use crate::server::model::inventory::{
    InventoryItem, MenuCategory, MenuEntry, RecipeIngredient, RestockSeverity,
};
use crate::server::model::receipt::{LineItemRow, ReceiptRow, ReceiptStatus};
use chrono::{DateTime, Utc};
use log::{error, info};
use rust_decimal::Decimal;
use tokio::task::JoinSet;
use tokio_postgres::{Client, NoTls, Row, Transaction};

const RECEIPT_COLUMNS: &str = "id, created_at, order_time, total_amount, status";

impl DbClient for Client {
    type Txn<'a> = Transaction<'a>;

    async fn transaction(&mut self) -> Result<Transaction<'_>, DbError> {
        Ok(Client::transaction(self).await?)
    }

    fn is_closed(&self) -> bool {
        Client::is_closed(self)
    }
}

impl UnitOfWork for Transaction<'_> {
    async fn commit(self) -> Result<(), DbError> {
        Ok(Transaction::commit(self).await?)
    }

    async fn rollback(self) -> Result<(), DbError> {
        Ok(Transaction::rollback(self).await?)
    }
}

async fn connect(conn_str: &str) -> Result<Client, DbError> {
    let (client, conn) = tokio_postgres::connect(conn_str, NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            error!("connection returned error and aborted, {}", e);
        }
    });
    Ok(client)
}

impl Pool<Client> {
    /// open `size` connections concurrently; closed ones are reopened with
    /// the same connection string
    pub async fn connect(name: &str, conn_str: &str, size: usize) -> Result<Self, DbError> {
        let conn_str = conn_str.to_string();
        let pool = Pool::with_connector(name, move || {
            let conn_str = conn_str.clone();
            async move { connect(&conn_str).await }
        });
        let mut set = JoinSet::new();
        for _ in 0..size {
            let pool = pool.clone();
            set.spawn(async move { pool.connect_one().await });
        }
        while let Some(res) = set.join_next().await {
            match res {
                Ok(Ok(client)) => pool.add(client),
                Ok(Err(e)) => return Err(e),
                Err(e) => error!("join_next failed when joining, {}", e),
            }
        }
        info!("pool {} ready with {} connections", pool.name(), pool.idle());
        Ok(pool)
    }
}

fn receipt_from_row(row: &Row) -> Result<ReceiptRow, DbError> {
    let status: String = row.try_get("status")?;
    Ok(ReceiptRow {
        receipt_id: row.try_get("id")?,
        date: row.try_get("created_at")?,
        order_time: row.try_get("order_time")?,
        totalamount: row.try_get("total_amount")?,
        status: status.parse().map_err(|message| DbError::Decode {
            column: "status",
            message,
        })?,
    })
}

impl OrderStore for Transaction<'_> {
    async fn insert_receipt(
        &self,
        created_at: DateTime<Utc>,
        order_time: DateTime<Utc>,
        total: Decimal,
        status: ReceiptStatus,
    ) -> Result<i64, DbError> {
        let row = self
            .query_one(
                r#"
                INSERT INTO receipt (created_at, order_time, total_amount, status)
                VALUES ($1, $2, $3, $4)
                RETURNING id
            "#,
                &[&created_at, &order_time, &total, &status.as_str()],
            )
            .await?;
        Ok(row.try_get("id")?)
    }

    async fn insert_line_item(&self, receipt_id: i64, price: Decimal) -> Result<i64, DbError> {
        let row = self
            .query_one(
                "INSERT INTO line_item (receipt_id, price) VALUES ($1, $2) RETURNING id",
                &[&receipt_id, &price],
            )
            .await?;
        Ok(row.try_get("id")?)
    }

    async fn insert_meal_item(&self, line_item_id: i64, meal: &MealSelection) -> Result<(), DbError> {
        let [entree1, entree2, entree3] = &meal.entrees;
        self.execute(
            r#"
            INSERT INTO meal_line_item (line_item_id, entree1, entree2, entree3, side, size)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#,
            &[&line_item_id, entree1, entree2, entree3, &meal.side, &meal.size],
        )
        .await?;
        Ok(())
    }

    async fn insert_drink_item(&self, line_item_id: i64, drink: &DrinkSelection) -> Result<(), DbError> {
        self.execute(
            "INSERT INTO drink_line_item (line_item_id, name, size) VALUES ($1, $2, $3)",
            &[&line_item_id, &drink.name, &drink.size],
        )
        .await?;
        Ok(())
    }

    async fn insert_appetizer_item(
        &self,
        line_item_id: i64,
        appetizer: &AppetizerSelection,
    ) -> Result<(), DbError> {
        self.execute(
            "INSERT INTO appetizer_line_item (line_item_id, name) VALUES ($1, $2)",
            &[&line_item_id, &appetizer.name],
        )
        .await?;
        Ok(())
    }

    async fn recipe_for(&self, menu_name: &str) -> Result<Vec<RecipeIngredient>, DbError> {
        let rows = self
            .query(
                r#"
                SELECT inventory_id, quantity
                FROM recipe_ingredient
                WHERE menu_name = $1
                ORDER BY inventory_id
            "#,
                &[&menu_name],
            )
            .await?;
        rows.iter()
            .map(|r| {
                Ok(RecipeIngredient {
                    inventory_id: r.try_get("inventory_id")?,
                    quantity: r.try_get("quantity")?,
                })
            })
            .collect()
    }

    async fn decrement_inventory(
        &self,
        inventory_id: i32,
        amount: Decimal,
    ) -> Result<Option<Decimal>, DbError> {
        let row = self
            .query_opt(
                r#"
                UPDATE inventory_item
                SET quantity = quantity - $1
                WHERE id = $2
                RETURNING quantity
            "#,
                &[&amount, &inventory_id],
            )
            .await?;
        match row {
            Some(row) => Ok(Some(row.try_get("quantity")?)),
            None => Ok(None),
        }
    }

    async fn set_inventory_quantity(&self, inventory_id: i32, quantity: Decimal) -> Result<u64, DbError> {
        Ok(self
            .execute(
                "UPDATE inventory_item SET quantity = $1 WHERE id = $2",
                &[&quantity, &inventory_id],
            )
            .await?)
    }

    async fn find_receipt(&self, receipt_id: i64) -> Result<Option<ReceiptRow>, DbError> {
        let stmt = format!("SELECT {RECEIPT_COLUMNS} FROM receipt WHERE id = $1");
        match self.query_opt(stmt.as_str(), &[&receipt_id]).await? {
            Some(row) => Ok(Some(receipt_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_receipts(
        &self,
        offset: i64,
        limit: i64,
        status: Option<ReceiptStatus>,
    ) -> Result<Vec<ReceiptRow>, DbError> {
        let stmt = format!(
            r#"
            SELECT {RECEIPT_COLUMNS}
            FROM receipt
            WHERE $3::text IS NULL OR status = $3
            ORDER BY created_at DESC, id DESC
            OFFSET $1
            LIMIT $2
        "#
        );
        let status = status.map(|s| s.as_str());
        let rows = self.query(stmt.as_str(), &[&offset, &limit, &status]).await?;
        rows.iter().map(receipt_from_row).collect()
    }

    async fn line_items_of(&self, receipt_id: i64) -> Result<Vec<LineItemRow>, DbError> {
        let rows = self
            .query(
                "SELECT id, price FROM line_item WHERE receipt_id = $1 ORDER BY id",
                &[&receipt_id],
            )
            .await?;
        rows.iter()
            .map(|r| {
                Ok(LineItemRow {
                    line_item_id: r.try_get("id")?,
                    price: r.try_get("price")?,
                })
            })
            .collect()
    }

    async fn find_meal_item(&self, line_item_id: i64) -> Result<Option<MealSelection>, DbError> {
        let row = self
            .query_opt(
                r#"
                SELECT entree1, entree2, entree3, side, size
                FROM meal_line_item
                WHERE line_item_id = $1
            "#,
                &[&line_item_id],
            )
            .await?;
        match row {
            Some(r) => Ok(Some(MealSelection {
                entrees: [r.try_get("entree1")?, r.try_get("entree2")?, r.try_get("entree3")?],
                side: r.try_get("side")?,
                size: r.try_get("size")?,
            })),
            None => Ok(None),
        }
    }

    async fn find_drink_item(&self, line_item_id: i64) -> Result<Option<DrinkSelection>, DbError> {
        let row = self
            .query_opt(
                "SELECT name, size FROM drink_line_item WHERE line_item_id = $1",
                &[&line_item_id],
            )
            .await?;
        match row {
            Some(r) => Ok(Some(DrinkSelection {
                name: r.try_get("name")?,
                size: r.try_get("size")?,
            })),
            None => Ok(None),
        }
    }

    async fn find_appetizer_item(&self, line_item_id: i64) -> Result<Option<AppetizerSelection>, DbError> {
        let row = self
            .query_opt(
                "SELECT name FROM appetizer_line_item WHERE line_item_id = $1",
                &[&line_item_id],
            )
            .await?;
        match row {
            Some(r) => Ok(Some(AppetizerSelection {
                name: r.try_get("name")?,
            })),
            None => Ok(None),
        }
    }

    async fn delete_line_items(&self, receipt_id: i64) -> Result<u64, DbError> {
        for variant in ["meal_line_item", "drink_line_item", "appetizer_line_item"] {
            let stmt = format!(
                "DELETE FROM {variant} WHERE line_item_id IN (SELECT id FROM line_item WHERE receipt_id = $1)"
            );
            self.execute(stmt.as_str(), &[&receipt_id]).await?;
        }
        Ok(self
            .execute("DELETE FROM line_item WHERE receipt_id = $1", &[&receipt_id])
            .await?)
    }

    async fn update_receipt(
        &self,
        receipt_id: i64,
        status: ReceiptStatus,
        total: Option<Decimal>,
    ) -> Result<u64, DbError> {
        Ok(self
            .execute(
                r#"
                UPDATE receipt
                SET status = $2, total_amount = COALESCE($3, total_amount)
                WHERE id = $1
            "#,
                &[&receipt_id, &status.as_str(), &total],
            )
            .await?)
    }

    async fn delete_receipt(&self, receipt_id: i64) -> Result<u64, DbError> {
        Ok(self
            .execute("DELETE FROM receipt WHERE id = $1", &[&receipt_id])
            .await?)
    }

    async fn list_inventory(&self) -> Result<Vec<InventoryItem>, DbError> {
        let rows = self
            .query(
                "SELECT id, name, quantity, unit FROM inventory_item ORDER BY name",
                &[],
            )
            .await?;
        rows.iter()
            .map(|r| {
                let quantity: Decimal = r.try_get("quantity")?;
                Ok(InventoryItem {
                    id: r.try_get("id")?,
                    name: r.try_get("name")?,
                    quantity,
                    unit: r.try_get("unit")?,
                    severity: RestockSeverity::from_quantity(quantity),
                })
            })
            .collect()
    }

    async fn list_menu(&self, category: Option<MenuCategory>) -> Result<Vec<MenuEntry>, DbError> {
        let category = category.map(|c| c.as_str());
        let rows = self
            .query(
                r#"
                SELECT name, category, price, calories
                FROM menu_item
                WHERE $1::text IS NULL OR category = $1
                ORDER BY category, name
            "#,
                &[&category],
            )
            .await?;
        rows.iter()
            .map(|r| {
                let category: String = r.try_get("category")?;
                Ok(MenuEntry {
                    name: r.try_get("name")?,
                    category: category.parse().map_err(|message| DbError::Decode {
                        column: "category",
                        message,
                    })?,
                    price: r.try_get("price")?,
                    calories: r.try_get("calories")?,
                })
            })
            .collect()
    }
}
