use crate::server::database::pool::{Connection, Pool};
use crate::server::database::{DbClient, DbError};
use crate::server::model::config::InventoryFloorPolicy;
use std::time::Duration;

pub(crate) struct AppState<C: DbClient> {
    db_read_pool: Pool<C>,
    db_write_pool: Pool<C>,
    acquire_timeout: Duration,
    floor_policy: InventoryFloorPolicy,
}

impl<C: DbClient> AppState<C> {
    pub fn new(
        db_read_pool: Pool<C>,
        db_write_pool: Pool<C>,
        acquire_timeout: Duration,
        floor_policy: InventoryFloorPolicy,
    ) -> Self {
        Self {
            db_read_pool,
            db_write_pool,
            acquire_timeout,
            floor_policy,
        }
    }

    pub fn get_db_read_pool(&self) -> Pool<C> {
        self.db_read_pool.clone()
    }

    pub async fn read_connection(&self) -> Result<Connection<C>, DbError> {
        self.db_read_pool.acquire(self.acquire_timeout).await
    }

    pub async fn write_connection(&self) -> Result<Connection<C>, DbError> {
        self.db_write_pool.acquire(self.acquire_timeout).await
    }

    pub fn floor_policy(&self) -> InventoryFloorPolicy {
        self.floor_policy
    }

    pub fn close(&self) {
        self.db_read_pool.close();
        self.db_write_pool.close();
    }
}
