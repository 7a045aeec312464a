use crate::server::database::{DbClient, DbError};
use log::{error, info, warn};
use std::collections::VecDeque;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time;

const RECONNECT_BACKOFF_MIN: Duration = Duration::from_millis(100);
const RECONNECT_BACKOFF_MAX: Duration = Duration::from_secs(30);

type ConnectFuture<M> = Pin<Box<dyn Future<Output = Result<M, DbError>> + Send>>;
type Connector<M> = Arc<dyn Fn() -> ConnectFuture<M> + Send + Sync>;

pub(crate) struct CommonPool<M>
where
    M: DbClient,
{
    /// pool name
    name: String,
    /// idle connections, handed out in a FIFO manner
    connections: Mutex<VecDeque<M>>,
    /// one permit per idle connection
    available: Arc<Semaphore>,
    /// opens a replacement for a closed connection
    connect: Option<Connector<M>>,
}

pub(crate) struct Pool<M>(Arc<CommonPool<M>>)
where
    M: DbClient;

impl<M> Clone for Pool<M>
where
    M: DbClient,
{
    fn clone(&self) -> Pool<M> {
        Pool(self.0.clone())
    }
}

impl<M> Pool<M>
where
    M: DbClient,
{
    /// create an empty pool, fill it with [`Pool::add`]. Closed connections
    /// are dropped for good.
    pub fn new(name: impl Into<String>) -> Self {
        Self::build(name.into(), None)
    }

    /// like [`Pool::new`], but every closed connection is replaced by a
    /// fresh one from `connect`, retried with backoff until it succeeds.
    pub fn with_connector<F, Fut>(name: impl Into<String>, connect: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M, DbError>> + Send + 'static,
    {
        let connect: Connector<M> = Arc::new(move || Box::pin(connect()) as ConnectFuture<M>);
        Self::build(name.into(), Some(connect))
    }

    fn build(name: String, connect: Option<Connector<M>>) -> Self {
        Self(Arc::new(CommonPool {
            name,
            connections: Mutex::new(VecDeque::new()),
            available: Arc::new(Semaphore::new(0)),
            connect,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn idle(&self) -> usize {
        self.lock().len()
    }

    pub fn add(&self, client: M) {
        self.lock().push_back(client);
        self.0.available.add_permits(1);
    }

    /// open one connection through the connector, if the pool has one
    pub async fn connect_one(&self) -> Result<M, DbError> {
        match &self.0.connect {
            Some(connect) => connect().await,
            None => Err(DbError::PoolClosed {
                pool: self.0.name.clone(),
            }),
        }
    }

    /// acquire a connection, bail out once `timeout` elapses. Idle
    /// connections that were closed meanwhile are skipped and replaced.
    pub async fn acquire(&self, timeout: Duration) -> Result<Connection<M>, DbError> {
        let deadline = time::Instant::now() + timeout;
        loop {
            let permit =
                match time::timeout_at(deadline, self.0.available.clone().acquire_owned()).await {
                    Ok(Ok(permit)) => permit,
                    Ok(Err(_)) => {
                        return Err(DbError::PoolClosed {
                            pool: self.0.name.clone(),
                        })
                    }
                    Err(_) => {
                        error!(
                            "timed out to acquire a connection from pool {} after {:?}",
                            self.0.name, timeout
                        );
                        return Err(DbError::PoolTimeout {
                            pool: self.0.name.clone(),
                        });
                    }
                };
            let Some(client) = self.lock().pop_front() else {
                return Err(DbError::PoolClosed {
                    pool: self.0.name.clone(),
                });
            };
            if client.is_closed() {
                self.discard(permit);
                continue;
            }
            return Ok(Connection {
                client: Some(client),
                pool: self.clone(),
                permit: Some(permit),
            });
        }
    }

    /// stop handing out connections; waiters fail with `PoolClosed`
    pub fn close(&self) {
        self.0.available.close();
    }

    fn release(&self, client: M, permit: OwnedSemaphorePermit) {
        if client.is_closed() {
            self.discard(permit);
            return;
        }
        self.lock().push_back(client);
        drop(permit);
    }

    /// retire the slot of a closed connection and refill it in the background
    fn discard(&self, permit: OwnedSemaphorePermit) {
        warn!("discarding closed connection from pool {}", self.0.name);
        permit.forget();
        let Some(connect) = self.0.connect.clone() else {
            return;
        };
        let pool = self.clone();
        tokio::spawn(async move {
            let mut backoff = RECONNECT_BACKOFF_MIN;
            while !pool.0.available.is_closed() {
                match connect().await {
                    Ok(client) => {
                        info!("replaced closed connection in pool {}", pool.0.name);
                        pool.add(client);
                        return;
                    }
                    Err(e) => {
                        warn!(
                            "reconnect for pool {} failed, retrying in {:?}, {}",
                            pool.0.name, backoff, e
                        );
                        time::sleep(backoff).await;
                        backoff = (backoff * 2).min(RECONNECT_BACKOFF_MAX);
                    }
                }
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<M>> {
        self.0.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A checked out client, handed back to its pool on drop.
pub(crate) struct Connection<M>
where
    M: DbClient,
{
    client: Option<M>,
    pool: Pool<M>,
    permit: Option<OwnedSemaphorePermit>,
}

impl<M> Deref for Connection<M>
where
    M: DbClient,
{
    type Target = M;

    fn deref(&self) -> &M {
        // only taken in drop
        self.client.as_ref().expect("connection already released")
    }
}

impl<M> DerefMut for Connection<M>
where
    M: DbClient,
{
    fn deref_mut(&mut self) -> &mut M {
        self.client.as_mut().expect("connection already released")
    }
}

impl<M> Drop for Connection<M>
where
    M: DbClient,
{
    fn drop(&mut self) {
        if let (Some(client), Some(permit)) = (self.client.take(), self.permit.take()) {
            self.pool.release(client, permit);
        }
    }
}
