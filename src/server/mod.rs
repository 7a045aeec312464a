//! main file for the server

pub(crate) mod controller;
pub(crate) mod database;
pub(crate) mod model;
pub(crate) mod scheduler;
pub(crate) mod service;
pub(crate) mod state;
pub(crate) mod util;

use crate::server::controller::routes;
use crate::server::database::pool::Pool;
use crate::server::model::config::ServerConfig;
use crate::server::scheduler::job::restock_monitor;
use crate::server::state::AppState;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info};
use tokio_postgres::Client;
use tokio_util::sync::CancellationToken;

/// Run the server
pub(crate) async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let db_read_pool =
        Pool::<Client>::connect("read", &config.db_read_conn_str, config.pool_size).await?;
    let db_write_pool =
        Pool::<Client>::connect("write", &config.db_write_conn_str, config.pool_size).await?;
    let state = web::Data::new(AppState::new(
        db_read_pool,
        db_write_pool,
        config.acquire_timeout,
        config.floor_policy,
    ));
    info!("inventory floor policy is {:?}", config.floor_policy);

    let cancel_token = CancellationToken::new();
    let monitor = config.restock_interval.map(|period| {
        actix_web::rt::spawn(restock_monitor(
            state.get_db_read_pool(),
            period,
            config.acquire_timeout,
            cancel_token.clone(),
        ))
    });

    let data = state.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(data.clone())
            .configure(routes::<Client>)
    })
    .bind(config.addr)?
    .run()
    .await?;

    cancel_token.cancel();
    if let Some(handle) = monitor {
        if let Err(e) = handle.await {
            error!("restock monitor aborted, {}", e);
        }
    }
    state.close();
    info!("server stopped");
    Ok(())
}
