//! application entry point

use crate::server::model::config::{AppEnv, ServerConfig};
use log::{info, warn};

mod server;

#[actix_web::main()]
async fn main() -> anyhow::Result<()> {
    let app_env = AppEnv::from_env()?;
    let dotenv = app_env.dotenv_file().map(|file| (file, dotenvy::from_filename(file)));

    // after dotenv, RUST_LOG may come from the file
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    if let Some((file, Err(e))) = dotenv {
        warn!("failed to load {}, falling back to process env, {}", file, e);
    }

    let config = ServerConfig::from_env()?;
    info!("App is starting in env={} on {}", app_env, config.addr);

    server::run(config).await
}
