use log::{error, info};

mod overlays;
mod shell;
mod web;

use crate::shell::AppConfig;
use crate::web::server::{start_web_server, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    info!("Starting tie-point page shell...");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    // Client configuration, templates and the overlay store are built once here
    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e));
        }
    };
    info!("Application state initialized");

    // Runs until Ctrl+C; the server handles the signal and drains workers
    start_web_server(&config, state).await?;

    info!("Tie-point page shell shutdown complete");
    Ok(())
}
