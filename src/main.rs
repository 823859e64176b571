use tracing::{info, Level};

use serpent_arena::config::ServerConfig;
use serpent_arena::room::manager::RoomManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Serpent Arena Server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        "Configuration loaded: max_rooms={}, max_players_per_room={}",
        config.max_rooms, config.max_players_per_room
    );

    // The default room starts ticking immediately; the transport front-end
    // attaches players through the manager's room handles
    let mut manager = RoomManager::new(&config);
    info!(
        "Simulation ready, default room {}",
        manager.default_room().id()
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    manager.shutdown_all();
    info!("Server stopped");

    Ok(())
}
