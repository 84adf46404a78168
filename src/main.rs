use room_allocator::config::ServerConfig;
use room_allocator::server;
use room_allocator::store::TimetableStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    let store = TimetableStore::open(&config.store_path)?;
    server::run_server(config.bind_addr()?, store).await?;

    Ok(())
}
