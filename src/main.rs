use genea_tree::config::{AppConfig, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress sqlx debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info) // Default to Info for everything
        .filter_module("sqlx", LevelFilter::Warn) // Suppress sqlx Debug logs
        .parse_default_env()
        .init();

    println!("Genea: family tree API server");

    // Load configuration
    let config = AppConfig::load()?;
    println!(
        "Configuration loaded: environment={}, server={}:{}",
        config.environment, config.server.host, config.server.port
    );

    match config.database.backend {
        StoreBackend::Postgres => println!("Connecting to PostgreSQL..."),
        StoreBackend::Memory => println!("Using in-memory store"),
    }
    println!("Family tree API available at http://{}/api", config.server_address());

    genea_tree::serve(&config).await
}
