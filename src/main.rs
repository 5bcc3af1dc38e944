/// Catalog Gateway - music catalog relay and image upload service
use catalog_gateway::{config::ServerConfig, context::AppContext, error::ApiResult, server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ApiResult<()> {
    // Load configuration (reads .env first, so RUST_LOG may come from there)
    let config = ServerConfig::from_env()?;

    // Initialize logging
    let filter = EnvFilter::try_new(&config.logging.level).unwrap_or_else(|e| {
        eprintln!("Invalid log filter {:?}: {}", config.logging.level, e);
        EnvFilter::new("info")
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Print banner
    print_banner(&config.service.version);

    // Create application context (creates the storage directory)
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

fn print_banner(version: &str) {
    println!(
        r#"
   ______      __        __
  / ____/___ _/ /_____ _/ /___  ____ _
 / /   / __ `/ __/ __ `/ / __ \/ __ `/
/ /___/ /_/ / /_/ /_/ / / /_/ / /_/ /
\____/\__,_/\__/\__,_/_/\____/\__, /
                             /____/
        Catalog Gateway v{}
        "#,
        version
    );
}
