use anyhow::Result;
use perfdash::serve;
use std::env;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();

    info!("Starting company performance dashboard");

    let routes = serve::routes();

    // Get port from environment or default to 8080
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    info!("Server starting on port {}", port);
    info!("Dashboard: http://localhost:{}/", port);
    info!("API endpoint: POST http://localhost:{}/api/dashboard", port);

    warp::serve(routes).run(([0, 0, 0, 0], port)).await;

    Ok(())
}
