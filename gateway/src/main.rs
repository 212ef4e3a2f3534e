//! Gateway main entry point
//!
//! Serves login and the protected test endpoints over HTTP.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gateway_lib::{build_router, AppState, GatewayConfig};

async fn run_server() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gateway=info,gateway_lib=info,access_service=info,auth=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = GatewayConfig::from_env();
    tracing::info!("Starting Gateway v{}", config.version);

    // A weak signing key stops here, before the listener is bound
    let state = AppState::from_config(&config).await.map_err(|e| {
        tracing::error!("Refusing to start: {:#}", e);
        e
    })?;

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    tracing::info!("HTTP server listening on {}", config.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "run" => {}
            other => {
                print_help();
                anyhow::bail!("unknown argument: {}", other);
            }
        }
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_server())
}

fn print_help() {
    println!("Gateway Service - token authentication and role-based access");
    println!();
    println!("Usage:");
    println!("  gateway                  Run the HTTP server");
    println!("  gateway run              Same as above");
    println!();
    println!("Environment Variables:");
    println!("  GATEWAY_HTTP_ADDR        HTTP listen address (default: 127.0.0.1:8080)");
    println!("  JWT_SECRET               Signing key, base64 or raw, at least 32 bytes (required)");
    println!("  JWT_EXPIRATION_SECS      Token lifetime in seconds (default: 3600)");
    println!("  DB_HOST                  MySQL host; in-memory directory when unset");
    println!("  DB_PORT, DB_NAME, DB_USER, DB_PASSWORD, DB_MAX_CONNECTIONS,");
    println!("  DB_MIN_CONNECTIONS, DB_CONNECT_TIMEOUT_SECS");
    println!("  ADMIN_NAME, ADMIN_SECRET Bootstrap admin for the in-memory directory");
    println!("  ADMIN_EMAIL              Bootstrap admin email (default: <name>@localhost)");
    println!("  RUST_LOG                 Log filter");
}
