use salvo::conn::tcp::TcpAcceptor;
use salvo::prelude::*;
use dotenv::dotenv;
use std::time::Duration;
use tokio::signal;

use db_peeker::{api, init_tracing, AppState, Config};

/// Bind to address, retrying while a previous process still holds the port
async fn bind_with_retry(address: &str, max_retries: u32) -> anyhow::Result<TcpAcceptor> {
    let mut attempt = 1;
    loop {
        match TcpListener::new(address.to_string()).try_bind().await {
            Ok(acceptor) => return Ok(acceptor),
            Err(e) if attempt < max_retries => {
                tracing::warn!(
                    "⚠️  Cannot bind {} (attempt {}/{}): {}, retrying in 1 second...",
                    address, attempt, max_retries, e
                );
                tokio::time::sleep(Duration::from_secs(1)).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "failed to bind {} after {} attempts: {}",
                    address, max_retries, e
                ))
            }
        }
    }
}

/// Wait for shutdown signal (SIGTERM, SIGINT, or Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing()?;

    // Missing or malformed settings stop here, before anything is served.
    let config = Config::from_env()?;
    let state = AppState::new(&config).await?;

    let router = api::router(state);
    let acceptor = bind_with_retry(&config.server_address, 5).await?;

    tracing::info!("🚀 db-peeker listening on http://{}", config.server_address);

    let service = Service::new(router);
    let server = Server::new(acceptor);

    tokio::select! {
        _ = server.serve(service) => {
            tracing::info!("🛑 Server stopped");
        }
        _ = shutdown_signal() => {
            tracing::info!("🛑 db-peeker shutting down gracefully");
        }
    }

    Ok(())
}
