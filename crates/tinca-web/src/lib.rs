//! tinca-web - HTTP API for tinca using Axum

pub mod auth;
pub mod response;
pub mod router;
pub mod state;
pub mod validation;

pub use router::create_router;
pub use state::AppState;

use anyhow::Result;
use std::net::SocketAddr;
use tinca_core::AppContext;
use tokio::net::TcpListener;
use tracing::info;

/// Run the web server until Ctrl-C
pub async fn run(ctx: AppContext, port: u16) -> Result<()> {
    let leaderboard = ctx.leaderboard.clone();
    let router = create_router(AppState::new(ctx));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!("Web server listening on http://{}", addr);
    println!("Web server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let in-flight snapshot invalidations finish before the cache goes away
    leaderboard.settle().await;
    info!("Web server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
