use anyhow::{Context, Result};
use axum::{routing::get, Router};
use log::info;

/// GET / -> 200 "OK". Единственный маршрут, нужен только аптайм-мониторам.
async fn ok() -> &'static str {
    "OK"
}

fn router() -> Router {
    Router::new().route("/", get(ok))
}

pub async fn serve(port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind liveness endpoint on {addr}"))?;

    info!("❤️ Liveness endpoint on {}", addr);

    axum::serve(listener, router())
        .await
        .context("Liveness server stopped")
}
