use keyrace::{KeyraceError, KeyraceServer};

#[tokio::main]
async fn main() -> Result<(), KeyraceError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3001);
    let addr = format!("0.0.0.0:{port}");

    let server = KeyraceServer::builder().bind_addr(&addr).build().await?;
    tracing::info!(%addr, "keyrace server listening");
    server.run().await
}
