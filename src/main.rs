use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crop_yield::{config::Config, http, reference::ReferenceCatalog};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_env()?;

    let ctx = crop_yield::load_context(&cfg).context("failed to load prediction pipeline")?;
    tracing::info!(
        "loaded schema: {} columns, {} countries, {} crops; expanded width {}",
        ctx.schema().len(),
        ctx.schema().known_countries().len(),
        ctx.schema().known_crops().len(),
        ctx.expanded_width()
    );

    // Warmup so a mismatched deployment fails here, not on the first request
    let probe = ctx.warmup().context("warmup prediction failed")?;
    tracing::info!("warmup forward ok (native={:.3})", probe.native_value);

    let catalog = match &cfg.reference_path {
        Some(path) => {
            let mut catalog = ReferenceCatalog::load(path).context("failed to load reference dataset")?;
            let dropped = catalog.restrict_to(ctx.schema());
            if !dropped.is_empty() {
                tracing::warn!("reference names absent from schema, hidden: {:?}", dropped);
            }
            catalog
        }
        None => ReferenceCatalog::from_schema(ctx.schema()),
    };

    let state = http::AppState {
        ctx: Arc::new(ctx),
        catalog: Arc::new(catalog),
        log_pred: cfg.log_pred,
    };

    let app = http::router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
