mod handlers;

use std::sync::Arc;

use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use verb_router::{Config, RouteWatcher, RouterKind, RouterService, UniversalRouter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verb_router=debug,verb_server=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("verb-server v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::var("VERB_CONFIG").unwrap_or_else(|_| "verb.toml".to_string());
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        warn!("Failed to load config: {:#}, using defaults", e);
        Config::default()
    });

    let hot_reload_enabled = std::env::var("HOT_RELOAD")
        .map(|v| v.parse::<bool>().unwrap_or(config.dev.hot_reload))
        .unwrap_or(config.dev.hot_reload);

    // Invalid router configuration is fatal here, not on the first request
    let mut router = UniversalRouter::from_config(&config.router, Arc::new(handlers::registry()))
        .context("Failed to build router")?
        .with_development(config.dev.development);
    router.add_middleware(handlers::timing);

    if let Some(manual) = router.as_manual_mut() {
        handlers::register(manual).context("Failed to register routes")?;
        for (method, pattern) in manual.routes() {
            info!("  {} {}", method, pattern);
        }
    }
    if let Ok(routes) = router.routes() {
        info!("Discovered {} route file(s)", routes.len());
        for route in routes {
            info!("  {} -> {}", route.pattern, route.key());
        }
    }

    let router = Arc::new(router);

    // Hot reload
    let _watcher = if hot_reload_enabled && router.kind() == RouterKind::Filesystem {
        let watcher = RouteWatcher::new(Arc::clone(&router)).context("Failed to watch routes")?;
        let mut changes = watcher.subscribe();
        tokio::spawn(async move {
            while let Ok(change) = changes.recv().await {
                info!(
                    "Routes updated: {:?} {:?} (generation {})",
                    change.kind, change.path, change.generation
                );
            }
        });
        Some(watcher)
    } else {
        None
    };

    let app = axum::Router::new()
        .fallback_service(RouterService::new(router))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
