//! Render Cache - an on-demand image rescaling server.
//!
//! Parses the configuration, prepares the storage root, wires the fetch and
//! transform pipeline together, and serves the HTTP API until shutdown.

use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rendercache::{
    cache::RenderService,
    config::Config,
    image::{HttpImageSource, ImageTransformer},
    server::{create_router, RouterConfig},
    storage::BlobStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    run_serve(config).await
}

// =============================================================================
// Serve
// =============================================================================

async fn run_serve(config: Config) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    print_banner();

    info!("Configuration:");
    info!("  Storage root: {}", config.storage_path.display());
    info!("  Fetch timeout: {}s", config.fetch_timeout);
    info!("  Cache max-age: {}s", config.cache_max_age);

    // Prepare the storage root before accepting requests
    let store = BlobStore::new(&config.storage_path);
    if let Err(e) = store.ensure_root().await {
        error!(
            "Failed to prepare storage root {}: {}",
            config.storage_path.display(),
            e
        );
        error!("  Check that the path is writable and the parent directory exists");
        return ExitCode::FAILURE;
    }

    // Wire source, transformer, and render service
    let source = HttpImageSource::new(Duration::from_secs(config.fetch_timeout));
    let transformer = ImageTransformer::new(source);
    let render_service = RenderService::new(transformer, store);

    let router_config = build_router_config(&config);
    let router = create_router(render_service, router_config);

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!(
        "    curl 'http://{}/fit_width/300?url=https://example.com/photo.jpg'",
        addr
    );
    info!(
        "    curl 'http://{}/fit_height/200?url=https://example.com/photo.jpg'",
        addr
    );
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// ANSI-shadow banner, logged once at startup.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!("██████╗ ███████╗███╗   ██╗██████╗ ███████╗██████╗ ");
    info!("██╔══██╗██╔════╝████╗  ██║██╔══██╗██╔════╝██╔══██╗");
    info!("██████╔╝█████╗  ██╔██╗ ██║██║  ██║█████╗  ██████╔╝");
    info!("██╔══██╗██╔══╝  ██║╚██╗██║██║  ██║██╔══╝  ██╔══██╗");
    info!("██║  ██║███████╗██║ ╚████║██████╔╝███████╗██║  ██║");
    info!("╚═╝  ╚═╝╚══════╝╚═╝  ╚═══╝╚═════╝ ╚══════╝╚═╝  ╚═╝");
    info!("");
    info!(" ██████╗ █████╗  ██████╗██╗  ██╗███████╗");
    info!("██╔════╝██╔══██╗██╔════╝██║  ██║██╔════╝");
    info!("██║     ███████║██║     ███████║█████╗  ");
    info!("██║     ██╔══██║██║     ██╔══██║██╔══╝  ");
    info!("╚██████╗██║  ██║╚██████╗██║  ██║███████╗");
    info!(" ╚═════╝╚═╝  ╚═╝ ╚═════╝╚═╝  ╚═╝╚══════╝");
    info!("");
    info!("                             v{}", version);
}

/// Set up the tracing subscriber. RUST_LOG overrides the verbosity flag.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "rendercache=debug,tower_http=debug"
    } else {
        "rendercache=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new().with_cache_max_age(config.cache_max_age);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}
