use mnav_engine::models::valuation;
use mnav_engine::state::AppState;
use mnav_engine::{config, data, server};

#[tokio::main]
async fn main() {
    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("mnav_engine starting");

    // Load config
    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    // Reference data is loaded once and shared read-only for the process lifetime
    let reference = match data::load_reference_data(cfg.reference_data_path.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("reference data error: {e}");
            std::process::exit(1);
        }
    };

    let live = reference.live;
    let source = cfg
        .reference_data_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "builtin".into());
    tracing::info!(
        source = %source,
        btc_price = live.btc_price,
        btc_held = live.btc_held,
        shares = live.shares,
        nav_per_share = valuation::nav_per_share(live.btc_price, live.btc_held, live.shares, live.cash, live.debt),
        factors = reference.mnav_model.factors.len(),
        "reference data loaded"
    );
    tracing::info!(
        trials = cfg.simulation.num_trials,
        steps = cfg.simulation.num_steps,
        seeded = cfg.simulation.seed.is_some(),
        workers = rayon::current_num_threads(),
        "monte carlo defaults"
    );

    let port = cfg.server_port;
    let app_state = AppState::new(cfg, reference);
    let app = server::router(app_state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
