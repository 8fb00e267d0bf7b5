use hydroping_api::{build_router, config::Config, services::pinger, AppState};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hydroping_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env();
    let addr = config.listen_addr();
    let state = AppState::new(config);

    // Minute tick that texts pro users their due pings
    pinger::spawn_pinger_worker(state.store.clone(), state.sms.clone());

    let app = build_router(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
