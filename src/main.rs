mod analysis;
mod app;
mod auth;
mod config;
mod images;
mod payments;
mod state;
#[cfg(test)]
mod test_support;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "platelens=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = state::AppState::init()?;
    if state.config.analysis.webhook_url.is_none() {
        tracing::warn!("ANALYSIS_WEBHOOK_URL is not set; analyses will fail with a configuration error");
    }
    if state.config.payments.secret_key.is_none() {
        tracing::warn!("PAYMENTS_SECRET_KEY is not set; payment confirmation is disabled");
    }

    app::serve(app::build_app(state)).await
}
