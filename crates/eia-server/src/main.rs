mod api;
mod middleware;

use std::sync::Arc;

use eia_analysis::PatternInterpreter;
use eia_llm::{ChatClient, LlmError};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, build_cors, default_rate_limit_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(eia_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = eia_db::connect_pool_from_config(&config).await?;
    let applied = eia_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations up to date");

    let llm = match ChatClient::new(&config.llm) {
        Ok(client) => Some(Arc::new(client)),
        Err(LlmError::MissingApiKey) => {
            tracing::warn!("OPENAI_API_KEY not set; analysis endpoints will return upstream_error");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let state = AppState {
        pool,
        llm,
        interpreter: Arc::new(PatternInterpreter),
        recent_analysis_hours: config.recent_analysis_hours,
    };
    let cors = build_cors(config.cors_origin.as_deref())?;
    let app = build_app(state, cors, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
