use std::sync::Arc;

use api_server::http::{self, AppState};
use shared::config::{ApiConfig, LogFormat, load_dotenv};
use shared::llm::{LlmGateway, OpenAiConfigError, OpenAiGateway, OpenAiGatewayConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "api_server=debug,shared=info,axum=info";

#[tokio::main]
async fn main() {
    let dotenv_result = load_dotenv();
    init_tracing();
    if let Err(err) = dotenv_result {
        error!("failed to read .env: {err}");
        std::process::exit(1);
    }

    let config = match ApiConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("failed to read config: {err}");
            std::process::exit(1);
        }
    };

    let llm_gateway = match build_llm_gateway() {
        Ok(gateway) => gateway,
        Err(err) => {
            error!("failed to configure OpenAI gateway: {err}");
            std::process::exit(1);
        }
    };

    let app = http::build_router(AppState {
        llm_gateway,
        max_body_bytes: config.max_body_bytes,
    });

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {}: {err}", config.bind_addr);
            std::process::exit(1);
        }
    };

    info!(
        "api server listening on {}",
        listener.local_addr().unwrap_or(config.bind_addr)
    );
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server exited with error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match LogFormat::from_env() {
        Ok(LogFormat::Json) => builder.json().init(),
        Ok(LogFormat::Text) => builder.init(),
        Err(err) => {
            builder.init();
            warn!("{err}; falling back to text logs");
        }
    }
}

fn build_llm_gateway() -> Result<Option<Arc<dyn LlmGateway>>, OpenAiConfigError> {
    let config = match OpenAiGatewayConfig::from_env() {
        Ok(config) => config,
        Err(OpenAiConfigError::MissingApiKey) => {
            warn!("OPENAI_API_KEY is not set; LLM endpoints will answer 500");
            return Ok(None);
        }
        Err(err) => return Err(err),
    };

    let gateway = OpenAiGateway::new(config)?;
    info!(model = gateway.model(), "OpenAI gateway configured");
    Ok(Some(Arc::new(gateway)))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
