use std::sync::Arc;

use tradejournal::api::router::create_router;
use tradejournal::config::AppConfig;
use tradejournal::reasoning::{ChatCompletionsClient, ReasoningService};
use tradejournal::{db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.is_production());

    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let db = db::init_pool(&config.database_url).await?;
    db::run_migrations(&db).await?;
    tracing::info!("Database connected, migrations applied");

    let metrics_handle = metrics::init_metrics();

    let reasoning: Option<Arc<dyn ReasoningService>> = match &config.reasoning_api_key {
        Some(key) => {
            let client = ChatCompletionsClient::new(
                &config.reasoning_endpoint,
                key,
                &config.reasoning_model,
                config.reasoning_timeout(),
            )?;
            tracing::info!(
                endpoint = %config.reasoning_endpoint,
                model = %client.model(),
                "Reasoning service configured"
            );
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("GITHUB_TOKEN is not set; spreadsheet import and assistant are disabled");
            None
        }
    };

    let state = AppState {
        db,
        config,
        metrics_handle,
        reasoning,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
