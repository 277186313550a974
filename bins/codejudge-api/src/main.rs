mod auth;
mod error;
mod handlers;
mod metrics;
mod routes;

use anyhow::Context;
use codejudge_common::catalog::ProblemCatalog;
use codejudge_common::config::{AppConfig, PollPolicy};
use codejudge_common::progress::{MemoryProgressStore, ProgressStore, RedisProgressStore};
use codejudge_common::types::Language;
use codejudge_judge::{EvaluationService, Judge0Client, JudgeClient, Orchestrator};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub struct AppState {
    pub catalog: ProblemCatalog,
    pub judge: Arc<dyn JudgeClient>,
    pub progress: Arc<dyn ProgressStore>,
    pub language: Language,
    pub poll: PollPolicy,
}

impl AppState {
    /// Evaluation service for one request, in the requested language or the configured default
    pub fn service(&self, language: Option<Language>) -> EvaluationService<Arc<dyn JudgeClient>> {
        let orchestrator = Orchestrator::new(
            self.judge.clone(),
            language.unwrap_or(self.language),
            self.poll,
        );
        EvaluationService::new(orchestrator, self.progress.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("CodeJudge API booting...");

    let config = AppConfig::from_env()?;
    metrics::register_metrics().context("Failed to register metrics")?;

    let catalog = match &config.catalog_path {
        Some(path) => ProblemCatalog::load(path)?,
        None => ProblemCatalog::builtin()?,
    };
    info!(problems = catalog.len(), "Problem catalog loaded");

    let progress: Arc<dyn ProgressStore> = match &config.redis_url {
        Some(url) => {
            let store = RedisProgressStore::connect(url)
                .await
                .context("Failed to connect to Redis")?;
            info!("Connected to Redis: {}", url);
            Arc::new(store)
        }
        None => {
            warn!("REDIS_URL not set, progress is kept in memory only");
            Arc::new(MemoryProgressStore::new())
        }
    };

    let judge = Judge0Client::new(&config.judge)?;
    info!(
        judge = %judge.base_url(),
        language = %config.judge.language,
        max_polls = config.judge.poll.max_attempts,
        "Judge client ready"
    );

    let state = Arc::new(AppState {
        catalog,
        judge: Arc::new(judge),
        progress,
        language: config.judge.language,
        poll: config.judge.poll,
    });

    let app = routes::router(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
