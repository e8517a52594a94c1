//! funnel-engine server.
//!
//! Configuration comes from `FUNNEL__*` environment variables (see
//! `funnel_engine::config`). Every external dependency is optional in
//! development: without a database, Redis, model key or prompt service the
//! server falls back to in-memory stores, the mock model and bundled prompts.

use std::net::SocketAddr;
use std::sync::Arc;

use secrecy::{ExposeSecret, Secret};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use funnel_engine::adapters::ai::{AnthropicConfig, AnthropicProvider, MockAIProvider};
use funnel_engine::adapters::auth::{JwtConfig, JwtSessionValidator};
use funnel_engine::adapters::http::{app_router, AppState, HttpOptions};
use funnel_engine::adapters::notifications::{
    NoopContactNotifier, WebhookConfig, WebhookContactNotifier,
};
use funnel_engine::adapters::postgres::{PostgresMemoryStore, PostgresSessionRepository};
use funnel_engine::adapters::prompts::{
    CachedPromptStore, HttpPromptStore, HttpPromptStoreConfig, InMemoryPromptStore,
};
use funnel_engine::adapters::rate_limiter::{InMemoryRateLimiter, RateLimitConfig, RedisRateLimiter};
use funnel_engine::adapters::storage::{InMemoryMemoryStore, InMemorySessionRepository};
use funnel_engine::adapters::telemetry::TracingTraceSink;
use funnel_engine::application::handlers::OrchestratorSettings;
use funnel_engine::config::AppConfig;
use funnel_engine::domain::flow::FlowRegistry;
use funnel_engine::ports::{
    AIProvider, ContactNotifier, MemoryStore, PromptStore, RateLimiter, SessionRepository,
    SessionValidator,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    let state = build_state(&config).await?;
    let options = HttpOptions {
        cors_origins: config.server.cors_origins_list(),
        request_timeout: config.server.request_timeout(),
    };
    let app = app_router(state, &options);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "funnel-engine listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.server.json_logs() {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn build_state(config: &AppConfig) -> Result<AppState, BoxError> {
    let mut flows = FlowRegistry::bundled()?;
    if let Some(dir) = &config.flows.directory {
        let loaded = flows.load_dir(dir)?;
        tracing::info!(directory = %dir.display(), loaded, "Loaded flow definitions");
    }
    tracing::info!(flows = flows.len(), "Flow registry ready");

    let (sessions, memory): (Arc<dyn SessionRepository>, Arc<dyn MemoryStore>) =
        match &config.database {
            Some(db) => {
                let pool = PgPoolOptions::new()
                    .min_connections(db.min_connections)
                    .max_connections(db.max_connections)
                    .acquire_timeout(db.acquire_timeout())
                    .connect(&db.url)
                    .await?;
                if db.run_migrations {
                    sqlx::migrate!("./migrations").run(&pool).await?;
                    tracing::info!("Database migrations applied");
                }
                (
                    Arc::new(PostgresSessionRepository::new(pool.clone())),
                    Arc::new(PostgresMemoryStore::new(pool)),
                )
            }
            None => {
                tracing::warn!("No database configured, sessions are kept in memory");
                (
                    Arc::new(InMemorySessionRepository::new()),
                    Arc::new(InMemoryMemoryStore::new()),
                )
            }
        };

    let rate_limit = RateLimitConfig::from(&config.rate_limit);
    let rate_limiter: Arc<dyn RateLimiter> = match &config.redis {
        Some(redis) => Arc::new(RedisRateLimiter::connect(&redis.url, rate_limit).await?),
        None => Arc::new(InMemoryRateLimiter::new(rate_limit)),
    };

    let ai: Arc<dyn AIProvider> = match config.ai.anthropic_key() {
        Some(key) => {
            let mut anthropic = AnthropicConfig::new(key.clone())
                .with_timeout(config.ai.timeout())
                .with_max_retries(config.ai.max_retries);
            if let Some(model) = &config.ai.default_model {
                anthropic = anthropic.with_model(model.clone());
            }
            if let Some(url) = &config.ai.base_url {
                anthropic = anthropic.with_base_url(url.clone());
            }
            Arc::new(AnthropicProvider::new(anthropic)?)
        }
        None => {
            tracing::warn!("No Anthropic API key configured, using the mock model");
            Arc::new(MockAIProvider::new())
        }
    };

    let prompts: Arc<dyn PromptStore> = match (
        config.prompts.base_url.as_deref().filter(|_| config.prompts.is_remote()),
        config.prompts.public_key.as_deref(),
        config.prompts.secret_key.as_ref(),
    ) {
        (Some(url), Some(public_key), Some(secret_key)) => {
            let remote = HttpPromptStore::new(
                HttpPromptStoreConfig::new(url, public_key, secret_key.clone())
                    .with_default_label(Some(config.prompts.label.clone()))
                    .with_timeout(config.prompts.timeout()),
            )?;
            Arc::new(CachedPromptStore::new(Arc::new(remote), config.prompts.cache_ttl()))
        }
        _ => {
            tracing::info!("No prompt service configured, agents use bundled prompts");
            Arc::new(InMemoryPromptStore::new())
        }
    };

    let notifier: Arc<dyn ContactNotifier> = match config.notifications.webhook_url() {
        Some(url) => Arc::new(WebhookContactNotifier::new(
            WebhookConfig::new(url)
                .with_secret(config.notifications.contact_webhook_secret.clone())
                .with_timeout(config.notifications.timeout()),
        )?),
        None => Arc::new(NoopContactNotifier),
    };

    let auth: Option<Arc<dyn SessionValidator>> = config.auth.jwt_secret.as_ref().map(|secret| {
        let mut jwt = JwtConfig::new(Secret::new(secret.expose_secret().clone()));
        if let Some(issuer) = &config.auth.jwt_issuer {
            jwt = jwt.with_issuer(issuer.clone());
        }
        if let Some(audience) = &config.auth.jwt_audience {
            jwt = jwt.with_audience(audience.clone());
        }
        Arc::new(JwtSessionValidator::new(jwt)) as Arc<dyn SessionValidator>
    });

    Ok(AppState {
        sessions,
        flows: Arc::new(flows),
        ai,
        prompts,
        prompt_label: Some(config.prompts.label.clone()),
        memory,
        traces: Arc::new(TracingTraceSink::new()),
        notifier,
        rate_limiter,
        auth,
        orchestrator_settings: OrchestratorSettings::default(),
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
