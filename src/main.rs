use std::sync::Arc;
use std::time::Duration;
use talkback::controllers::{history::HistoryController, playback::PlaybackController};
use talkback::domain::cache::AudioStore;
use talkback::domain::playback::PlaybackService;
use talkback::domain::shared::SystemClock;
use talkback::infrastructure::config::{Config, LogFormat, SynthesisProvider};
use talkback::infrastructure::gateway::{
    OpenAiGateway, PollyGateway, SynthesisGateway, WatsonGateway,
};
use talkback::infrastructure::http::{build_router, start_http_server};
use talkback::infrastructure::storage::{MemoryStorage, SqliteStorage, StorageBackend};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting Talkback on {}:{} ({:?})",
        config.host,
        config.port,
        config.environment
    );

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Storage backend and the audio store on top of it
    let backend = create_storage(&config).await?;
    let store = Arc::new(AudioStore::new(backend, config.cache_max_entries));
    store.ping().await?;
    tracing::info!(
        capacity = store.capacity(),
        entries = store.len().await?,
        "Audio store ready"
    );

    // 2. Synthesis gateway for the configured provider
    let gateway = create_gateway(&config).await?;
    tracing::info!(provider = gateway.provider(), "Synthesis gateway initialized");

    // 3. Orchestrator
    let playback_service = Arc::new(
        PlaybackService::new(store.clone(), gateway, Arc::new(SystemClock::new()))
            .with_session_timeout(Duration::from_secs(config.session_timeout_secs)),
    );

    // 4. Controllers
    let playback_controller = Arc::new(PlaybackController::new(
        playback_service.clone(),
        config.max_text_chars,
    ));
    let history_controller = Arc::new(HistoryController::new(playback_service));

    let app = build_router(store, playback_controller, history_controller);
    start_http_server(&config, app).await?;

    Ok(())
}

async fn create_storage(config: &Config) -> anyhow::Result<Arc<dyn StorageBackend>> {
    if config.uses_memory_storage() {
        tracing::warn!("Using in-memory audio storage; cached audio is lost on restart");
        return Ok(Arc::new(MemoryStorage::new(config.cache_quota_bytes)));
    }

    let storage = SqliteStorage::connect(&config.cache_database_url, config.cache_quota_bytes).await?;
    Ok(Arc::new(storage))
}

async fn create_gateway(config: &Config) -> anyhow::Result<Arc<dyn SynthesisGateway>> {
    let timeout = Duration::from_secs(config.synthesis_timeout_secs);

    let gateway: Arc<dyn SynthesisGateway> = match config.synthesis_provider {
        SynthesisProvider::Watson => {
            let base_url = config.watson_base_url.clone().unwrap_or_default();
            let api_key = config.watson_api_key.clone().unwrap_or_default();
            Arc::new(WatsonGateway::new(
                base_url,
                api_key,
                config.watson_voice.clone(),
                timeout,
            )?)
        }
        SynthesisProvider::Polly => {
            tracing::info!("Initializing AWS Polly client with region: {}", config.aws_region);

            let has_access_key = std::env::var("AWS_ACCESS_KEY_ID").is_ok();
            let has_secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").is_ok();
            if !has_access_key || !has_secret_key {
                tracing::warn!("AWS credentials not found in environment variables. Will attempt to use other credential providers (instance metadata, etc.)");
            }

            let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(config.aws_region.clone()))
                .load()
                .await;
            let polly_client = Arc::new(aws_sdk_polly::Client::new(&aws_config));
            Arc::new(PollyGateway::new(polly_client, config.polly_voice.clone()))
        }
        SynthesisProvider::OpenAi => {
            let api_key = config.openai_api_key.clone().unwrap_or_default();
            let client = async_openai::Client::with_config(
                async_openai::config::OpenAIConfig::new().with_api_key(api_key),
            );
            Arc::new(OpenAiGateway::new(
                Arc::new(client),
                config.openai_model.clone(),
                config.openai_voice.clone(),
            ))
        }
    };

    Ok(gateway)
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "talkback=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
