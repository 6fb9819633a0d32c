use std::sync::Arc;
use std::time::Duration;
use talkback::controllers::{history::HistoryController, playback::PlaybackController};
use talkback::domain::cache::{AudioStore, DEFAULT_MAX_ENTRIES};
use talkback::domain::playback::PlaybackService;
use talkback::domain::shared::SystemClock;
use talkback::infrastructure::http::build_router;
use talkback::infrastructure::storage::MemoryStorage;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;

pub mod api_client;
pub mod mock_gateway;

use api_client::TestClient;
use mock_gateway::MockGateway;

pub struct AppSettings {
    pub capacity: usize,
    pub quota_bytes: usize,
    pub max_text_chars: usize,
    pub gated_gateway: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_MAX_ENTRIES,
            quota_bytes: 5 * 1024 * 1024,
            max_text_chars: 50,
            gated_gateway: false,
        }
    }
}

pub struct TestContext {
    pub client: TestClient,
    pub store: Arc<AudioStore>,
    pub gateway: Arc<MockGateway>,
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async { spawn_app(AppSettings::default()).await }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // Server task ends with the test runtime
        }
    }
}

/// Start the full router on an ephemeral port
pub async fn spawn_app(settings: AppSettings) -> TestContext {
    let backend = Arc::new(MemoryStorage::new(settings.quota_bytes));
    let store = Arc::new(AudioStore::new(backend, settings.capacity));
    let gateway = Arc::new(if settings.gated_gateway {
        MockGateway::gated()
    } else {
        MockGateway::new()
    });

    let playback_service = Arc::new(PlaybackService::new(
        store.clone(),
        gateway.clone(),
        Arc::new(SystemClock::new()),
    ));
    let playback_controller = Arc::new(PlaybackController::new(
        playback_service.clone(),
        settings.max_text_chars,
    ));
    let history_controller = Arc::new(HistoryController::new(playback_service));
    let app = build_router(store.clone(), playback_controller, history_controller);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestContext {
        client: TestClient::new(&format!("http://{}", addr)),
        store,
        gateway,
    }
}

/// Poll GET /api/status until it reports `state`
pub async fn wait_for_state(client: &TestClient, state: &str) {
    for _ in 0..200 {
        let response = client.get("/api/status").await.unwrap();
        let current = response
            .body
            .as_ref()
            .and_then(|b| b.get("state"))
            .and_then(|s| s.as_str())
            .map(str::to_string);
        if current.as_deref() == Some(state) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("orchestrator never reached state '{}'", state);
}

/// Play `text` and immediately report playback completion
pub async fn play_and_finish(client: &TestClient, text: &str) -> api_client::ApiResponse {
    let response = client
        .post("/api/play", &serde_json::json!({ "text": text }))
        .await
        .unwrap();
    response.assert_status(hyper::StatusCode::OK);

    client
        .post_empty(&format!("/api/playback/{}/complete", response.session_id()))
        .await
        .unwrap()
        .assert_status(hyper::StatusCode::NO_CONTENT);

    response
}
