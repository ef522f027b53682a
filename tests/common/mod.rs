#![allow(dead_code)]

use axum::{Router, extract::ConnectInfo, middleware, routing::get};
use axum_test::TestServer;
use linktrail::api::handlers::{health_handler, redirect_handler};
use linktrail::api::middleware::auth;
use linktrail::api::routes::protected_routes;
use linktrail::application::services::{CodeSettings, hash_token};
use linktrail::domain::click_event::ClickEvent;
use linktrail::domain::click_worker::{ClickQueue, ClickRecorder, run_click_worker};
use linktrail::domain::repositories::TokenRepository;
use linktrail::infrastructure::cache::NullCache;
use linktrail::infrastructure::memory::{
    InMemoryAnalyticsRepository, InMemoryLinkRepository, InMemoryTokenRepository,
    InMemoryUsageCounter,
};
use linktrail::state::{AppState, Repositories, StateSettings};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::Layer;

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const BASE_URL: &str = "https://s.example.com";

/// Application state over in-memory backends, plus handles to inspect them.
pub struct TestApp {
    pub state: AppState,
    pub links: Arc<InMemoryLinkRepository>,
    pub analytics: Arc<InMemoryAnalyticsRepository>,
    pub tokens: Arc<InMemoryTokenRepository>,
}

pub struct TestOptions {
    pub rate_limit_per_day: u32,
    /// Spawn the click worker. Without it, clicks stay in the queue.
    pub run_worker: bool,
    pub queue_capacity: usize,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            rate_limit_per_day: 1_000,
            run_worker: true,
            queue_capacity: 100,
        }
    }
}

/// Builds the state. The returned receiver is `Some` when the worker is not
/// running and must be kept alive to keep the queue open.
pub fn create_test_app(options: TestOptions) -> (TestApp, Option<mpsc::Receiver<ClickEvent>>) {
    let links = Arc::new(InMemoryLinkRepository::new());
    let analytics = Arc::new(InMemoryAnalyticsRepository::new());
    let tokens = Arc::new(InMemoryTokenRepository::new());

    let recorder = Arc::new(ClickRecorder::new(analytics.clone(), links.clone()));
    let (click_queue, rx) = ClickQueue::new(options.queue_capacity, recorder.clone());

    let rx = if options.run_worker {
        tokio::spawn(run_click_worker(rx, recorder, 4));
        None
    } else {
        Some(rx)
    };

    let state = AppState::new(
        Repositories {
            links: links.clone(),
            analytics: analytics.clone(),
            tokens: tokens.clone(),
            usage: Arc::new(InMemoryUsageCounter::new()),
        },
        Arc::new(NullCache::new()),
        click_queue,
        StateSettings {
            base_url: BASE_URL.to_string(),
            token_signing_secret: SIGNING_SECRET.to_string(),
            rate_limit_per_day: options.rate_limit_per_day,
            code: CodeSettings::default(),
            behind_proxy: false,
        },
    );

    (
        TestApp {
            state,
            links,
            analytics,
            tokens,
        },
        rx,
    )
}

impl TestApp {
    /// Issues an API token for `user_id` (once) and returns the raw value.
    pub async fn token_for(&self, user_id: i64) -> String {
        let raw = format!("raw-token-for-user-{}", user_id);
        let hash = hash_token(SIGNING_SECRET, &raw);

        if self.tokens.validate_token(&hash).await.unwrap().is_none() {
            self.tokens
                .create_token(user_id, &format!("test-{}", user_id), &hash)
                .await
                .unwrap();
        }
        raw
    }

    /// The application routes without per-IP throttling, with a fixed peer
    /// address injected.
    pub fn server(&self) -> TestServer {
        let api = protected_routes().route_layer(middleware::from_fn_with_state(
            self.state.clone(),
            auth::layer,
        ));

        let app = Router::new()
            .route("/{token}", get(redirect_handler))
            .route("/health", get(health_handler))
            .nest("/api", api)
            .layer(MockConnectInfoLayer)
            .with_state(self.state.clone());

        TestServer::new(app).unwrap()
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Polls `condition` until it holds or two seconds pass.
pub async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

pub async fn create_test_user(pool: &PgPool, email: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (name, email, provider_id) VALUES ($1, $2, $2) RETURNING id",
    )
    .bind("Test User")
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
