use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::models::{DisplayCategory, PathaoCategory, SystemCategory, WebhookCategory};
use domain::services::SettingsStore;
use shared::jwt::{JwtConfig, JwtError};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, require_user_auth, trace_id};
use crate::routes::{courier, functions, health, notices, settings, setup};
use crate::services::{BridgeState, NoticeHub, QueryCache, SettingsService, WebhookRelay};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub cache: Arc<QueryCache>,
    pub notices: Arc<NoticeHub>,
    pub settings: Arc<SettingsService>,
    pub relay: Arc<WebhookRelay>,
    /// State of the courier bridge, `None` when realtime is disabled.
    pub realtime: Option<watch::Receiver<BridgeState>>,
    /// Flips to `true` when the server begins shutting down. Long-lived
    /// responses end on it so graceful shutdown can complete.
    pub shutdown: watch::Receiver<bool>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Wires the services around `store`. The pool serves every other query.
    pub fn new(
        config: Config,
        pool: PgPool,
        store: Arc<dyn SettingsStore>,
    ) -> Result<Self, JwtError> {
        let jwt = Arc::new(config.jwt.build()?);
        let cache = Arc::new(QueryCache::new());
        let notices = Arc::new(NoticeHub::new());
        let settings = Arc::new(SettingsService::new(store, cache.clone(), notices.clone()));
        let relay = Arc::new(WebhookRelay::new(Duration::from_secs(
            config.webhook.timeout_secs,
        )));
        let (shutdown_tx, shutdown) = watch::channel(false);

        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt,
            cache,
            notices,
            settings,
            relay,
            realtime: None,
            shutdown,
            shutdown_tx: Arc::new(shutdown_tx),
        })
    }

    /// Sender that starts shutdown for every clone of this state.
    pub fn shutdown_trigger(&self) -> Arc<watch::Sender<bool>> {
        self.shutdown_tx.clone()
    }

    /// Resolves once shutdown has begun.
    pub fn shutdown_signal(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut shutdown = self.shutdown.clone();
        async move {
            // An error means every sender is gone, which is shutdown too.
            let _ = shutdown.wait_for(|down| *down).await;
        }
    }

    /// Attaches the courier bridge state for health reporting.
    pub fn with_realtime(mut self, state: watch::Receiver<BridgeState>) -> Self {
        self.realtime = Some(state);
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Settings, sales and notice routes (require a platform access token)
    let protected_routes = Router::new()
        .route(
            "/api/v1/settings/display",
            get(settings::get_settings::<DisplayCategory>)
                .put(settings::update_settings::<DisplayCategory>),
        )
        .route(
            "/api/v1/settings/pathao",
            get(settings::get_settings::<PathaoCategory>)
                .put(settings::update_settings::<PathaoCategory>),
        )
        .route(
            "/api/v1/settings/webhook",
            get(settings::get_settings::<WebhookCategory>)
                .put(settings::update_settings::<WebhookCategory>),
        )
        .route(
            "/api/v1/settings/system",
            get(settings::get_settings::<SystemCategory>)
                .put(settings::update_settings::<SystemCategory>),
        )
        .route("/api/v1/settings/custom", get(settings::list_custom_settings))
        .route(
            "/api/v1/settings/custom/:setting_type",
            get(settings::get_custom_setting).put(settings::update_custom_setting),
        )
        .route("/api/v1/sales/:sale_id/courier", get(courier::get_sale_courier))
        .route("/api/v1/courier/relay", post(courier::relay_courier))
        .route("/api/v1/notices/stream", get(notices::stream_notices))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Privileged functions (require a platform access token)
    let function_routes = Router::new()
        .route("/functions/v1/stop-import", post(functions::stop_import))
        .route("/functions/v1/stop-sync", post(functions::stop_sync))
        .route(
            "/functions/v1/admin-delete-user",
            post(functions::admin_delete_user),
        )
        .route("/functions/v1/test-webhook", post(functions::test_webhook))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/api/v1/setup/status", get(setup::setup_status))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(function_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
