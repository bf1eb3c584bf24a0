use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use clientbook_storage::DynStorage;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::AuthState,
    cache::{CacheBackend, CacheStore, DynCacheStore},
    config::{AppConfig, StorageBackend},
    create_cache_backend, handlers,
    middleware as app_middleware,
    service::CustomerService,
};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: CustomerService,
    pub auth: AuthState,
}

impl AppState {
    pub fn new(service: CustomerService, auth: AuthState) -> Self {
        Self { service, auth }
    }
}

pub struct ClientbookServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;

    // Write routes sit behind token auth
    let protected = Router::new()
        .route("/addcustomer", post(handlers::add_customer))
        .route("/updatecustomer", put(handlers::update_customer))
        .route("/deletecustomer", delete(handlers::delete_customer))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            app_middleware::require_auth,
        ));

    Router::new()
        // Health endpoints
        .route("/healthcheck", get(handlers::healthcheck))
        .route("/healthz", get(handlers::healthz))
        // Reads
        .route("/listcustomers", get(handlers::list_customers))
        .route("/customer", get(handlers::get_customer))
        .merge(protected)
        .with_state(state)
        // Middleware stack, innermost first: cors -> compression -> trace -> request id
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = tracing::field::Empty,
                        request_id = %app_middleware::request_id_of(req)
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

#[derive(Default)]
pub struct ServerBuilder {
    config: AppConfig,
    addr: Option<SocketAddr>,
    storage: Option<DynStorage>,
    cache: Option<DynCacheStore>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    /// Uses the given record store instead of the configured one.
    pub fn with_storage(mut self, storage: DynStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Uses the given cache store instead of the configured one.
    pub fn with_cache(mut self, cache: DynCacheStore) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Connects the record and cache stores and assembles the router.
    pub async fn build(self) -> anyhow::Result<ClientbookServer> {
        let storage = match self.storage {
            Some(storage) => storage,
            None => create_storage(&self.config).await?,
        };
        let cache: DynCacheStore = match self.cache {
            Some(cache) => cache,
            None => {
                let backend: CacheBackend = create_cache_backend(&self.config.redis).await?;
                Arc::new(backend)
            }
        };
        tracing::info!(
            storage = storage.backend_name(),
            cache = cache.backend_name(),
            ttl_secs = self.config.cache.ttl_secs,
            invalidation = ?self.config.cache.invalidation,
            "Backends ready"
        );

        let service = CustomerService::new(storage, cache, self.config.cache_policy());
        let state = AppState::new(service, AuthState::from_config(&self.config.auth));
        let app = build_app(state, &self.config);

        Ok(ClientbookServer {
            addr: self.addr.unwrap_or_else(|| self.config.addr()),
            app,
        })
    }
}

async fn create_storage(cfg: &AppConfig) -> anyhow::Result<DynStorage> {
    let storage: DynStorage = match cfg.storage.backend {
        StorageBackend::Memory => clientbook_db_memory::create_storage(),
        StorageBackend::Postgres => {
            let pg = cfg
                .storage
                .postgres
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("storage.postgres config is required"))?;
            let pg_storage = clientbook_db_postgres::create_storage(pg.to_backend_config()).await?;
            pg_storage as DynStorage
        }
    };
    Ok(storage)
}

impl ClientbookServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
