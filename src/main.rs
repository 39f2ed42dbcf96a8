use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use hiregenius_backend::store::backend::{HttpBackend, StoreBackend};
use hiregenius_backend::store::memory::MemoryBackend;
use hiregenius_backend::{
    config::{get_config, init_config},
    middleware, routes, store, AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let backend: Arc<dyn StoreBackend> = if config.store_base_url.is_empty() {
        info!("STORE_BASE_URL not set, using in-process store");
        Arc::new(MemoryBackend::new())
    } else {
        let store_client = reqwest::Client::builder()
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build store HTTP client: {}", e))?;
        Arc::new(HttpBackend::new(
            config.store_base_url.clone(),
            config.store_auth_token.clone(),
            store_client,
        ))
    };

    let app_state = AppState::new(backend);

    if !config.store_base_url.is_empty() {
        for collection in store::collections::ALL {
            app_state.store.spawn_change_feed(collection);
        }
    }

    {
        let state = app_state.clone();
        tokio::spawn(async move {
            loop {
                state.assignment_service.tick_sessions().await;
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let auth_api = Router::new()
        .route("/api/auth/signup", post(routes::auth::signup))
        .route("/api/auth/login", post(routes::auth::login))
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(config.public_rps),
            middleware::rate_limit::rps_middleware,
        ));

    let recruiter_api = Router::new()
        .route("/api/jobs", post(routes::jobs::create_job))
        .route("/api/jobs/:id", patch(routes::jobs::update_job_status))
        .route(
            "/api/jobs/:id/document",
            post(routes::jobs::upload_job_document),
        )
        .route(
            "/api/applications/:id/status",
            post(routes::applications::update_application_status),
        )
        .route("/api/assignments", post(routes::assignments::create_assignment))
        .layer(axum::middleware::from_fn(middleware::auth::require_recruiter));

    let candidate_api = Router::new()
        .route("/api/applications", post(routes::applications::apply))
        .route(
            "/api/assignments/:id/start",
            post(routes::assignments::start_assignment),
        )
        .route(
            "/api/assignments/:id/answer",
            patch(routes::assignments::answer),
        )
        .route(
            "/api/assignments/:id/navigate",
            post(routes::assignments::navigate),
        )
        .route(
            "/api/assignments/:id/submit",
            post(routes::assignments::submit_assignment),
        )
        .layer(axum::middleware::from_fn(middleware::auth::require_candidate));

    let shared_api = Router::new()
        .route("/api/jobs", get(routes::jobs::list_jobs))
        .route("/api/jobs/:id", get(routes::jobs::get_job))
        .route("/api/applications", get(routes::applications::list_applications))
        .route("/api/interviews", get(routes::interviews::list_interviews))
        .route("/api/assignments", get(routes::assignments::list_assignments))
        .route("/api/assignments/:id", get(routes::assignments::get_assignment))
        .route(
            "/api/assignments/:id/status",
            get(routes::assignments::assignment_status),
        )
        .route(
            "/api/assignments/:id/results",
            get(routes::assignments::assignment_results),
        )
        .route(
            "/api/events/:collection",
            get(routes::events::subscribe_collection),
        )
        .layer(axum::middleware::from_fn(middleware::auth::require_auth));

    let api = recruiter_api
        .merge(candidate_api)
        .merge(shared_api)
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(config.api_rps),
            middleware::rate_limit::rps_middleware,
        ));

    let uploads_dir = config.uploads_dir.clone();
    info!("Serving uploads from: {}", uploads_dir);

    let app = base_routes
        .merge(auth_api)
        .merge(api)
        .nest_service("/uploads", tower_http::services::ServeDir::new(uploads_dir))
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
