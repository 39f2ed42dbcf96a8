use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use tower::ServiceExt;

use hiregenius_backend::middleware::rate_limit;

async fn ping() -> &'static str {
    "pong"
}

fn app(rps: u32) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state(rps),
            rate_limit::rps_middleware,
        ))
}

fn request(token: Option<&str>) -> Request<Body> {
    let builder = Request::builder().method("GET").uri("/ping");
    let builder = match token {
        Some(t) => builder.header("authorization", format!("Bearer {}", t)),
        None => builder,
    };
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn requests_beyond_the_window_budget_are_rejected() {
    let app = app(2);
    for _ in 0..2 {
        let resp = app.clone().oneshot(request(Some("alice"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let resp = app.clone().oneshot(request(Some("alice"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn budgets_are_tracked_per_caller() {
    let app = app(1);

    let resp = app.clone().oneshot(request(Some("alice"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app.clone().oneshot(request(Some("alice"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    // One exhausted caller does not spend anyone else's budget.
    let resp = app.clone().oneshot(request(Some("bob"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Unauthenticated traffic shares a single anonymous window.
    let resp = app.clone().oneshot(request(None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app.clone().oneshot(request(None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}
