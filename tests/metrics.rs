// tests/metrics.rs
use axum::body::{self, Body};
use axum::Router;
use http::{Request, StatusCode};
use tower::ServiceExt;

use mindflow::metrics::Metrics;
use mindflow::{create_router, AppState};

// One recorder per process, so everything lives in a single test.
#[tokio::test]
async fn metrics_endpoint_contains_expected_series() {
    let metrics = Metrics::init().expect("install prometheus recorder");
    let app: Router = create_router(AppState::default()).merge(metrics.router());

    let create = Request::post("/api/tasks")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"title":"Count me","priority":5}"#))
        .unwrap();
    let resp = app.clone().oneshot(create).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .clone()
        .oneshot(Request::get("/api/tasks/best").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(Request::get("/api/tasks/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        r#"mindflow_requests_total{action="create_task",outcome="success"} 1"#,
        r#"mindflow_requests_total{action="get_best_task",outcome="success"} 1"#,
        r#"mindflow_requests_total{action="get_task",outcome="error"} 1"#,
        "mindflow_request_duration_ms",
        "mindflow_selection_candidates",
        "mindflow_best_task_score",
    ] {
        assert!(
            text.contains(needle),
            "missing `{needle}` in /metrics output:\n{text}"
        );
    }
}
