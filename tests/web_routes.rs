// HTTP route tests — drive the router in-process with tower's `oneshot`.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{FixedStub, ZeroShotStub, TIMEOUT};
use moderacao::detection::config::DetectionConfig;
use moderacao::service::{ModelRoster, ModerationService};
use moderacao::web::{build_router, AppState};

fn app() -> axum::Router {
    let roster = ModelRoster {
        fixed: vec![Arc::new(FixedStub::new("toxic_bert", "non-toxic", 0.9))],
        zero_shot: Some(Arc::new(ZeroShotStub::new("conteúdo com conflitos e suspense", 0.6))),
    };
    let service = ModerationService::from_roster(DetectionConfig::default(), roster, TIMEOUT).unwrap();
    build_router(AppState {
        service: Arc::new(service),
    })
}

async fn post(path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_is_ok() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn detect_returns_verdict() {
    let (status, body) = post(
        "/ia/hate_speech/detect",
        json!({"text": "Eles não merecem viver"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["is_hate_speech"], true);
    assert_eq!(body["text_length"], 22);
}

#[tokio::test]
async fn detect_rejects_oversized_text() {
    let (status, body) = post(
        "/ia/hate_speech/detect",
        json!({"text": "a".repeat(5001)}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn detect_rejects_empty_text() {
    let (status, _) = post("/ia/hate_speech/detect", json!({"text": ""})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn detect_whitespace_is_structured_failure() {
    let (status, body) = post("/ia/hate_speech/detect", json!({"text": "   "})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["is_hate_speech"], false);
    assert_eq!(body["error"], "Texto vazio ou inválido");
}

#[tokio::test]
async fn analyze_returns_report() {
    let (status, body) = post(
        "/ia/hate_speech/analyze",
        json!({"text": "Essas pessoas estragam tudo por aqui"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let analysis = &body["analysis"];
    assert_eq!(analysis["is_hate_speech"], false);
    assert_eq!(analysis["model_version"], "1.1.0");
    assert_eq!(analysis["fallback_triggered"], false);
    assert_eq!(
        analysis["classifications"].as_array().unwrap().len(),
        DetectionConfig::default().zero_shot_labels.len()
    );
}

#[tokio::test]
async fn age_classification_returns_rating() {
    let (status, body) = post(
        "/ia/age_classification",
        json!({"text": "Um mistério sombrio na cidade"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"rating": "12+"}));
}

#[tokio::test]
async fn age_classification_rejects_blank_text() {
    let (status, body) = post("/ia/age_classification", json!({"text": "  "})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Texto vazio ou inválido");
}
