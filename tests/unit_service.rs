// Use-case boundary tests: roster wiring, structured failures, wire shape.

mod common;

use std::sync::Arc;

use common::{FailingStub, FixedStub, PanickingStub, ZeroShotStub, TIMEOUT};
use moderacao::detection::config::DetectionConfig;
use moderacao::error::ModerationError;
use moderacao::inference::traits::TextClassifier;
use moderacao::service::{ModelRoster, ModerationService};

const SUBTLE: &str = "Essas pessoas estragam tudo por aqui";

fn service(fixed: Vec<Arc<dyn TextClassifier>>, zero_shot: Option<Arc<dyn TextClassifier>>) -> Arc<ModerationService> {
    let roster = ModelRoster { fixed, zero_shot };
    Arc::new(ModerationService::from_roster(DetectionConfig::default(), roster, TIMEOUT).unwrap())
}

// ============================================================
// Roster wiring
// ============================================================

#[tokio::test]
async fn toxic_bert_gets_its_lower_threshold() {
    let svc = service(vec![Arc::new(FixedStub::new("toxic_bert", "toxic", 0.35))], None);
    assert!(svc.detect(SUBTLE).await.is_hate_speech);
}

#[tokio::test]
async fn other_models_use_the_default_threshold() {
    let svc = service(vec![Arc::new(FixedStub::new("hate_speech", "toxic", 0.35))], None);
    assert!(!svc.detect(SUBTLE).await.is_hate_speech);
}

#[tokio::test]
async fn zero_shot_model_is_evaluated_last() {
    let svc = service(
        vec![Arc::new(FixedStub::new("toxic_bert", "non-toxic", 0.9))],
        Some(Arc::new(ZeroShotStub::new("conteúdo neutro e respeitoso", 0.9))),
    );
    assert_eq!(svc.engine().model_names(), vec!["toxic_bert", "zero_shot"]);
}

#[test]
fn invalid_detection_config_is_rejected() {
    let config = DetectionConfig {
        hate_threshold: 1.5,
        ..Default::default()
    };
    let roster = ModelRoster {
        fixed: Vec::new(),
        zero_shot: None,
    };
    assert!(ModerationService::from_roster(config, roster, TIMEOUT).is_err());
}

// ============================================================
// Detection responses
// ============================================================

#[tokio::test]
async fn detect_success_carries_message_and_length() {
    let svc = service(Vec::new(), None);
    let response = svc.detect("Vamos matar essa praga de uma vez").await;

    assert!(response.success);
    assert!(response.is_hate_speech);
    assert_eq!(response.message.as_deref(), Some("Análise concluída com sucesso"));
    assert_eq!(response.text_length, Some(33));
    assert!(response.error.is_none());
}

#[tokio::test]
async fn detect_counts_characters_not_bytes() {
    let svc = service(Vec::new(), None);
    let response = svc.detect("ação").await;
    assert_eq!(response.text_length, Some(4));
}

#[tokio::test]
async fn detect_blank_text_is_structured_failure() {
    let svc = service(Vec::new(), None);
    let response = svc.detect("   ").await;

    assert!(!response.success);
    assert!(!response.is_hate_speech);
    assert_eq!(response.error.as_deref(), Some("Texto vazio ou inválido"));
}

#[tokio::test]
async fn panicking_model_is_treated_as_safe() {
    let svc = service(vec![Arc::new(PanickingStub)], None);
    let response = svc.detect(SUBTLE).await;

    assert!(!response.success);
    assert!(!response.is_hate_speech);
    assert_eq!(
        response.message.as_deref(),
        Some("Erro na análise - assumindo conteúdo seguro")
    );
    assert!(response.error.is_some());
}

#[tokio::test]
async fn panicking_model_fails_analysis_without_report() {
    let svc = service(vec![Arc::new(PanickingStub)], None);
    let response = svc.analyze(SUBTLE).await;

    assert!(!response.success);
    assert!(response.analysis.is_none());
    assert!(response.error.is_some());
}

// ============================================================
// Analysis responses
// ============================================================

#[tokio::test]
async fn analysis_serializes_with_wire_field_names() {
    let svc = service(
        vec![Arc::new(FailingStub::new("toxic_bert"))],
        Some(Arc::new(ZeroShotStub::new("ameaças e intimidação", 0.6))),
    );
    let response = svc.analyze(SUBTLE).await;
    assert!(response.success);

    let value = serde_json::to_value(&response).unwrap();
    let analysis = &value["analysis"];
    assert_eq!(analysis["text"], SUBTLE);
    assert_eq!(analysis["is_hate_speech"], true);
    assert_eq!(analysis["model_version"], "1.1.0");
    assert_eq!(analysis["fallback_triggered"], true);
    assert!(analysis["error_message"]
        .as_str()
        .unwrap()
        .starts_with("toxic_bert: "));
    assert!(analysis["analysis_timestamp"].is_string());
    assert_eq!(analysis["classifications"][0]["category"], "ameaças e intimidação");
    assert_eq!(analysis["classifications"][0]["is_hate_speech"], true);
    assert!(value.get("error").is_none());
}

#[tokio::test]
async fn analysis_round_trips_through_json() {
    let svc = service(Vec::new(), None);
    let response = svc.analyze("Essa praga no jardim acabou com as rosas").await;

    let json = serde_json::to_string(&response).unwrap();
    let parsed: moderacao::service::AnalysisResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, response);
}

#[tokio::test]
async fn analyze_blank_text_is_structured_failure() {
    let svc = service(Vec::new(), None);
    let response = svc.analyze("\n").await;

    assert!(!response.success);
    assert!(response.analysis.is_none());
    assert_eq!(response.error.as_deref(), Some("Texto vazio ou inválido"));
}

// ============================================================
// Age rating
// ============================================================

#[tokio::test]
async fn age_rating_shares_the_zero_shot_model() {
    let svc = service(
        Vec::new(),
        Some(Arc::new(ZeroShotStub::new("conteúdo com violência intensa ou temas adultos", 0.7))),
    );
    let response = svc.classify_age("Uma cena de guerra muito pesada").await.unwrap();
    assert_eq!(serde_json::to_value(&response).unwrap()["rating"], "16+");
}

#[tokio::test]
async fn age_rating_rejects_blank_text() {
    let svc = service(Vec::new(), None);
    assert!(matches!(
        svc.classify_age("  ").await,
        Err(ModerationError::EmptyText)
    ));
}
