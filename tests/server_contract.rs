//! Wire-contract tests for the HTTP surface, driven in-process.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceExt;

use common::ScriptedProvider;
use lexcabinet::pipeline::ContractPipeline;
use lexcabinet::safety::RateLimiter;
use lexcabinet::server::{router, AppState};

fn app_with(provider: Arc<ScriptedProvider>) -> axum::Router {
    router(AppState {
        pipeline: Arc::new(ContractPipeline::new(provider)),
        limiter: Arc::new(Mutex::new(RateLimiter::new())),
    })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn clarify_payload() -> String {
    json!({
        "contractType": "Vente immobilière",
        "parties": [{ "role": "Le Vendeur" }, { "role": "L'Acquéreur" }],
        "context": { "description": "Vente d'un appartement", "objectif": "Acte de vente" },
        "pointsSensibles": ["Conditions suspensives"],
        "missingInfo": [{
            "category": "Montants",
            "field": "prix_vente",
            "description": "Prix de vente du bien",
            "priority": "bloquant"
        }],
        "providedInfo": {}
    })
    .to_string()
}

#[tokio::test]
async fn clarify_success_envelope() {
    let app = app_with(Arc::new(ScriptedProvider::new([clarify_payload()])));

    let response = app
        .oneshot(post_json(
            "/v1/contracts/clarify",
            json!({
                "contractType": "Vente immobilière",
                "description": "Appartement à Lyon",
                "role": "notaire"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["needsMoreInfo"], true);
    assert_eq!(body["brief"]["contractType"], "Vente immobilière");
    assert_eq!(body["questions"][0]["fieldName"], "prix_vente");
    assert_eq!(body["questions"][0]["inputType"], "number");
    assert_eq!(body["tokensUsed"]["total_tokens"], 150);
}

#[tokio::test]
async fn clarify_failure_uses_flagged_envelope() {
    let app = app_with(Arc::new(ScriptedProvider::failing(
        "OpenAI API error: 503 - surcharge",
    )));

    let response = app
        .oneshot(post_json(
            "/v1/contracts/clarify",
            json!({ "contractType": "NDA", "role": "avocat" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("OpenAI API error"));
}

#[tokio::test]
async fn complete_validates_request_body() {
    let app = app_with(Arc::new(ScriptedProvider::new(Vec::<String>::new())));

    let response = app
        .oneshot(post_json(
            "/v1/contracts/complete",
            json!({ "contractContent": "", "partiesClients": {} }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("contractContent et partiesClients requis"));
    assert!(body.get("success").is_none());
}

#[tokio::test]
async fn complete_returns_completed_contract() {
    let app = app_with(Arc::new(ScriptedProvider::new([
        "Entre Claire Durand, née le [À COMPLÉTER]...",
    ])));

    let response = app
        .oneshot(post_json(
            "/v1/contracts/complete",
            json!({
                "contractContent": "Entre [À COMPLÉTER], née le [À COMPLÉTER]...",
                "partiesClients": {
                    "Le Vendeur": { "nom": "Durand", "prenom": "Claire" }
                }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["completedContract"]
        .as_str()
        .unwrap()
        .contains("Claire Durand"));
}

#[tokio::test]
async fn role_guard_refuses_low_tiers() {
    let provider = Arc::new(ScriptedProvider::new([clarify_payload()]));
    let app = app_with(provider.clone());

    let mut request = post_json(
        "/v1/contracts/clarify",
        json!({ "contractType": "NDA", "role": "avocat" }),
    );
    request
        .headers_mut()
        .insert("x-cabinet-role", "Stagiaire".parse().unwrap());

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("stagiaires"));
    // The provider was never reached.
    assert_eq!(provider.call_count(), 0);

    // A Collaborateur may create contracts.
    let mut request = post_json(
        "/v1/contracts/clarify",
        json!({ "contractType": "NDA", "role": "avocat" }),
    );
    request
        .headers_mut()
        .insert("x-cabinet-role", "Collaborateur".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn generate_is_rate_limited() {
    let contracts: Vec<String> = (0..5).map(|i| format!("Contrat {i}")).collect();
    let app = app_with(Arc::new(ScriptedProvider::new(contracts)));

    let request_body = json!({
        "contractType": "Bail d'habitation",
        "formData": { "loyer_mensuel": "850" }
    });

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(post_json("/v1/contracts/generate", request_body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(post_json("/v1/contracts/generate", request_body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Trop de requêtes"));
}

#[tokio::test]
async fn preflight_is_accepted() {
    let app = app_with(Arc::new(ScriptedProvider::new(Vec::<String>::new())));

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/v1/contracts/clarify")
        .header(header::ORIGIN, "https://app.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = app_with(Arc::new(ScriptedProvider::new(Vec::<String>::new())));

    let request = Request::builder()
        .method(Method::GET)
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}
