use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;

use rodcheck::auth::AuthKeys;
use rodcheck::classifier::features;
use rodcheck::server::{self, AppState};
use rodcheck::{ClassifierError, EmailClassifier, Prediction, PredictionService, Store};

/// Deterministic stand-in for the ONNX classifier: labels by the injected
/// URL flag. Keeps the HTTP tests independent of model artifacts while
/// still exercising the real preprocessing path.
struct FlagClassifier;

impl EmailClassifier for FlagClassifier {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
        if text.starts_with(features::URL_FLAG_PRESENT) {
            Ok(Prediction::from_logits([-2.0, 2.0]))
        } else {
            Ok(Prediction::from_logits([2.0, -2.0]))
        }
    }
}

fn test_server() -> TestServer {
    let store = Store::new();
    let auth = AuthKeys::new(b"integration-test-secret");
    let service = PredictionService::new(Arc::new(FlagClassifier), store.clone(), true);
    let app = server::router(
        AppState {
            service,
            store,
            auth,
        },
        "http://localhost:3000",
    )
    .expect("valid CORS origin");
    TestServer::new(app).expect("failed to start test server")
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

async fn register_and_login(server: &TestServer, username: &str) -> String {
    let res = server
        .post("/register")
        .json(&json!({ "username": username, "password": "pw" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);

    let res = server
        .post("/login")
        .json(&json!({ "username": username, "password": "pw" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    res.json::<Value>()["access_token"]
        .as_str()
        .expect("login response carries access_token")
        .to_string()
}

#[tokio::test]
async fn health_is_public() {
    let server = test_server();
    let res = server.get("/health").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.text(), "OK");
}

#[tokio::test]
async fn duplicate_registration_rejected() {
    let server = test_server();

    let res = server
        .post("/register")
        .json(&json!({ "username": "alice", "password": "pw" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);

    let res = server
        .post("/register")
        .json(&json!({ "username": "alice", "password": "other" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>()["msg"], "Username already exists");
}

#[tokio::test]
async fn empty_credentials_rejected() {
    let server = test_server();
    let res = server
        .post("/register")
        .json(&json!({ "username": "", "password": "" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_failures_are_uniform() {
    let server = test_server();
    register_and_login(&server, "alice").await;

    let wrong_password = server
        .post("/login")
        .json(&json!({ "username": "alice", "password": "nope" }))
        .await;
    let unknown_user = server
        .post("/login")
        .json(&json!({ "username": "mallory", "password": "pw" }))
        .await;

    assert_eq!(wrong_password.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status_code(), StatusCode::UNAUTHORIZED);
    // Same body for both causes, so the endpoint can't enumerate usernames.
    assert_eq!(
        wrong_password.json::<Value>()["msg"],
        unknown_user.json::<Value>()["msg"]
    );
}

#[tokio::test]
async fn predict_requires_bearer_token() {
    let server = test_server();

    let res = server
        .post("/predict")
        .json(&json!({ "email": "hello" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

    let res = server
        .post("/predict")
        .add_header(header::AUTHORIZATION, bearer("garbage-token"))
        .json(&json!({ "email": "hello" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn dashboard_requires_bearer_token() {
    let server = test_server();

    let res = server.get("/dashboard").await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

    let res = server
        .get("/dashboard")
        .add_header(header::AUTHORIZATION, bearer("garbage-token"))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_email_field_is_client_error() {
    let server = test_server();
    let token = register_and_login(&server, "alice").await;

    let res = server
        .post("/predict")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "body": "wrong field name" }))
        .await;
    assert!(res.status_code().is_client_error());
}

#[tokio::test]
async fn full_flow_predictions_and_dashboard() {
    let server = test_server();
    let token = register_and_login(&server, "alice").await;

    let res = server
        .post("/predict")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "email": "verify at http://evil.example/login" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.json::<Value>()["prediction"], "Phishing 🚨");

    let res = server
        .post("/predict")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "email": "update here: https://evil.example" }))
        .await;
    assert_eq!(res.json::<Value>()["prediction"], "Phishing 🚨");

    let res = server
        .post("/predict")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "email": "Did you finish work last week?" }))
        .await;
    assert_eq!(res.json::<Value>()["prediction"], "Legit ✅");

    let res = server
        .get("/dashboard")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let counts = res.json::<Value>();
    assert_eq!(counts["total"], 3);
    assert_eq!(counts["legit"], 1);
    assert_eq!(counts["phishing"], 2);
    assert_eq!(
        counts["legit"].as_u64().unwrap() + counts["phishing"].as_u64().unwrap(),
        counts["total"].as_u64().unwrap()
    );
}

#[tokio::test]
async fn dashboard_counts_are_per_user() {
    let server = test_server();
    let alice = register_and_login(&server, "alice").await;
    let bob = register_and_login(&server, "bob").await;

    server
        .post("/predict")
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .json(&json!({ "email": "see http://x.example" }))
        .await;

    let res = server
        .get("/dashboard")
        .add_header(header::AUTHORIZATION, bearer(&bob))
        .await;
    let counts = res.json::<Value>();
    assert_eq!(counts["total"], 0);
    assert_eq!(counts["legit"], 0);
    assert_eq!(counts["phishing"], 0);
}
