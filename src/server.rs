//! HTTP surface: register, login, predict, dashboard.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{
        header, header::InvalidHeaderValue, request::Parts, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::auth::AuthKeys;
use crate::classifier::ClassifierError;
use crate::service::PredictionService;
use crate::store::{DashboardCounts, Store, StoreError};

/// Everything a request handler needs, constructed once at startup and
/// threaded through the router state. No process-wide globals.
#[derive(Clone)]
pub struct AppState {
    pub service: PredictionService,
    pub store: Store,
    pub auth: AuthKeys,
}

/// Builds the application router with CORS restricted to `cors_origin`.
///
/// A `cors_origin` that is not a valid header value is a configuration
/// error and fails router construction, so the process refuses to bind
/// rather than serving with the wrong origin.
pub fn router(state: AppState, cors_origin: &str) -> Result<Router, InvalidHeaderValue> {
    let allow_origin = cors_origin.parse::<HeaderValue>()?;

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Ok(Router::new()
        .route("/health", get(health))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/predict", post(predict))
        .route("/dashboard", get(dashboard))
        .layer(cors)
        .with_state(state))
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Username already exists")]
    DuplicateUser,
    #[error("Bad username or password")]
    BadCredentials,
    #[error("Missing or invalid bearer token")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("Internal error")]
    Internal,
    #[error("Internal error")]
    Inference(#[from] ClassifierError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername => ApiError::DuplicateUser,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::DuplicateUser | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::BadCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal | ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let ApiError::Inference(e) = &self {
            // Details stay server-side; the client gets a generic message.
            log::error!("inference failed: {}", e);
        }
        (status, Json(json!({ "msg": self.to_string() }))).into_response()
    }
}

/// The authenticated caller, extracted from the `Authorization: Bearer`
/// header. Handlers that take this parameter reject anonymous requests.
pub struct AuthUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;
        let claims = state
            .auth
            .verify_token(token)
            .map_err(|_| ApiError::Unauthorized)?;
        Ok(AuthUser(claims.sub))
    }
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
}

async fn health() -> &'static str {
    "OK"
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Username and password must not be empty".to_string(),
        ));
    }
    state.store.create_user(&req.username, &req.password).await?;
    log::info!("registered user '{}'", req.username);
    Ok((StatusCode::CREATED, Json(json!({ "msg": "User created" }))))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    // Unknown user and wrong password share one error, so the endpoint
    // cannot be used to enumerate usernames.
    if !state
        .store
        .verify_credentials(&req.username, &req.password)
        .await
    {
        return Err(ApiError::BadCredentials);
    }

    let access_token = state
        .auth
        .create_token(&req.username)
        .map_err(|_| ApiError::Internal)?;
    Ok(Json(TokenResponse { access_token }))
}

async fn predict(
    State(state): State<AppState>,
    AuthUser(username): AuthUser,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let label = state.service.predict(&username, &req.email).await?;
    Ok(Json(PredictResponse {
        prediction: label.as_str().to_string(),
    }))
}

async fn dashboard(
    State(state): State<AppState>,
    AuthUser(username): AuthUser,
) -> Json<DashboardCounts> {
    Json(state.store.counts_for_user(&username).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{EmailClassifier, Prediction};
    use std::sync::Arc;

    struct NullClassifier;

    impl EmailClassifier for NullClassifier {
        fn classify(&self, _text: &str) -> Result<Prediction, ClassifierError> {
            Ok(Prediction::from_logits([1.0, 0.0]))
        }
    }

    fn state() -> AppState {
        let store = Store::new();
        AppState {
            service: PredictionService::new(Arc::new(NullClassifier), store.clone(), false),
            store,
            auth: AuthKeys::new(b"test-secret"),
        }
    }

    #[test]
    fn valid_cors_origin_accepted() {
        assert!(router(state(), "http://localhost:3000").is_ok());
    }

    #[test]
    fn invalid_cors_origin_is_a_startup_error() {
        assert!(router(state(), "not a\nheader value").is_err());
    }
}
