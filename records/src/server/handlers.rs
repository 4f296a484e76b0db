//! HTTP route handlers for the record server.
//!
//! Every record operation goes through [`handle_request`], which
//! authenticates before it looks at the path. An unauthenticated request
//! therefore gets a 401 whatever it asks for, and never reaches storage.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use super::error::ApiError;
use super::metrics::Metrics;
use super::router::{Endpoint, Route};
use crate::auth::Authenticator;
use crate::error::Error;
use crate::model::Identity;
use crate::serde::COLLECTION_LOG_KEY;
use crate::store::RecordStore;

/// Largest request body accepted by Put.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub authenticator: Authenticator,
    pub metrics: Arc<Metrics>,
}

/// Handle every `/{operation}/...` request.
///
/// Authenticates, resolves the route, then runs the operation as the
/// authenticated user. History on the reserved `_logs` key returns the
/// collection's List audit log.
pub async fn handle_request(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ApiError> {
    let identity = authenticate(&state, request.headers())?;

    let (parts, body) = request.into_parts();
    let route = Route::resolve(&parts.method, parts.uri.path())?;

    let response = match route.endpoint {
        Endpoint::Get => {
            let (collection, key) = route.record()?;
            let document = state.store.get(collection, key, &identity).await?;
            Json(document).into_response()
        }
        Endpoint::Put => {
            let (collection, key) = route.record()?;
            let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
                .await
                .map_err(|e| Error::InvalidInput(format!("Failed to read body: {}", e)))?;
            let value: Value = serde_json::from_slice(&body)
                .map_err(|e| Error::InvalidInput(format!("Invalid JSON payload: {}", e)))?;
            state.store.put(collection, key, value, &identity).await?;
            state.metrics.records_put_total.inc();
            (StatusCode::CREATED, "Created").into_response()
        }
        Endpoint::Delete => {
            let (collection, key) = route.record()?;
            state.store.delete(collection, key, &identity).await?;
            state.metrics.records_deleted_total.inc();
            StatusCode::NO_CONTENT.into_response()
        }
        Endpoint::History => {
            let (collection, key) = route.record()?;
            let logs = if key == COLLECTION_LOG_KEY {
                state.store.collection_history(collection).await?
            } else {
                state.store.history(collection, key, &identity).await?
            };
            Json(logs).into_response()
        }
        Endpoint::List => {
            let collection = route.collection()?;
            let items = state.store.list(collection, &identity).await?;
            state.metrics.records_listed_total.inc();
            state
                .metrics
                .records_list_items_total
                .inc_by(items.len() as u64);
            Json(items).into_response()
        }
    };

    Ok(response)
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    state.authenticator.authenticate(header).map_err(|e| {
        state.metrics.auth_rejections_total.inc();
        ApiError::from(e)
    })
}

/// Handle GET /metrics
pub async fn handle_metrics(State(state): State<AppState>) -> String {
    state.metrics.encode()
}

/// Handle GET /-/healthy
///
/// Returns 200 OK if the service is running.
pub async fn handle_healthy() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Handle GET /-/ready
///
/// Returns 200 OK once a point read against the backend succeeds.
pub async fn handle_ready(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.store.check_storage().await {
        Ok(_) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::warn!(error = %e, "storage check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "Not Ready")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthorizedUser;
    use crate::config::AuditConfig;
    use axum::body::Body;
    use axum::http::Method;
    use common::storage::in_memory::InMemoryStorage;
    use common::{MockClock, Storage};

    fn state() -> AppState {
        let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        let store = RecordStore::new(
            storage,
            Arc::new(MockClock::at_millis(1_700_000_000_000)),
            AuditConfig::default(),
        );
        let authenticator = Authenticator::new(vec![AuthorizedUser {
            user: "alice".to_string(),
            token: "token-a".to_string(),
            comment: None,
        }])
        .unwrap();
        AppState {
            store: Arc::new(store),
            authenticator,
            metrics: Arc::new(Metrics::new()),
        }
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: &str) -> Request {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn call(state: &AppState, request: Request) -> StatusCode {
        match handle_request(State(state.clone()), request).await {
            Ok(response) => response.status(),
            Err(e) => e.status(),
        }
    }

    #[tokio::test]
    async fn should_return_ok_for_healthy() {
        // when
        let (status, body) = handle_healthy().await;

        // then
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn should_return_ok_for_ready_when_storage_accessible() {
        // given
        let state = state();

        // when
        let (status, body) = handle_ready(State(state)).await;

        // then
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn should_reject_before_routing_and_count_rejection() {
        // given
        let state = state();

        // when
        let status = call(&state, request(Method::POST, "/nope", None, "")).await;

        // then
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(state.metrics.auth_rejections_total.get(), 1);
    }

    #[tokio::test]
    async fn should_put_then_get() {
        // given
        let state = state();

        // when
        let put = call(
            &state,
            request(Method::PUT, "/put/cars/honda", Some("token-a"), r#"{"model":"Civic"}"#),
        )
        .await;
        let get = call(
            &state,
            request(Method::GET, "/get/cars/honda", Some("token-a"), ""),
        )
        .await;

        // then
        assert_eq!(put, StatusCode::CREATED);
        assert_eq!(get, StatusCode::OK);
        assert_eq!(state.metrics.records_put_total.get(), 1);
    }

    #[tokio::test]
    async fn should_reject_malformed_payload() {
        let state = state();
        let status = call(
            &state,
            request(Method::PUT, "/put/cars/honda", Some("token-a"), "{not json"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.metrics.records_put_total.get(), 0);
    }

    #[tokio::test]
    async fn should_count_listed_items() {
        // given
        let state = state();
        for key in ["a", "b"] {
            call(
                &state,
                request(
                    Method::PUT,
                    &format!("/put/cars/{}", key),
                    Some("token-a"),
                    "{}",
                ),
            )
            .await;
        }

        // when
        let status = call(&state, request(Method::GET, "/list/cars", Some("token-a"), "")).await;

        // then
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.metrics.records_listed_total.get(), 1);
        assert_eq!(state.metrics.records_list_items_total.get(), 2);
    }
}
