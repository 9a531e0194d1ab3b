// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    relay::{CallOutcome, CallRequest, OutcomeKind},
    state::AppState,
};

pub mod calls;
pub mod focus;
pub mod health;
pub mod keyrings;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/keyring/call", post(calls::submit_call))
        .route("/keyrings", get(keyrings::list_keyrings))
        .route("/focus", get(focus::get_focus).put(focus::set_focus))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        calls::submit_call,
        keyrings::list_keyrings,
        focus::get_focus,
        focus::set_focus,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            CallRequest,
            CallOutcome,
            OutcomeKind,
            calls::CallAccepted,
            keyrings::KeyringInfo,
            focus::FocusStatus,
            focus::FocusUpdate,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Keyring", description = "Hardware keyring calls"),
        (name = "Focus", description = "Active instance selection"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::FocusGate;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (sender, _receiver) = mpsc::channel(1);
        let app = router(AppState::new(sender, FocusGate::default()));
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn call_endpoint_accepts_wire_request() {
        let (sender, mut receiver) = mpsc::channel(1);
        let app = router(AppState::new(sender, FocusGate::default()));

        let body = json!({
            "type": "ledger",
            "method": "getAccounts",
            "args": [],
            "prevState": {},
            "promiseId": "p1"
        });
        let response = app
            .oneshot(
                Request::post("/v1/keyring/call")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let accepted: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(accepted["promiseId"], "p1");

        let queued = receiver.recv().await.unwrap();
        assert_eq!(queued.keyring_type, "ledger");
        assert_eq!(queued.promise_id, "p1");
    }

    #[tokio::test]
    async fn focus_endpoint_round_trips() {
        let (sender, _receiver) = mpsc::channel(1);
        let gate = FocusGate::new(true);
        let app = router(AppState::new(sender, gate.clone()));

        let response = app
            .clone()
            .oneshot(
                Request::put("/v1/focus")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"focused":false}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!gate.is_focused());

        let response = app
            .oneshot(Request::get("/v1/focus").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"focused":false}"#);
    }
}
