//! `/health` liveness probe.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Whether a static root is being served.
    pub static_files: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        static_files: state.static_files.is_some(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use gatehouse_config::StaticCredentials;
    use gatehouse_oauth::{OAuthConfig, TokenCache};
    use tower::ServiceExt;

    use crate::{DomainAllowList, Forwarder, ServerConfig};

    fn state(config: ServerConfig) -> AppState {
        let tokens = TokenCache::new(
            OAuthConfig::default(),
            Arc::new(StaticCredentials::missing()),
        );
        AppState::new(
            config,
            Forwarder::open(),
            Forwarder::authenticated(DomainAllowList::battle_net(), Arc::new(tokens)),
        )
    }

    async fn probe(state: AppState) -> HealthResponse {
        let response = health_routes()
            .with_state(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_version() {
        let health = probe(state(ServerConfig::default())).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
        assert!(!health.static_files);
    }

    #[tokio::test]
    async fn test_health_reports_static_root() {
        let health = probe(state(ServerConfig::default().with_static_root("public"))).await;
        assert!(health.static_files);
    }
}
