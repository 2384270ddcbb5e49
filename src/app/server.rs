//! HTTP router and handlers.
//!
//! - `POST /generate-network` - synthesize, audit and correct a Bayesian network
//! - `POST /generate-mermaid` - compile a network description into a Mermaid diagram
//! - `GET /health` - liveness and configured model
//!
//! Every route is also served under `/api`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::app::state::AppState;
use crate::app::types::{
    ErrorResponse, GenerateMermaidRequest, GenerateMermaidResponse, GenerateNetworkRequest,
    GenerateNetworkResponse, HealthResponse, PartialKind, PreviousAttempt,
};
use crate::config::ServiceConfig;
use crate::core::correction::CorrectionTrace;
use crate::core::UserInput;
use crate::utils::error::{Result, ServiceError};
use crate::utils::validation::require_fields;

fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/generate-network", post(generate_network_handler))
        .route("/generate-mermaid", post(generate_mermaid_handler))
}

/// Create the router with all endpoints.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes())
        .nest("/api", routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &ServiceConfig) -> Result<()> {
    let addr = config.bind_address()?;
    let state = Arc::new(AppState::from_config(config));
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🌐 Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("🛑 Shutdown signal received");
        })
        .await?;

    Ok(())
}

fn error_response(err: &ServiceError, body: ErrorResponse) -> Response {
    let status = if err.is_client_error() {
        tracing::warn!("Rejected request: {}", err);
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!(
            "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
            err,
            err.category(),
            err.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", err.recovery_suggestion());
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let body = ErrorResponse {
        error: err.to_string(),
        suggestion: Some(err.recovery_suggestion()),
        ..body
    };
    (status, Json(body)).into_response()
}

fn rejection_error(rejection: JsonRejection) -> ServiceError {
    ServiceError::InvalidRequestError {
        message: rejection.body_text(),
    }
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.model_name.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Handler for POST /generate-network
pub async fn generate_network_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<GenerateNetworkRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return error_response(&rejection_error(rejection), ErrorResponse::default())
        }
    };

    // 驗證失敗時不呼叫任何 LLM
    let input = match UserInput::from_raw(
        request.json_data.as_deref(),
        request.situation_description.as_deref(),
    ) {
        Ok(input) => input,
        Err(e) => return error_response(&e, ErrorResponse::default()),
    };

    let mut trace = CorrectionTrace::default();
    let result = state.network.run(&input, &mut trace).await;
    match result {
        Ok(outcome) => Json(GenerateNetworkResponse {
            bayes_net: outcome.artifact,
            judge_verdict: outcome.verdict.text,
        })
        .into_response(),
        Err(e) => error_response(
            &e,
            ErrorResponse::default().with_partial(PartialKind::Network, trace),
        ),
    }
}

/// Handler for POST /generate-mermaid
pub async fn generate_mermaid_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<GenerateMermaidRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return error_response(&rejection_error(rejection), ErrorResponse::default())
        }
    };

    let network = request.network_output.unwrap_or_default();
    if let Err(e) = require_fields(&[("networkOutput", Some(network.as_str()))]) {
        return error_response(&e, ErrorResponse::default());
    }

    let mut trace = CorrectionTrace::default();
    let result = state.diagram.run(&network, &mut trace).await;
    match result {
        Ok(outcome) => Json(GenerateMermaidResponse {
            mermaid_code: outcome.diagram,
            judge_verdict: outcome.verdict.map(|v| v.text),
            previous_attempt: outcome.previous.map(|attempt| PreviousAttempt {
                mermaid_code: attempt.artifact,
                judge_verdict: attempt.verdict.text,
            }),
        })
        .into_response(),
        Err(e) => error_response(
            &e,
            ErrorResponse::default().with_partial(PartialKind::Diagram, trace),
        ),
    }
}
