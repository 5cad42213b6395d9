//! HTTP intake for questions.
//!
//! | Method     | Path                         | Description                       |
//! |------------|------------------------------|-----------------------------------|
//! | `GET/POST` | `/api/AskProduct/{*question}` | Answer the question in the path   |
//! | `GET/POST` | `/api/AskProduct[/]`          | `400`, no question supplied       |
//! | `GET`      | `/health`                     | Liveness check (returns version)  |
//!
//! Answers and pipeline explanations are both `200 text/plain`. Only a hard
//! pipeline fault maps to `500`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use product_qa_core::{ChatCompletion, QueryPipeline};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub const MISSING_QUESTION: &str = "Question not provided.";

pub fn router<C>(pipeline: Arc<QueryPipeline<C>>) -> Router
where
    C: ChatCompletion + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/api/AskProduct",
            get(missing_question).post(missing_question),
        )
        // The catch-all below never matches an empty tail.
        .route(
            "/api/AskProduct/",
            get(missing_question).post(missing_question),
        )
        .route(
            "/api/AskProduct/{*question}",
            get(ask_product::<C>).post(ask_product::<C>),
        )
        .route("/health", get(health))
        .with_state(pipeline)
}

pub async fn serve<C>(pipeline: Arc<QueryPipeline<C>>, bind: &str) -> anyhow::Result<()>
where
    C: ChatCompletion + Send + Sync + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %listener.local_addr()?, "question intake listening");

    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

async fn ask_product<C>(
    State(pipeline): State<Arc<QueryPipeline<C>>>,
    Path(question): Path<String>,
) -> Response
where
    C: ChatCompletion + Send + Sync + 'static,
{
    if question.trim().is_empty() {
        return missing_question().await.into_response();
    }

    // Dropping the handler (client went away) cancels the pipeline.
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    match pipeline.answer_text(&question, &cancel).await {
        Ok(answer) => (StatusCode::OK, answer).into_response(),
        Err(err) => {
            error!(error = %err, "question failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

async fn missing_question() -> (StatusCode, &'static str) {
    (StatusCode::BAD_REQUEST, MISSING_QUESTION)
}

async fn health() -> String {
    format!("ok {}", env!("CARGO_PKG_VERSION"))
}
