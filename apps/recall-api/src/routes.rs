use std::time::Duration;

use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	routing::{get, post},
};
use tokio::time;

use recall_service::{RetrieveRequest, RetrieveResponse};

use crate::state::AppState;

const RESPONSE_GRACE: Duration = Duration::from_millis(50);

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/knowledge/retrieve", post(retrieve))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

/// Always `200`. Pipeline errors, panics, and overruns answer with an empty document list.
async fn retrieve(
	State(state): State<AppState>,
	Json(payload): Json<RetrieveRequest>,
) -> Json<RetrieveResponse> {
	// One deadline for the settings load, one for the pipeline.
	let budget = state.service.deadline() * 2 + RESPONSE_GRACE;
	let service = state.service.clone();
	let mut task = tokio::spawn(async move { service.retrieve(payload).await });
	let response = match time::timeout(budget, &mut task).await {
		Ok(Ok(Ok(response))) => response,
		Ok(Ok(Err(err))) => {
			tracing::warn!(error = %err, "Knowledge retrieval failed. Answering with no documents.");

			RetrieveResponse::default()
		},
		Ok(Err(err)) => {
			tracing::warn!(
				error = %err,
				"Knowledge retrieval task aborted. Answering with no documents."
			);

			RetrieveResponse::default()
		},
		Err(_) => {
			task.abort();
			tracing::warn!(
				budget_ms = budget.as_millis() as u64,
				"Knowledge retrieval overran its budget. Answering with no documents."
			);

			RetrieveResponse::default()
		},
	};

	Json(response)
}
