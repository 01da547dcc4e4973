use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};

use recall_domain::{
	ScoredItem,
	query::{self, ConversationTurn},
	ranking, snippet,
};

use crate::{RecallService, Result, RetrievalOverrides, RetrievalSettings, strategy};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrieveRequest {
	#[serde(default)]
	pub messages: Vec<ConversationTurn>,
	#[serde(default, alias = "callerId")]
	pub caller_id: Option<String>,
	#[serde(default)]
	pub overrides: Option<RetrievalOverrides>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrieveResponse {
	pub documents: Vec<RetrievedDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedDocument {
	pub content: String,
	pub similarity: f32,
}
impl From<&ScoredItem> for RetrievedDocument {
	fn from(item: &ScoredItem) -> Self {
		Self { content: snippet::format_snippet(item), similarity: item.relevance_score() }
	}
}

/// Fully resolved input of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalRequest {
	pub query_text: String,
	/// `None` puts every strategy on its keyword path.
	pub query_embedding: Option<Vec<f32>>,
	pub caller_id: Option<String>,
	pub chunk_limit: u32,
	pub assertion_limit: u32,
	pub memory_limit: u32,
	pub min_relevance: f32,
	pub top_results: u32,
}
impl RetrievalRequest {
	pub fn new(
		query_text: String,
		query_embedding: Option<Vec<f32>>,
		caller_id: Option<String>,
		settings: &RetrievalSettings,
	) -> Self {
		Self {
			query_text,
			query_embedding,
			caller_id,
			chunk_limit: settings.chunk_limit,
			assertion_limit: settings.assertion_limit,
			memory_limit: settings.memory_limit,
			min_relevance: settings.min_relevance,
			top_results: settings.top_results,
		}
	}
}

impl RecallService {
	/// Snippets for the current turn, best first.
	///
	/// Degradation is internal: an unavailable embedding, a failing strategy, or a missed
	/// deadline all still produce `Ok`. Only an invalid request is an error.
	pub async fn retrieve(&self, req: RetrieveRequest) -> Result<RetrieveResponse> {
		let items = self.retrieve_ranked(req).await?;

		Ok(RetrieveResponse { documents: items.iter().map(RetrievedDocument::from).collect() })
	}

	pub async fn retrieve_ranked(&self, req: RetrieveRequest) -> Result<Vec<ScoredItem>> {
		let RetrieveRequest { messages, caller_id, overrides } = req;
		let mut settings = self.settings.current().await;

		if let Some(overrides) = overrides.as_ref() {
			settings = settings.with_overrides(overrides)?;
		}

		let query_text =
			query::build_query_text(&messages, settings.query_message_count as usize);

		if query_text.is_empty() {
			tracing::debug!(turns = messages.len(), "No end-user text to retrieve for.");

			return Ok(Vec::new());
		}

		let caller_id = caller_id
			.map(|caller_id| caller_id.trim().to_string())
			.filter(|caller_id| !caller_id.is_empty());
		let deadline = Instant::now() + self.deadline();
		let query_embedding = self.embed_query(&query_text, deadline).await;
		let request = RetrievalRequest::new(query_text, query_embedding, caller_id, &settings);

		Ok(self.search(request, deadline).await)
	}

	/// Runs the strategies for an already resolved request and ranks what they return by
	/// `deadline`.
	pub async fn search(&self, request: RetrievalRequest, deadline: Instant) -> Vec<ScoredItem> {
		let started = Instant::now();

		if request.query_text.trim().is_empty() {
			return Vec::new();
		}

		let tokens = query::tokenize(&request.query_text, self.cfg.scoring.min_token_chars);
		let embedded = request.query_embedding.is_some();
		let top_results = request.top_results as usize;
		let results =
			strategy::run_all(self.store.clone(), self.cfg.scoring, request, tokens, deadline)
				.await;
		let (assertions, chunks, memories) =
			(results.assertions.len(), results.chunks.len(), results.memories.len());
		let ranked = ranking::rank_global(results, top_results);

		tracing::debug!(
			embedded,
			assertions,
			chunks,
			memories,
			returned = ranked.len(),
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Knowledge retrieval finished."
		);

		ranked
	}

	/// The query embedding, or `None` when the provider fails, answers late, or returns a
	/// vector of the wrong size.
	async fn embed_query(&self, query_text: &str, deadline: Instant) -> Option<Vec<f32>> {
		let cfg = &self.cfg.providers.embedding;
		let started = Instant::now();
		let budget = started + Duration::from_millis(self.cfg.retrieval.embedding_timeout_ms);
		let texts = [query_text.to_string()];
		let result =
			time::timeout_at(budget.min(deadline), self.providers.embedding.embed(cfg, &texts))
				.await;
		let elapsed_ms = started.elapsed().as_millis() as u64;
		let expected_dim = self.cfg.storage.vector_dim as usize;

		match result {
			Ok(Ok(vectors)) => match vectors.into_iter().next() {
				Some(vector) if vector.len() == expected_dim => Some(vector),
				Some(vector) => {
					tracing::warn!(
						strategy = "embedding",
						expected_dim,
						actual_dim = vector.len(),
						elapsed_ms,
						"Embedding dimension mismatch. Falling back to keyword search."
					);

					None
				},
				None => {
					tracing::warn!(
						strategy = "embedding",
						elapsed_ms,
						"Embedding provider returned no vectors. Falling back to keyword search."
					);

					None
				},
			},
			Ok(Err(err)) => {
				tracing::warn!(
					strategy = "embedding",
					error = %err,
					elapsed_ms,
					"Embedding failed. Falling back to keyword search."
				);

				None
			},
			Err(_) => {
				tracing::warn!(
					strategy = "embedding",
					elapsed_ms,
					"Embedding timed out. Falling back to keyword search."
				);

				None
			},
		}
	}
}
