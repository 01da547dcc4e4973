use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub scoring: Scoring,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	/// Dimension of the `vector` columns. Must match the embedding provider.
	pub vector_dim: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Defaults for the per-turn retrieval tunables.
///
/// The first six fields can be replaced at runtime by the stored settings row and by
/// per-request overrides; the timing fields are fixed for the life of the process.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	/// Number of recent end-user turns folded into the query text.
	pub query_message_count: u32,
	pub chunk_limit: u32,
	pub assertion_limit: u32,
	pub memory_limit: u32,
	pub min_relevance: f32,
	pub top_results: u32,
	/// Soft deadline for the whole pipeline, measured from the start of the embedding attempt.
	pub deadline_ms: u64,
	/// Upper bound for the embedding attempt. Never exceeds `deadline_ms`.
	pub embedding_timeout_ms: u64,
	pub settings_ttl_ms: u64,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			query_message_count: 3,
			chunk_limit: 5,
			assertion_limit: 5,
			memory_limit: 3,
			min_relevance: 0.3,
			top_results: 8,
			deadline_ms: 80,
			embedding_timeout_ms: 40,
			settings_ttl_ms: 30_000,
		}
	}
}

/// Weights for keyword-mode scoring.
///
/// The defaults were tuned by hand against real tutoring sessions; they are exposed so they can
/// be recalibrated without a release.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Scoring {
	/// Share of the assertion score taken by lexical overlap.
	pub lexical_weight: f32,
	/// Share of the assertion score taken by the stored exam relevance.
	pub prior_weight: f32,
	/// Multiplier for a query word that matches an assertion tag.
	pub tag_match_weight: f32,
	pub default_prior_relevance: f32,
	/// Flat bonus for detailed assertions.
	pub depth_boost: f32,
	/// Assertions at this depth or deeper (or without one) count as detailed.
	pub detailed_min_depth: i32,
	pub memory_base_score: f32,
	/// Query words shorter than this are dropped by the tokenizer.
	pub min_token_chars: usize,
}
impl Default for Scoring {
	fn default() -> Self {
		Self {
			lexical_weight: 0.7,
			prior_weight: 0.3,
			tag_match_weight: 1.5,
			default_prior_relevance: 0.5,
			depth_boost: 0.05,
			detailed_min_depth: 2,
			memory_base_score: 0.3,
			min_token_chars: 3,
		}
	}
}
