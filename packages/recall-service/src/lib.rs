//! Per-turn knowledge retrieval for live tutoring calls.
//!
//! [`RecallService::retrieve`] turns the latest conversation turns into a ranked list of
//! snippets. Every collaborator sits behind a trait so the pipeline can run against Postgres
//! and the embedding API in production and against in-memory fakes in tests.

pub mod retrieve;
pub mod settings;
pub mod store;

mod error;
mod strategy;

pub use error::{Error, Result};
pub use retrieve::{RetrievalRequest, RetrieveRequest, RetrieveResponse, RetrievedDocument};
pub use settings::{RetrievalOverrides, RetrievalSettings, SettingsCache};
pub use store::{PgContentStore, PgSettingsSource};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use recall_config::{Config, EmbeddingProviderConfig};
use recall_providers::embedding::EmbeddingClient;
use recall_storage::{
	db::Db,
	models::{AssertionHit, AssertionRow, ChunkHit, MemoryRow},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

/// Read-only access to the knowledge base. Each call may fail on its own.
pub trait ContentStore
where
	Self: Send + Sync,
{
	/// Shared chunks plus the caller's own. Vector mode when `embedding` is present, keyword
	/// overlap otherwise. Hits below `min_relevance` are not returned.
	fn search_chunks<'a>(&'a self, query: ChunkQuery<'a>) -> BoxFuture<'a, Result<Vec<ChunkHit>>>;

	fn search_assertions_by_vector<'a>(
		&'a self,
		embedding: &'a [f32],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<AssertionHit>>>;

	/// Unscored candidates; the service applies the keyword formula.
	fn search_assertions_by_keyword<'a>(
		&'a self,
		tokens: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<AssertionRow>>>;

	/// Active memories of `caller_id`, most confident first.
	fn search_memories_by_keyword<'a>(
		&'a self,
		caller_id: &'a str,
		tokens: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<MemoryRow>>>;
}

/// Runtime source for the retrieval tunables. `None` means nothing is stored.
pub trait SettingsSource
where
	Self: Send + Sync,
{
	fn load_retrieval_settings(&self) -> BoxFuture<'_, Result<Option<RetrievalOverrides>>>;
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkQuery<'a> {
	pub tokens: &'a [String],
	pub embedding: Option<&'a [f32]>,
	pub caller_id: Option<&'a str>,
	pub min_relevance: f32,
	pub limit: u32,
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}

	pub fn from_config(cfg: &EmbeddingProviderConfig) -> Result<Self> {
		let client = EmbeddingClient::new(cfg)?;

		Ok(Self::new(Arc::new(client)))
	}
}

pub struct RecallService {
	pub cfg: Config,
	pub store: Arc<dyn ContentStore>,
	pub providers: Providers,
	pub settings: SettingsCache,
}
impl RecallService {
	pub fn new(cfg: Config, db: Db) -> Result<Self> {
		let providers = Providers::from_config(&cfg.providers.embedding)?;
		let store: Arc<dyn ContentStore> = Arc::new(PgContentStore::new(db.clone()));
		let source: Arc<dyn SettingsSource> = Arc::new(PgSettingsSource::new(db));

		Ok(Self::with_parts(cfg, store, providers, Some(source)))
	}

	/// Without a settings source the file defaults are used for every request.
	pub fn with_parts(
		cfg: Config,
		store: Arc<dyn ContentStore>,
		providers: Providers,
		settings_source: Option<Arc<dyn SettingsSource>>,
	) -> Self {
		let defaults = RetrievalSettings::from_config(&cfg.retrieval);
		let settings = match settings_source {
			Some(source) => SettingsCache::new(
				defaults,
				Duration::from_millis(cfg.retrieval.settings_ttl_ms),
				Duration::from_millis(cfg.retrieval.deadline_ms),
				source,
			),
			None => SettingsCache::fixed(defaults),
		};

		Self { cfg, store, providers, settings }
	}

	pub fn deadline(&self) -> Duration {
		Duration::from_millis(self.cfg.retrieval.deadline_ms)
	}
}

impl EmbeddingProvider for EmbeddingClient {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(EmbeddingClient::embed(self, cfg, texts))
	}
}
