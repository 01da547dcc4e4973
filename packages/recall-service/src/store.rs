//! Postgres-backed [`ContentStore`] and [`SettingsSource`].

use recall_domain::{cmp_f32_desc, scoring};
use recall_storage::{
	db::Db,
	models::{AssertionHit, AssertionRow, ChunkHit, MemoryRow},
	queries,
};

use crate::{BoxFuture, ChunkQuery, ContentStore, Result, RetrievalOverrides, SettingsSource};

#[derive(Clone)]
pub struct PgContentStore {
	db: Db,
}
impl PgContentStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}

	async fn chunks(&self, query: ChunkQuery<'_>) -> Result<Vec<ChunkHit>> {
		if let Some(embedding) = query.embedding {
			let hits = queries::search_chunks_by_vector(
				&self.db,
				embedding,
				query.caller_id,
				query.min_relevance,
				query.limit,
			)
			.await?;

			return Ok(hits);
		}

		let rows = queries::search_chunk_candidates(
			&self.db,
			query.tokens,
			query.caller_id,
			query.limit.saturating_mul(2),
		)
		.await?;
		let mut hits: Vec<ChunkHit> = rows
			.into_iter()
			.filter_map(|chunk| {
				let text = match chunk.title.as_deref() {
					Some(title) => format!("{title} {}", chunk.content),
					None => chunk.content.clone(),
				};
				let similarity = scoring::token_overlap_ratio(query.tokens, &text);

				(similarity >= query.min_relevance).then_some(ChunkHit { chunk, similarity })
			})
			.collect();

		hits.sort_by(|left, right| cmp_f32_desc(left.similarity, right.similarity));
		hits.truncate(query.limit as usize);

		Ok(hits)
	}
}
impl ContentStore for PgContentStore {
	fn search_chunks<'a>(&'a self, query: ChunkQuery<'a>) -> BoxFuture<'a, Result<Vec<ChunkHit>>> {
		Box::pin(self.chunks(query))
	}

	fn search_assertions_by_vector<'a>(
		&'a self,
		embedding: &'a [f32],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<AssertionHit>>> {
		Box::pin(async move {
			Ok(queries::search_assertions_by_vector(&self.db, embedding, limit).await?)
		})
	}

	fn search_assertions_by_keyword<'a>(
		&'a self,
		tokens: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<AssertionRow>>> {
		Box::pin(async move {
			Ok(queries::search_assertion_candidates(&self.db, tokens, limit).await?)
		})
	}

	fn search_memories_by_keyword<'a>(
		&'a self,
		caller_id: &'a str,
		tokens: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<MemoryRow>>> {
		Box::pin(async move {
			Ok(queries::search_memory_candidates(&self.db, caller_id, tokens, limit).await?)
		})
	}
}

#[derive(Clone)]
pub struct PgSettingsSource {
	db: Db,
}
impl PgSettingsSource {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}
impl SettingsSource for PgSettingsSource {
	fn load_retrieval_settings(&self) -> BoxFuture<'_, Result<Option<RetrievalOverrides>>> {
		Box::pin(async move {
			Ok(queries::load_settings(&self.db, queries::RETRIEVAL_SETTINGS_KEY).await?)
		})
	}
}
