//! The three retrieval strategies and their fan-out.
//!
//! Each strategy runs on its own task. The join waits for every task until the request
//! deadline; a task that fails, panics, or is still running at the deadline contributes
//! nothing and is logged. The assertion sub-searches stop a tenth of the budget earlier and
//! merge whichever side finished.

use std::sync::Arc;

use tokio::{
	task::JoinHandle,
	time::{self, Instant},
};

use recall_config::Scoring;
use recall_domain::{
	ScoredItem, SourceType,
	merge::{HybridMerge, RawCandidate, SearchMode},
	ranking::StrategyResults,
	scoring::{self, AssertionSignals},
	snippet::{self, AssertionAnnotations},
};
use recall_storage::models::{AssertionHit, AssertionRow, ChunkRow};

use crate::{ChunkQuery, ContentStore, Error, Result, RetrievalRequest};

struct StrategyInput {
	request: RetrievalRequest,
	tokens: Vec<String>,
	scoring: Scoring,
	/// Sub-searches inside a strategy stop here, leaving time to merge before `deadline`.
	sub_search_deadline: Instant,
}

pub(crate) async fn run_all(
	store: Arc<dyn ContentStore>,
	scoring: Scoring,
	request: RetrievalRequest,
	tokens: Vec<String>,
	deadline: Instant,
) -> StrategyResults {
	let started = Instant::now();
	let merge_reserve = deadline.saturating_duration_since(started) / 10;
	let input = Arc::new(StrategyInput {
		request,
		tokens,
		scoring,
		sub_search_deadline: deadline - merge_reserve,
	});
	let assertions = tokio::spawn(assertion_strategy(store.clone(), input.clone()));
	let chunks = tokio::spawn(chunk_strategy(store.clone(), input.clone()));
	let memories = tokio::spawn(memory_strategy(store, input));
	let (assertions, chunks, memories) = tokio::join!(
		collect("assertions", assertions, deadline, started),
		collect("chunks", chunks, deadline, started),
		collect("memories", memories, deadline, started),
	);

	StrategyResults { assertions, chunks, memories }
}

async fn collect(
	strategy: &'static str,
	mut handle: JoinHandle<Result<Vec<ScoredItem>>>,
	deadline: Instant,
	started: Instant,
) -> Vec<ScoredItem> {
	let result = match time::timeout_at(deadline, &mut handle).await {
		Ok(Ok(result)) => result,
		Ok(Err(err)) => {
			tracing::warn!(strategy, error = %err, "Retrieval strategy task aborted.");

			return Vec::new();
		},
		Err(_) => {
			handle.abort();

			Err(Error::Deadline { elapsed_ms: started.elapsed().as_millis() as u64 })
		},
	};

	match result {
		Ok(items) => items,
		Err(err) => {
			tracing::warn!(
				strategy,
				error = %err,
				elapsed_ms = started.elapsed().as_millis() as u64,
				"Retrieval strategy contributed no results."
			);

			Vec::new()
		},
	}
}

/// Vector and keyword sub-searches merged by assertion text. Without an embedding only the
/// keyword side runs.
async fn assertion_strategy(
	store: Arc<dyn ContentStore>,
	input: Arc<StrategyInput>,
) -> Result<Vec<ScoredItem>> {
	let StrategyInput { request, tokens, scoring, sub_search_deadline } = input.as_ref();
	let limit = request.assertion_limit;

	if limit == 0 {
		return Ok(Vec::new());
	}

	let fetch_limit = limit.saturating_mul(2);
	let vector_search = async {
		match request.query_embedding.as_deref() {
			Some(embedding) => within(
				*sub_search_deadline,
				store.search_assertions_by_vector(embedding, fetch_limit),
			)
			.await
			.map(Some),
			None => Ok(None),
		}
	};
	let keyword_search = async {
		if tokens.is_empty() {
			return Ok(Vec::new());
		}

		within(*sub_search_deadline, store.search_assertions_by_keyword(tokens, fetch_limit)).await
	};
	let (vector_hits, keyword_rows) = tokio::join!(vector_search, keyword_search);
	let (vector_hits, keyword_rows) = match (vector_hits, keyword_rows) {
		(Ok(vector_hits), Ok(keyword_rows)) => (vector_hits.unwrap_or_default(), keyword_rows),
		(Ok(vector_hits), Err(err)) if vector_hits.is_some() => {
			tracing::warn!(
				strategy = "assertions",
				error = %err,
				"Keyword assertion search failed or overran. Using vector hits only."
			);

			(vector_hits.unwrap_or_default(), Vec::new())
		},
		(Ok(_), Err(err)) => return Err(err),
		(Err(err), Ok(keyword_rows)) => {
			tracing::warn!(
				strategy = "assertions",
				error = %err,
				"Vector assertion search failed or overran. Using keyword hits only."
			);

			(Vec::new(), keyword_rows)
		},
		(Err(err), Err(_)) => return Err(err),
	};
	let mut merge = HybridMerge::new();

	merge.extend(vector_candidates(vector_hits, request.min_relevance));
	merge.extend(keyword_rows.into_iter().map(|row| {
		let score = scoring::assertion_keyword_score(tokens, &assertion_signals(&row), scoring);

		RawCandidate { key: row.assertion.clone(), score, mode: SearchMode::Keyword, payload: row }
	}));

	Ok(merge
		.into_ranked(limit as usize)
		.into_iter()
		.map(|candidate| {
			let row = candidate.payload;
			let content = snippet::render_assertion(&row.assertion, &assertion_annotations(&row));

			ScoredItem::new(content, candidate.score, SourceType::Assertion)
		})
		.collect())
}

/// A sub-search still running at `deadline` counts as failed.
async fn within<T>(deadline: Instant, search: impl Future<Output = Result<T>>) -> Result<T> {
	let started = Instant::now();

	match time::timeout_at(deadline, search).await {
		Ok(result) => result,
		Err(_) => Err(Error::Deadline { elapsed_ms: started.elapsed().as_millis() as u64 }),
	}
}

fn vector_candidates(
	hits: Vec<AssertionHit>,
	min_relevance: f32,
) -> impl Iterator<Item = RawCandidate<AssertionRow>> {
	hits.into_iter().filter(move |hit| hit.similarity >= min_relevance).map(|hit| RawCandidate {
		key: hit.assertion.assertion.clone(),
		score: hit.similarity,
		mode: SearchMode::Vector,
		payload: hit.assertion,
	})
}

fn assertion_signals(row: &AssertionRow) -> AssertionSignals<'_> {
	AssertionSignals {
		text: &row.assertion,
		tags: &row.tags,
		exam_relevance: row.exam_relevance,
		depth: row.depth,
	}
}

fn assertion_annotations(row: &AssertionRow) -> AssertionAnnotations<'_> {
	AssertionAnnotations {
		category: row.category.as_deref(),
		chapter: row.chapter.as_deref(),
		trust_level: row.trust_level.as_deref(),
	}
}

/// One search mode per request, deduplicated by chunk id.
async fn chunk_strategy(
	store: Arc<dyn ContentStore>,
	input: Arc<StrategyInput>,
) -> Result<Vec<ScoredItem>> {
	let StrategyInput { request, tokens, .. } = input.as_ref();
	let limit = request.chunk_limit;
	let embedding = request.query_embedding.as_deref();

	if limit == 0 || (embedding.is_none() && tokens.is_empty()) {
		return Ok(Vec::new());
	}

	let query = ChunkQuery {
		tokens,
		embedding,
		caller_id: request.caller_id.as_deref(),
		min_relevance: request.min_relevance,
		limit,
	};
	let hits = store.search_chunks(query).await?;
	let mode = if embedding.is_some() { SearchMode::Vector } else { SearchMode::Keyword };
	let mut merge: HybridMerge<ChunkRow> = HybridMerge::new();

	for hit in hits {
		if hit.similarity < request.min_relevance || hit.similarity.is_nan() {
			continue;
		}

		merge.insert(RawCandidate {
			key: hit.chunk.id.clone(),
			score: hit.similarity,
			mode,
			payload: hit.chunk,
		});
	}

	Ok(merge
		.into_ranked(limit as usize)
		.into_iter()
		.map(|candidate| {
			let chunk = candidate.payload;
			let content = snippet::render_chunk(chunk.title.as_deref(), &chunk.content);

			ScoredItem::new(content, candidate.score, SourceType::Chunk)
		})
		.collect())
}

/// Keyword-only search over the caller's memories. No caller, no search.
async fn memory_strategy(
	store: Arc<dyn ContentStore>,
	input: Arc<StrategyInput>,
) -> Result<Vec<ScoredItem>> {
	let StrategyInput { request, tokens, scoring, .. } = input.as_ref();
	let Some(caller_id) = request.caller_id.as_deref() else { return Ok(Vec::new()) };
	let limit = request.memory_limit;

	if limit == 0 || tokens.is_empty() {
		return Ok(Vec::new());
	}

	let rows = store.search_memories_by_keyword(caller_id, tokens, limit).await?;

	Ok(rows
		.into_iter()
		.take(limit as usize)
		.map(|row| {
			let content = snippet::render_memory(&row.key, &row.value);
			let score = scoring::memory_keyword_score(tokens, &content, scoring);

			ScoredItem::new(content, score, SourceType::Memory)
		})
		.collect())
}
