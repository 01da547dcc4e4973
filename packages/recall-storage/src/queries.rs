use serde::de::DeserializeOwned;

use crate::{
	Error, Result,
	db::Db,
	models::{AssertionHit, AssertionRow, ChunkHit, ChunkRow, MemoryRow},
};

pub const RETRIEVAL_SETTINGS_KEY: &str = "knowledge_retrieval";

pub async fn search_assertions_by_vector(
	db: &Db,
	embedding: &[f32],
	limit: u32,
) -> Result<Vec<AssertionHit>> {
	let vec_text = vector_to_pg(embedding);
	let rows = sqlx::query_as::<_, AssertionHit>(
		"\
SELECT
	id,
	assertion,
	category,
	chapter,
	tags,
	exam_relevance,
	depth,
	trust_level,
	(1 - (embedding <=> $1::text::vector))::real AS similarity
FROM knowledge_assertions
WHERE embedding IS NOT NULL
ORDER BY embedding <=> $1::text::vector, id
LIMIT $2",
	)
	.bind(vec_text.as_str())
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Assertions whose text or tags contain at least one token, highest exam relevance first.
pub async fn search_assertion_candidates(
	db: &Db,
	tokens: &[String],
	limit: u32,
) -> Result<Vec<AssertionRow>> {
	if tokens.is_empty() || limit == 0 {
		return Ok(Vec::new());
	}

	let patterns = like_patterns(tokens);
	let rows = sqlx::query_as::<_, AssertionRow>(
		"\
SELECT id, assertion, category, chapter, tags, exam_relevance, depth, trust_level
FROM knowledge_assertions
WHERE assertion ILIKE ANY($1)
	OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE ANY($1))
ORDER BY exam_relevance DESC NULLS LAST, id
LIMIT $2",
	)
	.bind(&patterns)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Shared chunks plus the caller's own, above `min_relevance` cosine similarity.
pub async fn search_chunks_by_vector(
	db: &Db,
	embedding: &[f32],
	caller_id: Option<&str>,
	min_relevance: f32,
	limit: u32,
) -> Result<Vec<ChunkHit>> {
	let vec_text = vector_to_pg(embedding);
	let rows = sqlx::query_as::<_, ChunkHit>(
		"\
SELECT
	id,
	title,
	content,
	caller_id,
	(1 - (embedding <=> $1::text::vector))::real AS similarity
FROM knowledge_chunks
WHERE embedding IS NOT NULL
	AND (caller_id IS NULL OR caller_id = $2)
	AND 1 - (embedding <=> $1::text::vector) >= $3::float8
ORDER BY embedding <=> $1::text::vector, id
LIMIT $4",
	)
	.bind(vec_text.as_str())
	.bind(caller_id)
	.bind(f64::from(min_relevance))
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Shared chunks plus the caller's own whose title or content contains a token, the ones
/// matching the most tokens first. Ties put the caller's rows ahead of shared ones.
pub async fn search_chunk_candidates(
	db: &Db,
	tokens: &[String],
	caller_id: Option<&str>,
	limit: u32,
) -> Result<Vec<ChunkRow>> {
	if tokens.is_empty() || limit == 0 {
		return Ok(Vec::new());
	}

	let patterns = like_patterns(tokens);
	let rows = sqlx::query_as::<_, ChunkRow>(
		"\
SELECT id, title, content, caller_id
FROM knowledge_chunks
WHERE (caller_id IS NULL OR caller_id = $2)
	AND (content ILIKE ANY($1) OR coalesce(title, '') ILIKE ANY($1))
ORDER BY
	(
		SELECT count(*)
		FROM unnest($1::text[]) AS pattern
		WHERE content ILIKE pattern OR coalesce(title, '') ILIKE pattern
	) DESC,
	caller_id IS NULL,
	id
LIMIT $3",
	)
	.bind(&patterns)
	.bind(caller_id)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Active memories of one caller that mention a token, most confident first.
pub async fn search_memory_candidates(
	db: &Db,
	caller_id: &str,
	tokens: &[String],
	limit: u32,
) -> Result<Vec<MemoryRow>> {
	if caller_id.trim().is_empty() {
		return Err(Error::InvalidArgument("caller_id must be non-empty.".to_string()));
	}
	if tokens.is_empty() || limit == 0 {
		return Ok(Vec::new());
	}

	let patterns = like_patterns(tokens);
	let rows = sqlx::query_as::<_, MemoryRow>(
		"\
SELECT id, caller_id, category, key, value, confidence
FROM caller_memories
WHERE caller_id = $1
	AND superseded_at IS NULL
	AND (key ILIKE ANY($2) OR value ILIKE ANY($2))
ORDER BY confidence DESC, id
LIMIT $3",
	)
	.bind(caller_id)
	.bind(&patterns)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn load_settings<T>(db: &Db, key: &str) -> Result<Option<T>>
where
	T: DeserializeOwned,
{
	let value: Option<serde_json::Value> =
		sqlx::query_scalar("SELECT value FROM system_settings WHERE key = $1")
			.bind(key)
			.fetch_optional(&db.pool)
			.await?;
	let Some(value) = value else { return Ok(None) };

	serde_json::from_value(value)
		.map(Some)
		.map_err(|source| Error::MalformedSettings { key: key.to_string(), source })
}

pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

/// `ILIKE` patterns for tokens. Tokens are alphanumeric, so no wildcard escaping is needed.
pub fn like_patterns(tokens: &[String]) -> Vec<String> {
	tokens.iter().map(|token| format!("%{token}%")).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn renders_pgvector_literal() {
		assert_eq!(vector_to_pg(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
		assert_eq!(vector_to_pg(&[]), "[]");
	}

	#[test]
	fn wraps_tokens_in_wildcards() {
		assert_eq!(like_patterns(&["cell".to_string()]), vec!["%cell%".to_string()]);
	}
}
