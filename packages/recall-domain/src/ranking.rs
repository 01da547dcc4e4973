use crate::{ScoredItem, cmp_f32_desc};

/// Per-strategy results, each already deduplicated and capped by its own limit.
#[derive(Debug, Clone, Default)]
pub struct StrategyResults {
	pub assertions: Vec<ScoredItem>,
	pub chunks: Vec<ScoredItem>,
	pub memories: Vec<ScoredItem>,
}
impl StrategyResults {
	pub fn total(&self) -> usize {
		self.assertions.len() + self.chunks.len() + self.memories.len()
	}
}

/// Concatenates assertions, chunks, then memories, sorts by score (stable, so ties keep that
/// priority), and keeps the first `top_results`.
///
/// There is no cross-strategy dedup; the strategies read disjoint content.
pub fn rank_global(results: StrategyResults, top_results: usize) -> Vec<ScoredItem> {
	let StrategyResults { assertions, chunks, memories } = results;
	let mut merged = Vec::with_capacity(assertions.len() + chunks.len() + memories.len());

	merged.extend(assertions);
	merged.extend(chunks);
	merged.extend(memories);
	merged.sort_by(|left, right| cmp_f32_desc(left.relevance_score(), right.relevance_score()));
	merged.truncate(top_results);

	merged
}
