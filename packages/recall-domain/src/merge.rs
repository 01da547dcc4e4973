//! Merge of candidates produced by more than one search mode.
//!
//! Candidates are keyed by an identity string that is stable across modes. A key seen by a
//! single mode keeps that mode's score; a key seen by several modes scores the mean of the
//! per-mode scores. Repeats within one mode keep the best score for that mode.

use std::collections::HashMap;

use crate::cmp_f32_desc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchMode {
	Vector,
	Keyword,
}

#[derive(Debug, Clone)]
pub struct RawCandidate<T> {
	pub key: String,
	pub score: f32,
	pub mode: SearchMode,
	pub payload: T,
}

#[derive(Debug, Clone)]
pub struct MergedCandidate<T> {
	pub key: String,
	pub score: f32,
	pub mode_scores: Vec<(SearchMode, f32)>,
	pub payload: T,
}
impl<T> MergedCandidate<T> {
	pub fn found_by(&self, mode: SearchMode) -> bool {
		self.mode_scores.iter().any(|(seen, _)| *seen == mode)
	}

	fn record(&mut self, mode: SearchMode, score: f32) {
		match self.mode_scores.iter_mut().find(|(seen, _)| *seen == mode) {
			Some((_, existing)) =>
				if cmp_f32_desc(score, *existing).is_lt() {
					*existing = score;
				},
			None => self.mode_scores.push((mode, score)),
		}

		let total: f32 = self.mode_scores.iter().map(|(_, score)| *score).sum();

		self.score = total / self.mode_scores.len() as f32;
	}
}

/// Insertion-ordered merge table.
#[derive(Debug)]
pub struct HybridMerge<T> {
	entries: Vec<MergedCandidate<T>>,
	index: HashMap<String, usize>,
}
impl<T> HybridMerge<T> {
	pub fn new() -> Self {
		Self { entries: Vec::new(), index: HashMap::new() }
	}

	pub fn insert(&mut self, candidate: RawCandidate<T>) {
		let RawCandidate { key, score, mode, payload } = candidate;

		match self.index.get(&key) {
			Some(&position) => self.entries[position].record(mode, score),
			None => {
				self.index.insert(key.clone(), self.entries.len());
				self.entries.push(MergedCandidate {
					key,
					score,
					mode_scores: vec![(mode, score)],
					payload,
				});
			},
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Merged candidates sorted by score, best first, ties in first-seen order, capped at
	/// `limit`.
	pub fn into_ranked(self, limit: usize) -> Vec<MergedCandidate<T>> {
		let mut entries = self.entries;

		entries.sort_by(|left, right| cmp_f32_desc(left.score, right.score));
		entries.truncate(limit);

		entries
	}
}
impl<T> Default for HybridMerge<T> {
	fn default() -> Self {
		Self::new()
	}
}
impl<T> Extend<RawCandidate<T>> for HybridMerge<T> {
	fn extend<I: IntoIterator<Item = RawCandidate<T>>>(&mut self, iter: I) {
		for candidate in iter {
			self.insert(candidate);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn raw(key: &str, score: f32, mode: SearchMode) -> RawCandidate<()> {
		RawCandidate { key: key.to_string(), score, mode, payload: () }
	}

	#[test]
	fn repeated_key_within_one_mode_keeps_best_score() {
		let mut merge = HybridMerge::new();

		merge.insert(raw("a", 0.4, SearchMode::Keyword));
		merge.insert(raw("a", 0.6, SearchMode::Keyword));
		merge.insert(raw("a", 0.5, SearchMode::Keyword));

		let ranked = merge.into_ranked(10);

		assert_eq!(ranked.len(), 1);
		assert!((ranked[0].score - 0.6).abs() < 1e-6);
		assert!(!ranked[0].found_by(SearchMode::Vector));
	}

	#[test]
	fn ties_keep_first_seen_order() {
		let mut merge = HybridMerge::new();

		merge.insert(raw("first", 0.5, SearchMode::Vector));
		merge.insert(raw("second", 0.5, SearchMode::Keyword));

		let keys: Vec<String> = merge.into_ranked(10).into_iter().map(|c| c.key).collect();

		assert_eq!(keys, vec!["first", "second"]);
	}
}
