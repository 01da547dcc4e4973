pub mod merge;
pub mod query;
pub mod ranking;
pub mod scoring;
pub mod snippet;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
	Chunk,
	Assertion,
	Memory,
}
impl SourceType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Chunk => "chunk",
			Self::Assertion => "assertion",
			Self::Memory => "memory",
		}
	}
}

/// One retrieved snippet. The relevance score is clamped to `[0, 1]` on construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
	content: String,
	relevance_score: f32,
	source_type: SourceType,
}
impl ScoredItem {
	pub fn new(content: impl Into<String>, relevance_score: f32, source_type: SourceType) -> Self {
		Self { content: content.into(), relevance_score: clamp_score(relevance_score), source_type }
	}

	pub fn content(&self) -> &str {
		&self.content
	}

	pub fn relevance_score(&self) -> f32 {
		self.relevance_score
	}

	pub fn source_type(&self) -> SourceType {
		self.source_type
	}
}

/// NaN counts as no evidence at all.
pub fn clamp_score(score: f32) -> f32 {
	if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
}

/// Descending order for scores with NaN sorted last.
pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
