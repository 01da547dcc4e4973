use recall_config::Scoring;

use crate::clamp_score;

/// The parts of an assertion that keyword scoring looks at.
#[derive(Debug, Clone, Copy)]
pub struct AssertionSignals<'a> {
	pub text: &'a str,
	pub tags: &'a [String],
	pub exam_relevance: Option<f32>,
	pub depth: Option<i32>,
}

/// Keyword-mode assertion score:
/// `(content + tag_weight * tags) / words * lexical_weight + prior * prior_weight + depth_boost`,
/// clamped to `[0, 1]`.
pub fn assertion_keyword_score(
	tokens: &[String],
	signals: &AssertionSignals<'_>,
	weights: &Scoring,
) -> f32 {
	let lexical = if tokens.is_empty() {
		0.0
	} else {
		let content_matches = count_text_matches(tokens, signals.text) as f32;
		let tag_matches = count_tag_matches(tokens, signals.tags) as f32;

		(content_matches + weights.tag_match_weight * tag_matches) / tokens.len() as f32
	};
	let prior = signals
		.exam_relevance
		.filter(|value| value.is_finite())
		.unwrap_or(weights.default_prior_relevance);

	clamp_score(
		lexical * weights.lexical_weight
			+ prior * weights.prior_weight
			+ depth_boost(signals.depth, weights),
	)
}

pub fn depth_boost(depth: Option<i32>, weights: &Scoring) -> f32 {
	match depth {
		Some(depth) if depth < weights.detailed_min_depth => 0.0,
		_ => weights.depth_boost,
	}
}

/// Keyword-mode memory score: `matches / words + memory_base_score`, clamped to `[0, 1]`.
pub fn memory_keyword_score(tokens: &[String], text: &str, weights: &Scoring) -> f32 {
	if tokens.is_empty() {
		return 0.0;
	}

	let ratio = count_text_matches(tokens, text) as f32 / tokens.len() as f32;

	clamp_score(ratio + weights.memory_base_score)
}

/// Share of query tokens that occur in `text`.
pub fn token_overlap_ratio(tokens: &[String], text: &str) -> f32 {
	if tokens.is_empty() {
		return 0.0;
	}

	count_text_matches(tokens, text) as f32 / tokens.len() as f32
}

pub fn count_text_matches(tokens: &[String], text: &str) -> usize {
	let text = text.to_lowercase();

	tokens.iter().filter(|token| text.contains(token.as_str())).count()
}

/// A token matches when any tag contains it, so `light` matches `light-reaction`.
pub fn count_tag_matches(tokens: &[String], tags: &[String]) -> usize {
	if tags.is_empty() {
		return 0;
	}

	let tags: Vec<String> = tags.iter().map(|tag| tag.to_lowercase()).collect();

	tokens.iter().filter(|token| tags.iter().any(|tag| tag.contains(token.as_str()))).count()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tokens(words: &[&str]) -> Vec<String> {
		words.iter().map(|word| word.to_string()).collect()
	}

	#[test]
	fn shallow_assertions_get_no_depth_boost() {
		let weights = Scoring::default();

		assert_eq!(depth_boost(Some(1), &weights), 0.0);
		assert_eq!(depth_boost(Some(2), &weights), weights.depth_boost);
		assert_eq!(depth_boost(None, &weights), weights.depth_boost);
	}

	#[test]
	fn missing_exam_relevance_uses_default_prior() {
		let weights = Scoring::default();
		let signals = AssertionSignals {
			text: "unrelated sentence",
			tags: &[],
			exam_relevance: None,
			depth: Some(1),
		};
		let score = assertion_keyword_score(&tokens(&["mitosis"]), &signals, &weights);

		assert!((score - 0.15).abs() < 1e-6, "score was {score}");
	}

	#[test]
	fn memory_score_adds_base() {
		let weights = Scoring::default();
		let score =
			memory_keyword_score(&tokens(&["football", "weekends"]), "Plays football", &weights);

		assert!((score - 0.8).abs() < 1e-6, "score was {score}");
	}
}
