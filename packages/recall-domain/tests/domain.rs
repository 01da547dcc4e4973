use recall_config::Scoring;
use recall_domain::{
	ScoredItem, SourceType,
	merge::{HybridMerge, RawCandidate, SearchMode},
	query::{self, ConversationTurn},
	ranking::{self, StrategyResults},
	scoring::{self, AssertionSignals},
	snippet::{self, AssertionAnnotations},
};

fn turns(pairs: &[(&str, &str)]) -> Vec<ConversationTurn> {
	pairs.iter().map(|(role, content)| ConversationTurn::new(*role, *content)).collect()
}

fn tags(values: &[&str]) -> Vec<String> {
	values.iter().map(|value| value.to_string()).collect()
}

fn candidate(key: &str, score: f32, mode: SearchMode) -> RawCandidate<String> {
	RawCandidate { key: key.to_string(), score, mode, payload: format!("rendered {key}") }
}

#[test]
fn query_uses_last_user_turns_in_order() {
	let conversation = turns(&[
		("user", "first question"),
		("assistant", "an answer"),
		("user", "second question"),
		("system", "ignored"),
		("user", "third question"),
		("assistant", "another answer"),
	]);

	assert_eq!(query::build_query_text(&conversation, 2), "second question third question");
	assert_eq!(
		query::build_query_text(&conversation, 10),
		"first question second question third question"
	);
}

#[test]
fn query_is_empty_without_user_turns() {
	let conversation = turns(&[("assistant", "Hello, how can I help?"), ("user", "   ")]);

	assert_eq!(query::build_query_text(&conversation, 3), "");
	assert_eq!(query::build_query_text(&[], 3), "");
	assert_eq!(query::build_query_text(&turns(&[("user", "hi there")]), 0), "");
}

#[test]
fn query_role_match_ignores_case() {
	let conversation = turns(&[("User", "  why is the sky blue  ")]);

	assert_eq!(query::build_query_text(&conversation, 1), "why is the sky blue");
}

#[test]
fn turns_accept_platform_field_aliases() {
	let turn: ConversationTurn =
		serde_json::from_str(r#"{"role":"user","message":"what is osmosis"}"#)
			.expect("Failed to parse turn.");

	assert_eq!(turn.content, "what is osmosis");
}

#[test]
fn tokenizer_drops_short_words_and_duplicates() {
	assert_eq!(
		query::tokenize("What is the Light reaction? The light REACTION!", 3),
		vec!["what", "the", "light", "reaction"]
	);
	assert!(query::tokenize("is it ok", 3).is_empty());
}

#[test]
fn photosynthesis_scenario_clamps_to_one() {
	let weights = Scoring::default();
	let tokens = query::tokenize("photosynthesis light reaction", weights.min_token_chars);
	let assertion_tags = tags(&["photosynthesis", "light-reaction"]);
	let signals = AssertionSignals {
		text: "Photosynthesis uses light energy to split water molecules.",
		tags: &assertion_tags,
		exam_relevance: Some(0.9),
		depth: None,
	};

	assert_eq!(scoring::count_text_matches(&tokens, signals.text), 2);
	assert_eq!(scoring::assertion_keyword_score(&tokens, &signals, &weights), 1.0);
}

#[test]
fn keyword_score_weights_lexical_prior_and_depth() {
	let weights = Scoring::default();
	let tokens = query::tokenize("cell membrane transport protein", weights.min_token_chars);
	let assertion_tags = tags(&["biology"]);
	let shallow = AssertionSignals {
		text: "The cell membrane controls transport.",
		tags: &assertion_tags,
		exam_relevance: Some(0.4),
		depth: Some(1),
	};
	let detailed = AssertionSignals { depth: Some(3), ..shallow };
	let shallow_score = scoring::assertion_keyword_score(&tokens, &shallow, &weights);
	let detailed_score = scoring::assertion_keyword_score(&tokens, &detailed, &weights);

	// 3/4 * 0.7 + 0.4 * 0.3
	assert!((shallow_score - 0.645).abs() < 1e-5, "score was {shallow_score}");
	assert!((detailed_score - 0.695).abs() < 1e-5, "score was {detailed_score}");
}

#[test]
fn repeated_query_words_count_once() {
	let weights = Scoring::default();
	let stuttered = query::tokenize("the the cell cell membrane transport", weights.min_token_chars);
	let distinct = query::tokenize("the cell membrane transport", weights.min_token_chars);
	let signals = AssertionSignals {
		text: "The cell membrane controls transport.",
		tags: &[],
		exam_relevance: Some(0.2),
		depth: Some(1),
	};

	assert_eq!(stuttered, distinct);
	assert_eq!(
		scoring::assertion_keyword_score(&stuttered, &signals, &weights),
		scoring::assertion_keyword_score(&distinct, &signals, &weights)
	);
	assert!(
		(scoring::memory_keyword_score(&stuttered, "cell biology", &weights) - 0.55).abs() < 1e-5
	);
}

#[test]
fn keyword_weights_are_configurable() {
	let weights =
		Scoring { lexical_weight: 1.0, prior_weight: 0.0, depth_boost: 0.0, ..Default::default() };
	let tokens = query::tokenize("enzyme substrate", weights.min_token_chars);
	let signals = AssertionSignals {
		text: "An enzyme binds one substrate.",
		tags: &[],
		exam_relevance: Some(1.0),
		depth: None,
	};

	assert!((scoring::assertion_keyword_score(&tokens, &signals, &weights) - 1.0).abs() < 1e-6);
}

#[test]
fn vector_and_keyword_hits_average() {
	let mut merge = HybridMerge::new();

	merge.insert(candidate("Water boils at 100C at sea level.", 0.82, SearchMode::Vector));
	merge.insert(candidate("Water boils at 100C at sea level.", 0.60, SearchMode::Keyword));

	let ranked = merge.into_ranked(5);

	assert_eq!(ranked.len(), 1);
	assert!((ranked[0].score - 0.71).abs() < 1e-6, "score was {}", ranked[0].score);
	assert!(ranked[0].found_by(SearchMode::Vector));
	assert!(ranked[0].found_by(SearchMode::Keyword));
}

#[test]
fn single_mode_hits_keep_their_score_and_merge_truncates() {
	let mut merge = HybridMerge::new();

	merge.extend([
		candidate("a", 0.9, SearchMode::Vector),
		candidate("b", 0.4, SearchMode::Vector),
		candidate("c", 0.7, SearchMode::Keyword),
		candidate("b", 0.8, SearchMode::Keyword),
	]);

	assert_eq!(merge.len(), 3);

	let ranked = merge.into_ranked(2);
	let keys: Vec<&str> = ranked.iter().map(|item| item.key.as_str()).collect();

	assert_eq!(keys, vec!["a", "c"]);
	assert!((ranked[0].score - 0.9).abs() < 1e-6);
	assert_eq!(ranked[0].payload, "rendered a");
}

#[test]
fn global_ranker_sorts_truncates_and_breaks_ties_by_source_priority() {
	let results = StrategyResults {
		assertions: vec![ScoredItem::new("assertion", 0.6, SourceType::Assertion)],
		chunks: vec![
			ScoredItem::new("chunk high", 0.9, SourceType::Chunk),
			ScoredItem::new("chunk tie", 0.6, SourceType::Chunk),
		],
		memories: vec![
			ScoredItem::new("memory tie", 0.6, SourceType::Memory),
			ScoredItem::new("memory low", 0.1, SourceType::Memory),
		],
	};

	assert_eq!(results.total(), 5);

	let ranked = ranking::rank_global(results.clone(), 4);
	let contents: Vec<&str> = ranked.iter().map(ScoredItem::content).collect();

	assert_eq!(contents, vec!["chunk high", "assertion", "chunk tie", "memory tie"]);
	assert!(ranking::rank_global(results, 0).is_empty());
}

#[test]
fn global_ranker_output_is_clamped() {
	let results = StrategyResults {
		assertions: vec![ScoredItem::new("over", 1.7, SourceType::Assertion)],
		chunks: vec![ScoredItem::new("under", -3.0, SourceType::Chunk)],
		memories: Vec::new(),
	};

	for item in ranking::rank_global(results, 10) {
		assert!((0.0..=1.0).contains(&item.relevance_score()));
	}
}

#[test]
fn formatter_marks_memories_only() {
	let memory = ScoredItem::new("favorite_subject: chemistry", 0.5, SourceType::Memory);
	let chunk = ScoredItem::new("[Cells] The nucleus stores DNA.", 0.5, SourceType::Chunk);

	assert_eq!(snippet::format_snippet(&memory), "[Caller Memory] favorite_subject: chemistry");
	assert_eq!(snippet::format_snippet(&chunk), "[Cells] The nucleus stores DNA.");
}

#[test]
fn renderers_attach_provenance() {
	let annotations = AssertionAnnotations {
		category: Some("definition"),
		chapter: Some("4"),
		trust_level: Some("verified"),
	};

	assert_eq!(
		snippet::render_assertion("Osmosis is passive.", &annotations),
		"[DEFINITION] Osmosis is passive. (Chapter: 4) [trust: verified]"
	);
	assert_eq!(
		snippet::render_assertion(
			"Osmosis is passive.",
			&AssertionAnnotations { category: None, chapter: Some(" "), trust_level: None },
		),
		"Osmosis is passive."
	);
	assert_eq!(snippet::render_chunk(Some("Cells"), " text "), "[Cells] text");
	assert_eq!(snippet::render_chunk(None, "text"), "text");
	assert_eq!(snippet::render_memory("", "likes maps"), "likes maps");
}
