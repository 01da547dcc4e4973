use std::collections::HashSet;

use serde::{Deserialize, Serialize};

const END_USER_ROLE: &str = "user";

/// One turn of the live conversation as delivered by the voice platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
	pub role: String,
	#[serde(alias = "message", alias = "text")]
	pub content: String,
}
impl ConversationTurn {
	pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
		Self { role: role.into(), content: content.into() }
	}

	pub fn is_end_user(&self) -> bool {
		self.role.trim().eq_ignore_ascii_case(END_USER_ROLE)
	}
}

/// Folds the last `max_turns` end-user turns into one query string, oldest first.
///
/// Agent, system, and tool turns are skipped, as are user turns with blank text. Returns an
/// empty string when nothing qualifies.
pub fn build_query_text(turns: &[ConversationTurn], max_turns: usize) -> String {
	if max_turns == 0 {
		return String::new();
	}

	let mut recent: Vec<&str> = turns
		.iter()
		.rev()
		.filter(|turn| turn.is_end_user())
		.map(|turn| turn.content.trim())
		.filter(|text| !text.is_empty())
		.take(max_turns)
		.collect();

	recent.reverse();

	recent.join(" ")
}

/// Lowercased, de-duplicated query words of at least `min_chars` characters, in query order.
pub fn tokenize(text: &str, min_chars: usize) -> Vec<String> {
	let mut normalized = String::with_capacity(text.len());

	for ch in text.chars() {
		if ch.is_alphanumeric() {
			normalized.extend(ch.to_lowercase());
		} else {
			normalized.push(' ');
		}
	}

	let mut out = Vec::new();
	let mut seen = HashSet::new();

	for token in normalized.split_whitespace() {
		if token.chars().count() < min_chars {
			continue;
		}
		if seen.insert(token) {
			out.push(token.to_string());
		}
	}

	out
}
