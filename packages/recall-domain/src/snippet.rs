use crate::{ScoredItem, SourceType};

pub const CALLER_MEMORY_MARKER: &str = "[Caller Memory]";

/// Fields an assertion carries into its rendered text.
#[derive(Debug, Clone, Copy)]
pub struct AssertionAnnotations<'a> {
	pub category: Option<&'a str>,
	pub chapter: Option<&'a str>,
	pub trust_level: Option<&'a str>,
}

/// `[CATEGORY] text (Chapter: x) [trust: y]`, skipping blank annotations.
pub fn render_assertion(text: &str, annotations: &AssertionAnnotations<'_>) -> String {
	let mut out = String::new();

	if let Some(category) = non_blank(annotations.category) {
		out.push('[');
		out.push_str(&category.to_uppercase());
		out.push_str("] ");
	}

	out.push_str(text.trim());

	if let Some(chapter) = non_blank(annotations.chapter) {
		out.push_str(" (Chapter: ");
		out.push_str(chapter);
		out.push(')');
	}
	if let Some(trust_level) = non_blank(annotations.trust_level) {
		out.push_str(" [trust: ");
		out.push_str(trust_level);
		out.push(']');
	}

	out
}

pub fn render_chunk(title: Option<&str>, content: &str) -> String {
	match non_blank(title) {
		Some(title) => format!("[{title}] {}", content.trim()),
		None => content.trim().to_string(),
	}
}

pub fn render_memory(key: &str, value: &str) -> String {
	let key = key.trim();
	let value = value.trim();

	if key.is_empty() { value.to_string() } else { format!("{key}: {value}") }
}

/// Final text for one retained item. Only memories gain a marker; the other sources were
/// annotated when they were rendered.
pub fn format_snippet(item: &ScoredItem) -> String {
	match item.source_type() {
		SourceType::Memory => format!("{CALLER_MEMORY_MARKER} {}", item.content()),
		SourceType::Assertion | SourceType::Chunk => item.content().to_string(),
	}
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}
