#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AssertionRow {
	pub id: String,
	/// Literal statement text. Also the identity key across search modes.
	pub assertion: String,
	pub category: Option<String>,
	pub chapter: Option<String>,
	pub tags: Vec<String>,
	pub exam_relevance: Option<f32>,
	pub depth: Option<i32>,
	pub trust_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AssertionHit {
	#[sqlx(flatten)]
	pub assertion: AssertionRow,
	/// `1 - cosine_distance` against the query embedding.
	pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ChunkRow {
	pub id: String,
	pub title: Option<String>,
	pub content: String,
	/// `None` for shared knowledge.
	pub caller_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ChunkHit {
	#[sqlx(flatten)]
	pub chunk: ChunkRow,
	pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MemoryRow {
	pub id: String,
	pub caller_id: String,
	pub category: Option<String>,
	pub key: String,
	pub value: String,
	pub confidence: f32,
}
