pub fn render_schema(vector_dim: u32) -> String {
	let init = include_str!("../../../sql/init.sql");
	let expanded = expand_includes(init);

	expanded.replace("<VECTOR_DIM>", &vector_dim.to_string())
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_knowledge_assertions.sql" => out
					.push_str(include_str!("../../../sql/tables/001_knowledge_assertions.sql")),
				"tables/002_knowledge_chunks.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_knowledge_chunks.sql")),
				"tables/003_caller_memories.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_caller_memories.sql")),
				"tables/004_system_settings.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_system_settings.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn expands_every_include_and_dimension() {
		let sql = render_schema(8);

		assert!(!sql.contains("\\ir "));
		assert!(!sql.contains("<VECTOR_DIM>"));
		assert!(sql.contains("vector(8)"));

		for table in ["knowledge_assertions", "knowledge_chunks", "caller_memories", "system_settings"]
		{
			assert!(sql.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")), "missing {table}");
		}
	}
}
