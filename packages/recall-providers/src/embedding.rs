//! OpenAI-compatible `/embeddings` client.

use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use recall_config::EmbeddingProviderConfig;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
	model: &'a str,
	input: &'a [String],
	dimensions: u32,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
	data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
	index: Option<usize>,
	embedding: Vec<f32>,
}

/// Holds one connection pool for the life of the process.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
	http: Client,
}
impl EmbeddingClient {
	pub fn new(cfg: &EmbeddingProviderConfig) -> Result<Self> {
		let http = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { http })
	}

	/// One vector per input, in input order.
	pub async fn embed(
		&self,
		cfg: &EmbeddingProviderConfig,
		texts: &[String],
	) -> Result<Vec<Vec<f32>>> {
		if texts.is_empty() {
			return Ok(Vec::new());
		}

		let body = EmbeddingRequest { model: &cfg.model, input: texts, dimensions: cfg.dimensions };
		let bytes = self
			.http
			.post(format!("{}{}", cfg.api_base, cfg.path))
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(&body)
			.send()
			.await?
			.error_for_status()?
			.bytes()
			.await?;
		let vectors = parse_embedding_response(&bytes)?;

		if vectors.len() != texts.len() {
			return Err(eyre::eyre!(
				"Embedding provider returned {} vectors for {} inputs.",
				vectors.len(),
				texts.len()
			));
		}

		Ok(vectors)
	}
}

/// Orders `data` by `index`, falling back to array position when the provider omits it.
pub fn parse_embedding_response(body: &[u8]) -> Result<Vec<Vec<f32>>> {
	let response: EmbeddingResponse = serde_json::from_slice(body)
		.map_err(|err| eyre::eyre!("Malformed embedding response: {err}."))?;
	let mut items: Vec<(usize, Vec<f32>)> = response
		.data
		.into_iter()
		.enumerate()
		.map(|(position, item)| (item.index.unwrap_or(position), item.embedding))
		.collect();

	items.sort_by_key(|(index, _)| *index);

	Ok(items.into_iter().map(|(_, embedding)| embedding).collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn orders_vectors_by_index() {
		let body = br#"{"data":[{"index":1,"embedding":[2.0,3.0]},{"index":0,"embedding":[0.5,1.5]}]}"#;
		let parsed = parse_embedding_response(body).expect("Failed to parse response.");

		assert_eq!(parsed, vec![vec![0.5, 1.5], vec![2.0, 3.0]]);
	}

	#[test]
	fn missing_index_uses_position() {
		let body = br#"{"data":[{"embedding":[1.0]},{"embedding":[2.0]}],"model":"m"}"#;
		let parsed = parse_embedding_response(body).expect("Failed to parse response.");

		assert_eq!(parsed, vec![vec![1.0], vec![2.0]]);
	}

	#[test]
	fn rejects_non_numeric_values() {
		let body = br#"{"data":[{"index":0,"embedding":["x"]}]}"#;

		assert!(parse_embedding_response(body).is_err());
	}

	#[test]
	fn rejects_error_payloads() {
		let err = parse_embedding_response(br#"{"error":"quota"}"#)
			.expect_err("Expected an error payload to fail.");

		assert!(err.to_string().contains("Malformed embedding response"), "{err}");
	}
}
