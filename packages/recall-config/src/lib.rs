mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Postgres, Providers, Retrieval, Scoring, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);
	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(invalid("service.log_level", "must be non-empty."));
	}
	if cfg.service.http_bind.trim().is_empty() {
		return Err(invalid("service.http_bind", "must be non-empty."));
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(invalid("storage.postgres.pool_max_conns", "must be greater than zero."));
	}

	let embedding = &cfg.providers.embedding;

	if embedding.dimensions == 0 {
		return Err(invalid("providers.embedding.dimensions", "must be greater than zero."));
	}
	if embedding.dimensions != cfg.storage.vector_dim {
		return Err(invalid("providers.embedding.dimensions", "must match storage.vector_dim."));
	}
	if embedding.api_key.trim().is_empty() {
		return Err(invalid("providers.embedding.api_key", "must be non-empty."));
	}
	if embedding.timeout_ms == 0 {
		return Err(invalid("providers.embedding.timeout_ms", "must be greater than zero."));
	}

	validate_retrieval(&cfg.retrieval)?;
	validate_scoring(&cfg.scoring)?;

	Ok(())
}

fn validate_retrieval(retrieval: &Retrieval) -> Result<()> {
	if retrieval.query_message_count == 0 {
		return Err(invalid("retrieval.query_message_count", "must be greater than zero."));
	}
	if !retrieval.min_relevance.is_finite() {
		return Err(invalid("retrieval.min_relevance", "must be a finite number."));
	}
	if !(0.0..=1.0).contains(&retrieval.min_relevance) {
		return Err(invalid("retrieval.min_relevance", "must be in the range 0.0-1.0."));
	}
	if retrieval.deadline_ms == 0 {
		return Err(invalid("retrieval.deadline_ms", "must be greater than zero."));
	}
	if retrieval.embedding_timeout_ms == 0 {
		return Err(invalid("retrieval.embedding_timeout_ms", "must be greater than zero."));
	}
	if retrieval.embedding_timeout_ms > retrieval.deadline_ms {
		return Err(invalid(
			"retrieval.embedding_timeout_ms",
			"must not exceed retrieval.deadline_ms.",
		));
	}

	Ok(())
}

fn validate_scoring(scoring: &Scoring) -> Result<()> {
	for (key, value) in [
		("scoring.lexical_weight", scoring.lexical_weight),
		("scoring.prior_weight", scoring.prior_weight),
		("scoring.tag_match_weight", scoring.tag_match_weight),
		("scoring.depth_boost", scoring.depth_boost),
		("scoring.memory_base_score", scoring.memory_base_score),
	] {
		if !value.is_finite() {
			return Err(invalid(key, "must be a finite number."));
		}
		if value < 0.0 {
			return Err(invalid(key, "must be zero or greater."));
		}
	}

	if !(0.0..=1.0).contains(&scoring.default_prior_relevance) {
		return Err(invalid("scoring.default_prior_relevance", "must be in the range 0.0-1.0."));
	}
	if scoring.min_token_chars == 0 {
		return Err(invalid("scoring.min_token_chars", "must be greater than zero."));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let api_base = cfg.providers.embedding.api_base.trim().trim_end_matches('/');

	cfg.providers.embedding.api_base = api_base.to_string();
	cfg.service.log_level = cfg.service.log_level.trim().to_string();
}

fn invalid(key: &'static str, reason: &'static str) -> Error {
	Error::Validation { key, reason }
}
