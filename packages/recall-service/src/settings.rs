//! Retrieval tunables resolved per request.
//!
//! File defaults are merged with the stored settings row (cached for a short TTL) and then with
//! any per-request overrides.

use std::{
	sync::{Arc, Mutex, PoisonError},
	time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio::{
	sync::Mutex as AsyncMutex,
	time::{self, Instant},
};

use recall_config::Retrieval;

use crate::{Error, Result, SettingsSource};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalSettings {
	pub query_message_count: u32,
	pub chunk_limit: u32,
	pub assertion_limit: u32,
	pub memory_limit: u32,
	pub min_relevance: f32,
	pub top_results: u32,
}
impl RetrievalSettings {
	pub fn from_config(cfg: &Retrieval) -> Self {
		Self {
			query_message_count: cfg.query_message_count,
			chunk_limit: cfg.chunk_limit,
			assertion_limit: cfg.assertion_limit,
			memory_limit: cfg.memory_limit,
			min_relevance: cfg.min_relevance,
			top_results: cfg.top_results,
		}
	}

	/// Applies a stored settings row. Out-of-range values are clamped or ignored.
	pub fn with_stored(mut self, stored: &RetrievalOverrides) -> Self {
		if let Some(count) = stored.query_message_count.filter(|count| *count > 0) {
			self.query_message_count = count;
		}
		if let Some(min_relevance) = stored.min_relevance.filter(|value| value.is_finite()) {
			self.min_relevance = min_relevance.clamp(0.0, 1.0);
		}

		self.apply_limits(stored);

		self
	}

	/// Applies per-request overrides. Unlike the stored row, invalid values are an error.
	pub fn with_overrides(mut self, overrides: &RetrievalOverrides) -> Result<Self> {
		if let Some(count) = overrides.query_message_count {
			if count == 0 {
				return Err(Error::InvalidRequest {
					message: "query_message_count must be greater than zero.".to_string(),
				});
			}

			self.query_message_count = count;
		}
		if let Some(min_relevance) = overrides.min_relevance {
			if !min_relevance.is_finite() || !(0.0..=1.0).contains(&min_relevance) {
				return Err(Error::InvalidRequest {
					message: "min_relevance must be in the range 0.0-1.0.".to_string(),
				});
			}

			self.min_relevance = min_relevance;
		}

		self.apply_limits(overrides);

		Ok(self)
	}

	fn apply_limits(&mut self, overrides: &RetrievalOverrides) {
		if let Some(limit) = overrides.chunk_limit {
			self.chunk_limit = limit;
		}
		if let Some(limit) = overrides.assertion_limit {
			self.assertion_limit = limit;
		}
		if let Some(limit) = overrides.memory_limit {
			self.memory_limit = limit;
		}
		if let Some(limit) = overrides.top_results {
			self.top_results = limit;
		}
	}
}

/// Partial tunables, as stored in `system_settings` or sent with a request.
///
/// Both snake_case and the admin UI's camelCase keys are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalOverrides {
	#[serde(default, alias = "queryMessageCount", skip_serializing_if = "Option::is_none")]
	pub query_message_count: Option<u32>,
	#[serde(default, alias = "chunkLimit", skip_serializing_if = "Option::is_none")]
	pub chunk_limit: Option<u32>,
	#[serde(default, alias = "assertionLimit", skip_serializing_if = "Option::is_none")]
	pub assertion_limit: Option<u32>,
	#[serde(default, alias = "memoryLimit", skip_serializing_if = "Option::is_none")]
	pub memory_limit: Option<u32>,
	#[serde(default, alias = "minRelevance", skip_serializing_if = "Option::is_none")]
	pub min_relevance: Option<f32>,
	#[serde(default, alias = "topResults", skip_serializing_if = "Option::is_none")]
	pub top_results: Option<u32>,
}

/// TTL cache over a [`SettingsSource`].
///
/// A failed or slow load caches the file defaults for one TTL. At most one reload runs at a
/// time; requests arriving meanwhile wait for it and reuse its value.
pub struct SettingsCache {
	defaults: RetrievalSettings,
	ttl: Duration,
	load_timeout: Duration,
	source: Option<Arc<dyn SettingsSource>>,
	cached: Mutex<Option<CachedSettings>>,
	reload: AsyncMutex<()>,
}
impl SettingsCache {
	pub fn new(
		defaults: RetrievalSettings,
		ttl: Duration,
		load_timeout: Duration,
		source: Arc<dyn SettingsSource>,
	) -> Self {
		Self {
			defaults,
			ttl,
			load_timeout,
			source: Some(source),
			cached: Mutex::new(None),
			reload: AsyncMutex::new(()),
		}
	}

	pub fn fixed(defaults: RetrievalSettings) -> Self {
		Self {
			defaults,
			ttl: Duration::ZERO,
			load_timeout: Duration::ZERO,
			source: None,
			cached: Mutex::new(None),
			reload: AsyncMutex::new(()),
		}
	}

	pub fn defaults(&self) -> RetrievalSettings {
		self.defaults
	}

	pub async fn current(&self) -> RetrievalSettings {
		let Some(source) = self.source.as_ref() else { return self.defaults };

		if let Some(settings) = self.lookup(Instant::now()) {
			return settings;
		}

		let _reloading = self.reload.lock().await;

		if let Some(settings) = self.lookup(Instant::now()) {
			return settings;
		}

		let settings = match time::timeout(self.load_timeout, source.load_retrieval_settings()).await
		{
			Ok(Ok(Some(stored))) => self.defaults.with_stored(&stored),
			Ok(Ok(None)) => self.defaults,
			Ok(Err(err)) => {
				tracing::warn!(
					error = %err,
					"Failed to load retrieval settings. Using configured defaults."
				);

				self.defaults
			},
			Err(_) => {
				let err = Error::Deadline { elapsed_ms: self.load_timeout.as_millis() as u64 };

				tracing::warn!(
					error = %err,
					"Loading retrieval settings timed out. Using configured defaults."
				);

				self.defaults
			},
		};

		self.store(settings, Instant::now() + self.ttl);

		settings
	}

	/// Drops the cached value so the next request reloads it.
	pub fn invalidate(&self) {
		*self.cached.lock().unwrap_or_else(PoisonError::into_inner) = None;
	}

	fn lookup(&self, now: Instant) -> Option<RetrievalSettings> {
		let cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);

		cached.as_ref().filter(|entry| now < entry.expires_at).map(|entry| entry.settings)
	}

	fn store(&self, settings: RetrievalSettings, expires_at: Instant) {
		*self.cached.lock().unwrap_or_else(PoisonError::into_inner) =
			Some(CachedSettings { settings, expires_at });
	}
}

struct CachedSettings {
	settings: RetrievalSettings,
	expires_at: Instant,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn defaults() -> RetrievalSettings {
		RetrievalSettings::from_config(&Retrieval::default())
	}

	#[test]
	fn stored_values_are_clamped_not_rejected() {
		let stored = RetrievalOverrides {
			query_message_count: Some(0),
			min_relevance: Some(1.8),
			top_results: Some(2),
			..Default::default()
		};
		let settings = defaults().with_stored(&stored);

		assert_eq!(settings.query_message_count, 3);
		assert_eq!(settings.min_relevance, 1.0);
		assert_eq!(settings.top_results, 2);
	}

	#[test]
	fn request_overrides_reject_out_of_range_values() {
		let overrides = RetrievalOverrides { min_relevance: Some(-0.1), ..Default::default() };

		assert!(matches!(
			defaults().with_overrides(&overrides),
			Err(Error::InvalidRequest { .. })
		));

		let overrides = RetrievalOverrides { query_message_count: Some(0), ..Default::default() };

		assert!(defaults().with_overrides(&overrides).is_err());
	}

	#[test]
	fn overrides_accept_camel_case_keys() {
		let parsed: RetrievalOverrides =
			serde_json::from_str(r#"{"topResults": 2, "min_relevance": 0.5}"#)
				.expect("Failed to parse overrides.");

		assert_eq!(parsed.top_results, Some(2));
		assert_eq!(parsed.min_relevance, Some(0.5));
		assert_eq!(parsed.chunk_limit, None);
	}
}
