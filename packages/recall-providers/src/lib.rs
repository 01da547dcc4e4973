pub mod embedding;

use color_eyre::{Result, eyre::WrapErr};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};

/// Bearer auth plus the configured extra headers. Extra header values must be JSON strings.
pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::with_capacity(default_headers.len() + 1);
	let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
		.wrap_err("API key is not a valid header value.")?;

	bearer.set_sensitive(true);
	headers.insert(AUTHORIZATION, bearer);

	for (key, value) in default_headers {
		let name = HeaderName::from_bytes(key.as_bytes())
			.wrap_err_with(|| format!("Default header {key:?} has an invalid name."))?;
		let value = value
			.as_str()
			.map(HeaderValue::from_str)
			.transpose()
			.wrap_err_with(|| format!("Default header {key:?} has an invalid value."))?
			.ok_or_else(|| color_eyre::eyre::eyre!("Default header {key:?} must be a string."))?;

		headers.insert(name, value);
	}

	Ok(headers)
}
