use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read config file at {path:?}.")]
	ReadConfig { path: PathBuf, source: std::io::Error },
	#[error("Failed to parse config file at {path:?}.")]
	ParseConfig { path: PathBuf, source: toml::de::Error },
	#[error("{key} {reason}")]
	Validation { key: &'static str, reason: &'static str },
}
impl Error {
	/// Dotted path of the offending key for validation failures.
	pub fn key(&self) -> Option<&'static str> {
		match self {
			Self::Validation { key, .. } => Some(key),
			_ => None,
		}
	}
}
