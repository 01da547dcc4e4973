#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Malformed settings row {key:?}: {source}")]
	MalformedSettings { key: String, source: serde_json::Error },
}
