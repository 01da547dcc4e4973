//! Disposable Postgres databases for integration tests.
//!
//! Tests that need one read `RECALL_PG_DSN` and are `#[ignore]`d by default. Each
//! [`TestDatabase`] lives on the server named by that DSN and is dropped again with `FORCE`.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

pub const DSN_ENV: &str = "RECALL_PG_DSN";

const FALLBACK_ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];

pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok().filter(|dsn| !dsn.trim().is_empty())
}

pub struct TestDatabase {
	name: String,
	dsn: String,
	admin: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::InvalidDsn(err.to_string()))?;
		let (admin, mut conn) = admin_connection(&base).await?;
		let name = format!("recall_test_{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str()).await?;
		conn.close().await?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin, dropped: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Runs each statement on its own, in order, against the test database.
	pub async fn seed(&self, statements: &[&str]) -> Result<()> {
		let mut conn = PgConnection::connect(&self.dsn).await?;

		for statement in statements {
			conn.execute(*statement).await?;
		}

		conn.close().await?;

		Ok(())
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.admin, &self.name).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let admin = &self.admin;
		let name = self.name.as_str();

		// Drop may run on a runtime thread; block_on needs a thread of its own.
		thread::scope(|scope| {
			scope.spawn(|| {
				let outcome = Builder::new_current_thread()
					.enable_all()
					.build()
					.map_err(|err| err.to_string())
					.and_then(|runtime| {
						runtime.block_on(drop_database(admin, name)).map_err(|err| err.to_string())
					});

				if let Err(err) = outcome {
					eprintln!("Failed to drop test database {name}: {err}.");
				}
			});
		});
	}
}

/// Connects to the DSN's own database first, then to the usual maintenance databases.
async fn admin_connection(base: &PgConnectOptions) -> Result<(PgConnectOptions, PgConnection)> {
	let mut candidates = vec![base.clone()];
	let mut failures = Vec::new();

	candidates.extend(FALLBACK_ADMIN_DATABASES.map(|database| base.clone().database(database)));

	for options in candidates {
		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => failures.push(err.to_string()),
		}
	}

	Err(Error::NoAdminDatabase(failures.join("; ")))
}

async fn drop_database(admin: &PgConnectOptions, name: &str) -> Result<()> {
	let mut conn = PgConnection::connect_with(admin).await?;

	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}" WITH (FORCE)"#).as_str()).await?;
	conn.close().await?;

	Ok(())
}
