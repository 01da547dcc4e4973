//! Shared command-line look for the recall binaries.

use std::env::consts::{ARCH, OS};

use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `0.1.0 (linux-x86_64)`.
pub fn long_version() -> String {
	format!("{VERSION} ({OS}-{ARCH})")
}

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.literal(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
		.error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn long_version_starts_with_package_version() {
		assert!(long_version().starts_with(VERSION));
		assert!(long_version().contains(OS));
	}
}
