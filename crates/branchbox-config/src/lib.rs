// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for branchbox.
//!
//! Sources are merged in precedence order (built-in defaults, then the TOML
//! file, then `BRANCHBOX_*` environment variables) and resolved into a
//! [`Config`] with every field populated.

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use error::ConfigError;
pub use layer::BranchboxConfigLayer;
pub use sections::{
	ConsoleConfig, HttpConfig, LoggingConfig, PathsConfig, StreamConfig, SupervisorConfig,
};
pub use sources::{
	default_config_path, ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource,
};

const MAX_BUFFER_CAPACITY: usize = 100_000;
const MIN_POLL_INTERVAL_MS: u128 = 50;

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
	pub http: HttpConfig,
	pub paths: PathsConfig,
	pub supervisor: SupervisorConfig,
	pub stream: StreamConfig,
	pub console: ConsoleConfig,
	pub logging: LoggingConfig,
	pub projects: BTreeMap<String, PathBuf>,
}

impl Config {
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Loads configuration from the default file location and the environment.
pub fn load_config() -> Result<Config, ConfigError> {
	let mut sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(DefaultsSource)];
	if let Some(path) = default_config_path() {
		sources.push(Box::new(TomlSource::new(path)));
	}
	sources.push(Box::new(EnvSource::new()));
	load_from_sources(sources)
}

/// Like [`load_config`] but reads the TOML file at `path`.
pub fn load_config_with_file(path: &Path) -> Result<Config, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(path)),
		Box::new(EnvSource::new()),
	])
}

pub fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<Config, ConfigError> {
	sources.sort_by_key(|source| source.precedence());

	let mut merged = BranchboxConfigLayer::default();
	for source in &sources {
		tracing::debug!(source = source.name(), "loading config source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

fn finalize(layer: BranchboxConfigLayer) -> Result<Config, ConfigError> {
	let config = Config {
		http: layer.http.unwrap_or_default().finalize(),
		paths: layer.paths.unwrap_or_default().finalize(),
		supervisor: layer.supervisor.unwrap_or_default().finalize(),
		stream: layer.stream.unwrap_or_default().finalize(),
		console: layer.console.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
		projects: layer.projects,
	};

	validate(&config)?;

	tracing::info!(
		addr = %config.socket_addr(),
		data_dir = %config.paths.data_dir.display(),
		projects = config.projects.len(),
		"configuration loaded"
	);

	Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
	let capacity = config.stream.buffer_capacity;
	if capacity == 0 || capacity > MAX_BUFFER_CAPACITY {
		return Err(ConfigError::Validation(format!(
			"stream.buffer_capacity must be between 1 and {MAX_BUFFER_CAPACITY}, got {capacity}"
		)));
	}
	if config.stream.poll_interval.as_millis() < MIN_POLL_INTERVAL_MS {
		return Err(ConfigError::Validation(format!(
			"stream.poll_interval_ms must be at least {MIN_POLL_INTERVAL_MS}"
		)));
	}
	if config.console.session_prefix.is_empty() {
		return Err(ConfigError::Validation(
			"console.session_prefix must not be empty".to_string(),
		));
	}
	if config.supervisor.default_command.trim().is_empty() {
		return Err(ConfigError::Validation(
			"supervisor.default_command must not be empty".to_string(),
		));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use proptest::prelude::*;

	use super::*;

	struct FixedSource(Precedence, BranchboxConfigLayer);

	impl ConfigSource for FixedSource {
		fn name(&self) -> &'static str {
			"fixed"
		}

		fn precedence(&self) -> Precedence {
			self.0
		}

		fn load(&self) -> Result<BranchboxConfigLayer, ConfigError> {
			Ok(self.1.clone())
		}
	}

	fn with_stream(buffer: Option<usize>, poll_ms: Option<u64>) -> BranchboxConfigLayer {
		BranchboxConfigLayer {
			stream: Some(sections::StreamConfigLayer {
				buffer_capacity: buffer,
				poll_interval_ms: poll_ms,
			}),
			..Default::default()
		}
	}

	#[test]
	fn test_defaults_resolve() {
		let config = load_from_sources(vec![Box::new(DefaultsSource)]).unwrap();
		assert_eq!(config.socket_addr(), "127.0.0.1:4780");
		assert_eq!(config.stream.buffer_capacity, 1000);
		assert_eq!(config.stream.poll_interval, Duration::from_millis(500));
		assert_eq!(config.console.session_prefix, "bbx-");
		assert_eq!(config.console.history_lines, 2000);
		assert_eq!(config.logging.level, "info");
		assert!(config.projects.is_empty());
	}

	#[test]
	fn test_file_then_env_precedence() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(
			&path,
			"[http]\nhost = \"0.0.0.0\"\nport = 8000\n\n[projects]\nweb = \"/src/web\"\n",
		)
		.unwrap();

		// Sources are supplied out of order on purpose.
		let config = load_from_sources(vec![
			Box::new(EnvSource::with_lookup(|key| {
				(key == "BRANCHBOX_PORT").then(|| "9000".to_string())
			})),
			Box::new(TomlSource::new(&path)),
			Box::new(DefaultsSource),
		])
		.unwrap();

		assert_eq!(config.http.host, "0.0.0.0");
		assert_eq!(config.http.port, 9000);
		assert_eq!(config.projects["web"], PathBuf::from("/src/web"));
	}

	#[test]
	fn test_zero_buffer_rejected() {
		let err = load_from_sources(vec![Box::new(FixedSource(
			Precedence::ConfigFile,
			with_stream(Some(0), None),
		))])
		.unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}

	#[test]
	fn test_fast_poll_rejected() {
		let err = load_from_sources(vec![Box::new(FixedSource(
			Precedence::ConfigFile,
			with_stream(None, Some(10)),
		))])
		.unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}

	#[test]
	fn test_file_error_propagates() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(&path, "not toml at all [").unwrap();
		let err = load_from_sources(vec![Box::new(TomlSource::new(&path))]).unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	proptest! {
		#[test]
		fn buffer_capacity_bounds(capacity in 0usize..200_000) {
			let result = load_from_sources(vec![Box::new(FixedSource(
				Precedence::Environment,
				with_stream(Some(capacity), None),
			))]);
			let valid = (1..=MAX_BUFFER_CAPACITY).contains(&capacity);
			prop_assert_eq!(result.is_ok(), valid);
		}
	}
}
