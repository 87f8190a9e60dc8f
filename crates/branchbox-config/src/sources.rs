// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources, applied in precedence order.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::layer::BranchboxConfigLayer;
use crate::sections::{
	ConsoleConfigLayer, HttpConfigLayer, LoggingConfigLayer, PathsConfigLayer, StreamConfigLayer,
	SupervisorConfigLayer,
};

/// Higher values win when layers are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<BranchboxConfigLayer, ConfigError>;
}

/// Contributes nothing; section defaults are applied in `finalize`.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<BranchboxConfigLayer, ConfigError> {
		Ok(BranchboxConfigLayer::default())
	}
}

/// `$XDG_CONFIG_HOME/branchbox/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("branchbox").join("config.toml"))
}

pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<BranchboxConfigLayer, ConfigError> {
		if !self.path.exists() {
			tracing::debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(BranchboxConfigLayer::default());
		}

		let content = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::FileRead {
			path: self.path.clone(),
			source,
		})?;

		toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
			path: self.path.clone(),
			source,
		})
	}
}

/// Reads `BRANCHBOX_*` variables. Empty values count as unset.
pub struct EnvSource {
	lookup: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
}

impl EnvSource {
	pub fn new() -> Self {
		Self {
			lookup: Box::new(|key| std::env::var(key).ok()),
		}
	}

	/// Reads from `lookup` instead of the process environment.
	pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
		Self {
			lookup: Box::new(lookup),
		}
	}

	fn var(&self, key: &str) -> Option<String> {
		(self.lookup)(key).filter(|value| !value.is_empty())
	}

	fn parsed<T: FromStr>(&self, key: &str, kind: &str) -> Result<Option<T>, ConfigError> {
		match self.var(key) {
			Some(value) => value
				.trim()
				.parse::<T>()
				.map(Some)
				.map_err(|_| ConfigError::InvalidValue {
					key: key.to_string(),
					message: format!("invalid {kind} value '{value}'"),
				}),
			None => Ok(None),
		}
	}

	fn paths(&self, key: &str) -> Option<Vec<PathBuf>> {
		self.var(key).map(|value| {
			std::env::split_paths(&value)
				.filter(|path| !path.as_os_str().is_empty())
				.collect()
		})
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<BranchboxConfigLayer, ConfigError> {
		let http = HttpConfigLayer {
			host: self.var("BRANCHBOX_HOST"),
			port: self.parsed("BRANCHBOX_PORT", "u16")?,
		};
		let paths = PathsConfigLayer {
			data_dir: self.var("BRANCHBOX_DATA_DIR").map(PathBuf::from),
		};
		let supervisor = SupervisorConfigLayer {
			base_port: self.parsed("BRANCHBOX_BASE_PORT", "u16")?,
			readiness_grace_ms: self.parsed("BRANCHBOX_READINESS_GRACE_MS", "u64")?,
			default_command: self.var("BRANCHBOX_DEFAULT_COMMAND"),
			bind_host: self.var("BRANCHBOX_BIND_HOST"),
			extra_path: self.paths("BRANCHBOX_EXTRA_PATH"),
		};
		let stream = StreamConfigLayer {
			buffer_capacity: self.parsed("BRANCHBOX_STREAM_BUFFER", "usize")?,
			poll_interval_ms: self.parsed("BRANCHBOX_POLL_INTERVAL_MS", "u64")?,
		};
		let console = ConsoleConfigLayer {
			tmux_binary: self.var("BRANCHBOX_TMUX"),
			session_prefix: self.var("BRANCHBOX_SESSION_PREFIX"),
			history_lines: self.parsed("BRANCHBOX_HISTORY_LINES", "u32")?,
		};
		let logging = LoggingConfigLayer {
			level: self.var("BRANCHBOX_LOG_LEVEL"),
		};

		Ok(BranchboxConfigLayer {
			http: Some(http),
			paths: Some(paths),
			supervisor: Some(supervisor),
			stream: Some(stream),
			console: Some(console),
			logging: Some(logging),
			projects: Default::default(),
		})
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn env(pairs: &[(&str, &str)]) -> EnvSource {
		let vars: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		EnvSource::with_lookup(move |key| vars.get(key).cloned())
	}

	#[test]
	fn test_precedence_order() {
		assert!(Precedence::Defaults < Precedence::ConfigFile);
		assert!(Precedence::ConfigFile < Precedence::Environment);
	}

	#[test]
	fn test_toml_missing_file_is_empty() {
		let dir = tempfile::tempdir().unwrap();
		let layer = TomlSource::new(dir.path().join("absent.toml")).load().unwrap();
		assert!(layer.http.is_none());
		assert!(layer.projects.is_empty());
	}

	#[test]
	fn test_toml_parse_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(&path, "[http\nport = ").unwrap();
		let err = TomlSource::new(&path).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_toml_wrong_type_is_parse_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(&path, "[http]\nport = \"eighty\"\n").unwrap();
		let err = TomlSource::new(&path).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_env_reads_values() {
		let layer = env(&[
			("BRANCHBOX_PORT", "9100"),
			("BRANCHBOX_BASE_PORT", "5000"),
			("BRANCHBOX_EXTRA_PATH", "/opt/a/bin:/opt/b/bin"),
			("BRANCHBOX_SESSION_PREFIX", "dev-"),
			("BRANCHBOX_STREAM_BUFFER", "64"),
		])
		.load()
		.unwrap();

		assert_eq!(layer.http.unwrap().port, Some(9100));
		let supervisor = layer.supervisor.unwrap();
		assert_eq!(supervisor.base_port, Some(5000));
		assert_eq!(
			supervisor.extra_path,
			Some(vec![PathBuf::from("/opt/a/bin"), PathBuf::from("/opt/b/bin")])
		);
		assert_eq!(layer.console.unwrap().session_prefix.as_deref(), Some("dev-"));
		assert_eq!(layer.stream.unwrap().buffer_capacity, Some(64));
	}

	#[test]
	fn test_env_empty_value_is_unset() {
		let layer = env(&[("BRANCHBOX_HOST", ""), ("BRANCHBOX_PORT", "")])
			.load()
			.unwrap();
		let http = layer.http.unwrap();
		assert_eq!(http.host, None);
		assert_eq!(http.port, None);
	}

	#[test]
	fn test_env_invalid_number() {
		let err = env(&[("BRANCHBOX_PORT", "not-a-port")]).load().unwrap_err();
		match err {
			ConfigError::InvalidValue { key, message } => {
				assert_eq!(key, "BRANCHBOX_PORT");
				assert!(message.contains("not-a-port"));
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn test_env_port_out_of_range() {
		let err = env(&[("BRANCHBOX_BASE_PORT", "70000")]).load().unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
	}
}
