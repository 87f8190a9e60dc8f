// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JSON file store with atomic replace-on-save.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{RegistryError, Result};
use crate::records::{ConsoleMap, ServerMap};

/// Store for server records (`servers.json`).
pub type ServerRegistry = RegistryStore<ServerMap>;

/// Store for console metadata (`consoles.json`).
pub type ConsoleRegistry = RegistryStore<ConsoleMap>;

/// A whole-file JSON store.
///
/// `save` writes a sibling `.tmp` file and renames it over the target, so a
/// reader never observes a half-written registry.
#[derive(Debug, Clone)]
pub struct RegistryStore<T> {
	path: PathBuf,
	_marker: PhantomData<fn() -> T>,
}

impl<T> RegistryStore<T>
where
	T: Default + Serialize + DeserializeOwned,
{
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			_marker: PhantomData,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Load the registry, degrading to an empty map on any failure.
	pub async fn load(&self) -> T {
		match self.try_load().await {
			Ok(value) => value,
			Err(e) => {
				warn!(path = %self.path.display(), error = %e, "registry unreadable, using empty state");
				T::default()
			}
		}
	}

	/// Load the registry, surfacing read and parse failures.
	///
	/// A missing file is not an error.
	pub async fn try_load(&self) -> Result<T> {
		let contents = match tokio::fs::read_to_string(&self.path).await {
			Ok(contents) => contents,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				debug!(path = %self.path.display(), "registry file not found");
				return Ok(T::default());
			}
			Err(e) => {
				return Err(RegistryError::Io {
					path: self.path.clone(),
					source: e,
				})
			}
		};

		if contents.trim().is_empty() {
			return Ok(T::default());
		}

		serde_json::from_str(&contents).map_err(|e| RegistryError::Parse {
			path: self.path.clone(),
			source: e,
		})
	}

	pub async fn save(&self, value: &T) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			tokio::fs::create_dir_all(parent)
				.await
				.map_err(|e| RegistryError::Io {
					path: parent.to_path_buf(),
					source: e,
				})?;
		}

		let json = serde_json::to_string_pretty(value)?;
		let tmp_path = self.path.with_extension("json.tmp");

		tokio::fs::write(&tmp_path, &json)
			.await
			.map_err(|e| RegistryError::Io {
				path: tmp_path.clone(),
				source: e,
			})?;
		tokio::fs::rename(&tmp_path, &self.path)
			.await
			.map_err(|e| RegistryError::Io {
				path: self.path.clone(),
				source: e,
			})?;

		debug!(path = %self.path.display(), "saved registry");
		Ok(())
	}
}

impl RegistryStore<ServerMap> {
	pub fn in_dir(data_dir: &Path) -> Self {
		Self::new(data_dir.join("servers.json"))
	}
}

impl RegistryStore<ConsoleMap> {
	pub fn in_dir(data_dir: &Path) -> Self {
		Self::new(data_dir.join("consoles.json"))
	}
}
