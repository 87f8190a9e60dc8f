// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Durable registry of server and console records.
//!
//! The registry is best-effort state: a missing or corrupt file loads as an
//! empty map, and nothing in it is trusted without a liveness check by the
//! caller. Stores do no locking; callers serialize their read-modify-write
//! cycles.

pub mod error;
pub mod ports;
pub mod records;
pub mod store;

pub use error::{RegistryError, Result};
pub use ports::{active_ports, next_free_port};
pub use records::{
	find_console, find_server, find_server_mut, remove_console, upsert_console, upsert_server,
	ConsoleMap, ServerMap,
};
pub use store::{ConsoleRegistry, RegistryStore, ServerRegistry};
