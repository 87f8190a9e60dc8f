// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections, each with a resolved type and a mergeable layer.

mod console;
mod http;
mod logging;
mod paths;
mod stream;
mod supervisor;

pub use console::{ConsoleConfig, ConsoleConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use paths::{PathsConfig, PathsConfigLayer};
pub use stream::{StreamConfig, StreamConfigLayer};
pub use supervisor::{SupervisorConfig, SupervisorConfigLayer};
