// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Supervision of branch-scoped development servers.
//!
//! [`Supervisor`] owns the lifecycle of one dev server per `(project, branch)`:
//! it allocates a port, spawns the command in the branch's worktree as its
//! own process group, classifies readiness from output, and records every
//! transition in the server registry. Output is published to the
//! [`StreamHub`](branchbox_stream::StreamHub) under the branch's server key.
//!
//! The registry is the only state trusted across restarts, so
//! [`Supervisor::list`] re-probes every active pid before answering.
//!
//! [`TaskRunner`] runs one-shot commands with the same environment and
//! streams them under the task key.

mod launch;
mod monitor;
pub mod process;
pub mod readiness;
mod supervisor;
mod task;

pub use launch::{augment_path, common_toolchain_dirs, exit_code, LaunchEnv};
pub use process::{ProcessControl, SystemProcessControl, Termination};
pub use readiness::{ReadinessClassifier, READY_MARKERS};
pub use supervisor::{StartRequest, Supervisor, SupervisorOptions};
pub use task::TaskRunner;
