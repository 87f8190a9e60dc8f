// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Collaborators that turn a `(project, branch)` into a working directory and
//! suggest what to run there.
//!
//! - [`WorktreeResolver`] with the git-backed [`GitWorktreeResolver`] and the
//!   map-backed [`FixedWorktreeResolver`]
//! - [`AppDetector`] with the manifest-reading [`ManifestDetector`]

pub mod detect;
pub mod error;
pub mod fixed;
pub mod git;
pub mod resolver;

pub use detect::{AppCandidate, AppDetector, ManifestDetector};
pub use error::{Result, WorktreeError};
pub use fixed::FixedWorktreeResolver;
pub use git::{parse_worktree_list, GitWorktreeResolver, WorktreeEntry};
pub use resolver::WorktreeResolver;
