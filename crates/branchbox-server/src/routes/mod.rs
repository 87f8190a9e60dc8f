// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod apps;
pub mod consoles;
pub mod health;
pub mod servers;
pub mod tasks;
