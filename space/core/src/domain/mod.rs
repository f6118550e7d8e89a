// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Storage contract, value objects and pure rules of a space.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Everything that does not touch the disk or the network

pub mod directory;
pub mod file_meta;
pub mod metrics;
pub mod path_sanitizer;
pub mod server_config;
pub mod space_primitives;
