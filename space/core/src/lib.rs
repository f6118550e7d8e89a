// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Notespace Core
//!
//! Storage abstraction and protocol surface of a note-taking server: the
//! `SpacePrimitives` contract, its disk, bundle and policy backends, and the
//! REST and WebDAV adapters that expose a space over HTTP.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Library consumed by the `notespace` binary

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use domain::file_meta::FileMeta;
pub use domain::space_primitives::{SpaceError, SpacePrimitives};
