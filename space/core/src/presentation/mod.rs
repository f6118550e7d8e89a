// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`notespace-core`)
//!
//! HTTP surface that translates requests into `SpacePrimitives` calls. This
//! is the only place storage errors become status codes.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Router, ping/config endpoints, web client bundle |
//! | [`fs_api`] | HTTP (Axum) | REST file API under `/.fs` |
//! | [`webdav`] | WebDAV over HTTP | PROPFIND, MKCOL, COPY, MOVE, LOCK and friends |

pub mod api;
pub mod fs_api;
pub mod webdav;
