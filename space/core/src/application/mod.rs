// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod space_bootstrap;

pub use space_bootstrap::{
    build_space_stack, disk_backend, ensure_index_and_config, BundleAssets, SpaceStack,
    SpaceTemplates,
};
