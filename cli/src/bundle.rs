// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Assets compiled into the `notespace` binary
//!
//! The bundle holds two subtrees: `client/` (the web client) and `base_fs/`
//! (read-only pages overlaid onto every space). The space templates seed
//! new spaces with an index and a config page.

use anyhow::{Context, Result};
use notespace_core::application::{BundleAssets, SpaceTemplates};
use notespace_core::infrastructure::storage::bundle::{executable_timestamp, EmbeddedBundle};
use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const BUNDLED_FILES: &[(&str, &[u8])] = &[
    (
        "client/index.html",
        include_bytes!("../bundle/client/index.html"),
    ),
    (
        "client/manifest.json",
        include_bytes!("../bundle/client/manifest.json"),
    ),
    (
        "base_fs/Library/Notespace/Welcome.md",
        include_bytes!("../bundle/base_fs/Library/Notespace/Welcome.md"),
    ),
];

const INDEX_TEMPLATE: &[u8] = include_bytes!("../space_template/index.md");
const CONFIG_TEMPLATE: &[u8] = include_bytes!("../space_template/CONFIG.md");

/// Sample configuration written by `notespace config generate`
pub const SAMPLE_CONFIG: &str = include_str!("../templates/notespace.yaml");

/// Everything the server needs from the binary itself
pub fn bundle_assets() -> BundleAssets {
    with_bundle(EmbeddedBundle::from_static(BUNDLED_FILES))
}

/// Compiled-in assets, or the bundle found in `bundle_dir` when given
///
/// The space templates always come from the binary.
pub fn load_bundle_assets(bundle_dir: Option<&Path>) -> Result<BundleAssets> {
    let Some(dir) = bundle_dir else {
        return Ok(bundle_assets());
    };

    let bundle = EmbeddedBundle::from_dir(dir)
        .with_context(|| format!("Failed to load bundle from {:?}", dir))?;
    info!(dir = %dir.display(), files = bundle.len(), "Serving bundle from disk");
    Ok(with_bundle(bundle))
}

fn with_bundle(bundle: EmbeddedBundle) -> BundleAssets {
    BundleAssets {
        bundle: Arc::new(bundle),
        timestamp: executable_timestamp(),
        templates: SpaceTemplates {
            index_page: Cow::Borrowed(INDEX_TEMPLATE),
            config_page: Cow::Borrowed(CONFIG_TEMPLATE),
        },
    }
}
