use std::path::PathBuf;

use anyhow::Context;
use pal_config::{PROJECT_DIR, PalConfig};
use serde::Serialize;

use crate::bootstrap::project_dir_parent;
use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct InitResponse {
    project_root: String,
    database: String,
}

/// Handle `pal init`: create `.palanquee/` and migrate the database.
pub async fn handle(config: PalConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let root = match &flags.project {
        Some(project) => project_dir_parent(PathBuf::from(project)),
        None => std::env::current_dir().context("failed to read current directory")?,
    };

    let state_dir = root.join(PROJECT_DIR);
    std::fs::create_dir_all(&state_dir)
        .with_context(|| format!("failed to create {}", state_dir.display()))?;

    let ctx = AppContext::init(root, config).await?;
    tracing::info!(root = %ctx.project_root.display(), "project initialized");

    output(
        &InitResponse {
            project_root: ctx.project_root.display().to_string(),
            database: ctx.config.database.path.clone(),
        },
        flags.format,
    )
}
