use std::path::PathBuf;

use anyhow::Context;
use pal_config::{PROJECT_DIR, PalConfig};

use crate::cli::GlobalFlags;

/// Load `.env` from the project (or the current directory), then the
/// layered configuration.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<PalConfig> {
    load_project_dotenv(flags)?;

    let config = PalConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn load_project_dotenv(flags: &GlobalFlags) -> anyhow::Result<()> {
    let root = match &flags.project {
        Some(project) => project_dir_parent(PathBuf::from(project)),
        None => std::env::current_dir().context("failed to determine current directory")?,
    };

    let env_path = root.join(".env");
    if env_path.exists() {
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
    }
    Ok(())
}

/// Accept both the project root and its `.palanquee` directory.
pub fn project_dir_parent(path: PathBuf) -> PathBuf {
    let is_state_dir = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == PROJECT_DIR);
    if is_state_dir {
        path.parent().map_or(path.clone(), std::path::Path::to_path_buf)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::project_dir_parent;

    #[test]
    fn state_directory_resolves_to_its_parent() {
        assert_eq!(
            project_dir_parent(PathBuf::from("/club/.palanquee")),
            PathBuf::from("/club")
        );
        assert_eq!(project_dir_parent(PathBuf::from("/club")), PathBuf::from("/club"));
    }
}
