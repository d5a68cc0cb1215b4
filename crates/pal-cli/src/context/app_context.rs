use std::path::{Path, PathBuf};

use anyhow::Context;
use pal_config::{PROJECT_DIR, PalConfig};
use pal_db::service::PalService;

use crate::notifier::OutboxNotifier;

/// File collecting link notices for the club's mailer.
const OUTBOX_FILE: &str = "outbox.jsonl";

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: PalService,
    pub config: PalConfig,
    pub project_root: PathBuf,
}

impl AppContext {
    /// Open the project database named by `config`.
    ///
    /// A relative database path is taken from the project root.
    pub async fn init(project_root: PathBuf, mut config: PalConfig) -> anyhow::Result<Self> {
        if !config.database.is_in_memory() {
            config.database.path = database_path(&project_root, &config.database.path)
                .to_string_lossy()
                .into_owned();
        }

        let service = PalService::from_config(&config)
            .await
            .with_context(|| format!("failed to open database at {}", config.database.path))?;

        Ok(Self {
            service,
            config,
            project_root,
        })
    }

    /// Notifier appending link notices to `.palanquee/outbox.jsonl`.
    #[must_use]
    pub fn outbox(&self) -> OutboxNotifier {
        OutboxNotifier::new(self.project_root.join(PROJECT_DIR).join(OUTBOX_FILE))
    }
}

/// Resolve the configured database path against the project root.
#[must_use]
pub fn database_path(project_root: &Path, configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::database_path;

    #[test]
    fn relative_paths_hang_off_the_project_root() {
        assert_eq!(
            database_path(Path::new("/club"), ".palanquee/palanquee.db"),
            Path::new("/club/.palanquee/palanquee.db")
        );
    }

    #[test]
    fn absolute_paths_are_kept() {
        assert_eq!(
            database_path(Path::new("/club"), "/var/lib/pal.db"),
            Path::new("/var/lib/pal.db")
        );
    }
}
