use clap::Subcommand;

/// Training section commands.
#[derive(Clone, Debug, Subcommand)]
pub enum SectionCommands {
    /// Create a section.
    Add {
        /// Machine code, e.g. prepa_niveau1.
        code: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List sections.
    List,
    /// Put a person in a section.
    Join {
        #[arg(long)]
        person: String,
        /// Section code.
        #[arg(long)]
        section: String,
    },
    /// Students eligible for a section.
    Students {
        /// Section code.
        code: String,
    },
}
