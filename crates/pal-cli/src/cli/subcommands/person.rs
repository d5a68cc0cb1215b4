use clap::Subcommand;

/// Club member commands.
#[derive(Clone, Debug, Subcommand)]
pub enum PersonCommands {
    /// Register a person.
    Add {
        #[arg(long)]
        first: String,
        #[arg(long)]
        last: String,
        /// student or supervisor.
        #[arg(long, default_value = "student")]
        role: String,
        /// Certification level (debutant, niveau1, ..., moniteur_federal2).
        #[arg(long)]
        level: String,
        #[arg(long)]
        email: Option<String>,
        /// Section codes to join right away.
        #[arg(long)]
        section: Vec<String>,
    },
    /// Show one person.
    Get { id: String },
    /// List people.
    List {
        /// Optional role filter.
        #[arg(long)]
        role: Option<String>,
    },
}
