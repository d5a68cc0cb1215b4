use clap::Subcommand;

/// Evaluation link commands.
#[derive(Clone, Debug, Subcommand)]
pub enum LinkCommands {
    /// Issue a new link for a group, closing the previous one.
    Generate { group: String },
    /// Open a link as its holder would.
    Show { token: String },
    /// Submit ratings through a link.
    Submit {
        token: String,
        /// JSON list of {diver_id, competency_id, rating, comment} (`-` for stdin).
        #[arg(long)]
        file: String,
    },
    /// Current and used links of a group.
    List { group: String },
    /// Queue an e-mail notice of the group's link for its supervisor.
    Notify { group: String },
}
