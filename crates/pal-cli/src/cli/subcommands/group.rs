use clap::Subcommand;

/// Dive group commands.
#[derive(Clone, Debug, Subcommand)]
pub enum GroupCommands {
    /// List the dive groups of a session.
    List { session: String },
    /// Members of a group with their aptitude.
    Members { group: String },
    /// Set the planned competencies and exercise notes of a group.
    Plan {
        group: String,
        #[arg(long)]
        competency: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Add a diver to a group.
    AddMember {
        group: String,
        diver: String,
        #[arg(long)]
        aptitude: Option<String>,
    },
    /// Change the aptitude of a member.
    SetAptitude {
        group: String,
        diver: String,
        /// Omit to clear.
        #[arg(long)]
        aptitude: Option<String>,
    },
    /// Remove a diver from a group.
    RemoveMember { group: String, diver: String },
    /// Save a rating sheet as the group's supervisor.
    Rate {
        group: String,
        /// JSON list of {diver_id, competency_id, rating, comment} (`-` for stdin).
        #[arg(long)]
        file: String,
    },
    /// Stored ratings of a group.
    Ratings { group: String },
}
