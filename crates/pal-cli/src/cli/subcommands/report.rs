use clap::Subcommand;

/// Report commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ReportCommands {
    /// Group sheet: session, supervisor, limits, members and exercises.
    Group { group: String },
    /// Diver progression sheet.
    Progression { diver: String },
}
