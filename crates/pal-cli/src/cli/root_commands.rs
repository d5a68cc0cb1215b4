use clap::{Args, Subcommand};

use crate::cli::subcommands::{
    CurriculumCommands, GroupCommands, LinkCommands, PersonCommands, ReportCommands,
    SectionCommands, SessionCommands,
};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Create the .palanquee directory and its database.
    Init,
    /// Club members.
    Person {
        #[command(subcommand)]
        action: PersonCommands,
    },
    /// Training sections.
    Section {
        #[command(subcommand)]
        action: SectionCommands,
    },
    /// Competency groups, competencies and exercises.
    Curriculum {
        #[command(subcommand)]
        action: CurriculumCommands,
    },
    /// Dive sessions and enrollments.
    Session {
        #[command(subcommand)]
        action: SessionCommands,
    },
    /// Create dive groups from a JSON assignment request.
    Assign(AssignArgs),
    /// Replace a session's dive groups from a CSV roster matrix.
    Import(ImportArgs),
    /// Dive groups: plans, members and interactive ratings.
    Group {
        #[command(subcommand)]
        action: GroupCommands,
    },
    /// Evaluation links.
    Link {
        #[command(subcommand)]
        action: LinkCommands,
    },
    /// Record one exercise evaluation for a diver.
    Evaluate(EvaluateArgs),
    /// Progression tree of a diver.
    Progress(ProgressArgs),
    /// Printable reports.
    Report {
        #[command(subcommand)]
        action: ReportCommands,
    },
    /// Query the audit trail.
    Audit(AuditArgs),
}

/// Arguments for `pal assign`.
#[derive(Clone, Debug, Args)]
pub struct AssignArgs {
    /// Session ID.
    pub session: String,
    /// JSON file holding the assignment request (`-` for stdin).
    #[arg(long)]
    pub file: String,
}

/// Arguments for `pal import`.
#[derive(Clone, Debug, Args)]
pub struct ImportArgs {
    /// Session ID.
    pub session: String,
    /// CSV export of the roster spreadsheet (`-` for stdin).
    #[arg(long)]
    pub file: String,
    /// Field delimiter of the CSV file.
    #[arg(long, default_value = ",")]
    pub delimiter: char,
}

/// Arguments for `pal evaluate`.
#[derive(Clone, Debug, Args)]
pub struct EvaluateArgs {
    #[arg(long)]
    pub diver: String,
    #[arg(long)]
    pub exercise: String,
    /// Rating from 1 to 3.
    #[arg(long)]
    pub rating: u8,
    /// Evaluating supervisor.
    #[arg(long)]
    pub supervisor: Option<String>,
    #[arg(long, default_value = "")]
    pub comment: String,
}

/// Arguments for `pal progress`.
#[derive(Clone, Debug, Args)]
pub struct ProgressArgs {
    /// Diver (person) ID.
    pub diver: String,
}

/// Arguments for `pal audit`.
#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    #[arg(long)]
    pub entity_type: Option<String>,
    #[arg(long)]
    pub entity_id: Option<String>,
    #[arg(long)]
    pub action: Option<String>,
    #[arg(long)]
    pub session: Option<String>,
}
