use clap::Subcommand;

/// Curriculum authoring commands.
#[derive(Clone, Debug, Subcommand)]
pub enum CurriculumCommands {
    /// Add a competency group to a section.
    AddGroup {
        /// Section code.
        #[arg(long)]
        section: String,
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add a competency to a competency group.
    AddCompetency {
        /// Competency group ID.
        #[arg(long)]
        group: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Create an exercise, optionally attached to competencies.
    AddExercise {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Competency IDs this exercise serves.
        #[arg(long)]
        competency: Vec<String>,
    },
    /// Attach an existing exercise to a competency.
    Attach {
        #[arg(long)]
        competency: String,
        #[arg(long)]
        exercise: String,
    },
    /// Show the curriculum tree of a section.
    Show {
        /// Section code.
        code: String,
    },
}
