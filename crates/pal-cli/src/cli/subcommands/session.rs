use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;

/// Dive session commands.
#[derive(Clone, Debug, Subcommand)]
pub enum SessionCommands {
    /// Schedule a session.
    Add {
        /// Date as YYYY-MM-DD.
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        location: String,
        /// Start time as HH:MM.
        #[arg(long)]
        start: Option<NaiveTime>,
        /// End time as HH:MM.
        #[arg(long)]
        end: Option<NaiveTime>,
        /// Lead supervisor ID.
        #[arg(long)]
        lead: Option<String>,
    },
    /// List sessions, most recent first.
    List {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Enroll people in a session.
    Enroll {
        session: String,
        #[arg(required = true)]
        people: Vec<String>,
    },
    /// Enrolled people of a session.
    Roster { session: String },
}
