use pal_db::repos::sessions::NewSession;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::SessionCommands;
use crate::commands::shared::limit::Listing;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct EnrollResponse<'a> {
    session_id: &'a str,
    enrolled: &'a [String],
}

/// Handle `pal session`.
pub async fn handle(
    action: &SessionCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        SessionCommands::Add {
            date,
            location,
            start,
            end,
            lead,
        } => {
            let new = NewSession {
                start_time: *start,
                end_time: *end,
                lead_supervisor_id: lead.clone(),
                ..NewSession::new(*date, location.as_str())
            };
            output(&ctx.service.create_session(&new).await?, flags.format)
        }
        SessionCommands::List { limit } => {
            let limit = Listing::Sessions.resolve(*limit, flags, &ctx.config);
            output(&ctx.service.list_sessions(limit).await?, flags.format)
        }
        SessionCommands::Enroll { session, people } => {
            for person in people {
                ctx.service.enroll(session, person).await?;
            }
            output(
                &EnrollResponse {
                    session_id: session,
                    enrolled: people,
                },
                flags.format,
            )
        }
        SessionCommands::Roster { session } => {
            let roster = ctx.service.session_roster(session).await?;
            output(&roster.people, flags.format)
        }
    }
}
