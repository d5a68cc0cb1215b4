use pal_core::rating::RatingSheet;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::GroupCommands;
use crate::commands::shared::input::read_json;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct MembershipResponse<'a> {
    group_id: &'a str,
    diver_id: &'a str,
    aptitude: Option<&'a str>,
    removed: bool,
}

/// Handle `pal group`.
pub async fn handle(
    action: &GroupCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        GroupCommands::List { session } => {
            output(&ctx.service.list_groups(session).await?, flags.format)
        }
        GroupCommands::Members { group } => {
            output(&ctx.service.group_members(group).await?, flags.format)
        }
        GroupCommands::Plan {
            group,
            competency,
            notes,
        } => {
            let planned = ctx
                .service
                .set_group_plan(group, competency, notes.as_deref())
                .await?;
            output(&planned, flags.format)
        }
        GroupCommands::AddMember {
            group,
            diver,
            aptitude,
        } => {
            let membership = ctx
                .service
                .add_membership(group, diver, aptitude.as_deref())
                .await?;
            output(&membership, flags.format)
        }
        GroupCommands::SetAptitude {
            group,
            diver,
            aptitude,
        } => {
            ctx.service
                .set_membership_aptitude(group, diver, aptitude.as_deref())
                .await?;
            output(
                &MembershipResponse {
                    group_id: group,
                    diver_id: diver,
                    aptitude: aptitude.as_deref(),
                    removed: false,
                },
                flags.format,
            )
        }
        GroupCommands::RemoveMember { group, diver } => {
            ctx.service.remove_membership(group, diver).await?;
            output(
                &MembershipResponse {
                    group_id: group,
                    diver_id: diver,
                    aptitude: None,
                    removed: true,
                },
                flags.format,
            )
        }
        GroupCommands::Rate { group, file } => {
            let sheet: RatingSheet = read_json(file)?;
            let progress = ctx.service.save_group_evaluations(group, &sheet).await?;
            output(&progress, flags.format)
        }
        GroupCommands::Ratings { group } => {
            output(&ctx.service.group_evaluations(group).await?, flags.format)
        }
    }
}
