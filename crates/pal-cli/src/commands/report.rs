use crate::cli::GlobalFlags;
use crate::cli::subcommands::ReportCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `pal report`.
pub async fn handle(
    action: &ReportCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ReportCommands::Group { group } => {
            output(&ctx.service.group_report(group).await?, flags.format)
        }
        ReportCommands::Progression { diver } => {
            output(&ctx.service.progression_report(diver).await?, flags.format)
        }
    }
}
