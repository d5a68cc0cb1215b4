#[path = "link/access.rs"]
mod access;
#[path = "link/generate.rs"]
mod generate;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::LinkCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `pal link`.
pub async fn handle(
    action: &LinkCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        LinkCommands::Generate { group } => generate::run(group, ctx, flags).await,
        LinkCommands::Show { token } => access::show(token, ctx, flags).await,
        LinkCommands::Submit { token, file } => access::submit(token, file, ctx, flags).await,
        LinkCommands::List { group } => output(&ctx.service.group_links(group).await?, flags.format),
        LinkCommands::Notify { group } => {
            let notice = ctx.service.notify_supervisor(group, &ctx.outbox()).await?;
            output(&notice, flags.format)
        }
    }
}
