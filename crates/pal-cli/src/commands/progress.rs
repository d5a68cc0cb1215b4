use crate::cli::GlobalFlags;
use crate::cli::root_commands::ProgressArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `pal progress`.
pub async fn handle(
    args: &ProgressArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    output(&ctx.service.progress(&args.diver).await?, flags.format)
}
