use pal_core::assignment::AssignmentRequest;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AssignArgs;
use crate::commands::shared::input::read_json;
use crate::context::AppContext;
use crate::output::output;

/// Handle `pal assign`.
pub async fn handle(args: &AssignArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let request: AssignmentRequest = read_json(&args.file)?;
    let outcome = ctx.service.assign(&args.session, &request).await?;
    output(&outcome, flags.format)
}
