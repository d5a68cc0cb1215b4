use crate::cli::GlobalFlags;
use crate::cli::root_commands::ImportArgs;
use crate::commands::shared::input::read_matrix;
use crate::context::AppContext;
use crate::output::output;

/// Handle `pal import`. Existing groups of the session are replaced.
pub async fn handle(args: &ImportArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let matrix = read_matrix(&args.file, args.delimiter)?;
    tracing::debug!(
        rows = matrix.row_count(),
        cols = matrix.col_count(),
        "roster matrix read"
    );
    let outcome = ctx.service.import_matrix(&args.session, &matrix).await?;
    output(&outcome, flags.format)
}
