use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Person { action } => commands::person::handle(&action, ctx, flags).await,
        Commands::Section { action } => commands::section::handle(&action, ctx, flags).await,
        Commands::Curriculum { action } => commands::curriculum::handle(&action, ctx, flags).await,
        Commands::Session { action } => commands::session::handle(&action, ctx, flags).await,
        Commands::Assign(args) => commands::assign::handle(&args, ctx, flags).await,
        Commands::Import(args) => commands::import::handle(&args, ctx, flags).await,
        Commands::Group { action } => commands::group::handle(&action, ctx, flags).await,
        Commands::Link { action } => commands::link::handle(&action, ctx, flags).await,
        Commands::Evaluate(args) => commands::evaluate::handle(&args, ctx, flags).await,
        Commands::Progress(args) => commands::progress::handle(&args, ctx, flags).await,
        Commands::Report { action } => commands::report::handle(&action, ctx, flags).await,
        Commands::Audit(args) => commands::audit::handle(&args, ctx, flags).await,
        Commands::Init => unreachable!("init is pre-dispatched in main"),
    }
}
