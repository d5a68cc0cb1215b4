use pal_core::rating::RatingSheet;
use pal_db::repos::links::LinkOutcome;

use crate::cli::GlobalFlags;
use crate::commands::shared::input::read_json;
use crate::context::AppContext;
use crate::output::output;

/// Human note for a refused link, printed to stderr unless `--quiet`.
fn refusal_note<T>(outcome: &LinkOutcome<T>) -> Option<&'static str> {
    match outcome {
        LinkOutcome::Ready(_) => None,
        LinkOutcome::NotFound => Some("this link does not exist or has been closed"),
        LinkOutcome::Expired => Some("this link has expired"),
    }
}

/// Print the outcome. Unknown, closed and expired links are regular
/// answers, so the command still succeeds.
fn finish<T: serde::Serialize>(outcome: &LinkOutcome<T>, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(outcome, flags.format)?;
    if let Some(note) = refusal_note(outcome) {
        if !flags.quiet {
            eprintln!("{note}");
        }
    }
    Ok(())
}

pub async fn show(token: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let outcome = ctx.service.access_link(token).await?;
    finish(&outcome, flags)
}

/// Nothing is saved through a refused link; the outcome says why.
pub async fn submit(
    token: &str,
    file: &str,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let sheet: RatingSheet = read_json(file)?;
    let outcome = ctx.service.submit_link(token, &sheet).await?;
    finish(&outcome, flags)
}
