use anyhow::Context;
use pal_core::rating::Rating;
use pal_db::repos::evaluations::NewExerciseEvaluation;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::EvaluateArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `pal evaluate`.
pub async fn handle(
    args: &EvaluateArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let rating = Rating::try_from(args.rating).context("invalid --rating")?;
    let new = NewExerciseEvaluation {
        diver_id: args.diver.clone(),
        exercise_id: args.exercise.clone(),
        supervisor_id: args.supervisor.clone(),
        rating,
        comment: args.comment.clone(),
        evaluated_at: None,
    };
    let evaluation = ctx.service.record_exercise_evaluation(&new).await?;
    output(&evaluation, flags.format)
}
