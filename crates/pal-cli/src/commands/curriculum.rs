use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::CurriculumCommands;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct AttachResponse<'a> {
    competency_id: &'a str,
    exercise_id: &'a str,
}

/// Handle `pal curriculum`.
pub async fn handle(
    action: &CurriculumCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        CurriculumCommands::AddGroup {
            section,
            title,
            description,
        } => {
            let section = ctx.service.find_section_by_code(section).await?;
            let group = ctx
                .service
                .create_competency_group(&section.id, title, description.as_deref())
                .await?;
            output(&group, flags.format)
        }
        CurriculumCommands::AddCompetency {
            group,
            name,
            description,
        } => {
            let competency = ctx
                .service
                .create_competency(group, name, description.as_deref())
                .await?;
            output(&competency, flags.format)
        }
        CurriculumCommands::AddExercise {
            name,
            description,
            competency,
        } => {
            let exercise = ctx
                .service
                .create_exercise(name, description.as_deref())
                .await?;
            for competency_id in competency {
                ctx.service.attach_exercise(competency_id, &exercise.id).await?;
            }
            output(&exercise, flags.format)
        }
        CurriculumCommands::Attach {
            competency,
            exercise,
        } => {
            ctx.service.attach_exercise(competency, exercise).await?;
            output(
                &AttachResponse {
                    competency_id: competency,
                    exercise_id: exercise,
                },
                flags.format,
            )
        }
        CurriculumCommands::Show { code } => {
            let section = ctx.service.find_section_by_code(code).await?;
            output(&ctx.service.section_curriculum(&section.id).await?, flags.format)
        }
    }
}
