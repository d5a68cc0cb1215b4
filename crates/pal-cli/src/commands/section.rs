use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::SectionCommands;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct JoinResponse<'a> {
    person_id: &'a str,
    section_id: String,
}

/// Handle `pal section`.
pub async fn handle(
    action: &SectionCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        SectionCommands::Add {
            code,
            name,
            description,
        } => {
            let section = ctx
                .service
                .create_section(code, name, description.as_deref())
                .await?;
            output(&section, flags.format)
        }
        SectionCommands::List => output(&ctx.service.list_sections().await?, flags.format),
        SectionCommands::Join { person, section } => {
            let section = ctx.service.find_section_by_code(section).await?;
            ctx.service.join_section(person, &section.id).await?;
            output(
                &JoinResponse {
                    person_id: person,
                    section_id: section.id,
                },
                flags.format,
            )
        }
        SectionCommands::Students { code } => {
            let section = ctx.service.find_section_by_code(code).await?;
            output(&ctx.service.eligible_students(&section.id).await?, flags.format)
        }
    }
}
