use pal_core::enums::{Level, Role};
use pal_db::repos::people::NewPerson;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::PersonCommands;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `pal person`.
pub async fn handle(
    action: &PersonCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        PersonCommands::Add {
            first,
            last,
            role,
            level,
            email,
            section,
        } => {
            let new = NewPerson {
                first_name: first.clone(),
                last_name: last.clone(),
                email: email.clone(),
                role: parse_enum::<Role>(role, "role")?,
                level: parse_enum::<Level>(level, "level")?,
            };
            let person = ctx.service.create_person(&new).await?;
            for code in section {
                let section = ctx.service.find_section_by_code(code).await?;
                ctx.service.join_section(&person.id, &section.id).await?;
            }
            let person = ctx.service.get_person(&person.id).await?;
            output(&person, flags.format)
        }
        PersonCommands::Get { id } => output(&ctx.service.get_person(id).await?, flags.format),
        PersonCommands::List { role } => {
            let role = role
                .as_deref()
                .map(|value| parse_enum::<Role>(value, "role"))
                .transpose()?;
            output(&ctx.service.list_people(role).await?, flags.format)
        }
    }
}
