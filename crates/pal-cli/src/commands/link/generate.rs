use pal_core::entities::EvaluationLink;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct GeneratedLink {
    #[serde(flatten)]
    link: EvaluationLink,
    url: String,
}

pub async fn run(group: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let link = ctx.service.generate_link(group).await?;
    let url = ctx.service.link_settings().url_for(&link.token);
    output(&GeneratedLink { link, url }, flags.format)
}
