use thankful_core::NoteKind;

use crate::cli::KindArg;
use crate::commands::common::{authed_client, note_preview, translator};
use crate::config_profiles::CliProfile;
use crate::error::CliError;

pub async fn run_prayers(
    limit: usize,
    as_json: bool,
    profile_name: &str,
    profile: &CliProfile,
) -> Result<(), CliError> {
    let (client, session) = authed_client(profile_name, profile).await?;
    let requests = client
        .fetch_prayer_requests(&session.user.id, limit)
        .await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&requests)?);
        return Ok(());
    }

    let translator = translator(profile)?;
    if requests.is_empty() {
        println!("{}", translator.t("prayers.empty"));
        return Ok(());
    }

    for request in &requests {
        let marker = if request.is_answered { "answered" } else { "open" };
        println!(
            "{}  {:<8}  {}",
            request.created_at.format("%Y-%m-%d"),
            marker,
            note_preview(&request.title, 50)
        );
    }
    Ok(())
}

pub async fn run_templates(
    kind: Option<KindArg>,
    as_json: bool,
    profile_name: &str,
    profile: &CliProfile,
) -> Result<(), CliError> {
    let (client, _session) = authed_client(profile_name, profile).await?;
    let kind: Option<NoteKind> = kind.map(Into::into);
    let templates = client.fetch_community_templates(kind).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&templates)?);
        return Ok(());
    }

    let translator = translator(profile)?;
    if templates.is_empty() {
        println!("{}", translator.t("templates.empty"));
        return Ok(());
    }

    for template in &templates {
        println!(
            "{:<9}  {:<40}  {}",
            template.kind.to_string(),
            note_preview(&template.title, 40),
            note_preview(&template.content, 50)
        );
    }
    Ok(())
}
