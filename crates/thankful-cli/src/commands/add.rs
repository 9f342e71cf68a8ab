use thankful_core::NoteDraft;

use crate::cli::KindArg;
use crate::commands::common::{
    build_repository, default_title, resolve_note_content, translator,
};
use crate::config_profiles::CliProfile;
use crate::error::CliError;

#[allow(clippy::fn_params_excessive_bools)]
pub async fn run_add(
    kind: KindArg,
    title: Option<String>,
    public: bool,
    content_parts: &[String],
    profile_name: &str,
    profile: &CliProfile,
    offline: bool,
) -> Result<(), CliError> {
    let content = resolve_note_content(content_parts)?;
    let mut repo = build_repository(profile_name, profile, offline).await?;

    let title = title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| default_title(&content));

    let mut draft = NoteDraft::new(repo.user_id(), kind.into(), title, content);
    if public {
        draft = draft.public();
    }

    let note = repo.create_note(draft).await?;
    println!("{}", note.id);

    if note.id.is_local() {
        let translator = translator(profile)?;
        println!("{}", translator.t("notes.captured_offline"));
    }

    Ok(())
}
