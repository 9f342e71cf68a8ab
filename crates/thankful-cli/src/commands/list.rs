use thankful_core::{Note, NoteKind};

use crate::cli::KindArg;
use crate::commands::common::{
    build_repository, format_note_lines, note_to_list_item, translator, NoteListItem,
};
use crate::config_profiles::CliProfile;
use crate::error::CliError;

#[allow(clippy::fn_params_excessive_bools)]
pub async fn run_list(
    kind: Option<KindArg>,
    favorites: bool,
    tag: Option<&str>,
    limit: usize,
    as_json: bool,
    profile_name: &str,
    profile: &CliProfile,
    offline: bool,
) -> Result<(), CliError> {
    let mut repo = build_repository(profile_name, profile, offline).await?;
    repo.fetch_notes().await?;

    let kind: Option<NoteKind> = kind.map(Into::into);
    let notes: Vec<Note> = repo
        .notes()
        .iter()
        .filter(|note| kind.is_none_or(|k| note.kind == k))
        .filter(|note| !favorites || note.is_favorite)
        .filter(|note| tag.is_none_or(|t| note.tags.contains(&t.to_lowercase())))
        .take(limit)
        .cloned()
        .collect();

    if as_json {
        let items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    let translator = translator(profile)?;

    if let Some(error) = repo.last_error() {
        eprintln!("Warning: {error} (showing offline entries)");
    }
    let pending = repo.pending_count()?;
    if pending > 0 {
        println!(
            "{}",
            translator.t_with("sync.pending_banner", &[("count", &pending.to_string())])
        );
    }

    if notes.is_empty() {
        println!("{}", translator.t("notes.empty"));
        return Ok(());
    }

    for line in format_note_lines(&notes) {
        println!("{line}");
    }
    Ok(())
}
