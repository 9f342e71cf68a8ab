use thankful_core::models::extract_tags;
use thankful_core::NotePatch;

use crate::commands::common::{
    build_repository, capture_editor_input_with_initial, resolve_note_id,
};
use crate::config_profiles::CliProfile;
use crate::error::CliError;

pub async fn run_edit(
    id: &str,
    profile_name: &str,
    profile: &CliProfile,
    offline: bool,
) -> Result<(), CliError> {
    let mut repo = build_repository(profile_name, profile, offline).await?;
    repo.fetch_notes().await?;

    let note_id = resolve_note_id(repo.notes(), id)?;
    let current = repo
        .notes()
        .iter()
        .find(|note| note.id == note_id)
        .cloned()
        .ok_or_else(|| CliError::NoteNotFound(id.to_string()))?;

    let Some(edited) = capture_editor_input_with_initial(&current.content)? else {
        return Err(CliError::EmptyEditedContent);
    };

    if edited == current.content {
        println!("{note_id}");
        return Ok(());
    }

    let patch = NotePatch {
        content: Some(edited.clone()),
        tags: Some(extract_tags(&edited)),
        ..Default::default()
    };
    let updated = repo.update_note(&note_id, &patch).await?;
    println!("{}", updated.id);
    Ok(())
}
