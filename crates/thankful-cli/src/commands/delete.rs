use crate::commands::common::{build_repository, resolve_note_id};
use crate::config_profiles::CliProfile;
use crate::error::CliError;

pub async fn run_delete(
    id: &str,
    profile_name: &str,
    profile: &CliProfile,
    offline: bool,
) -> Result<(), CliError> {
    let mut repo = build_repository(profile_name, profile, offline).await?;
    repo.fetch_notes().await?;

    let note_id = resolve_note_id(repo.notes(), id)?;
    repo.delete_note(&note_id).await?;
    println!("{note_id}");
    Ok(())
}
