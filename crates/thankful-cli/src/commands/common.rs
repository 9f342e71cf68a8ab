use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use serde::Serialize;
use thankful_core::i18n::{Translator, DEFAULT_LOCALE};
use thankful_core::util::normalize_text_option;
use thankful_core::{ConnectivityMonitor, Note, NoteId, NoteRepository, OfflineVault, SupabaseClient};

use crate::auth::{load_stored_session, AuthService, Session};
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

const EN_CATALOG: &str = include_str!("../../locales/en.json");
const ES_CATALOG: &str = include_str!("../../locales/es.json");

/// Load the profile config and resolve the profile a command should use.
pub fn load_profile(explicit: Option<&str>) -> Result<(String, CliProfile), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(explicit);
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();
    Ok((profile_name, profile))
}

/// Backend project URL + anon key, from the profile or the environment.
pub fn resolve_backend(profile: &CliProfile) -> Result<(String, String), CliError> {
    let url = profile
        .supabase_url()
        .or_else(|| normalize_text_option(env::var("THANKFUL_SUPABASE_URL").ok()));
    let anon_key = profile
        .supabase_anon_key()
        .or_else(|| normalize_text_option(env::var("THANKFUL_SUPABASE_ANON_KEY").ok()));

    match (url, anon_key) {
        (Some(url), Some(anon_key)) => Ok((url, anon_key)),
        _ => Err(CliError::Config(
            "Backend is not configured. Run `thankful config init --supabase-url ... --supabase-anon-key ...`.".to_string(),
        )),
    }
}

/// Resolve the signed-in session for a profile.
///
/// Online, the persisted session is restored (refreshing if expired); with
/// `offline`, the stored session is used as-is since refresh would need the
/// network.
pub async fn resolve_session(
    profile_name: &str,
    profile: &CliProfile,
    offline: bool,
) -> Result<Session, CliError> {
    if offline {
        return load_stored_session(profile_name)
            .map_err(auth_error)?
            .ok_or(CliError::NotSignedIn);
    }

    let session = match resolve_backend(profile) {
        Ok((url, anon_key)) => AuthService::new(profile_name, &url, &anon_key)
            .map_err(auth_error)?
            .restore_session()
            .await
            .map_err(auth_error)?,
        Err(_) => load_stored_session(profile_name).map_err(auth_error)?,
    };
    session.ok_or(CliError::NotSignedIn)
}

/// Authenticated PostgREST client plus the session that backs it.
pub async fn authed_client(
    profile_name: &str,
    profile: &CliProfile,
) -> Result<(SupabaseClient, Session), CliError> {
    let session = resolve_session(profile_name, profile, false).await?;
    let (url, anon_key) = resolve_backend(profile)?;
    let client = SupabaseClient::new(url, anon_key, &session.access_token)?;
    Ok((client, session))
}

/// Open the offline vault for a profile.
pub fn open_vault(profile: &CliProfile) -> Result<OfflineVault, CliError> {
    let dir = profile
        .data_dir
        .clone()
        .or_else(|| env::var_os("THANKFUL_DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(|| {
            thankful_core::offline::vault_dir_under(
                &dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")),
            )
        });
    Ok(OfflineVault::open(dir)?)
}

/// Build the note repository a command operates on.
///
/// `offline` seeds the connectivity monitor with the disconnected flag, which
/// routes reads and creates through the vault.
pub async fn build_repository(
    profile_name: &str,
    profile: &CliProfile,
    offline: bool,
) -> Result<NoteRepository<SupabaseClient>, CliError> {
    let session = resolve_session(profile_name, profile, offline).await?;
    let (url, anon_key) = resolve_backend(profile)?;
    let client = SupabaseClient::new(url, anon_key, &session.access_token)?;
    let vault = open_vault(profile)?;
    let connectivity = ConnectivityMonitor::new(!offline);
    if offline {
        tracing::debug!("Offline mode: reads and creates route through the vault");
    }
    Ok(NoteRepository::new(
        client,
        vault,
        connectivity,
        session.user.id,
    ))
}

/// Translator for the profile's preferred locale.
///
/// `THANKFUL_LOCALES_DIR` points at a directory of `<code>.json` files;
/// otherwise the embedded catalogs are used, unknown locales falling back to
/// the default one.
pub fn translator(profile: &CliProfile) -> Result<Translator, CliError> {
    let locale = profile
        .locale()
        .or_else(|| normalize_text_option(env::var("THANKFUL_LOCALE").ok()))
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string());

    if let Some(dir) = env::var_os("THANKFUL_LOCALES_DIR") {
        return Ok(Translator::load_dir(Path::new(&dir), &locale)?);
    }

    let catalog = match locale.as_str() {
        "es" => ES_CATALOG,
        _ => EN_CATALOG,
    };
    Ok(Translator::from_sources(locale, catalog, EN_CATALOG)?)
}

pub fn auth_error(error: crate::auth::AuthError) -> CliError {
    CliError::Auth(error.to_string())
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub preview: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    pub is_public: bool,
    pub pending: bool,
    pub created_at: String,
    pub relative_time: String,
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();

    NoteListItem {
        id: note.id.to_string(),
        kind: note.kind.to_string(),
        title: note.title.clone(),
        preview: note_preview(&note.content, 60),
        content: note.content.clone(),
        tags: note.tags.iter().cloned().collect(),
        is_favorite: note.is_favorite,
        is_public: note.is_public,
        pending: note.id.is_local(),
        created_at: note.created_at.to_rfc3339(),
        relative_time: format_relative_time(note.created_at.timestamp_millis(), now_ms),
    }
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|note| {
            let id = note.id.to_string();
            let short_id = id.chars().take(13).collect::<String>();
            let kind = note.kind.to_string();
            let flags = format!(
                "{}{}",
                if note.is_favorite { '*' } else { ' ' },
                if note.id.is_local() { '!' } else { ' ' }
            );
            let title = note_preview(&note.title, 32);
            let relative_time = format_relative_time(note.created_at.timestamp_millis(), now_ms);
            let tags = render_tags(note);

            if tags.is_empty() {
                format!("{short_id:<13}  {kind:<9}  {flags}  {title:<32}  {relative_time}")
            } else {
                format!(
                    "{short_id:<13}  {kind:<9}  {flags}  {title:<32}  {relative_time:<10}  {tags}"
                )
            }
        })
        .collect()
}

pub fn note_preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn render_tags(note: &Note) -> String {
    note.tags
        .iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Default entry title: the first content line, collapsed and capped.
pub fn default_title(content: &str) -> String {
    note_preview(content, 60)
}

/// Resolve a note by full id or unique id prefix against the fetched list.
pub fn resolve_note_id(notes: &[Note], query: &str) -> Result<NoteId, CliError> {
    let query = normalize_note_identifier(query)?;

    let matching: Vec<&Note> = notes
        .iter()
        .filter(|note| note.id.to_string().starts_with(&query))
        .collect();

    match matching.len() {
        0 => Err(CliError::NoteNotFound(query)),
        1 => Ok(matching[0].id),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|note| note.id.to_string().chars().take(13).collect::<String>())
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn resolve_note_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    if let Some(content) = capture_editor_input()? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input() -> Result<Option<String>, CliError> {
    capture_editor_input_with_initial("")
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&note_content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            // Fallback for editor commands with args, e.g. "code --wait"
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("thankful-note-{}-{now}.md", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use thankful_core::{NoteDraft, NoteKind};

    fn local_note(ms: i64) -> Note {
        Note::from_draft_local(
            NoteDraft::new("u1", NoteKind::Gratitude, "Morning walk", "Cool air #outside"),
            ms,
            Utc::now(),
        )
    }

    #[test]
    fn normalize_content_trims_and_rejects_empty() {
        assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
        assert_eq!(normalize_content(" \n\t "), None);
    }

    #[test]
    fn normalize_note_identifier_rejects_empty() {
        assert!(matches!(
            normalize_note_identifier(" \n "),
            Err(CliError::EmptyNoteId)
        ));
        assert_eq!(
            normalize_note_identifier("  abc123  ").unwrap(),
            "abc123".to_string()
        );
    }

    #[test]
    fn format_relative_time_units() {
        let now = 10_000_000;
        assert_eq!(format_relative_time(now - 30_000, now), "just now");
        assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
        assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    }

    #[test]
    fn note_preview_truncates_with_ellipsis() {
        let preview = note_preview("This is a very long sentence that should be shortened", 20);
        assert_eq!(preview, "This is a very lo...");
    }

    #[test]
    fn default_title_uses_first_line() {
        assert_eq!(default_title("First line\nSecond"), "First line");
    }

    #[test]
    fn list_item_marks_offline_notes_pending() {
        let item = note_to_list_item(&local_note(1_700_000_000_000));
        assert!(item.pending);
        assert_eq!(item.id, "offline_1700000000000");
        assert_eq!(item.kind, "gratitude");
        assert_eq!(item.tags, vec!["outside"]);
    }

    #[test]
    fn resolve_note_id_matches_exact_and_prefix() {
        let notes = vec![local_note(1_111), local_note(2_222)];

        let exact = resolve_note_id(&notes, "offline_1111").unwrap();
        assert_eq!(exact, notes[0].id);

        let by_prefix = resolve_note_id(&notes, "offline_2").unwrap();
        assert_eq!(by_prefix, notes[1].id);
    }

    #[test]
    fn resolve_note_id_rejects_ambiguous_prefix() {
        let notes = vec![local_note(3_001), local_note(3_002)];
        let error = resolve_note_id(&notes, "offline_3").unwrap_err();
        assert!(matches!(error, CliError::AmbiguousNoteId(_)));
    }

    #[test]
    fn resolve_note_id_rejects_missing_note() {
        let error = resolve_note_id(&[], "offline_9").unwrap_err();
        assert!(matches!(error, CliError::NoteNotFound(_)));
    }

    #[test]
    fn embedded_catalogs_parse() {
        let profile = CliProfile::default();
        let translator = translator(&profile).unwrap();
        assert_eq!(
            translator.t("sync.up_to_date"),
            "Everything is synced."
        );
    }
}
