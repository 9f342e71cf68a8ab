use std::path::PathBuf;

use thankful_core::util::{is_http_url, normalize_text_option};

use crate::cli::ConfigCommands;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            supabase_url,
            supabase_anon_key,
            locale,
            data_dir,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            supabase_url,
            supabase_anon_key,
            locale,
            data_dir,
            no_activate,
        ),
    }
}

fn run_config_init(
    profile: Option<&str>,
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    locale: Option<String>,
    data_dir: Option<PathBuf>,
    no_activate: bool,
) -> Result<(), CliError> {
    if let Some(url) = normalize_text_option(supabase_url.clone()) {
        if !is_http_url(&url) {
            return Err(CliError::Config(
                "Backend URL must include http:// or https://".to_string(),
            ));
        }
    }

    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile);

    let entry = config.profile_mut_or_default(&profile_name);
    if let Some(url) = normalize_text_option(supabase_url) {
        entry.supabase_url = Some(url);
    }
    if let Some(key) = normalize_text_option(supabase_anon_key) {
        entry.supabase_anon_key = Some(key);
    }
    if let Some(locale) = normalize_text_option(locale) {
        entry.locale = Some(locale.to_lowercase());
    }
    if let Some(dir) = data_dir {
        entry.data_dir = Some(dir);
    }

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!("Profile '{}' saved to {}", profile_name, path.display());
    Ok(())
}
