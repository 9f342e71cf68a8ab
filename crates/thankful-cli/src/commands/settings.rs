use chrono::Utc;
use thankful_core::models::UserSettings;

use crate::cli::SettingsCommands;
use crate::commands::common::authed_client;
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub async fn run_settings(
    command: SettingsCommands,
    profile_name: &str,
    profile: &CliProfile,
) -> Result<(), CliError> {
    match command {
        SettingsCommands::Show => {
            let (client, session) = authed_client(profile_name, profile).await?;
            let settings = client
                .fetch_user_settings(&session.user.id)
                .await?
                .unwrap_or_else(|| UserSettings::new(&session.user.id, Utc::now()));

            println!("locale:          {}", settings.locale);
            println!("daily_reminder:  {}", settings.daily_reminder);
            Ok(())
        }
        SettingsCommands::SetLocale { locale } => {
            let locale = locale.trim().to_lowercase();
            if locale.is_empty() {
                return Err(CliError::Config("Locale must not be empty".to_string()));
            }

            let (client, session) = authed_client(profile_name, profile).await?;
            let mut settings = client
                .fetch_user_settings(&session.user.id)
                .await?
                .unwrap_or_else(|| UserSettings::new(&session.user.id, Utc::now()));
            settings.locale.clone_from(&locale);
            settings.updated_at = Utc::now();
            let saved = client.upsert_user_settings(&settings).await?;

            // Mirror the locale into the profile so output follows it
            // without a settings fetch on every command.
            let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
            config.profile_mut_or_default(profile_name).locale = Some(saved.locale.clone());
            config.save().map_err(CliError::Config)?;

            println!("Locale set to {}", saved.locale);
            Ok(())
        }
    }
}
