use chrono::Utc;

use crate::commands::common::{authed_client, translator};
use crate::config_profiles::CliProfile;
use crate::error::CliError;

pub async fn run_streaks(
    as_json: bool,
    profile_name: &str,
    profile: &CliProfile,
) -> Result<(), CliError> {
    let (client, session) = authed_client(profile_name, profile).await?;
    let streaks = client.fetch_streaks(&session.user.id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&streaks)?);
        return Ok(());
    }

    let translator = translator(profile)?;
    if streaks.is_empty() {
        println!("{}", translator.t("streaks.empty"));
        return Ok(());
    }

    let today = Utc::now().date_naive();
    for streak in &streaks {
        let state = if streak.is_alive(today) {
            translator.t("streaks.active")
        } else {
            translator.t("streaks.broken")
        };
        println!(
            "{:<9}  current={:<3}  longest={:<3}  ({state})",
            streak.kind.to_string(),
            streak.current_count,
            streak.longest_count
        );
    }
    Ok(())
}
