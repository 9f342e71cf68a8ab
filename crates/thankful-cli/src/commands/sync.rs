use crate::commands::common::{build_repository, translator};
use crate::config_profiles::CliProfile;
use crate::error::CliError;

pub async fn run_sync_status(
    as_json: bool,
    profile_name: &str,
    profile: &CliProfile,
    offline: bool,
) -> Result<(), CliError> {
    let repo = build_repository(profile_name, profile, offline).await?;
    let pending = repo.pending_count()?;

    if as_json {
        let status = serde_json::json!({
            "pending": pending,
            "online": !offline,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let translator = translator(profile)?;
    if pending == 0 {
        println!("{}", translator.t("sync.up_to_date"));
    } else {
        println!(
            "{}",
            translator.t_with("sync.pending_banner", &[("count", &pending.to_string())])
        );
    }
    Ok(())
}

pub async fn run_sync_push(
    as_json: bool,
    profile_name: &str,
    profile: &CliProfile,
    offline: bool,
) -> Result<(), CliError> {
    let mut repo = build_repository(profile_name, profile, offline).await?;
    let report = repo.push_pending().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let translator = translator(profile)?;
    if report.pushed == 0 && report.failed == 0 {
        println!("{}", translator.t("sync.up_to_date"));
    } else {
        println!(
            "{}",
            translator.t_with(
                "sync.pushed",
                &[
                    ("pushed", &report.pushed.to_string()),
                    ("failed", &report.failed.to_string()),
                ],
            )
        );
        if let Some(error) = repo.last_error() {
            eprintln!("Warning: {error}");
        }
    }
    Ok(())
}
