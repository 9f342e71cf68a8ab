use crate::commands::common::authed_client;
use crate::config_profiles::CliProfile;
use crate::error::CliError;

pub async fn run_profile(profile_name: &str, profile: &CliProfile) -> Result<(), CliError> {
    let (client, session) = authed_client(profile_name, profile).await?;

    match client.fetch_profile(&session.user.id).await? {
        Some(row) => {
            println!("{}", row.label());
            if let Some(email) = row.email.as_deref() {
                println!("email:   {email}");
            }
            if let Some(avatar) = row.avatar_url.as_deref() {
                println!("avatar:  {avatar}");
            }
            println!("joined:  {}", row.created_at.format("%Y-%m-%d"));
        }
        None => {
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("No profile row yet for {email_label}.");
        }
    }
    Ok(())
}
