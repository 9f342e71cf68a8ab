use thankful_core::auth::SignUpOutcome;

use crate::auth::{clear_stored_session, load_stored_session, AuthService};
use crate::cli::AuthCommands;
use crate::commands::common::{auth_error, load_profile, resolve_backend};
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        AuthCommands::Signup {
            profile,
            email,
            password,
            display_name,
        } => {
            let service = service_for(profile.as_deref().or(global_profile))?;
            let outcome = service
                .sign_up(&email, &password, display_name.as_deref())
                .await
                .map_err(auth_error)?;
            match outcome {
                SignUpOutcome::SignedIn(session) => {
                    let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                    println!("Signed up and signed in as {email_label}");
                }
                SignUpOutcome::ConfirmationRequired => {
                    println!("Check {email} for a confirmation link, then run `thankful auth login`.");
                }
            }
            Ok(())
        }
        AuthCommands::Login {
            profile,
            email,
            password,
        } => {
            let service = service_for(profile.as_deref().or(global_profile))?;
            let session = service
                .sign_in(&email, &password)
                .await
                .map_err(auth_error)?;
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Signed in as {email_label}");
            Ok(())
        }
        AuthCommands::Status { profile } => {
            let (profile_name, profile) = load_profile(profile.as_deref().or(global_profile))?;
            let session = match resolve_backend(&profile) {
                Ok((url, anon_key)) => AuthService::new(&profile_name, &url, &anon_key)
                    .map_err(auth_error)?
                    .restore_session()
                    .await
                    .map_err(auth_error)?,
                Err(_) => load_stored_session(&profile_name).map_err(auth_error)?,
            };

            if let Some(session) = session {
                let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                println!(
                    "Profile '{}' is signed in as {} (expires_at={})",
                    profile_name, email_label, session.expires_at
                );
            } else {
                println!("Profile '{profile_name}' is not signed in.");
            }
            Ok(())
        }
        AuthCommands::Logout { profile } => {
            let (profile_name, profile) = load_profile(profile.as_deref().or(global_profile))?;
            let stored_session = load_stored_session(&profile_name).map_err(auth_error)?;

            match (resolve_backend(&profile).ok(), stored_session) {
                (Some((url, anon_key)), Some(session)) => {
                    AuthService::new(&profile_name, &url, &anon_key)
                        .map_err(auth_error)?
                        .sign_out(&session.access_token)
                        .await
                        .map_err(auth_error)?;
                }
                _ => {
                    clear_stored_session(&profile_name).map_err(auth_error)?;
                }
            }

            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
        AuthCommands::ResetPassword { email } => {
            let service = service_for(global_profile)?;
            service.recover_password(&email).await.map_err(auth_error)?;
            println!("Password reset email sent to {email}");
            Ok(())
        }
        AuthCommands::Google {
            profile,
            redirect_to,
            callback,
        } => {
            let service = service_for(profile.as_deref().or(global_profile))?;

            if let Some(callback) = callback {
                let session = service.complete_oauth(&callback).await.map_err(auth_error)?;
                let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                println!("Signed in as {email_label}");
                return Ok(());
            }

            println!("{}", service.google_authorize_url(redirect_to.as_deref()));
            println!("Open the URL, approve access, then rerun with --callback <redirect URL>.");
            Ok(())
        }
    }
}

fn service_for(explicit_profile: Option<&str>) -> Result<AuthService, CliError> {
    let (profile_name, profile) = load_profile(explicit_profile)?;
    let (url, anon_key) = resolve_backend(&profile)?;
    AuthService::new(&profile_name, &url, &anon_key).map_err(auth_error)
}
