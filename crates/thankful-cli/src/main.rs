//! Thankful CLI - gratitude, sermon, and prayer journaling from the terminal
//!
//! Quick capture with minimal friction; entries written while offline land in
//! the local vault and upload on an explicit `thankful sync push`.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;

use clap::{CommandFactory, Parser};

use cli::{Cli, Commands, KindArg, SyncCommands};
use error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("thankful=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let global_profile = cli.profile.clone();
    let offline = cli.offline;
    let (profile_name, profile) = commands::common::load_profile(global_profile.as_deref())?;

    match cli.command {
        Some(Commands::Add {
            kind,
            title,
            public,
            content,
        }) => {
            commands::add::run_add(kind, title, public, &content, &profile_name, &profile, offline)
                .await
        }
        Some(Commands::List {
            kind,
            favorites,
            tag,
            limit,
            json,
        }) => {
            commands::list::run_list(
                kind,
                favorites,
                tag.as_deref(),
                limit,
                json,
                &profile_name,
                &profile,
                offline,
            )
            .await
        }
        Some(Commands::Edit { id }) => {
            commands::edit::run_edit(&id, &profile_name, &profile, offline).await
        }
        Some(Commands::Delete { id }) => {
            commands::delete::run_delete(&id, &profile_name, &profile, offline).await
        }
        Some(Commands::Favorite { id }) => {
            commands::favorite::run_favorite(&id, &profile_name, &profile, offline).await
        }
        Some(Commands::Sync { command }) => match command {
            SyncCommands::Status { json } => {
                commands::sync::run_sync_status(json, &profile_name, &profile, offline).await
            }
            SyncCommands::Push { json } => {
                commands::sync::run_sync_push(json, &profile_name, &profile, offline).await
            }
        },
        Some(Commands::Auth { command }) => {
            commands::auth_cmd::run_auth(command, global_profile.as_deref()).await
        }
        Some(Commands::Profile) => commands::profile::run_profile(&profile_name, &profile).await,
        Some(Commands::Streaks { json }) => {
            commands::streaks::run_streaks(json, &profile_name, &profile).await
        }
        Some(Commands::Settings { command }) => {
            commands::settings::run_settings(command, &profile_name, &profile).await
        }
        Some(Commands::Prayers { limit, json }) => {
            commands::community::run_prayers(limit, json, &profile_name, &profile).await
        }
        Some(Commands::Templates { kind, json }) => {
            commands::community::run_templates(kind, json, &profile_name, &profile).await
        }
        Some(Commands::Completions { shell, output }) => {
            commands::completions::run_completions(shell, output.as_deref())
        }
        Some(Commands::Config { command }) => {
            commands::config::run_config(command, global_profile.as_deref())
        }
        None => {
            // Quick capture mode: thankful "grateful for ..."
            if cli.note.is_empty() {
                Cli::command().print_help().map_err(CliError::Io)?;
                println!();
                Ok(())
            } else {
                commands::add::run_add(
                    KindArg::Gratitude,
                    None,
                    false,
                    &cli.note,
                    &profile_name,
                    &profile,
                    offline,
                )
                .await
            }
        }
    }
}
