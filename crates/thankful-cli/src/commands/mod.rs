pub mod add;
pub mod auth_cmd;
pub mod common;
pub mod community;
pub mod completions;
pub mod config;
pub mod delete;
pub mod edit;
pub mod favorite;
pub mod list;
pub mod profile;
pub mod settings;
pub mod streaks;
pub mod sync;
