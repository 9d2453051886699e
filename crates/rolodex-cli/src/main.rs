mod config;
mod prompt;
mod shell;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use owo_colors::OwoColorize;
use rolodex_service::{RolodexService, ServiceEvent};

use config::{Cli, Config};
use shell::Shell;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .from_env_lossy()
                .add_directive("rolodex_cli=info".parse()?)
                .add_directive("rolodex_service=info".parse()?)
                .add_directive("rolodex_store=info".parse()?),
        )
        .init();

    let config = Config::from_cli_and_env(Cli::parse())?;
    println!("📁 Data directory: {}", config.data_dir.display());

    let mut service = RolodexService::new(config.layout());
    let mut event_rx = service
        .take_event_receiver()
        .ok_or_else(|| color_eyre::eyre::eyre!("Failed to get event receiver"))?;

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            handle_event(event);
        }
    });

    Shell::new(service, config.json)
        .run()
        .await
        .wrap_err("Terminal session failed")
}

fn handle_event(event: ServiceEvent) {
    let line = match event {
        ServiceEvent::Registered { username, is_admin } => {
            let role = if is_admin { "admin" } else { "user" };
            format!("🆕 Registered {} {}", role, username)
        }
        ServiceEvent::LoggedIn { username, is_admin } => {
            let marker = if is_admin { " (admin)" } else { "" };
            format!("🔑 {} logged in{}", username, marker)
        }
        ServiceEvent::LoggedOut { username } => format!("🚪 {} logged out", username),
        ServiceEvent::PasswordReset { username } => {
            format!("🔐 Password reset for {}", username)
        }
        ServiceEvent::ProfileUpdated { username } => format!("👤 Profile updated: {}", username),
        ServiceEvent::UserDeleted { username, by } => {
            format!("🗑️  {} deleted user {}", by, username)
        }
        ServiceEvent::UserPasswordChanged { username, by } => {
            format!("🔐 {} changed the password of {}", by, username)
        }
    };
    println!("{}", line.dimmed());
}
