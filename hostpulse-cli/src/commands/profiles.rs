//! Connection profile listing.

use std::path::Path;

use hostpulse_core::config::ConnectionProfile;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::util::load_settings;

#[derive(Serialize)]
struct ProfileRow<'a> {
    name: &'a str,
    host: &'a str,
    port: u16,
    user: Option<&'a str>,
    transport: &'static str,
    jump_host: Option<&'a str>,
}

impl<'a> From<&'a ConnectionProfile> for ProfileRow<'a> {
    fn from(p: &'a ConnectionProfile) -> Self {
        Self {
            name: &p.name,
            host: &p.host,
            port: p.port,
            user: p.user.as_deref(),
            transport: p.transport().as_str(),
            jump_host: p.jump_host.as_deref(),
        }
    }
}

/// Profiles command handler
pub fn cmd_profiles(config_path: Option<&Path>, format: OutputFormat) -> Result<(), CliError> {
    let settings = load_settings(config_path)?;
    let rows: Vec<ProfileRow<'_>> = settings.connections.iter().map(ProfileRow::from).collect();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&rows)
                .map_err(|e| CliError::Output(e.to_string()))?;
            println!("{json}");
        }
        OutputFormat::Table => print_table(&rows),
    }
    Ok(())
}

fn print_table(rows: &[ProfileRow<'_>]) {
    if rows.is_empty() {
        println!("No connection profiles configured.");
        return;
    }

    let targets: Vec<String> = rows
        .iter()
        .map(|r| r.user.map_or_else(|| r.host.to_string(), |u| format!("{u}@{}", r.host)))
        .collect();
    let name_width = rows.iter().map(|r| r.name.len()).max().unwrap_or(4).max(4);
    let host_width = targets.iter().map(String::len).max().unwrap_or(4).max(4);

    println!(
        "{:<name_width$}  {:<host_width$}  {:>5}  {:<9}  VIA",
        "NAME", "HOST", "PORT", "TRANSPORT"
    );
    for (row, target) in rows.iter().zip(&targets) {
        println!(
            "{:<name_width$}  {:<host_width$}  {:>5}  {:<9}  {}",
            row.name,
            target,
            row.port,
            row.transport,
            row.jump_host.unwrap_or("-")
        );
    }
}
