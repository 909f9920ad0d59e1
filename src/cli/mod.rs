use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::{ConfigStore, EndpointConfig};
use crate::services::{refresh_pass, StatsClient};
use crate::types::{RefreshResult, UsageSnapshot};
use crate::{logging, tui};

/// Terminal quota & usage monitor for Claude relay API endpoints
#[derive(Parser)]
#[command(name = "quotrack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Verbose logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch interactive TUI (default)
    Tui,

    /// Run one refresh pass and print the report
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage monitored endpoints
    Endpoints {
        #[command(subcommand)]
        command: EndpointCommands,
    },
}

#[derive(Subcommand)]
enum EndpointCommands {
    /// List configured endpoints
    List,

    /// Add an endpoint
    Add {
        /// Display name
        name: String,
        /// Relay base URL, e.g. https://relay.example.com
        base_url: String,
        /// API identifier issued by the relay
        api_id: String,
        /// Hide from the compact summary line
        #[arg(long)]
        no_summary: bool,
    },

    /// Edit an endpoint; only the given fields change
    Edit {
        /// Display name of the endpoint to edit
        name: String,
        /// New display name
        #[arg(long)]
        rename: Option<String>,
        /// New relay base URL
        #[arg(long)]
        base_url: Option<String>,
        /// New API identifier
        #[arg(long)]
        api_id: Option<String>,
        /// Show in the compact summary line (true/false)
        #[arg(long)]
        summary: Option<bool>,
    },

    /// Remove an endpoint by name
    Remove {
        /// Display name of the endpoint to remove
        name: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let store = Arc::new(ConfigStore::open()?);
        match self.command {
            None | Some(Commands::Tui) => tui::run(store).await,
            Some(Commands::Status { json }) => {
                logging::init(self.verbose);
                status(&store, json).await
            }
            Some(Commands::Endpoints { command }) => {
                logging::init(self.verbose);
                endpoints(&store, command)
            }
        }
    }
}

async fn status(store: &ConfigStore, json: bool) -> anyhow::Result<()> {
    let client = StatsClient::new()?;
    let endpoints = store.endpoints();
    let result = refresh_pass(&client, &endpoints).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.snapshots.is_empty() {
        println!("No endpoints configured.");
        println!("Add one with: quotrack endpoints add <name> <base-url> <api-id>");
        return Ok(());
    }

    print_report(&result);
    Ok(())
}

fn print_report(result: &RefreshResult) {
    let name_width = result
        .snapshots
        .iter()
        .map(|s| s.endpoint_name.len())
        .max()
        .unwrap_or(0);

    for snapshot in &result.snapshots {
        println!(
            "{:name_width$}  {}",
            snapshot.endpoint_name,
            snapshot_line(snapshot)
        );
    }
}

fn snapshot_line(snapshot: &UsageSnapshot) -> String {
    if let Some(error) = &snapshot.error {
        return format!("error: {error}");
    }
    let Some(stats) = &snapshot.stats else {
        return "error: no data".to_string();
    };

    let limits = &stats.limits;
    let today = match snapshot.daily_cost_fraction() {
        Some(fraction) => format!(
            "today ${:.2} / ${:.0} ({:.0}%)",
            limits.current_daily_cost,
            limits.daily_cost_limit,
            fraction * 100.0
        ),
        None => format!("today ${:.2}", limits.current_daily_cost),
    };

    format!(
        "total {}  {}  today tokens {}",
        stats.usage.total.formatted_cost, today, snapshot.daily_tokens
    )
}

fn endpoints(store: &ConfigStore, command: EndpointCommands) -> anyhow::Result<()> {
    match command {
        EndpointCommands::List => {
            let endpoints = store.endpoints();
            if endpoints.is_empty() {
                println!("No endpoints configured.");
                return Ok(());
            }
            for ep in endpoints {
                let summary = if ep.include_in_summary {
                    ""
                } else {
                    "  (hidden from summary)"
                };
                println!("{}  {}  {}{}", ep.id, ep.name, ep.base_url, summary);
            }
        }
        EndpointCommands::Add {
            name,
            base_url,
            api_id,
            no_summary,
        } => {
            let mut endpoint = EndpointConfig::new(name, base_url, api_id);
            endpoint.include_in_summary = !no_summary;
            let name = endpoint.name.clone();
            store.add(endpoint)?;
            println!("Added {name}.");
        }
        EndpointCommands::Edit {
            name,
            rename,
            base_url,
            api_id,
            summary,
        } => {
            let mut endpoint = store
                .find_by_name(&name)
                .ok_or_else(|| anyhow::anyhow!("no endpoint named '{name}'"))?;
            if let Some(rename) = rename {
                endpoint.name = rename;
            }
            if let Some(base_url) = base_url {
                endpoint.base_url = base_url;
            }
            if let Some(api_id) = api_id {
                endpoint.api_id = api_id;
            }
            if let Some(summary) = summary {
                endpoint.include_in_summary = summary;
            }
            let name = endpoint.name.clone();
            store.update(endpoint)?;
            println!("Updated {name}.");
        }
        EndpointCommands::Remove { name } => {
            let endpoint = store
                .find_by_name(&name)
                .ok_or_else(|| anyhow::anyhow!("no endpoint named '{name}'"))?;
            store.remove(endpoint.id)?;
            println!("Removed {}.", endpoint.name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::try_parse_from(["quotrack"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::try_parse_from(["quotrack", "status"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Status { json: false })));
    }

    #[test]
    fn test_cli_parse_status_json() {
        let cli = Cli::try_parse_from(["quotrack", "status", "--json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Status { json: true })));
    }

    #[test]
    fn test_cli_parse_endpoints_add() {
        let cli = Cli::try_parse_from([
            "quotrack",
            "endpoints",
            "add",
            "alpha",
            "https://relay.example.com",
            "abc123",
            "--no-summary",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Endpoints {
                command:
                    EndpointCommands::Add {
                        name,
                        base_url,
                        api_id,
                        no_summary,
                    },
            }) => {
                assert_eq!(name, "alpha");
                assert_eq!(base_url, "https://relay.example.com");
                assert_eq!(api_id, "abc123");
                assert!(no_summary);
            }
            _ => panic!("expected endpoints add"),
        }
    }

    #[test]
    fn test_cli_parse_endpoints_edit() {
        let cli = Cli::try_parse_from([
            "quotrack",
            "endpoints",
            "edit",
            "alpha",
            "--rename",
            "alpha2",
            "--summary",
            "false",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Endpoints {
                command:
                    EndpointCommands::Edit {
                        name,
                        rename,
                        base_url,
                        api_id,
                        summary,
                    },
            }) => {
                assert_eq!(name, "alpha");
                assert_eq!(rename.as_deref(), Some("alpha2"));
                assert!(base_url.is_none());
                assert!(api_id.is_none());
                assert_eq!(summary, Some(false));
            }
            _ => panic!("expected endpoints edit"),
        }
    }

    #[test]
    fn test_cli_parse_verbose_flag() {
        let cli = Cli::try_parse_from(["quotrack", "-v", "status"]).unwrap();
        assert!(cli.verbose);
    }

    // ========== report formatting tests ==========

    #[test]
    fn test_snapshot_line_for_failure() {
        let ep = EndpointConfig::new("alpha", "https://a.example.com", "a1");
        let snapshot = UsageSnapshot::failure(&ep, "request timed out".into());
        assert_eq!(snapshot_line(&snapshot), "error: request timed out");
    }
}
