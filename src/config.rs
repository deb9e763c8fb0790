//! Command-line and environment configuration.

use crate::aggregate::BuildingMatch;
use crate::client::{AdminClient, StateEndpoint, WebDataSource};
use crate::model::pilot::{HealthFilter, PilotFilter};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Parser)]
#[command(name = "campaign-map")]
#[command(about = "Terminal dashboard and client for a Sturmovik campaign server")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Connection and behaviour settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Base URL of the campaign server
    #[arg(long, global = true, env = "CAMPAIGN_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,

    /// Base URL of a separate ban enforcer service
    #[arg(long, global = true, env = "CAMPAIGN_BAN_ENFORCER_URL")]
    pub ban_enforcer_url: Option<String>,

    /// Password of the `admin` user for control and ban commands
    #[arg(long, global = true, env = "CAMPAIGN_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Route serving a day's war state
    #[arg(
        long,
        global = true,
        env = "CAMPAIGN_STATE_ENDPOINT",
        value_enum,
        default_value_t = StateEndpoint::Past
    )]
    pub state_endpoint: StateEndpoint,

    /// Match building health records on all four position fields
    #[arg(long, global = true, env = "CAMPAIGN_STRICT_BUILDING_MATCH")]
    pub strict_building_match: bool,

    /// Log file of the interactive dashboard
    #[arg(long, global = true, default_value = "campaign-map.log")]
    pub log_file: PathBuf,
}

impl Settings {
    pub fn building_match(&self) -> BuildingMatch {
        if self.strict_building_match {
            BuildingMatch::Strict
        } else {
            BuildingMatch::Legacy
        }
    }

    pub fn data_source(&self) -> WebDataSource {
        WebDataSource::new(self.server_url.clone(), self.state_endpoint)
    }

    pub fn admin_client(&self) -> crate::client::Result<AdminClient> {
        AdminClient::new(
            self.server_url.clone(),
            self.ban_enforcer_url.clone(),
            self.admin_password.clone(),
        )
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive map dashboard (default)
    Map,

    /// Per-day campaign figures for every date
    Timeline,

    /// Synchronization state of the server
    Status,

    /// Send a control command such as `advance` or `reset`
    Control { verb: String },

    /// Ban a player
    Ban {
        guid: String,
        #[arg(long, default_value_t = 0)]
        days: u32,
        #[arg(long, default_value_t = 0)]
        hours: u32,
    },

    /// Lift a player's ban
    Unban { guid: String },

    /// List pilots
    Pilots(PilotArgs),

    /// List players, optionally by name
    Players {
        #[arg(long)]
        name: Option<String>,
    },

    /// One pilot with their mission records
    Pilot { id: String },

    /// Players currently online
    Online,

    /// Scenarios known to the server
    Scenarios,

    /// Supplies and storage of a region, as computed by the server
    Region { day: usize, id: String },

    /// Storage capacity of an airfield, as computed by the server
    Airfield { day: usize, id: String },

    /// Land transport capacity between two neighbouring regions
    Transport {
        day: usize,
        from: String,
        to: String,
    },

    /// Write one day's regions and airfields as GeoJSON
    Export {
        /// Day index; the latest day when omitted
        day: Option<usize>,
        #[arg(short, long, default_value = "campaign.geojson")]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
pub struct PilotArgs {
    #[arg(long, value_enum)]
    pub health: Option<HealthFilter>,
    #[arg(long)]
    pub coalition: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
}

impl From<PilotArgs> for PilotFilter {
    fn from(args: PilotArgs) -> Self {
        PilotFilter {
            health: args.health,
            coalition: args.coalition,
            country: args.country,
            name: args.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["campaign-map"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.settings.state_endpoint, StateEndpoint::Past);
        assert_eq!(cli.settings.log_file, PathBuf::from("campaign-map.log"));
    }

    #[test]
    fn test_subcommand_with_global_settings() {
        let cli = Cli::try_parse_from([
            "campaign-map",
            "ban",
            "abc-123",
            "--days",
            "2",
            "--server-url",
            "http://campaign:9000",
            "--strict-building-match",
            "--state-endpoint",
            "summary",
        ])
        .unwrap();
        assert_eq!(cli.settings.server_url, "http://campaign:9000");
        assert_eq!(cli.settings.building_match(), BuildingMatch::Strict);
        assert_eq!(cli.settings.state_endpoint, StateEndpoint::Summary);
        match cli.command {
            Some(Command::Ban { guid, days, hours }) => {
                assert_eq!(guid, "abc-123");
                assert_eq!((days, hours), (2, 0));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_pilot_args_into_filter() {
        let cli =
            Cli::try_parse_from(["campaign-map", "pilots", "--health", "only-healthy"]).unwrap();
        let Some(Command::Pilots(args)) = cli.command else {
            panic!("expected pilots");
        };
        let filter = PilotFilter::from(args);
        assert_eq!(filter.health, Some(HealthFilter::OnlyHealthy));
        assert!(filter.name.is_none());
    }

    #[test]
    fn test_transport_positionals() {
        let cli = Cli::try_parse_from(["campaign-map", "transport", "3", "Bonn", "Koeln"]).unwrap();
        let Some(Command::Transport { day, from, to }) = cli.command else {
            panic!("expected transport");
        };
        assert_eq!((day, from.as_str(), to.as_str()), (3, "Bonn", "Koeln"));
    }
}
