use crate::output;
use crate::session::ClientSession;
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;
use skyline_cloud::{ResourceConfig, ResourceHandler};
use skyline_cloud_softlayer::FIREWALL_RESOURCE;

#[derive(Subcommand)]
pub enum FirewallCommands {
    /// Order a dedicated firewall for a public VLAN
    Create {
        /// Public VLAN id
        #[arg(long)]
        public_vlan_id: i64,
        /// High-availability pair
        #[arg(long)]
        ha: bool,
        /// Tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Show a firewall
    Show {
        /// Firewall id
        id: String,
    },
    /// Cancel a firewall
    Delete {
        /// Firewall id
        id: String,
    },
}

pub async fn handle(cmd: FirewallCommands, session: &ClientSession) -> anyhow::Result<()> {
    let handler = session.firewall_handler()?;

    match cmd {
        FirewallCommands::Create {
            public_vlan_id,
            ha,
            tags,
        } => {
            println!(
                "{} firewall for VLAN {}...",
                "Ordering".blue(),
                public_vlan_id.to_string().cyan()
            );
            let config = ResourceConfig::new(
                FIREWALL_RESOURCE,
                "cli",
                json!({
                    "public_vlan_id": public_vlan_id,
                    "ha_enabled": ha,
                    "tags": tags,
                }),
            );
            let state = handler.create(&config).await?;
            output::print_state(&state);
        }
        FirewallCommands::Show { id } => {
            let state = handler.read(&id).await?;
            output::print_state(&state);
        }
        FirewallCommands::Delete { id } => {
            handler.delete(&id).await?;
            output::print_deleted("firewall", &id);
        }
    }
    Ok(())
}
