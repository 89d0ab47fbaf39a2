use crate::output;
use crate::session::ClientSession;
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;
use skyline_cloud::{ResourceConfig, ResourceHandler};
use skyline_cloud_softlayer::VLAN_RESOURCE;

#[derive(Subcommand)]
pub enum VlanCommands {
    /// Order a VLAN and wait for it to be provisioned
    Create {
        /// Datacenter name (e.g. dal06)
        #[arg(short, long)]
        datacenter: String,
        /// PUBLIC or PRIVATE
        #[arg(short = 't', long = "type", value_parser = ["PUBLIC", "PRIVATE"])]
        vlan_type: String,
        /// Number of static public IP addresses
        #[arg(short, long)]
        subnet_size: u32,
        /// VLAN name
        #[arg(short, long)]
        name: Option<String>,
        /// Router hostname (fcr* for public, bcr* for private)
        #[arg(short, long)]
        router_hostname: Option<String>,
        /// Tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Show a VLAN
    Show {
        /// VLAN id
        id: String,
    },
    /// Cancel a VLAN
    Delete {
        /// VLAN id
        id: String,
    },
}

pub async fn handle(cmd: VlanCommands, session: &ClientSession) -> anyhow::Result<()> {
    let handler = session.vlan_handler()?;

    match cmd {
        VlanCommands::Create {
            datacenter,
            vlan_type,
            subnet_size,
            name,
            router_hostname,
            tags,
        } => {
            println!(
                "{} {} VLAN in {}...",
                "Ordering".blue(),
                vlan_type,
                datacenter.cyan()
            );
            let config = ResourceConfig::new(
                VLAN_RESOURCE,
                "cli",
                json!({
                    "datacenter": datacenter,
                    "type": vlan_type,
                    "subnet_size": subnet_size,
                    "name": name.unwrap_or_default(),
                    "router_hostname": router_hostname.unwrap_or_default(),
                    "tags": tags,
                }),
            );
            let state = handler.create(&config).await?;
            output::print_state(&state);
        }
        VlanCommands::Show { id } => {
            let state = handler.read(&id).await?;
            output::print_state(&state);
        }
        VlanCommands::Delete { id } => {
            handler.delete(&id).await?;
            output::print_deleted("VLAN", &id);
        }
    }
    Ok(())
}
