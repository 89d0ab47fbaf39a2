mod commands;
mod output;
mod session;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skyline")]
#[command(about = "Provision IBM Cloud VLANs, firewalls and OpenWhisk entities", long_about = None)]
struct Cli {
    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a qualified OpenWhisk name
    Name {
        /// `[/][namespace/][package/]entity`
        raw: String,
        /// Namespace to bind when the name has none
        #[arg(short, long)]
        namespace: Option<String>,
    },
    /// Network VLANs
    #[command(subcommand)]
    Vlan(commands::vlan::VlanCommands),
    /// Dedicated hardware firewalls
    #[command(subcommand)]
    Firewall(commands::firewall::FirewallCommands),
    /// OpenWhisk actions
    #[command(subcommand)]
    Action(commands::action::ActionCommands),
    /// OpenWhisk packages
    #[command(subcommand)]
    Package(commands::package::PackageCommands),
    /// Show version
    Version,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Neither needs credentials
    match &cli.command {
        Commands::Version => {
            println!("skyline {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::Name { raw, namespace } => {
            return commands::name::handle(raw, namespace.as_deref());
        }
        _ => {}
    }

    let config = skyline_config::Config::load()?;
    let session = session::ClientSession::new(config);

    let cancel = session.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, stopping...".yellow());
            cancel.cancel();
        }
    });

    match cli.command {
        Commands::Vlan(cmd) => commands::vlan::handle(cmd, &session).await?,
        Commands::Firewall(cmd) => commands::firewall::handle(cmd, &session).await?,
        Commands::Action(cmd) => commands::action::handle(cmd, &session).await?,
        Commands::Package(cmd) => commands::package::handle(cmd, &session).await?,
        Commands::Version | Commands::Name { .. } => {
            unreachable!("handled before config loading")
        }
    }

    Ok(())
}
