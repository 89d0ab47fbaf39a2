use crate::output;
use crate::session::ClientSession;
use clap::Subcommand;
use serde_json::json;
use skyline_cloud::{DataSource, ResourceConfig};
use skyline_cloud_openwhisk::{PACKAGE_RESOURCE, PackageDataSource};

#[derive(Subcommand)]
pub enum PackageCommands {
    /// Show a package, including bindings to shared packages
    Show {
        /// `name` or `/namespace/name`
        name: String,
    },
}

pub async fn handle(cmd: PackageCommands, session: &ClientSession) -> anyhow::Result<()> {
    let source = PackageDataSource::new(session.openwhisk().await?);

    match cmd {
        PackageCommands::Show { name } => {
            let query = ResourceConfig::new(PACKAGE_RESOURCE, "cli", json!({ "name": name }));
            let state = source.read(&query).await?;
            output::print_state(&state);
        }
    }
    Ok(())
}
