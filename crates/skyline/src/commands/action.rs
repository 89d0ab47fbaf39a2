use crate::output;
use crate::session::ClientSession;
use clap::Subcommand;
use skyline_cloud::ResourceHandler;
use skyline_cloud_openwhisk::ActionHandler;

#[derive(Subcommand)]
pub enum ActionCommands {
    /// Show an action
    Show {
        /// `[package/]name`, or `/namespace/[package/]name`
        id: String,
    },
    /// Delete an action
    Delete {
        /// `[package/]name`, or `/namespace/[package/]name`
        id: String,
    },
}

pub async fn handle(cmd: ActionCommands, session: &ClientSession) -> anyhow::Result<()> {
    let handler = ActionHandler::new(session.openwhisk().await?);

    match cmd {
        ActionCommands::Show { id } => {
            let state = handler.read(&id).await?;
            output::print_state(&state);
        }
        ActionCommands::Delete { id } => {
            handler.delete(&id).await?;
            output::print_deleted("action", &id);
        }
    }
    Ok(())
}
