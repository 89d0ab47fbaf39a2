//! OpenWhisk provider for Skyline
//!
//! Manages actions, triggers, rules and packages in an OpenWhisk namespace.
//! The namespace credentials are either configured directly as a
//! `uuid:key` auth key or looked up from an IBM Cloud API key.
//!
//! Resource ids are the `[package/]entity` path when the entity lives in the
//! client's default namespace, and the fully qualified `/namespace/path`
//! otherwise.
//!
//! # Example
//!
//! ```no_run
//! use skyline_cloud::ResourceHandler;
//! use skyline_cloud_openwhisk::{ActionHandler, WhiskClient, WhiskConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WhiskConfig::new("openwhisk.ng.bluemix.net", "uuid:key").with_namespace("org_dev");
//! let actions = ActionHandler::new(Arc::new(WhiskClient::new(config)?));
//! let state = actions.read("utils/hello").await?;
//! println!("{} version {}", state.id, state.attributes["version"]);
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod auth;
pub mod client;
pub mod error;
pub mod exec;
pub mod names;
pub mod package;
pub mod rule;
pub mod trigger;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use action::{ACTION_RESOURCE, ActionHandler, ActionSpec};
pub use auth::{connect_with_api_key, region_endpoint};
pub use client::{Collection, WhiskApi, WhiskClient, WhiskConfig};
pub use error::{Result, WhiskError};
pub use exec::{ExecConfig, LimitsConfig};
pub use names::EntityName;
pub use package::{PACKAGE_RESOURCE, PackageDataSource, PackageHandler};
pub use rule::{RULE_RESOURCE, RuleHandler};
pub use trigger::{FeedConfig, TRIGGER_RESOURCE, TriggerHandler, TriggerSpec};
