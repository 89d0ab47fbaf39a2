//! Skyline cloud provisioning core
//!
//! This crate holds what every Skyline provider shares: the resource handler
//! abstraction, the reconciled resource state, and the three pieces of logic
//! the handlers lean on.
//!
//! - **Order polling**: wait for an asynchronous product order to show up as
//!   exactly one resource on the account ([`OrderPoller`])
//! - **Qualified names**: parse and print `[/namespace/][package/]entity`
//!   identifiers ([`QualifiedName`])
//! - **Key/value codec**: convert annotation and parameter arrays to maps
//!   and compare them order-insensitively ([`keyvalue`])
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  skyline CLI                     │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                skyline-cloud                     │
//! │  trait ResourceHandler / DataSource              │
//! │  OrderPoller · QualifiedName · keyvalue          │
//! └───────┬─────────────────────────┬───────────────┘
//!         │                         │
//! ┌───────▼────────┐       ┌────────▼────────┐
//! │   softlayer    │       │    openwhisk    │
//! │ firewall, vlan │       │ action, trigger │
//! │                │       │ rule, package   │
//! └────────────────┘       └─────────────────┘
//! ```

pub mod error;
pub mod keyvalue;
pub mod poller;
pub mod provider;
pub mod qualified_name;
pub mod state;

// Re-exports
pub use error::{CloudError, Result};
pub use keyvalue::{KeyValue, KeyValueList, KeyValueMap};
pub use poller::{
    Clock, ManualClock, OrderFilter, OrderPoller, PollConfig, PollError, TokioClock,
};
pub use provider::{DataSource, ResourceConfig, ResourceHandler, RetryConfig};
pub use qualified_name::{DEFAULT_NAMESPACE, QualifiedName};
pub use state::{ResourceState, ResourceStatus};

/// Re-exported so callers can cancel a running poll without a direct dependency
pub use tokio_util::sync::CancellationToken;
