pub mod action;
pub mod firewall;
pub mod name;
pub mod package;
pub mod vlan;
