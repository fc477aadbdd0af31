//! Typed model of what the LXC tools print and read for lxhost.
//!
//! This crate is the schema layer: the closed `ContainerState` enumeration,
//! extraction of single-value marker lines (`state:`, `pid:`, `lxc version:`)
//! from command output, the `ContainerName` identifier, and the `Config`
//! codec that round-trips LXC configuration files with their ordered
//! network blocks.

pub mod config;
pub mod marker;
pub mod state;
pub mod types;

pub use config::{
    Config, NetworkBlock, Section, NETWORK_KEY_ORDER, NETWORK_PREFIX, NETWORK_TYPE_KEY,
};
pub use marker::{parse_pid, parse_state, parse_version, unique_lines, unique_tokens, NO_PID};
pub use state::ContainerState;
pub use types::ContainerName;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unknown container state: '{0}'")]
    UnknownState(String),
    #[error("state '{0}' is never reported by the LXC tools")]
    UnreportableState(String),
    #[error("container name must not be empty")]
    EmptyName,
}
