//! Container lifecycle and configuration over a command transport.
//!
//! This crate ties the schema layer and the transports together: `Container`
//! issues LXC tool commands for one named container and reads its state back,
//! `ConfigFile` loads and saves configuration files through the transport,
//! and `Lxc` is the host-level entry point that hands both out. Nothing here
//! caches container state; every query goes to the tools.

pub mod config_file;
pub mod container;
pub mod lxc;
pub mod settings;

pub use config_file::{ConfigFile, ConfigFileOptions};
pub use container::{Container, ContainerOptions, BOOTSTRAP_ATTEMPTS};
pub use lxc::Lxc;
pub use settings::HostSettings;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("cannot construct container: {0}")]
    Construction(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("transport error: {0}")]
    Transport(#[from] lxhost_runtime::TransportError),
    #[error("schema error: {0}")]
    Schema(#[from] lxhost_schema::SchemaError),
    #[error("bootstrap script {path} not visible in container after {attempts} attempts")]
    BootstrapFileMissing { path: String, attempts: u32 },
    #[error("wait needs at least one target state")]
    NoWaitStates,
    #[error("cannot wait for state '{0}': lxc-wait never reports it")]
    UnreportableWaitState(lxhost_schema::ContainerState),
    #[error("settings error: {0}")]
    Settings(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
