use crate::config_file::ConfigFile;
use crate::container::{Container, ContainerOptions};
use crate::settings::HostSettings;
use crate::CoreError;
use lxhost_runtime::{Command, LocalTransport, RemoteSession, RemoteTransport, Transport};
use lxhost_schema::{parse_version, unique_tokens};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Container names reported by `lxc-ls`, deduplicated in first-seen order.
pub(crate) fn list_names(transport: &dyn Transport, args: &[&str]) -> Result<Vec<String>, CoreError> {
    let output = transport.exec(&Command::new("lxc-ls").args(args.iter().copied()))?;
    Ok(unique_tokens(&output))
}

/// Host-level entry point: lists containers, hands out [`Container`]
/// handles and reads host-wide information.
///
/// Whether commands run under `sudo` is decided by the transport alone;
/// `settings.use_sudo` only feeds the `local` and `remote` constructors.
pub struct Lxc {
    transport: Arc<dyn Transport>,
    settings: HostSettings,
}

impl Lxc {
    pub fn new(transport: Arc<dyn Transport>, settings: HostSettings) -> Self {
        if settings.use_sudo != transport.use_sudo() {
            warn!(
                "settings use_sudo={} ignored, {} transport has use_sudo={}",
                settings.use_sudo,
                transport.name(),
                transport.use_sudo()
            );
        }
        Self {
            transport,
            settings,
        }
    }

    /// Run the tools on this machine.
    pub fn local(settings: HostSettings) -> Self {
        let transport = Arc::new(LocalTransport::new(settings.use_sudo));
        Self::new(transport, settings)
    }

    /// Run the tools through a caller-owned session to another host.
    pub fn remote(session: Arc<dyn RemoteSession>, settings: HostSettings) -> Self {
        let transport = Arc::new(RemoteTransport::new(session, settings.use_sudo));
        Self::new(transport, settings)
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn settings(&self) -> &HostSettings {
        &self.settings
    }

    pub fn use_sudo(&self) -> bool {
        self.transport.use_sudo()
    }

    pub fn exec(&self, command: &Command) -> Result<String, CoreError> {
        Ok(self.transport.exec(command)?)
    }

    pub fn ls(&self, args: &[&str]) -> Result<Vec<String>, CoreError> {
        list_names(self.transport.as_ref(), args)
    }

    pub fn exists(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self.ls(&["-1"])?.iter().any(|n| n == name))
    }

    pub fn container(&self, name: &str) -> Result<Container, CoreError> {
        Container::new(ContainerOptions {
            name: Some(name.to_owned()),
            transport: Some(Arc::clone(&self.transport)),
            settings: Some(self.settings.clone()),
        })
    }

    /// A handle for every container `lxc-ls` reports.
    pub fn containers(&self) -> Result<Vec<Container>, CoreError> {
        self.ls(&["-1"])?
            .iter()
            .map(|name| self.container(name))
            .collect()
    }

    /// `lxc-ps` output, one process per line.
    pub fn ps(&self, args: &[&str]) -> Result<Vec<String>, CoreError> {
        let output = self.exec(&Command::new("lxc-ps").args(args.iter().copied()))?;
        Ok(output.lines().map(str::to_owned).collect())
    }

    /// Installed LXC version, if `lxc-version` reports one.
    pub fn version(&self) -> Result<Option<String>, CoreError> {
        let output = self.exec(&Command::new("lxc-version"))?;
        let version = parse_version(&output);
        if version.is_none() {
            debug!("no version line in lxc-version output: {output}");
        }
        Ok(version)
    }

    /// `lxc-checkconfig` report with terminal colour codes removed.
    pub fn checkconfig(&self) -> Result<Vec<String>, CoreError> {
        let output = self.exec(&Command::new("lxc-checkconfig"))?;
        Ok(console::strip_ansi_codes(&output)
            .lines()
            .map(str::to_owned)
            .collect())
    }

    /// The host-wide `lxc.conf`.
    pub fn config(&self) -> Result<ConfigFile, CoreError> {
        ConfigFile::open(Arc::clone(&self.transport), self.settings.host_config_path())
    }
}

impl fmt::Debug for Lxc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lxc")
            .field("transport", &self.transport.name())
            .field("use_sudo", &self.use_sudo())
            .finish_non_exhaustive()
    }
}
