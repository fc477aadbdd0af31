use crate::CoreError;
use lxhost_runtime::{shell_quote, Command, FileWrite, Transport};
use lxhost_schema::Config;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Collaborators a [`ConfigFile`] is built from. Both are required.
#[derive(Default)]
pub struct ConfigFileOptions {
    pub transport: Option<Arc<dyn Transport>>,
    pub path: Option<String>,
}

/// An LXC configuration file on the target host, plus its parsed content.
///
/// The content starts empty; `load` replaces it with what the file holds and
/// `save` writes it back in one here-document write.
pub struct ConfigFile {
    transport: Arc<dyn Transport>,
    path: String,
    config: Config,
}

impl ConfigFile {
    pub fn new(options: ConfigFileOptions) -> Result<Self, CoreError> {
        let transport = options
            .transport
            .ok_or_else(|| CoreError::Config("a transport is required".to_owned()))?;
        let path = options
            .path
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| CoreError::Config("a configuration path is required".to_owned()))?;
        Ok(Self {
            transport,
            path,
            config: Config::new(),
        })
    }

    pub fn open(transport: Arc<dyn Transport>, path: impl Into<String>) -> Result<Self, CoreError> {
        Self::new(ConfigFileOptions {
            transport: Some(transport),
            path: Some(path.into()),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Point at another file. The in-memory content is kept.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Read and parse the file. A missing file reads as empty.
    pub fn load(&mut self) -> Result<&Config, CoreError> {
        let content = self.transport.exec(
            &Command::new("cat")
                .arg(shell_quote(&self.path))
                .arg("2>/dev/null"),
        )?;
        self.config = Config::parse(&content);
        debug!(
            "loaded {}: {} keys, {} network blocks",
            self.path,
            self.config.keys().len(),
            self.config.networks().len()
        );
        Ok(&self.config)
    }

    /// Serialize the content and write it to the file.
    pub fn save(&self) -> Result<String, CoreError> {
        info!("saving configuration to {}", self.path);
        let write = FileWrite::new(self.path.as_str(), self.config.build());
        Ok(self.transport.write_file(&write)?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }
}

impl fmt::Debug for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigFile")
            .field("path", &self.path)
            .field("transport", &self.transport.name())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lxhost_runtime::MockTransport;

    const CONTAINER_CONFIG: &str = "\
lxc.utsname = server-east-1
lxc.rootfs = /var/lib/lxc/server-east-1/rootfs
lxc.network.type = veth
lxc.network.flags = up
lxc.network.link = lxcbr0
";

    #[test]
    fn construction_requires_transport_and_path() {
        let missing_transport = ConfigFile::new(ConfigFileOptions {
            transport: None,
            path: Some("/etc/lxc/web".to_owned()),
        });
        assert!(matches!(missing_transport, Err(CoreError::Config(_))));

        let missing_path = ConfigFile::new(ConfigFileOptions {
            transport: Some(Arc::new(MockTransport::new())),
            path: None,
        });
        assert!(matches!(missing_path, Err(CoreError::Config(_))));

        let blank_path = ConfigFile::open(Arc::new(MockTransport::new()), "  ");
        assert!(matches!(blank_path, Err(CoreError::Config(_))));
    }

    #[test]
    fn load_reads_through_the_transport() {
        let mock = Arc::new(MockTransport::new().with_sudo(true).respond("cat", CONTAINER_CONFIG));
        let mut file = ConfigFile::open(mock.clone(), "/etc/lxc/server-east-1").unwrap();

        let config = file.load().unwrap();
        assert_eq!(config.get("lxc.utsname").unwrap(), ["server-east-1"]);
        assert_eq!(config.networks().len(), 1);
        assert_eq!(
            mock.calls(),
            vec!["sudo cat /etc/lxc/server-east-1 2>/dev/null".to_owned()]
        );
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let mock = Arc::new(MockTransport::new());
        let mut file = ConfigFile::open(mock, "/etc/lxc/ghost").unwrap();
        assert!(file.load().unwrap().is_empty());
    }

    #[test]
    fn save_writes_the_built_content() {
        let mock = Arc::new(MockTransport::new().with_sudo(true).respond("cat", CONTAINER_CONFIG));
        let mut file = ConfigFile::open(mock.clone(), "/etc/lxc/server-east-1").unwrap();
        file.load().unwrap();
        file.config_mut().replace("lxc.utsname", "server-west-2");
        file.save().unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[1],
            "cat <<'LXHOST_EOF' | sudo tee /etc/lxc/server-east-1\n\
lxc.utsname = server-west-2\n\
lxc.rootfs = /var/lib/lxc/server-east-1/rootfs\n\
lxc.network.type = veth\n\
lxc.network.flags = up\n\
lxc.network.link = lxcbr0\n\
LXHOST_EOF"
        );
    }

    #[test]
    fn set_path_keeps_content() {
        let mock = Arc::new(MockTransport::new().respond("cat", CONTAINER_CONFIG));
        let mut file = ConfigFile::open(mock, "/etc/lxc/a").unwrap();
        file.load().unwrap();
        file.set_path("/tmp/copy");
        assert_eq!(file.path(), "/tmp/copy");
        assert!(!file.config().is_empty());
        assert_eq!(file.into_config().keys().len(), 2);
    }
}
