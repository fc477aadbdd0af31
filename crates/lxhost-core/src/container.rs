use crate::config_file::ConfigFile;
use crate::lxc::list_names;
use crate::settings::HostSettings;
use crate::CoreError;
use lxhost_runtime::{Command, FileWrite, Transport};
use lxhost_schema::{parse_pid, parse_state, unique_lines, ContainerName, ContainerState};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How many times `bootstrap` renders and runs its script before giving up.
pub const BOOTSTRAP_ATTEMPTS: u32 = 5;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

static BOOTSTRAP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Collaborators a [`Container`] is built from. `name` and `transport` are
/// required; `settings` falls back to [`HostSettings::default`].
#[derive(Default)]
pub struct ContainerOptions {
    pub name: Option<String>,
    pub transport: Option<Arc<dyn Transport>>,
    pub settings: Option<HostSettings>,
}

/// Handle on one named container.
///
/// Holds no state of its own: state and pid are read from `lxc-info` on
/// every call, and lifecycle operations return the state observed right
/// after the command finished.
pub struct Container {
    name: ContainerName,
    transport: Arc<dyn Transport>,
    settings: HostSettings,
    retry_delay: Duration,
}

impl Container {
    pub fn new(options: ContainerOptions) -> Result<Self, CoreError> {
        let transport = options
            .transport
            .ok_or_else(|| CoreError::Construction("a transport is required".to_owned()))?;
        let name = options
            .name
            .ok_or_else(|| CoreError::Construction("a container name is required".to_owned()))?;
        let name = ContainerName::new(name).map_err(|e| CoreError::Construction(e.to_string()))?;
        Ok(Self {
            name,
            transport,
            settings: options.settings.unwrap_or_default(),
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Pause between `bootstrap` attempts.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn name(&self) -> &ContainerName {
        &self.name
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    fn command(&self, program: &str) -> Command {
        Command::new(program).args(["-n", self.name.as_str()])
    }

    fn exec(&self, program: &str, args: &[&str]) -> Result<String, CoreError> {
        let command = self.command(program).args(args.iter().copied());
        Ok(self.transport.exec(&command)?)
    }

    pub fn exists(&self) -> Result<bool, CoreError> {
        let names = list_names(self.transport.as_ref(), &["-1"])?;
        Ok(names.iter().any(|n| *n == *self.name))
    }

    /// Current state. Containers missing from `lxc-ls` are `NotCreated`
    /// and `lxc-info` is not consulted for them.
    pub fn state(&self) -> Result<ContainerState, CoreError> {
        if !self.exists()? {
            return Ok(ContainerState::NotCreated);
        }
        let output = self.exec("lxc-info", &["--state"])?;
        Ok(parse_state(&output))
    }

    /// Init pid, or `-1` when the output carries none.
    pub fn pid(&self) -> Result<i64, CoreError> {
        let output = self.exec("lxc-info", &["--pid"])?;
        Ok(parse_pid(&output))
    }

    /// `lxc-info` output lines without repeats.
    pub fn info(&self, args: &[&str]) -> Result<Vec<String>, CoreError> {
        let output = self.exec("lxc-info", args)?;
        Ok(unique_lines(&output))
    }

    /// Block until the container reaches one of `states`, for at most
    /// `timeout`. Returns `false` on timeout.
    ///
    /// `lxc-wait` runs on a worker thread. If the deadline passes first the
    /// worker is abandoned, not cancelled: over a remote session the
    /// `lxc-wait` process keeps running on the far host until it finishes.
    pub fn wait(&self, states: &[ContainerState], timeout: Duration) -> Result<bool, CoreError> {
        if states.is_empty() {
            return Err(CoreError::NoWaitStates);
        }
        if let Some(state) = states.iter().find(|s| !s.is_reportable()) {
            return Err(CoreError::UnreportableWaitState(*state));
        }
        let state_arg = states
            .iter()
            .map(|s| s.wait_name())
            .collect::<Vec<_>>()
            .join("|");
        let command = self.command("lxc-wait").arg("-s").arg(format!("'{state_arg}'"));

        let transport = Arc::clone(&self.transport);
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name(format!("lxc-wait-{}", self.name))
            .spawn(move || {
                // receiver may be gone after a timeout
                let _ = tx.send(transport.exec(&command));
            })?;

        match rx.recv_timeout(timeout) {
            Ok(result) => {
                result?;
                debug!("{} reached {state_arg}", self.name);
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "timed out after {:?} waiting for {} to reach {state_arg}; lxc-wait left running",
                    timeout, self.name
                );
                Ok(false)
            }
            Err(RecvTimeoutError::Disconnected) => Err(CoreError::Io(std::io::Error::other(
                "lxc-wait worker exited without a result",
            ))),
        }
    }

    fn lifecycle(&self, program: &str, args: &[&str]) -> Result<ContainerState, CoreError> {
        info!("{program} {}", self.name);
        let output = self.exec(program, args)?;
        if !output.is_empty() {
            debug!("{program} output: {output}");
        }
        self.state()
    }

    pub fn create(&self, args: &[&str]) -> Result<ContainerState, CoreError> {
        self.lifecycle("lxc-create", args)
    }

    /// Fails on the tool side for running containers unless `-f` is passed.
    pub fn destroy(&self, args: &[&str]) -> Result<ContainerState, CoreError> {
        self.lifecycle("lxc-destroy", args)
    }

    /// Start in the background (`--daemon`).
    pub fn start(&self, args: &[&str]) -> Result<ContainerState, CoreError> {
        let mut all = vec!["--daemon"];
        all.extend_from_slice(args);
        self.lifecycle("lxc-start", &all)
    }

    pub fn stop(&self, args: &[&str]) -> Result<ContainerState, CoreError> {
        self.lifecycle("lxc-stop", args)
    }

    pub fn restart(&self) -> Result<ContainerState, CoreError> {
        self.stop(&[])?;
        self.start(&[])
    }

    /// Same as [`Container::restart`].
    pub fn reload(&self) -> Result<ContainerState, CoreError> {
        self.restart()
    }

    /// Start a throwaway copy through `lxc-start-ephemeral`, whose union
    /// layer lives under `fs_root(true)`. The tool takes the source
    /// container from `args` (`-o NAME`), so no `-n` is added.
    pub fn start_ephemeral(&self, args: &[&str]) -> Result<String, CoreError> {
        info!("lxc-start-ephemeral from {}", self.name);
        let command = Command::new("lxc-start-ephemeral").args(args.iter().copied());
        Ok(self.transport.exec(&command)?)
    }

    /// `lxc-console` output. Over a capturing transport this is not an
    /// interactive session.
    pub fn console(&self, args: &[&str]) -> Result<String, CoreError> {
        self.exec("lxc-console", args)
    }

    pub fn freeze(&self, args: &[&str]) -> Result<ContainerState, CoreError> {
        self.lifecycle("lxc-freeze", args)
    }

    pub fn unfreeze(&self, args: &[&str]) -> Result<ContainerState, CoreError> {
        self.lifecycle("lxc-unfreeze", args)
    }

    /// Run a command inside the running container; returns its output.
    pub fn attach(&self, args: &[&str]) -> Result<String, CoreError> {
        self.exec("lxc-attach", args)
    }

    /// Launch the container around a single application.
    pub fn execute(&self, args: &[&str]) -> Result<String, CoreError> {
        let config_path = self.config_path();
        let mut all = vec!["-f", config_path.as_str(), "--"];
        all.extend_from_slice(args);
        self.exec("lxc-execute", &all)
    }

    /// Copy this container to `new_name` and return a handle on the copy.
    pub fn clone_to(&self, new_name: &str, args: &[&str]) -> Result<Container, CoreError> {
        let copy = Container::new(ContainerOptions {
            name: Some(new_name.to_owned()),
            transport: Some(Arc::clone(&self.transport)),
            settings: Some(self.settings.clone()),
        })?;
        let command = Command::new("lxc-clone")
            .args(["-o", self.name.as_str(), "-n", copy.name.as_str()])
            .args(args.iter().copied());
        let output = self.transport.exec(&command)?;
        if !output.is_empty() {
            debug!("lxc-clone output: {output}");
        }
        Ok(copy)
    }

    /// Render `script` into the container's `/tmp` and run it with bash
    /// through `lxc-attach`. The container must be running.
    ///
    /// A freshly written file is sometimes not yet visible inside the
    /// container; when bash reports it missing the whole operation is
    /// repeated, up to [`BOOTSTRAP_ATTEMPTS`] times.
    pub fn bootstrap(&self, script: &str) -> Result<String, CoreError> {
        let mut guest_path = String::new();
        for attempt in 1..=BOOTSTRAP_ATTEMPTS {
            guest_path = format!("/tmp/{}", bootstrap_file_name());
            let host_path = format!("{}{guest_path}", self.fs_root(false));

            let write = FileWrite::new(host_path, script)
                .with_owner("root:root")
                .with_mode("0755");
            self.transport.write_file(&write)?;

            let output = self.attach(&["--", "/bin/bash", guest_path.as_str()])?;
            if !output.contains(&format!("{guest_path}: No such file or directory")) {
                return Ok(output);
            }

            warn!(
                "bootstrap attempt {attempt}/{BOOTSTRAP_ATTEMPTS} for {}: {guest_path} not found",
                self.name
            );
            if attempt < BOOTSTRAP_ATTEMPTS {
                thread::sleep(self.retry_delay);
            }
        }
        Err(CoreError::BootstrapFileMissing {
            path: guest_path,
            attempts: BOOTSTRAP_ATTEMPTS,
        })
    }

    pub fn config_path(&self) -> String {
        self.settings.container_config_path(&self.name)
    }

    pub fn config(&self) -> Result<ConfigFile, CoreError> {
        ConfigFile::open(Arc::clone(&self.transport), self.config_path())
    }

    pub fn container_root(&self) -> String {
        self.settings.container_root(&self.name)
    }

    /// Root filesystem on the host; `delta0` is the union layer used by
    /// ephemeral containers.
    pub fn fs_root(&self, ephemeral: bool) -> String {
        let leaf = if ephemeral { "delta0" } else { "rootfs" };
        format!("{}/{leaf}", self.container_root())
    }
}

macro_rules! state_predicates {
    ($($fn_name:ident => $state:ident),* $(,)?) => {
        impl Container {
            $(
                #[doc = concat!("Whether `state()` is `", stringify!($state), "`.")]
                pub fn $fn_name(&self) -> Result<bool, CoreError> {
                    Ok(self.state()? == ContainerState::$state)
                }
            )*
        }
    };
}

state_predicates!(
    is_not_created => NotCreated,
    is_stopped => Stopped,
    is_starting => Starting,
    is_running => Running,
    is_stopping => Stopping,
    is_aborting => Aborting,
    is_freezing => Freezing,
    is_frozen => Frozen,
    is_thawed => Thawed,
    is_unknown => Unknown,
);

fn bootstrap_file_name() -> String {
    let seq = BOOTSTRAP_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("bootstrap-{}-{seq}", std::process::id())
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name.as_str())
            .finish_non_exhaustive()
    }
}
