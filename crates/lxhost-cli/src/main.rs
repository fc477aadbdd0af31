mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::lifecycle::Action;
use commands::{exit_code_for, EXIT_CONFIG_ERROR};
use lxhost_core::{HostSettings, Lxc};
use lxhost_schema::ContainerState;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "lxhost",
    version,
    about = "Manage LXC containers through the LXC command-line tools"
)]
struct Cli {
    /// Settings file (defaults to ~/.config/lxhost/settings.json).
    #[arg(long, global = true)]
    settings: Option<String>,

    /// Prefix every LXC command with sudo.
    #[arg(long, default_value_t = false, global = true)]
    sudo: bool,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List containers and their states.
    List,
    /// Exit zero if the container exists.
    Exists { name: String },
    /// Print the container state.
    State { name: String },
    /// Print the container init pid (-1 when not running).
    Pid { name: String },
    /// Print lxc-info output.
    Info { name: String },
    /// Create a container (template arguments after --).
    Create {
        name: String,
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Destroy a container.
    Destroy {
        name: String,
        /// Stop the container first if it is running.
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },
    /// Start a container in the background.
    Start { name: String },
    /// Stop a container.
    Stop { name: String },
    /// Stop then start a container.
    Restart { name: String },
    /// Freeze all processes of a container.
    Freeze { name: String },
    /// Thaw a frozen container.
    Unfreeze { name: String },
    /// Block until the container reaches one of the given states.
    Wait {
        name: String,
        /// Target state; repeat for alternatives.
        #[arg(
            long = "state",
            required = true,
            num_args = 1..,
            value_parser = ContainerState::parse_reportable
        )]
        states: Vec<ContainerState>,
        /// Give up after this many seconds (defaults to the settings value).
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Run a command inside a running container (command after --).
    Attach {
        name: String,
        #[arg(required = true, last = true)]
        command: Vec<String>,
    },
    /// Copy a local script into a running container and run it with bash.
    Bootstrap { name: String, script: PathBuf },
    /// Show or edit a container's configuration file.
    Config {
        name: String,
        /// Print the values of one key.
        #[arg(long)]
        get: Option<String>,
        /// Replace a key, as KEY=VALUE. Repeatable.
        #[arg(long, value_parser = commands::config::parse_assignment)]
        set: Vec<(String, String)>,
    },
    /// Print lxhost and LXC versions.
    Version,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("LXHOST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let settings = match load_settings(cli.settings.as_deref()) {
        Ok(settings) => {
            let use_sudo = settings.use_sudo || cli.sudo;
            settings.with_sudo(use_sudo)
        }
        Err(msg) => {
            eprintln!("error: {msg}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    let wait_default = Duration::from_secs(settings.wait_timeout_secs);
    let lxc = Lxc::local(settings);
    tracing::debug!("using {lxc:?}");
    let json = cli.json;

    let result = match cli.command {
        Commands::List => commands::list::run(&lxc, json),
        Commands::Exists { name } => commands::query::exists(&lxc, &name, json),
        Commands::State { name } => commands::query::state(&lxc, &name, json),
        Commands::Pid { name } => commands::query::pid(&lxc, &name, json),
        Commands::Info { name } => commands::query::info(&lxc, &name, json),
        Commands::Create { name, args } => {
            commands::lifecycle::run(&lxc, Action::Create, &name, &args, json)
        }
        Commands::Destroy { name, force } => {
            let args = if force { vec!["-f".to_owned()] } else { Vec::new() };
            commands::lifecycle::run(&lxc, Action::Destroy, &name, &args, json)
        }
        Commands::Start { name } => commands::lifecycle::run(&lxc, Action::Start, &name, &[], json),
        Commands::Stop { name } => commands::lifecycle::run(&lxc, Action::Stop, &name, &[], json),
        Commands::Restart { name } => {
            commands::lifecycle::run(&lxc, Action::Restart, &name, &[], json)
        }
        Commands::Freeze { name } => {
            commands::lifecycle::run(&lxc, Action::Freeze, &name, &[], json)
        }
        Commands::Unfreeze { name } => {
            commands::lifecycle::run(&lxc, Action::Unfreeze, &name, &[], json)
        }
        Commands::Wait {
            name,
            states,
            timeout,
        } => {
            let timeout = timeout.map_or(wait_default, Duration::from_secs);
            commands::wait::run(&lxc, &name, &states, timeout, json)
        }
        Commands::Attach { name, command } => commands::attach::run(&lxc, &name, &command, json),
        Commands::Bootstrap { name, script } => {
            commands::attach::bootstrap(&lxc, &name, &script, json)
        }
        Commands::Config { name, get, set } => {
            commands::config::run(&lxc, &name, get.as_deref(), &set, json)
        }
        Commands::Version => commands::version::run(&lxc, json),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}

fn load_settings(path: Option<&str>) -> Result<HostSettings, String> {
    match path {
        Some(path) => HostSettings::load(&expand_tilde(path)),
        None => HostSettings::load_default(),
    }
    .map_err(|e| match e {
        lxhost_core::CoreError::Io(io) => format!("settings error: {io}"),
        other => other.to_string(),
    })
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
