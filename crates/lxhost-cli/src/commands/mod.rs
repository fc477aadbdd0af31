pub mod attach;
pub mod completions;
pub mod config;
pub mod lifecycle;
pub mod list;
pub mod query;
pub mod version;
pub mod wait;

use lxhost_core::{Container, Lxc};
use lxhost_schema::ContainerState;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_TRANSPORT_ERROR: u8 = 3;
pub const EXIT_WAIT_TIMEOUT: u8 = 4;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn colorize_state(state: ContainerState) -> String {
    use console::Style;
    let text = state.as_str();
    match state {
        ContainerState::Running => Style::new().green().bold().apply_to(text).to_string(),
        ContainerState::Stopped => Style::new().yellow().apply_to(text).to_string(),
        ContainerState::Frozen | ContainerState::Freezing => {
            Style::new().blue().apply_to(text).to_string()
        }
        ContainerState::Starting | ContainerState::Stopping | ContainerState::Thawed => {
            Style::new().cyan().apply_to(text).to_string()
        }
        ContainerState::Aborting => Style::new().red().apply_to(text).to_string(),
        ContainerState::NotCreated | ContainerState::Unknown => {
            Style::new().dim().apply_to(text).to_string()
        }
    }
}

pub fn container(lxc: &Lxc, name: &str) -> Result<Container, String> {
    lxc.container(name).map_err(|e| e.to_string())
}

/// Map an error message from a command to its process exit code.
pub fn exit_code_for(message: &str) -> u8 {
    if message.starts_with("config error:") || message.starts_with("settings error:") {
        EXIT_CONFIG_ERROR
    } else if message.starts_with("transport error:") {
        EXIT_TRANSPORT_ERROR
    } else {
        EXIT_FAILURE
    }
}
