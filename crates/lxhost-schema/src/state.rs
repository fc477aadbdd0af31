use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Observed lifecycle state of a container.
///
/// `NotCreated` never comes from `lxc-info`; it is reported when the
/// container is absent from the `lxc-ls` listing. `Unknown` is what any
/// unparsable or unexpected state text maps to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContainerState {
    NotCreated,
    Stopped,
    Starting,
    Running,
    Stopping,
    Aborting,
    Freezing,
    Frozen,
    Thawed,
    Unknown,
}

impl ContainerState {
    pub const ALL: [ContainerState; 10] = [
        ContainerState::NotCreated,
        ContainerState::Stopped,
        ContainerState::Starting,
        ContainerState::Running,
        ContainerState::Stopping,
        ContainerState::Aborting,
        ContainerState::Freezing,
        ContainerState::Frozen,
        ContainerState::Thawed,
        ContainerState::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContainerState::NotCreated => "not_created",
            ContainerState::Stopped => "stopped",
            ContainerState::Starting => "starting",
            ContainerState::Running => "running",
            ContainerState::Stopping => "stopping",
            ContainerState::Aborting => "aborting",
            ContainerState::Freezing => "freezing",
            ContainerState::Frozen => "frozen",
            ContainerState::Thawed => "thawed",
            ContainerState::Unknown => "unknown",
        }
    }

    /// Name as `lxc-wait -s` expects it.
    pub fn wait_name(self) -> String {
        self.as_str().to_uppercase()
    }

    /// Map a word printed by `lxc-info`. Anything that is not one of the
    /// tool's own states is `Unknown`.
    pub fn from_reported(word: &str) -> Self {
        word.parse()
            .ok()
            .filter(|state: &ContainerState| state.is_reportable())
            .unwrap_or(ContainerState::Unknown)
    }

    /// Parse a state the tools can report, for `lxc-wait` targets.
    pub fn parse_reportable(s: &str) -> Result<Self, SchemaError> {
        let state: ContainerState = s.parse()?;
        if state.is_reportable() {
            Ok(state)
        } else {
            Err(SchemaError::UnreportableState(state.as_str().to_owned()))
        }
    }

    /// Whether `lxc-info` can ever report this state.
    pub fn is_reportable(self) -> bool {
        !matches!(self, ContainerState::NotCreated | ContainerState::Unknown)
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerState {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        ContainerState::ALL
            .into_iter()
            .find(|state| state.as_str() == lowered)
            .ok_or_else(|| SchemaError::UnknownState(s.to_owned()))
    }
}
