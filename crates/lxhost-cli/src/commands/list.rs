use super::{colorize_state, json_pretty, EXIT_SUCCESS};
use lxhost_core::Lxc;
use lxhost_schema::ContainerState;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ListEntry {
    name: String,
    state: ContainerState,
}

fn collect(lxc: &Lxc) -> Result<Vec<ListEntry>, String> {
    let containers = lxc.containers().map_err(|e| e.to_string())?;
    containers
        .iter()
        .map(|c| {
            Ok(ListEntry {
                name: c.name().to_string(),
                state: c.state().map_err(|e| e.to_string())?,
            })
        })
        .collect()
}

pub fn run(lxc: &Lxc, json: bool) -> Result<u8, String> {
    let entries = collect(lxc)?;
    if json {
        println!("{}", json_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("no containers found");
    } else {
        println!("{:<24} STATE", "NAME");
        for entry in &entries {
            println!("{:<24} {}", entry.name, colorize_state(entry.state));
        }
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lxhost_core::HostSettings;
    use lxhost_runtime::MockTransport;
    use std::sync::Arc;

    #[test]
    fn entries_carry_each_state() {
        let mock = Arc::new(
            MockTransport::new()
                .respond("lxc-ls", "web db")
                .respond_sequence("lxc-info", &["state: RUNNING", "state: STOPPED"]),
        );
        let lxc = Lxc::new(mock, HostSettings::default());
        let entries = collect(&lxc).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "web");
        assert_eq!(entries[0].state, ContainerState::Running);
        assert_eq!(entries[1].state, ContainerState::Stopped);
    }
}
