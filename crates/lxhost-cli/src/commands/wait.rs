use super::{container, json_pretty, EXIT_SUCCESS, EXIT_WAIT_TIMEOUT};
use lxhost_core::Lxc;
use lxhost_schema::ContainerState;
use std::time::Duration;

pub fn run(
    lxc: &Lxc,
    name: &str,
    states: &[ContainerState],
    timeout: Duration,
    json: bool,
) -> Result<u8, String> {
    let reached = container(lxc, name)?
        .wait(states, timeout)
        .map_err(|e| e.to_string())?;
    if json {
        println!(
            "{}",
            json_pretty(&serde_json::json!({ "name": name, "reached": reached }))?
        );
    } else if reached {
        println!("{name} reached {}", describe(states));
    } else {
        eprintln!(
            "timed out after {}s waiting for {name} to reach {}",
            timeout.as_secs(),
            describe(states)
        );
    }
    Ok(if reached { EXIT_SUCCESS } else { EXIT_WAIT_TIMEOUT })
}

fn describe(states: &[ContainerState]) -> String {
    states
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(" or ")
}
