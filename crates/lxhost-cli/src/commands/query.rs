use super::{colorize_state, container, json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use lxhost_core::Lxc;

/// Exits non-zero when the container is absent.
pub fn exists(lxc: &Lxc, name: &str, json: bool) -> Result<u8, String> {
    let found = lxc.exists(name).map_err(|e| e.to_string())?;
    if json {
        println!(
            "{}",
            json_pretty(&serde_json::json!({ "name": name, "exists": found }))?
        );
    } else {
        println!("{found}");
    }
    Ok(if found { EXIT_SUCCESS } else { EXIT_FAILURE })
}

pub fn state(lxc: &Lxc, name: &str, json: bool) -> Result<u8, String> {
    let state = container(lxc, name)?.state().map_err(|e| e.to_string())?;
    if json {
        println!(
            "{}",
            json_pretty(&serde_json::json!({ "name": name, "state": state }))?
        );
    } else {
        println!("{}", colorize_state(state));
    }
    Ok(EXIT_SUCCESS)
}

pub fn pid(lxc: &Lxc, name: &str, json: bool) -> Result<u8, String> {
    let pid = container(lxc, name)?.pid().map_err(|e| e.to_string())?;
    if json {
        println!(
            "{}",
            json_pretty(&serde_json::json!({ "name": name, "pid": pid }))?
        );
    } else {
        println!("{pid}");
    }
    Ok(EXIT_SUCCESS)
}

pub fn info(lxc: &Lxc, name: &str, json: bool) -> Result<u8, String> {
    let lines = container(lxc, name)?.info(&[]).map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&lines)?);
    } else {
        for line in &lines {
            println!("{line}");
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

    fn lxc(mock: MockTransport) -> Lxc {
        Lxc::new(Arc::new(mock), HostSettings::default())
    }

    #[test]
    fn exists_sets_exit_code() {
        let host = lxc(MockTransport::new().respond("lxc-ls", "web"));
        assert_eq!(exists(&host, "web", false).unwrap(), EXIT_SUCCESS);
        assert_eq!(exists(&host, "db", true).unwrap(), EXIT_FAILURE);
    }

    #[test]
    fn transport_failure_is_an_error() {
        let host = lxc(MockTransport::new().fail("lxc-info", "boom"));
        let err = pid(&host, "web", false).unwrap_err();
        assert!(err.starts_with("transport error:"));
    }
}
