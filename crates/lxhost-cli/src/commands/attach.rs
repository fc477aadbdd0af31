use super::{container, json_pretty, EXIT_SUCCESS};
use lxhost_core::Lxc;
use std::path::Path;

pub fn run(lxc: &Lxc, name: &str, command: &[String], json: bool) -> Result<u8, String> {
    let mut args = vec!["--"];
    args.extend(command.iter().map(String::as_str));
    let output = container(lxc, name)?
        .attach(&args)
        .map_err(|e| e.to_string())?;
    print_output(name, &output, json)
}

/// Run a local script file inside the container.
pub fn bootstrap(lxc: &Lxc, name: &str, script: &Path, json: bool) -> Result<u8, String> {
    let content = std::fs::read_to_string(script)
        .map_err(|e| format!("failed to read {}: {e}", script.display()))?;
    let output = container(lxc, name)?
        .bootstrap(&content)
        .map_err(|e| e.to_string())?;
    print_output(name, &output, json)
}

fn print_output(name: &str, output: &str, json: bool) -> Result<u8, String> {
    if json {
        println!(
            "{}",
            json_pretty(&serde_json::json!({ "name": name, "output": output }))?
        );
    } else if !output.is_empty() {
        println!("{output}");
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
    fn command_follows_double_dash() {
        let mock = Arc::new(MockTransport::new().respond("lxc-attach", "up 3 days"));
        let lxc = Lxc::new(mock.clone(), HostSettings::default());
        run(&lxc, "web", &["uptime".to_owned(), "-p".to_owned()], false).unwrap();
        assert_eq!(mock.calls(), vec!["lxc-attach -n web -- uptime -p".to_owned()]);
    }

    #[test]
    fn bootstrap_reads_the_script_file() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("setup.sh");
        std::fs::write(&script, "echo provisioning").unwrap();

        let mock = Arc::new(MockTransport::new().respond("lxc-attach", "provisioning"));
        let lxc = Lxc::new(mock.clone(), HostSettings::default());
        bootstrap(&lxc, "web", &script, true).unwrap();
        assert!(mock.calls()[0].contains("\necho provisioning\n"));
        assert_eq!(mock.call_count("lxc-attach"), 1);
    }

    #[test]
    fn bootstrap_reports_missing_script() {
        let lxc = Lxc::new(Arc::new(MockTransport::new()), HostSettings::default());
        let err = bootstrap(&lxc, "web", Path::new("/nonexistent/setup.sh"), false).unwrap_err();
        assert!(err.contains("failed to read"));
    }
}
