use super::{colorize_state, container, json_pretty, EXIT_SUCCESS};
use lxhost_core::Lxc;
use lxhost_schema::ContainerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Destroy,
    Start,
    Stop,
    Restart,
    Freeze,
    Unfreeze,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Action::Create => "created",
            Action::Destroy => "destroyed",
            Action::Start => "started",
            Action::Stop => "stopped",
            Action::Restart => "restarted",
            Action::Freeze => "froze",
            Action::Unfreeze => "unfroze",
        }
    }
}

fn apply(lxc: &Lxc, action: Action, name: &str, args: &[String]) -> Result<ContainerState, String> {
    let c = container(lxc, name)?;
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let result = match action {
        Action::Create => c.create(&args),
        Action::Destroy => c.destroy(&args),
        Action::Start => c.start(&args),
        Action::Stop => c.stop(&args),
        Action::Restart => c.restart(),
        Action::Freeze => c.freeze(&args),
        Action::Unfreeze => c.unfreeze(&args),
    };
    result.map_err(|e| e.to_string())
}

pub fn run(lxc: &Lxc, action: Action, name: &str, args: &[String], json: bool) -> Result<u8, String> {
    let state = apply(lxc, action, name, args)?;
    if json {
        println!(
            "{}",
            json_pretty(&serde_json::json!({ "name": name, "state": state }))?
        );
    } else {
        println!("{} {name} ({})", action.verb(), colorize_state(state));
    }
    Ok(EXIT_SUCCESS)
}
