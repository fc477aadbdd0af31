use super::{json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use lxhost_core::Lxc;

pub fn run(lxc: &Lxc, json: bool) -> Result<u8, String> {
    let lxc_version = lxc.version().map_err(|e| e.to_string())?;
    if json {
        println!(
            "{}",
            json_pretty(&serde_json::json!({
                "lxhost": env!("CARGO_PKG_VERSION"),
                "lxc": lxc_version,
            }))?
        );
    } else {
        println!("lxhost {}", env!("CARGO_PKG_VERSION"));
        match &lxc_version {
            Some(v) => println!("lxc {v}"),
            None => println!("lxc not found"),
        }
    }
    Ok(if lxc_version.is_some() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}
