use super::{container, json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use lxhost_core::Lxc;

/// Split a `KEY=VALUE` assignment.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("config error: expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("config error: empty key in '{raw}'"));
    }
    Ok((key.to_owned(), value.trim().to_owned()))
}

/// Print a container's configuration, one key, or apply assignments.
///
/// Assignments replace every existing value of their key and are saved
/// in a single write.
pub fn run(
    lxc: &Lxc,
    name: &str,
    get: Option<&str>,
    set: &[(String, String)],
    json: bool,
) -> Result<u8, String> {
    let mut file = container(lxc, name)?
        .config()
        .map_err(|e| e.to_string())?;
    file.load().map_err(|e| e.to_string())?;

    if !set.is_empty() {
        for (key, value) in set {
            file.config_mut().replace(key, value);
        }
        file.save().map_err(|e| e.to_string())?;
        if !json {
            println!("updated {} ({} keys)", file.path(), set.len());
            return Ok(EXIT_SUCCESS);
        }
    }

    if let Some(key) = get {
        let Some(values) = file.config().get(key) else {
            eprintln!("{key} is not set in {}", file.path());
            return Ok(EXIT_FAILURE);
        };
        if json {
            println!("{}", json_pretty(&values)?);
        } else {
            for value in values {
                println!("{value}");
            }
        }
        return Ok(EXIT_SUCCESS);
    }

    if json {
        println!("{}", json_pretty(file.config())?);
    } else {
        println!("{}", file.config());
    }
    Ok(EXIT_SUCCESS)
}
