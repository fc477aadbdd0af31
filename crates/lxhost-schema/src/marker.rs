//! Extraction of scalar fields from LXC tool output.
//!
//! Each field is carried by a single marker line anchored at line start
//! (`state: RUNNING`, `pid: 4821`, `lxc version: 1.0.8`). Labels are
//! case-sensitive. A missing or malformed marker degrades to a sentinel
//! instead of an error.

use crate::state::ContainerState;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static STATE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^state:\s+(\w+)\s*$").expect("valid regex"));

static PID_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^pid:\s+(-?\d+)\s*$").expect("valid regex"));

static VERSION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^lxc version:\s+(.+?)\s*$").expect("valid regex"));

/// Sentinel returned when no pid can be read.
pub const NO_PID: i64 = -1;

/// First `state:` marker, lowercased and mapped; `Unknown` when absent.
pub fn parse_state(output: &str) -> ContainerState {
    STATE_LINE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map_or(ContainerState::Unknown, |m| {
            ContainerState::from_reported(m.as_str())
        })
}

/// First `pid:` marker; [`NO_PID`] when absent or out of range.
pub fn parse_pid(output: &str) -> i64 {
    PID_LINE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(NO_PID)
}

pub fn parse_version(output: &str) -> Option<String> {
    VERSION_LINE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Whitespace-separated tokens of all lines, first occurrence order, no repeats.
pub fn unique_tokens(output: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    output
        .split_whitespace()
        .filter(|token| seen.insert(*token))
        .map(str::to_owned)
        .collect()
}

/// Output lines with trailing carriage returns removed, no repeats.
pub fn unique_lines(output: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    output
        .lines()
        .filter(|line| seen.insert(*line))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_marker_maps_to_enum() {
        assert_eq!(parse_state("state: STOPPED"), ContainerState::Stopped);
        assert_eq!(
            parse_state("Name: web\nstate:   RUNNING\n"),
            ContainerState::Running
        );
    }

    #[test]
    fn state_marker_tolerates_pty_line_endings() {
        assert_eq!(parse_state("state: FROZEN\r\n"), ContainerState::Frozen);
    }

    #[test]
    fn bogus_state_is_unknown() {
        assert_eq!(parse_state("state: bogus"), ContainerState::Unknown);
    }

    #[test]
    fn missing_state_is_unknown() {
        assert_eq!(parse_state(""), ContainerState::Unknown);
        assert_eq!(
            parse_state("lxc-info: web doesn't exist"),
            ContainerState::Unknown
        );
    }

    #[test]
    fn state_label_is_case_sensitive_and_anchored() {
        assert_eq!(parse_state("State: RUNNING"), ContainerState::Unknown);
        assert_eq!(parse_state("  state: RUNNING"), ContainerState::Unknown);
    }

    #[test]
    fn pid_marker_parses_signed_integers() {
        assert_eq!(parse_pid("pid: -1"), -1);
        assert_eq!(parse_pid("pid: 4821"), 4821);
        assert_eq!(parse_pid("state: RUNNING\npid:    77\n"), 77);
    }

    #[test]
    fn unparsable_pid_is_sentinel() {
        assert_eq!(parse_pid("pid: abc"), NO_PID);
        assert_eq!(parse_pid(""), NO_PID);
        assert_eq!(parse_pid("pid: 99999999999999999999999"), NO_PID);
    }

    #[test]
    fn version_marker() {
        assert_eq!(
            parse_version("lxc version: 0.9.0.rc1\n").as_deref(),
            Some("0.9.0.rc1")
        );
        assert_eq!(parse_version("command not found"), None);
    }

    #[test]
    fn tokens_are_deduplicated() {
        assert_eq!(unique_tokens("a\nb b\n"), vec!["a", "b"]);
        assert!(unique_tokens("").is_empty());
    }

    #[test]
    fn lines_are_deduplicated_in_order() {
        assert_eq!(
            unique_lines("state: RUNNING\r\npid: 5\nstate: RUNNING\n"),
            vec!["state: RUNNING", "pid: 5"]
        );
    }
}
