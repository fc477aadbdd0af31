//! LXC configuration file codec.
//!
//! The format is one `key = value` assignment per line. A key may repeat, in
//! which case its values accumulate in order. Keys under `lxc.network` are
//! grouped into network blocks; every `lxc.network.type` line opens a new
//! block. Everything else lands in the flat section, which keeps first-seen
//! key order.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;
use tracing::debug;

/// Prefix shared by every key that belongs to a network block.
pub const NETWORK_PREFIX: &str = "lxc.network";

/// The key that starts a new network block.
pub const NETWORK_TYPE_KEY: &str = "lxc.network.type";

/// Order in which recognized network keys are written back.
pub const NETWORK_KEY_ORDER: [&str; 13] = [
    "lxc.network.type",
    "lxc.network.flags",
    "lxc.network.link",
    "lxc.network.name",
    "lxc.network.hwaddr",
    "lxc.network.mtu",
    "lxc.network.veth.pair",
    "lxc.network.ipv4",
    "lxc.network.ipv4.gateway",
    "lxc.network.ipv6",
    "lxc.network.ipv6.gateway",
    "lxc.network.script.up",
    "lxc.network.script.down",
];

/// Ordered multimap: keys keep insertion order, each key holds its values in
/// the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    entries: Vec<(String, Vec<String>)>,
}

/// One virtual network interface.
pub type NetworkBlock = Section;

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` after any values `key` already has.
    pub fn append(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, values)) => values.push(value.to_owned()),
            None => self
                .entries
                .push((key.to_owned(), vec![value.to_owned()])),
        }
    }

    /// Drop any values `key` has and store `value` alone. The key keeps its
    /// original position.
    pub fn replace(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, values)) => *values = vec![value.to_owned()],
            None => self
                .entries
                .push((key.to_owned(), vec![value.to_owned()])),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, values)| (k.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn write_lines(&self, lines: &mut Vec<String>) {
        for (key, values) in self.iter() {
            push_assignments(lines, key, values);
        }
    }

    fn write_network_lines(&self, lines: &mut Vec<String>) {
        for key in NETWORK_KEY_ORDER {
            if let Some(values) = self.get(key) {
                push_assignments(lines, key, values);
            }
        }
        for (key, values) in self.iter() {
            if !NETWORK_KEY_ORDER.contains(&key) {
                push_assignments(lines, key, values);
            }
        }
    }
}

fn push_assignments(lines: &mut Vec<String>, key: &str, values: &[String]) {
    for value in values {
        lines.push(format!("{key} = {value}"));
    }
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Parsed LXC configuration: the flat section plus network blocks in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    entries: Section,
    networks: Vec<NetworkBlock>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(content: &str) -> Self {
        let mut config = Config::default();
        let mut open: Option<NetworkBlock> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                debug!("config line {}: no '=' found, skipping", idx + 1);
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() {
                debug!("config line {}: empty key, skipping", idx + 1);
                continue;
            }

            if key.starts_with(NETWORK_PREFIX) {
                if key == NETWORK_TYPE_KEY {
                    if let Some(block) = open.take() {
                        config.networks.push(block);
                    }
                }
                open.get_or_insert_with(NetworkBlock::new)
                    .append(key, value);
            } else {
                config.entries.append(key, value);
            }
        }

        if let Some(block) = open {
            config.networks.push(block);
        }
        config
    }

    /// Render back to file content. Flat keys first, in insertion order,
    /// then each network block with its recognized keys in canonical order.
    pub fn build(&self) -> String {
        let mut lines = Vec::new();
        self.entries.write_lines(&mut lines);
        for block in &self.networks {
            block.write_network_lines(&mut lines);
        }
        lines.join("\n")
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key)
    }

    /// Append a value for a flat key; repeated keys accumulate.
    pub fn set(&mut self, key: &str, value: &str) {
        self.entries.append(key, value);
    }

    pub fn replace(&mut self, key: &str, value: &str) {
        self.entries.replace(key, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().collect()
    }

    pub fn values(&self) -> Vec<&[String]> {
        self.entries.iter().map(|(_, values)| values).collect()
    }

    pub fn entries(&self) -> &Section {
        &self.entries
    }

    pub fn networks(&self) -> &[NetworkBlock] {
        &self.networks
    }

    pub fn networks_mut(&mut self) -> &mut Vec<NetworkBlock> {
        &mut self.networks
    }

    pub fn clear(&mut self) {
        self.entries = Section::default();
        self.networks.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.networks.is_empty()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

impl Serialize for Config {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Config", 2)?;
        state.serialize_field("entries", &self.entries)?;
        state.serialize_field("networks", &self.networks)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_NETWORKS: &str = "\
lxc.utsname = host1
lxc.network.type = veth
lxc.network.link = br0
lxc.network.type = veth
lxc.network.link = br1
";

    fn block(pairs: &[(&str, &str)]) -> NetworkBlock {
        let mut block = NetworkBlock::new();
        for (k, v) in pairs {
            block.append(k, v);
        }
        block
    }

    #[test]
    fn parses_flat_keys_and_network_blocks() {
        let config = Config::parse(TWO_NETWORKS);
        assert_eq!(config.keys(), vec!["lxc.utsname"]);
        assert_eq!(config.get("lxc.utsname").unwrap(), ["host1"]);
        assert_eq!(config.networks().len(), 2);
        assert_eq!(
            config.networks()[0],
            block(&[("lxc.network.type", "veth"), ("lxc.network.link", "br0")])
        );
        assert_eq!(
            config.networks()[1],
            block(&[("lxc.network.type", "veth"), ("lxc.network.link", "br1")])
        );
    }

    #[test]
    fn repeated_flat_keys_accumulate() {
        let config = Config::parse(
            "lxc.cgroup.devices.allow = c 1:3 rwm\nlxc.utsname = a\nlxc.cgroup.devices.allow = c 1:5 rwm\n",
        );
        assert_eq!(config.keys(), vec!["lxc.cgroup.devices.allow", "lxc.utsname"]);
        assert_eq!(
            config.get("lxc.cgroup.devices.allow").unwrap(),
            ["c 1:3 rwm", "c 1:5 rwm"]
        );
    }

    #[test]
    fn splits_on_first_equals_and_trims() {
        let config = Config::parse("  lxc.mount.entry =  proc proc proc opt=ro 0 0  \r\n");
        assert_eq!(
            config.get("lxc.mount.entry").unwrap(),
            ["proc proc proc opt=ro 0 0"]
        );
    }

    #[test]
    fn skips_blank_and_malformed_lines() {
        let config = Config::parse("\n\nnot an assignment\n = orphan\nlxc.arch = amd64\n");
        assert_eq!(config.keys(), vec!["lxc.arch"]);
        assert!(config.networks().is_empty());
    }

    #[test]
    fn network_keys_before_type_open_an_implicit_block() {
        let config = Config::parse(
            "lxc.network.link = br0\nlxc.network.type = veth\nlxc.network.link = br1\n",
        );
        assert_eq!(config.networks().len(), 2);
        assert_eq!(config.networks()[0], block(&[("lxc.network.link", "br0")]));
        assert_eq!(
            config.networks()[1].get("lxc.network.link").unwrap(),
            ["br1"]
        );
    }

    #[test]
    fn network_lines_after_flat_keys_stay_in_block() {
        let config = Config::parse(
            "lxc.network.type = veth\nlxc.rootfs = /var/lib/lxc/a/rootfs\nlxc.network.ipv4 = 10.0.0.2/24\n",
        );
        assert_eq!(config.keys(), vec!["lxc.rootfs"]);
        assert_eq!(config.networks().len(), 1);
        assert_eq!(
            config.networks()[0].get("lxc.network.ipv4").unwrap(),
            ["10.0.0.2/24"]
        );
    }

    #[test]
    fn build_emits_flat_section_then_canonical_network_order() {
        let config = Config::parse(
            "\
lxc.network.type = veth
lxc.network.custom = 1
lxc.network.ipv4 = 10.0.3.2/24
lxc.network.link = lxcbr0
lxc.network.flags = up
lxc.utsname = web
",
        );
        assert_eq!(
            config.build(),
            "\
lxc.utsname = web
lxc.network.type = veth
lxc.network.flags = up
lxc.network.link = lxcbr0
lxc.network.ipv4 = 10.0.3.2/24
lxc.network.custom = 1"
        );
    }

    #[test]
    fn unrecognized_network_keys_keep_encounter_order() {
        let mut net = NetworkBlock::new();
        net.append("lxc.network.zeta", "z");
        net.append("lxc.network.alpha", "a");
        net.append("lxc.network.type", "empty");
        let mut config = Config::new();
        config.networks_mut().push(net);
        assert_eq!(
            config.build(),
            "lxc.network.type = empty\nlxc.network.zeta = z\nlxc.network.alpha = a"
        );
    }

    #[test]
    fn roundtrip_preserves_content() {
        let original = Config::parse(
            "\
lxc.utsname = server-east-1
lxc.arch = amd64
lxc.cgroup.devices.allow = a
lxc.cgroup.devices.allow = b
lxc.network.type = veth
lxc.network.hwaddr = 00:16:3e:aa:bb:cc
lxc.network.link = br0
lxc.network.flags = up
lxc.network.type = macvlan
lxc.network.link = eth0
lxc.network.ipv4 = 192.168.1.5/24
lxc.network.ipv4 = 192.168.1.6/24
",
        );
        let reparsed = Config::parse(&original.build());
        assert_eq!(reparsed.entries(), original.entries());
        assert_eq!(reparsed.networks().len(), original.networks().len());
        for (a, b) in reparsed.networks().iter().zip(original.networks()) {
            let mut a_keys: Vec<_> = a.keys().collect();
            let mut b_keys: Vec<_> = b.keys().collect();
            a_keys.sort_unstable();
            b_keys.sort_unstable();
            assert_eq!(a_keys, b_keys);
            for key in a.keys() {
                assert_eq!(a.get(key), b.get(key));
            }
        }
    }

    #[test]
    fn set_appends_and_replace_overwrites() {
        let mut config = Config::new();
        config.set("lxc.include", "/usr/share/lxc/config/common.conf");
        config.set("lxc.include", "/usr/share/lxc/config/userns.conf");
        assert_eq!(config.get("lxc.include").unwrap().len(), 2);

        config.replace("lxc.include", "/etc/lxc/default.conf");
        assert_eq!(config.get("lxc.include").unwrap(), ["/etc/lxc/default.conf"]);
        assert_eq!(config.remove("lxc.include").unwrap().len(), 1);
        assert!(config.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let mut config = Config::parse(TWO_NETWORKS);
        assert!(!config.is_empty());
        config.clear();
        assert!(config.is_empty());
        assert_eq!(config.build(), "");
    }

    #[test]
    fn values_follow_key_order() {
        let config = Config::parse("b = 1\na = 2\nb = 3\n");
        let values: Vec<Vec<String>> = config.values().into_iter().map(<[String]>::to_vec).collect();
        assert_eq!(values, vec![vec!["1".to_owned(), "3".to_owned()], vec!["2".to_owned()]]);
    }

    #[test]
    fn serializes_as_ordered_maps() {
        let config = Config::parse(TWO_NETWORKS);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["entries"]["lxc.utsname"][0], "host1");
        assert_eq!(json["networks"][1]["lxc.network.link"][0], "br1");
    }

    #[test]
    fn display_matches_build() {
        let config = Config::parse(TWO_NETWORKS);
        assert_eq!(config.to_string(), config.build());
    }
}
