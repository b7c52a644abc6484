use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::process::Command;

use crate::error::WifiScoutError;

#[derive(Debug, Clone)]
pub struct WirelessInterface {
    pub name: String,
    pub is_up: bool,
}

/// List all wireless interfaces on the system by walking sysfs.
pub fn list_wireless_interfaces() -> Result<Vec<WirelessInterface>> {
    let entries = fs::read_dir("/sys/class/net").context("Failed to read /sys/class/net")?;

    let mut interfaces = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_wireless(&name) {
            continue;
        }
        let is_up = fs::read_to_string(format!("/sys/class/net/{name}/operstate"))
            .map(|s| s.trim() == "up")
            .unwrap_or(false);
        interfaces.push(WirelessInterface { name, is_up });
    }

    Ok(interfaces)
}

/// A wireless device exposes a `wireless` directory in sysfs.
fn is_wireless(interface_name: &str) -> bool {
    Path::new(&format!("/sys/class/net/{interface_name}/wireless")).exists()
}

/// Find the first wireless interface, preferring one that is up.
pub fn find_wireless_interface() -> Result<WirelessInterface> {
    let interfaces = list_wireless_interfaces()?;

    interfaces
        .iter()
        .find(|i| i.is_up)
        .or_else(|| interfaces.first())
        .cloned()
        .ok_or_else(|| WifiScoutError::RadioUnavailable.into())
}

/// Resolve interface: use the provided name or auto-detect one.
pub fn resolve_interface(interface: Option<&str>) -> Result<WirelessInterface> {
    match interface {
        Some(name) => {
            if !is_wireless(name) {
                return Err(WifiScoutError::PlatformCommand(format!(
                    "'{name}' is not a wireless interface"
                ))
                .into());
            }
            let is_up = fs::read_to_string(format!("/sys/class/net/{name}/operstate"))
                .map(|s| s.trim() == "up")
                .unwrap_or(false);
            Ok(WirelessInterface {
                name: name.to_string(),
                is_up,
            })
        }
        None => find_wireless_interface(),
    }
}

/// IPv4 address assigned to an interface, read with `ip -o -4 addr show`.
/// Returns `None` when the interface has no address; used as the IP
/// lookup on hosts without a direct connection-info API.
pub fn local_ipv4(interface_name: &str) -> Option<String> {
    let output = Command::new("ip")
        .args(["-o", "-4", "addr", "show", "dev", interface_name])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_ip_addr_output(&stdout)
}

/// Parses `ip -o -4 addr show` output, e.g.
/// `3: wlan0    inet 192.168.4.2/24 brd 192.168.4.255 scope global ...`
fn parse_ip_addr_output(stdout: &str) -> Option<String> {
    for line in stdout.lines() {
        let mut tokens = line.split_whitespace();
        while let Some(token) = tokens.next() {
            if token == "inet" {
                let addr = tokens.next()?;
                let ip = addr.split('/').next()?;
                return Some(ip.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_addr_output_parsing() {
        let stdout =
            "3: wlan0    inet 192.168.4.2/24 brd 192.168.4.255 scope global dynamic wlan0\n";
        assert_eq!(parse_ip_addr_output(stdout).as_deref(), Some("192.168.4.2"));
    }

    #[test]
    fn no_address_parses_to_none() {
        assert_eq!(parse_ip_addr_output(""), None);
        assert_eq!(parse_ip_addr_output("3: wlan0    mtu 1500\n"), None);
    }
}
