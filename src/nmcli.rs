//! Full-scan backend built on NetworkManager's `nmcli` tool.
//!
//! This is the adapter for hosts that can actively scan: it can trigger a
//! fresh scan, read back every visible network with signal, frequency,
//! and security metadata, and connect or disconnect on demand.
//!
//! # Scan delivery
//!
//! `nmcli device wifi rescan` only kicks the scan off; there is no
//! blocking "wait for scan complete" call. Results accumulate in
//! NetworkManager's cache and are read back with `device wifi list
//! --rescan no`, which never triggers a second scan. The orchestrator
//! polls that read until results appear or its deadline passes.
//!
//! # Commands executed
//!
//! ```bash
//! nmcli radio wifi
//! nmcli device wifi rescan ifname <interface>
//! nmcli -t -f SSID,BSSID,SIGNAL,FREQ,SECURITY device wifi list ifname <interface> --rescan no
//! nmcli -t device show <interface>
//! nmcli device wifi connect <ssid> password <password> ifname <interface>
//! nmcli device disconnect <interface>
//! ```

use tokio::process::Command;
use tracing::warn;

use crate::backend::{Capability, RawNetwork, WifiBackend};
use crate::error::WifiScoutError;
use crate::network::{ConnectionOptions, CurrentConnection};

/// Backend driving a specific wireless interface through nmcli.
#[derive(Debug, Clone)]
pub struct NmcliBackend {
    interface: String,
}

impl NmcliBackend {
    pub fn new(interface: impl Into<String>) -> Self {
        NmcliBackend {
            interface: interface.into(),
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    async fn run(&self, args: &[&str]) -> Result<String, WifiScoutError> {
        let output = Command::new("nmcli")
            .args(args)
            .output()
            .await
            .map_err(|e| WifiScoutError::PlatformCommand(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WifiScoutError::PlatformCommand(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl WifiBackend for NmcliBackend {
    fn capability(&self) -> Capability {
        Capability::FullScan
    }

    async fn is_radio_enabled(&self) -> bool {
        match self.run(&["radio", "wifi"]).await {
            Ok(stdout) => stdout.trim() == "enabled",
            // False on any uncertainty.
            Err(_) => false,
        }
    }

    async fn trigger_scan(&self) -> Result<(), WifiScoutError> {
        // A rescan request fails if one is already in flight; the cached
        // results are still served, so this is not a scan failure.
        if let Err(e) = self
            .run(&["device", "wifi", "rescan", "ifname", &self.interface])
            .await
        {
            warn!(interface = %self.interface, error = %e, "wifi rescan request refused");
        }
        Ok(())
    }

    async fn poll_scan_results(&self) -> Result<Vec<RawNetwork>, WifiScoutError> {
        let stdout = self
            .run(&[
                "-t",
                "-f",
                "SSID,BSSID,SIGNAL,FREQ,SECURITY",
                "device",
                "wifi",
                "list",
                "ifname",
                &self.interface,
                "--rescan",
                "no",
            ])
            .await?;

        Ok(parse_wifi_list(&stdout))
    }

    async fn current_connection(&self) -> Result<Option<CurrentConnection>, WifiScoutError> {
        let stdout = self.run(&["-t", "device", "show", &self.interface]).await?;
        let Some(mut connection) = parse_device_show(&stdout) else {
            return Ok(None);
        };

        // The BSSID of the joined access point comes from the active row
        // of the scan cache; best-effort, the connection stands without it.
        if let Ok(list) = self
            .run(&[
                "-t",
                "-f",
                "ACTIVE,SSID,BSSID",
                "device",
                "wifi",
                "list",
                "ifname",
                &self.interface,
                "--rescan",
                "no",
            ])
            .await
        {
            if let Some(bssid) = parse_active_bssid(&list) {
                connection.bssid = bssid;
            }
        }

        Ok(Some(connection))
    }

    async fn connect(&self, options: &ConnectionOptions) -> Result<(), WifiScoutError> {
        let mut args: Vec<&str> = vec!["device", "wifi", "connect", &options.ssid];
        if let Some(ref password) = options.password {
            args.push("password");
            args.push(password);
        }
        if options.is_wep {
            // Legacy WEP networks need the key type spelled out.
            args.push("wep-key-type");
            args.push("key");
        }
        args.push("ifname");
        args.push(&self.interface);

        // An explicit nmcli refusal (bad password, no such SSID) is the
        // one failure callers must be able to tell apart from "absent".
        self.run(&args).await.map_err(|e| {
            let message = e.to_string();
            if message.contains("No network with SSID") {
                WifiScoutError::NotFound(options.ssid.clone())
            } else {
                WifiScoutError::PlatformRejected(message)
            }
        })?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), WifiScoutError> {
        self.run(&["device", "disconnect", &self.interface]).await?;
        Ok(())
    }
}

/// Splits one line of `nmcli -t` output on unescaped colons.
///
/// Terse mode escapes literal colons (BSSIDs contain them) as `\:` and
/// backslashes as `\\`.
fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Parses `device wifi list` terse output (SSID:BSSID:SIGNAL:FREQ:SECURITY).
fn parse_wifi_list(stdout: &str) -> Vec<RawNetwork> {
    let mut networks = Vec::new();

    for line in stdout.lines() {
        let fields = split_terse(line);
        if fields.len() < 5 {
            continue;
        }

        let ssid = fields[0].clone();
        let bssid = fields[1].clone();
        if ssid.is_empty() && bssid.is_empty() {
            continue;
        }

        let signal_dbm = fields[2].parse::<u8>().ok().map(percent_to_dbm);
        let frequency_mhz = parse_frequency(&fields[3]);
        let security = fields[4].trim();
        let capabilities = if security.is_empty() {
            None
        } else {
            Some(security.to_string())
        };

        networks.push(RawNetwork {
            ssid,
            bssid,
            signal_dbm,
            frequency_mhz,
            capabilities,
        });
    }

    networks
}

/// nmcli reports signal as a 0-100 percentage; records carry dBm. The
/// conversion is the usual linear approximation over the -100..-50 range.
fn percent_to_dbm(percent: u8) -> i32 {
    i32::from(percent.min(100)) / 2 - 100
}

/// Parses the FREQ field, which carries a unit suffix ("2437 MHz").
fn parse_frequency(field: &str) -> Option<u32> {
    let digits: String = field.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Parses `nmcli -t device show` output (KEY:VALUE per line) into the
/// current connection, or `None` when no connection profile is active.
fn parse_device_show(stdout: &str) -> Option<CurrentConnection> {
    let mut ssid = None;
    let mut ip_address = None;
    let mut subnet_mask = None;
    let mut gateway = None;
    let mut dns_servers = Vec::new();

    for line in stdout.lines() {
        // Split on the first colon only; values may contain colons.
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() || value == "--" {
            continue;
        }

        match key {
            "GENERAL.CONNECTION" => ssid = Some(value.to_string()),
            "IP4.ADDRESS[1]" => {
                // CIDR notation, e.g. "192.168.4.2/24".
                match value.split_once('/') {
                    Some((addr, prefix)) => {
                        ip_address = Some(addr.to_string());
                        subnet_mask = prefix.parse::<u8>().ok().map(prefix_to_mask);
                    }
                    None => ip_address = Some(value.to_string()),
                }
            }
            "IP4.GATEWAY" => gateway = Some(value.to_string()),
            key if key.starts_with("IP4.DNS") => dns_servers.push(value.to_string()),
            _ => {}
        }
    }

    Some(CurrentConnection {
        ssid: ssid?,
        bssid: String::new(),
        ip_address,
        subnet_mask,
        gateway,
        dns_servers,
    })
}

/// Picks the BSSID out of the row marked active in
/// `-f ACTIVE,SSID,BSSID device wifi list` output.
fn parse_active_bssid(stdout: &str) -> Option<String> {
    for line in stdout.lines() {
        let fields = split_terse(line);
        if fields.len() >= 3 && fields[0] == "yes" && !fields[2].is_empty() {
            return Some(fields[2].clone());
        }
    }
    None
}

/// Converts a CIDR prefix length to a dotted-quad netmask.
fn prefix_to_mask(prefix: u8) -> String {
    let bits: u32 = if prefix >= 32 {
        u32::MAX
    } else {
        !(u32::MAX >> prefix)
    };
    let octets = bits.to_be_bytes();
    format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
}
