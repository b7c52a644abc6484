use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use wifi_scout::backend::PlatformBackend;
use wifi_scout::config::{Profiles, SavedNetwork, profiles_path};
use wifi_scout::gate::SystemPermissions;
use wifi_scout::network::{ConnectionOptions, NetworkRecord, ScanOptions};
use wifi_scout::session::WifiSession;
use wifi_scout::{interface, server};

#[derive(Parser)]
#[command(name = "wifi-scout")]
#[command(about = "Discover nearby WiFi networks and track the current connection")]
#[command(version)]
struct Cli {
    /// Interface to use (defaults to the first wireless interface)
    #[arg(short, long, global = true)]
    interface: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List wireless interfaces
    ListInterfaces,

    /// Scan for nearby networks
    Scan {
        /// Maximum number of networks to report
        #[arg(short, long)]
        max_results: Option<usize>,

        /// Scan timeout in milliseconds (capped at 10000)
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// Emit the fingerprint as JSON
        #[arg(long)]
        json: bool,
    },

    /// List SSIDs discovered by a scan, deduplicated
    Ssids,

    /// Show everything known about one network
    Detail {
        /// SSID of the network
        ssid: String,

        #[arg(long)]
        json: bool,
    },

    /// Show signal strength for one network
    Signal {
        /// SSID of the network
        ssid: String,
    },

    /// Show channel and frequency for one network
    Channel {
        /// SSID of the network
        ssid: String,
    },

    /// Show the currently connected network
    Current {
        #[arg(long)]
        json: bool,
    },

    /// Show the local IP address of the WiFi connection
    Ip,

    /// Connect to a network
    Connect {
        /// SSID of the network to connect to
        ssid: String,

        /// Password (uses the saved profile if not provided)
        #[arg(short, long)]
        password: Option<String>,

        /// Save credentials as a profile
        #[arg(short, long)]
        save: bool,
    },

    /// Disconnect from the current network (best-effort)
    Disconnect,

    /// Serve scan results and connection state over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Save network credentials as a profile
    SaveNetwork {
        /// SSID of the network
        ssid: String,

        /// Password for the network
        #[arg(short, long)]
        password: Option<String>,

        /// Network uses legacy WEP
        #[arg(long)]
        wep: bool,
    },

    /// Show saved profiles
    ShowProfiles,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ListInterfaces => cmd_list_interfaces(),
        Commands::Scan {
            max_results,
            timeout_ms,
            json,
        } => cmd_scan(cli.interface.as_deref(), max_results, timeout_ms, json).await,
        Commands::Ssids => cmd_ssids(cli.interface.as_deref()).await,
        Commands::Detail { ssid, json } => cmd_detail(cli.interface.as_deref(), &ssid, json).await,
        Commands::Signal { ssid } => cmd_signal(cli.interface.as_deref(), &ssid).await,
        Commands::Channel { ssid } => cmd_channel(cli.interface.as_deref(), &ssid).await,
        Commands::Current { json } => cmd_current(cli.interface.as_deref(), json).await,
        Commands::Ip => cmd_ip(cli.interface.as_deref()).await,
        Commands::Connect {
            ssid,
            password,
            save,
        } => cmd_connect(cli.interface.as_deref(), &ssid, password.as_deref(), save).await,
        Commands::Disconnect => cmd_disconnect(cli.interface.as_deref()).await,
        Commands::Serve { port } => cmd_serve(cli.interface.as_deref(), port).await,
        Commands::SaveNetwork {
            ssid,
            password,
            wep,
        } => cmd_save_network(&ssid, password.as_deref(), wep),
        Commands::ShowProfiles => cmd_show_profiles(),
    }
}

async fn build_session(interface: Option<&str>) -> Result<WifiSession<PlatformBackend>> {
    // Flag wins, then the configured default, then auto-detection.
    let configured = Profiles::load()
        .ok()
        .and_then(|profiles| profiles.default_interface);
    let iface = interface::resolve_interface(interface.or(configured.as_deref()))?;
    let backend = PlatformBackend::detect(&iface.name).await;
    Ok(WifiSession::new(backend, SystemPermissions))
}

fn cmd_list_interfaces() -> Result<()> {
    let interfaces = interface::list_wireless_interfaces()?;

    if interfaces.is_empty() {
        println!("No wireless interfaces found.");
        return Ok(());
    }

    println!("{:<16} {}", "INTERFACE", "STATE");
    println!("{}", "-".repeat(24));
    for iface in interfaces {
        let state = if iface.is_up { "up" } else { "down" };
        println!("{:<16} {}", iface.name, state);
    }

    Ok(())
}

async fn cmd_scan(
    interface: Option<&str>,
    max_results: Option<usize>,
    timeout_ms: Option<u64>,
    json: bool,
) -> Result<()> {
    let session = build_session(interface).await?;

    let fingerprint = session
        .scan(ScanOptions {
            max_results,
            timeout_ms,
            location: None,
        })
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&fingerprint)?);
        return Ok(());
    }

    if fingerprint.networks.is_empty() {
        println!("No networks found ({:?}).", session.last_scan_state());
        return Ok(());
    }

    display_networks(&fingerprint.networks);
    Ok(())
}

async fn cmd_ssids(interface: Option<&str>) -> Result<()> {
    let session = build_session(interface).await?;
    session.scan(ScanOptions::default()).await;

    for ssid in session.list_known_ssids() {
        println!("{ssid}");
    }
    Ok(())
}

async fn cmd_detail(interface: Option<&str>, ssid: &str, json: bool) -> Result<()> {
    let session = build_session(interface).await?;
    session.scan(ScanOptions::default()).await;

    match session.get_network_detail(ssid) {
        Some(record) if json => println!("{}", serde_json::to_string_pretty(&record)?),
        Some(record) => {
            println!("SSID:      {}", record.ssid);
            println!("BSSID:     {}", record.bssid);
            if let Some(signal) = record.signal_dbm {
                println!("Signal:    {signal} dBm");
            }
            if let (Some(channel), Some(freq)) = (record.channel, record.frequency_mhz) {
                println!("Channel:   {channel} ({freq} MHz)");
            }
            if let Some(ref capabilities) = record.capabilities {
                println!("Security:  {capabilities}");
            }
        }
        None => println!("Network '{ssid}' not found."),
    }
    Ok(())
}

async fn cmd_signal(interface: Option<&str>, ssid: &str) -> Result<()> {
    let session = build_session(interface).await?;
    session.scan(ScanOptions::default()).await;

    match session.get_signal_strength(ssid) {
        Some(dbm) => println!("{dbm} dBm"),
        None => println!("Signal strength for '{ssid}' is not available."),
    }
    Ok(())
}

async fn cmd_channel(interface: Option<&str>, ssid: &str) -> Result<()> {
    let session = build_session(interface).await?;
    session.scan(ScanOptions::default()).await;

    match session.get_channel_info(ssid) {
        Some(info) => println!("channel {} ({} MHz)", info.channel, info.frequency_mhz),
        None => println!("Channel info for '{ssid}' is not available."),
    }
    Ok(())
}

async fn cmd_current(interface: Option<&str>, json: bool) -> Result<()> {
    let session = build_session(interface).await?;

    match session.get_current_connection().await {
        Some(connection) if json => println!("{}", serde_json::to_string_pretty(&connection)?),
        Some(connection) => {
            println!("Connected: {}", connection.ssid);
            if !connection.bssid.is_empty() {
                println!("BSSID:     {}", connection.bssid);
            }
            if let Some(ref ip) = connection.ip_address {
                println!("IP:        {ip}");
            }
            if let Some(ref mask) = connection.subnet_mask {
                println!("Netmask:   {mask}");
            }
            if let Some(ref gateway) = connection.gateway {
                println!("Gateway:   {gateway}");
            }
            if !connection.dns_servers.is_empty() {
                println!("DNS:       {}", connection.dns_servers.join(", "));
            }
        }
        None => println!("Not connected."),
    }
    Ok(())
}

async fn cmd_ip(interface: Option<&str>) -> Result<()> {
    let session = build_session(interface).await?;

    match session.get_local_ip_address().await {
        Some(ip) => println!("{ip}"),
        None => println!("No WiFi IP address found."),
    }
    Ok(())
}

async fn cmd_connect(
    interface: Option<&str>,
    ssid: &str,
    password: Option<&str>,
    save: bool,
) -> Result<()> {
    let mut profiles = Profiles::load().unwrap_or_default();

    // Password from the argument, or from a saved profile
    let (password, is_wep) = match password {
        Some(p) => (Some(p.to_string()), false),
        None => match profiles.find_network(ssid) {
            Some(saved) => {
                println!("Using saved profile for '{ssid}'");
                (saved.password.clone(), saved.is_wep)
            }
            None => (None, false),
        },
    };

    let session = build_session(interface).await?;
    println!("Connecting to '{ssid}'...");

    session
        .connect(ConnectionOptions {
            ssid: ssid.to_string(),
            password: password.clone(),
            is_wep,
        })
        .await?;
    println!("Connection request accepted.");

    if save {
        profiles.add_network(SavedNetwork {
            ssid: ssid.to_string(),
            password,
            is_wep,
        });
        profiles.save()?;
        println!("Profile saved.");
    }

    Ok(())
}

async fn cmd_disconnect(interface: Option<&str>) -> Result<()> {
    let session = build_session(interface).await?;
    session.disconnect().await?;
    println!("Disconnect requested.");
    Ok(())
}

async fn cmd_serve(interface: Option<&str>, port: u16) -> Result<()> {
    let session = Arc::new(build_session(interface).await?);
    server::run_server(session, server::ServerConfig { port }).await
}

fn cmd_save_network(ssid: &str, password: Option<&str>, wep: bool) -> Result<()> {
    if ssid.is_empty() {
        bail!("SSID must not be empty");
    }

    let mut profiles = Profiles::load().unwrap_or_default();
    profiles.add_network(SavedNetwork {
        ssid: ssid.to_string(),
        password: password.map(String::from),
        is_wep: wep,
    });
    profiles.save()?;

    println!("Saved profile '{}' to {}", ssid, profiles_path()?.display());
    Ok(())
}

fn cmd_show_profiles() -> Result<()> {
    println!("Profiles file: {}", profiles_path()?.display());
    println!();

    let profiles = Profiles::load()?;

    if profiles.networks.is_empty() {
        println!("No saved profiles.");
    } else {
        println!("{:<24} {:<6} {}", "SSID", "WEP", "PASSWORD");
        println!("{}", "-".repeat(48));
        for network in &profiles.networks {
            let masked = network
                .password
                .as_ref()
                .map(|p| "*".repeat(p.len().min(12)))
                .unwrap_or_else(|| "-".to_string());
            let wep = if network.is_wep { "yes" } else { "no" };
            println!("{:<24} {:<6} {}", network.ssid, wep, masked);
        }
    }

    Ok(())
}

fn display_networks(networks: &[NetworkRecord]) {
    println!(
        "{:<28} {:<18} {:>7} {:>4} {:>5} {}",
        "SSID", "BSSID", "SIGNAL", "CH", "", "SECURITY"
    );
    println!("{}", "-".repeat(76));

    for network in networks {
        let ssid = if network.ssid.is_empty() {
            "(hidden)".to_string()
        } else {
            truncate_ssid(&network.ssid, 28)
        };
        let signal = network
            .signal_dbm
            .map(|s| format!("{s} dBm"))
            .unwrap_or_else(|| "-".to_string());
        let channel = network
            .channel
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let bar = network.signal_dbm.map(signal_to_bar).unwrap_or("    ");
        let security = network.capabilities.as_deref().unwrap_or("");

        println!(
            "{:<28} {:<18} {:>7} {:>4} {:>5} {}",
            ssid, network.bssid, signal, channel, bar, security
        );
    }
}

fn truncate_ssid(ssid: &str, max_len: usize) -> String {
    if ssid.chars().count() > max_len {
        let truncated: String = ssid.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    } else {
        ssid.to_string()
    }
}

/// Four-segment bar for a dBm reading; closer to 0 is stronger.
fn signal_to_bar(dbm: i32) -> &'static str {
    match dbm {
        d if d >= -55 => "████",
        d if d >= -65 => "███░",
        d if d >= -75 => "██░░",
        d if d >= -85 => "█░░░",
        _ => "░░░░",
    }
}
