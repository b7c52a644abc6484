use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Profiles {
    #[serde(default)]
    pub networks: Vec<SavedNetwork>,
    #[serde(default)]
    pub default_interface: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SavedNetwork {
    pub ssid: String,
    pub password: Option<String>,
    #[serde(default)]
    pub is_wep: bool,
}

impl Profiles {
    pub fn load() -> Result<Self> {
        Self::load_from(&profiles_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Profiles::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read profiles file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse profiles file: {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&profiles_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create profiles directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize profiles")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write profiles file: {}", path.display()))?;

        Ok(())
    }

    pub fn find_network(&self, ssid: &str) -> Option<&SavedNetwork> {
        self.networks.iter().find(|n| n.ssid == ssid)
    }

    pub fn add_network(&mut self, network: SavedNetwork) {
        // Replace any existing entry with the same SSID
        self.networks.retain(|n| n.ssid != network.ssid);
        self.networks.push(network);
    }

    pub fn remove_network(&mut self, ssid: &str) -> bool {
        let before = self.networks.len();
        self.networks.retain(|n| n.ssid != ssid);
        self.networks.len() != before
    }
}

pub fn profiles_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("wifi-scout").join("profiles.toml"))
}
