use std::collections::HashMap;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use crate::logging::{log_info, log_warning};
use crate::pattern::WinningPattern;

pub const DEFAULT_CONFIG_PATH: &str = "conf/server.conf";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub hints_enabled: bool,
    pub winning_pattern: WinningPattern,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            data_dir: PathBuf::from("data/games"),
            hints_enabled: false,
            winning_pattern: WinningPattern::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Self::from_str_content(&content)
    }

    pub fn from_str_content(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config_map = parse_config(content);
        let defaults = Self::default();

        let host = match config_map.get("host") {
            Some(h) => {
                h.parse::<IpAddr>().map_err(|e| format!("invalid host '{h}': {e}"))?;
                h.clone()
            }
            None => defaults.host,
        };

        let port = match config_map.get("port") {
            Some(p) => p.parse::<u16>().map_err(|e| format!("invalid port '{p}': {e}"))?,
            None => defaults.port,
        };

        let data_dir = config_map
            .get("data_dir")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let hints_enabled = match config_map.get("hints_enabled") {
            Some(h) => parse_bool(h).ok_or_else(|| format!("invalid hints_enabled '{h}'"))?,
            None => defaults.hints_enabled,
        };

        let winning_pattern = match config_map.get("winning_pattern") {
            Some(p) => parse_pattern(p)?,
            None => defaults.winning_pattern,
        };

        Ok(ServerConfig { host, port, data_dir, hints_enabled, winning_pattern })
    }

    pub fn load_or_default() -> Self {
        Self::load_from_or_default(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(config) => {
                log_info(&format!("Loaded configuration from {}", path.display()));
                config
            }
            Err(e) => {
                log_warning(&format!("Could not load config from {}: {e}. Using defaults.", path.display()));
                Self::default()
            }
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_config(content: &str) -> HashMap<String, String> {
    let mut config = HashMap::new();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            config.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    config
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

// Either a preset name (FULL_HOUSE, ROW_2, ...) or comma-separated indices.
fn parse_pattern(value: &str) -> Result<WinningPattern, Box<dyn std::error::Error>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(WinningPattern::default());
    }
    if value.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Ok(WinningPattern::preset(value)?);
    }

    let indices = value
        .split(',')
        .map(|index| index.trim().parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| format!("invalid winning_pattern '{value}': {e}"))?;
    Ok(WinningPattern::from_indices(indices)?)
}
