//! Server configuration from environment variables

use crate::types::{Panelist, TeamNames};
use std::net::SocketAddr;

const DEFAULT_DATABASE_PATH: &str = "panel_showdown.db";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8501";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// SQLite file holding all persisted state
    pub database_path: String,
    pub bind_addr: SocketAddr,
    pub team_names: TeamNames,
    /// Roster shown on the display, empty when none is configured
    pub panelists: Vec<Panelist>,
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Read the panel roster from PANELISTS (inline JSON array) or, failing that,
/// from the JSON file named by PANELISTS_FILE. A bad roster is logged and
/// skipped so the session can still run.
fn load_panelists() -> Vec<Panelist> {
    let (source, json) = if let Some(inline) = env_non_empty("PANELISTS") {
        ("PANELISTS".to_string(), inline)
    } else if let Some(path) = env_non_empty("PANELISTS_FILE") {
        match std::fs::read_to_string(&path) {
            Ok(contents) => (path, contents),
            Err(e) => {
                tracing::warn!("Failed to read panelists file {}: {}", path, e);
                return Vec::new();
            }
        }
    } else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<Panelist>>(&json) {
        Ok(panelists) => {
            tracing::info!("Loaded {} panelists from {}", panelists.len(), source);
            panelists
        }
        Err(e) => {
            tracing::warn!("Invalid panelist roster in {}: {}", source, e);
            Vec::new()
        }
    }
}

impl ServerConfig {
    /// Load config from DATABASE_PATH, BIND_ADDR, TEAM_A_NAME, TEAM_B_NAME
    /// and the panelist roster
    pub fn from_env() -> Self {
        let database_path =
            env_non_empty("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        let default_addr: SocketAddr = ([0, 0, 0, 0], 8501).into();
        let bind_addr = match env_non_empty("BIND_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(
                    "Invalid BIND_ADDR {:?} ({}), using {}",
                    raw,
                    e,
                    DEFAULT_BIND_ADDR
                );
                default_addr
            }),
            None => default_addr,
        };

        let defaults = TeamNames::default();
        let team_names = TeamNames {
            team_a: env_non_empty("TEAM_A_NAME").unwrap_or(defaults.team_a),
            team_b: env_non_empty("TEAM_B_NAME").unwrap_or(defaults.team_b),
        };

        Self {
            database_path,
            bind_addr,
            team_names,
            panelists: load_panelists(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    use crate::types::PanelSide;
    use std::io::Write;

    const KEYS: [&str; 6] = [
        "DATABASE_PATH",
        "BIND_ADDR",
        "TEAM_A_NAME",
        "TEAM_B_NAME",
        "PANELISTS",
        "PANELISTS_FILE",
    ];

    const ROSTER: &str = r#"[
        {"name": "Ada", "position": "CTO", "company": "Acme", "side": "team_a"},
        {"name": "Grace", "position": "Host", "company": "Conf", "side": "moderator",
         "image_url": "/img/grace.png"}
    ]"#;

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = ServerConfig::from_env();
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.team_names, TeamNames::default());
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("DATABASE_PATH", "/tmp/showdown.db");
        std::env::set_var("BIND_ADDR", "127.0.0.1:9000");
        std::env::set_var("TEAM_A_NAME", "Backend Crew");
        std::env::set_var("TEAM_B_NAME", "  ");

        let config = ServerConfig::from_env();
        assert_eq!(config.database_path, "/tmp/showdown.db");
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.team_names.team_a, "Backend Crew");
        assert_eq!(config.team_names.team_b, "Team B");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_bind_addr_falls_back() {
        clear_env();
        std::env::set_var("BIND_ADDR", "not-an-address");
        let config = ServerConfig::from_env();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_no_panelists_by_default() {
        clear_env();
        assert!(ServerConfig::from_env().panelists.is_empty());
    }

    #[test]
    #[serial]
    fn test_inline_panelists() {
        clear_env();
        std::env::set_var("PANELISTS", ROSTER);
        let panelists = ServerConfig::from_env().panelists;
        assert_eq!(panelists.len(), 2);
        assert_eq!(panelists[0].name, "Ada");
        assert_eq!(panelists[1].side, PanelSide::Moderator);
        assert_eq!(panelists[1].image_url.as_deref(), Some("/img/grace.png"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_panelists_file() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ROSTER.as_bytes()).unwrap();
        std::env::set_var("PANELISTS_FILE", file.path());
        assert_eq!(ServerConfig::from_env().panelists.len(), 2);

        std::env::set_var("PANELISTS_FILE", "/nonexistent/panelists.json");
        assert!(ServerConfig::from_env().panelists.is_empty());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_panelists_are_skipped() {
        clear_env();
        std::env::set_var("PANELISTS", r#"[{"name": "Ada", "side": "bc"}]"#);
        assert!(ServerConfig::from_env().panelists.is_empty());
        clear_env();
    }
}
