//! Orchestrator configuration
//!
//! All settings come from environment variables with sensible defaults;
//! durability is opt-in via `DATABASE_URL` (runs live in memory otherwise).

use shortcast_core::domain::gate::SpeakerProfile;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API binds to
    pub bind_addr: String,

    /// Postgres connection string; when unset, runs are kept in memory and
    /// lost on restart
    pub database_url: Option<String>,

    /// Base URL of the external stage-worker service
    pub worker_url: String,

    /// Speakers offered at the speaker-selection gate
    pub roster: Vec<SpeakerProfile>,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - BIND_ADDR (optional, default: 0.0.0.0:8080)
    /// - DATABASE_URL (optional; memory store when unset)
    /// - WORKER_URL (optional, default: http://localhost:8090)
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            worker_url: std::env::var("WORKER_URL")
                .unwrap_or_else(|_| "http://localhost:8090".to_string()),
            roster: default_roster(),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if !self.worker_url.starts_with("http://") && !self.worker_url.starts_with("https://") {
            anyhow::bail!("worker_url must start with http:// or https://");
        }

        if self.roster.is_empty() {
            anyhow::bail!("speaker roster cannot be empty");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            database_url: None,
            worker_url: "http://localhost:8090".to_string(),
            roster: default_roster(),
        }
    }
}

/// Built-in speaker roster presented at the speaker-selection gate.
pub fn default_roster() -> Vec<SpeakerProfile> {
    let profile = |key: &str, name: &str, description: &str| SpeakerProfile {
        key: key.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        photo_url: format!("/files/assets/pic/{}.jpeg", key),
    };

    vec![
        profile("alex", "Alex", "Calm, curious host"),
        profile("mia", "Mia", "Quick-witted co-host"),
        profile("june", "June", "Warm storyteller"),
        profile("sam", "Sam", "Skeptical questioner"),
        profile("theo", "Theo", "Deadpan one-liner specialist"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.worker_url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        config.worker_url = "http://localhost:8090".to_string();
        assert!(config.validate().is_ok());

        config.roster.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_roster_keys_unique() {
        let roster = default_roster();
        let mut keys: Vec<_> = roster.iter().map(|p| p.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), roster.len());
    }
}
