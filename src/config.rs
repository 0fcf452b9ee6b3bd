use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::errors::{IntentError, IntentResult};

const DEFAULT_LOGIN_VALIDITY_SECS: u64 = 3600;

/// Runtime configuration for the request services.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntentsConfig {
    /// How long a wallet login challenge stays valid, measured from creation.
    #[serde(default = "default_login_validity_secs")]
    pub login_request_validity_secs: u64,
    /// Default RPC endpoint per chain id, used by gateways when a request's
    /// project carries no custom URL. Keys are decimal chain ids.
    #[serde(default)]
    pub rpc_urls: HashMap<String, String>,
}

fn default_login_validity_secs() -> u64 {
    DEFAULT_LOGIN_VALIDITY_SECS
}

impl Default for IntentsConfig {
    fn default() -> Self {
        Self {
            login_request_validity_secs: DEFAULT_LOGIN_VALIDITY_SECS,
            rpc_urls: HashMap::new(),
        }
    }
}

impl IntentsConfig {
    pub fn load(path: &Path) -> IntentResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|err| IntentError::Config(format!("unable to read config: {err}")))?;
        toml::from_str(&content)
            .map_err(|err| IntentError::Config(format!("unable to parse config: {err}")))
    }

    pub fn save(&self, path: &Path) -> IntentResult<()> {
        let encoded = toml::to_string_pretty(self)
            .map_err(|err| IntentError::Config(format!("unable to encode config: {err}")))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| IntentError::Config(format!("unable to create config dir: {err}")))?;
        }
        fs::write(path, encoded)
            .map_err(|err| IntentError::Config(format!("unable to write config: {err}")))
    }

    pub fn login_request_validity(&self) -> Duration {
        let secs = i64::try_from(self.login_request_validity_secs).unwrap_or(i64::MAX);
        Duration::seconds(secs)
    }

    pub fn rpc_url(&self, chain_id: u64) -> Option<&str> {
        self.rpc_urls.get(&chain_id.to_string()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_on_empty_config() {
        let config: IntentsConfig = toml::from_str("").expect("empty config");
        assert_eq!(
            config.login_request_validity_secs,
            DEFAULT_LOGIN_VALIDITY_SECS
        );
        assert!(config.rpc_urls.is_empty());
    }

    #[test]
    fn oversized_validity_saturates_instead_of_wrapping() {
        let mut config = IntentsConfig::default();
        config.login_request_validity_secs = u64::MAX;
        assert!(config.login_request_validity().is_positive());
        assert_eq!(config.login_request_validity(), Duration::seconds(i64::MAX));
    }

    #[test]
    fn saves_and_loads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("intents.toml");

        let mut config = IntentsConfig::default();
        config.login_request_validity_secs = 900;
        config.save(&path).expect("save");

        let loaded = IntentsConfig::load(&path).expect("load");
        assert_eq!(loaded.login_request_validity_secs, 900);
    }

    #[test]
    fn load_of_missing_file_is_a_config_error() {
        let result = IntentsConfig::load(Path::new("/nonexistent/intents.toml"));
        assert!(matches!(result, Err(IntentError::Config(_))));
    }

    #[test]
    fn roundtrips_through_toml() {
        let mut config = IntentsConfig::default();
        config.login_request_validity_secs = 120;
        config
            .rpc_urls
            .insert("137".into(), "https://polygon.example.com".into());

        let encoded = toml::to_string_pretty(&config).expect("encode");
        let decoded: IntentsConfig = toml::from_str(&encoded).expect("decode");
        assert_eq!(decoded.login_request_validity_secs, 120);
        assert_eq!(decoded.rpc_url(137), Some("https://polygon.example.com"));
        assert_eq!(decoded.rpc_url(1), None);
    }
}
