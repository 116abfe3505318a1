use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use vigil_chain::RpcEndpoints;

#[derive(Deserialize, Default)]
pub struct VigilConfig {
    pub api: Option<ApiConfig>,
    pub etherscan: Option<EtherscanConfig>,
    pub rpc: Option<RpcConfig>,
    pub guard: Option<GuardConfig>,
    pub trust: Option<TrustConfig>,
}

#[derive(Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_api_bind")]
    pub bind: String,
}

#[derive(Deserialize)]
pub struct EtherscanConfig {
    pub api_key: Option<String>,
}

#[derive(Deserialize)]
pub struct RpcConfig {
    pub default_url: Option<String>,
    /// Per-chain endpoint overrides keyed by decimal chain id.
    #[serde(default)]
    pub chains: HashMap<String, String>,
}

#[derive(Deserialize)]
pub struct GuardConfig {
    #[serde(default = "default_decision_timeout")]
    pub decision_timeout_secs: u64,
    #[serde(default)]
    pub surface_webhooks: Vec<String>,
}

#[derive(Deserialize)]
pub struct TrustConfig {
    #[serde(default = "default_trust_db")]
    pub db_path: String,
}

fn default_api_port() -> u16 {
    4000
}
fn default_api_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_decision_timeout() -> u64 {
    15
}
fn default_trust_db() -> String {
    "./vigil-data/trust.db".to_string()
}

impl VigilConfig {
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn api_bind(&self) -> String {
        self.api
            .as_ref()
            .map(|a| a.bind.clone())
            .unwrap_or_else(default_api_bind)
    }

    pub fn api_port(&self) -> u16 {
        self.api.as_ref().map(|a| a.port).unwrap_or_else(default_api_port)
    }

    pub fn etherscan_key(&self) -> String {
        self.etherscan
            .as_ref()
            .and_then(|e| e.api_key.clone())
            .or_else(|| std::env::var("ETHERSCAN_API_KEY").ok())
            .unwrap_or_default()
    }

    pub fn endpoints(&self) -> RpcEndpoints {
        let Some(rpc) = self.rpc.as_ref() else {
            return RpcEndpoints::default();
        };
        let overrides = rpc
            .chains
            .iter()
            .filter_map(|(chain, url)| chain.parse::<u64>().ok().map(|id| (id, url.clone())))
            .collect();
        RpcEndpoints {
            overrides,
            default_url: rpc.default_url.clone(),
        }
    }

    pub fn decision_timeout(&self) -> Duration {
        Duration::from_secs(
            self.guard
                .as_ref()
                .map(|g| g.decision_timeout_secs)
                .unwrap_or_else(default_decision_timeout),
        )
    }

    pub fn surface_webhooks(&self) -> Vec<String> {
        self.guard
            .as_ref()
            .map(|g| g.surface_webhooks.clone())
            .unwrap_or_default()
    }

    pub fn trust_db_path(&self) -> String {
        self.trust
            .as_ref()
            .map(|t| t.db_path.clone())
            .unwrap_or_else(default_trust_db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chain_overrides() {
        let config: VigilConfig = toml::from_str(
            r#"
            [rpc]
            default_url = "http://global"
            [rpc.chains]
            "1" = "http://mainnet"
            "8453" = "http://base"
            [guard]
            decision_timeout_secs = 5
            "#,
        )
        .unwrap();

        let endpoints = config.endpoints();
        assert_eq!(endpoints.resolve(1).as_deref(), Some("http://mainnet"));
        assert_eq!(endpoints.resolve(8453).as_deref(), Some("http://base"));
        assert_eq!(endpoints.resolve(5).as_deref(), Some("http://global"));
        assert_eq!(config.decision_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = VigilConfig::default();
        assert_eq!(config.api_port(), 4000);
        assert_eq!(config.decision_timeout(), Duration::from_secs(15));
        assert_eq!(config.trust_db_path(), "./vigil-data/trust.db");
    }
}
