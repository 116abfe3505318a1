use std::time::Duration;

use dashmap::DashMap;
use ethers_core::abi::Abi;
use serde_json::Value;
use tracing::{debug, info};
use vigil_core::{chains, AbiSource};

const SOURCIFY_BASE: &str = "https://repo.sourcify.dev/contracts";
const FETCH_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone)]
pub struct ResolvedAbi {
    pub abi: Abi,
    pub source: AbiSource,
}

/// Resolves a callable interface for a (chain, address) pair. Sources are
/// tried in fixed priority order: sourcify full match, sourcify partial
/// match, then the explorer getabi endpoint for mapped chains. Every fetch
/// failure means "this source has no answer" and falls through.
///
/// Successful resolutions are cached for the life of the process under the
/// lowercased address; a contract verified after first lookup keeps serving
/// the stale entry, an accepted limitation.
pub struct AbiResolver {
    client: reqwest::Client,
    api_key: String,
    cache: DashMap<String, ResolvedAbi>,
}

impl AbiResolver {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            cache: DashMap::new(),
        }
    }

    pub async fn resolve(&self, chain_id: u64, address: &str) -> Option<ResolvedAbi> {
        let key = cache_key(chain_id, address);
        if let Some(hit) = self.cache.get(&key) {
            debug!(chain_id, address = %address, "abi cache hit");
            return Some(hit.value().clone());
        }

        if let Some(abi) = self.fetch_sourcify(chain_id, address).await {
            return Some(self.store(key, chain_id, address, abi, AbiSource::Sourcify));
        }
        if let Some(abi) = self.fetch_explorer(chain_id, address).await {
            return Some(self.store(key, chain_id, address, abi, AbiSource::Etherscan));
        }

        debug!(chain_id, address = %address, "no source yielded an abi");
        None
    }

    /// Cache lookup without touching the network.
    pub fn cached(&self, chain_id: u64, address: &str) -> Option<ResolvedAbi> {
        self.cache
            .get(&cache_key(chain_id, address))
            .map(|e| e.value().clone())
    }

    /// Insert an entry directly, bypassing remote sources.
    pub fn seed(&self, chain_id: u64, address: &str, entry: ResolvedAbi) {
        self.cache.insert(cache_key(chain_id, address), entry);
    }

    fn store(
        &self,
        key: String,
        chain_id: u64,
        address: &str,
        abi: Abi,
        source: AbiSource,
    ) -> ResolvedAbi {
        let entry = ResolvedAbi { abi, source };
        self.cache.insert(key, entry.clone());
        info!(chain_id, address = %address, source = %source, "abi resolved");
        entry
    }

    async fn fetch_sourcify(&self, chain_id: u64, address: &str) -> Option<Abi> {
        let lowered = address.to_lowercase();
        for variant in ["full_match", "partial_match"] {
            let url = format!("{SOURCIFY_BASE}/{variant}/{chain_id}/{lowered}/metadata.json");
            let Ok(resp) = self.client.get(&url).send().await else {
                continue;
            };
            if !resp.status().is_success() {
                continue;
            }
            let Ok(body) = resp.json::<Value>().await else {
                continue;
            };
            let node = if body["output"]["abi"].is_array() {
                &body["output"]["abi"]
            } else {
                &body["abi"]
            };
            if !node.as_array().is_some_and(|a| !a.is_empty()) {
                continue;
            }
            if let Ok(abi) = serde_json::from_value::<Abi>(node.clone()) {
                return Some(abi);
            }
        }
        None
    }

    async fn fetch_explorer(&self, chain_id: u64, address: &str) -> Option<Abi> {
        let base = chains::explorer_base(chain_id)?;
        let url = format!(
            "{base}/api?module=contract&action=getabi&address={address}&apikey={}",
            self.api_key
        );
        let resp = self.client.get(&url).send().await.ok()?;
        let body: Value = resp.json().await.ok()?;
        if body["status"].as_str() != Some("1") {
            return None;
        }
        let raw = body["result"].as_str()?;
        serde_json::from_str(raw).ok()
    }
}

fn cache_key(chain_id: u64, address: &str) -> String {
    format!("{}:{}", chain_id, address.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ResolvedAbi {
        let abi: Abi = serde_json::from_str(
            r#"[{"type":"function","name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"value","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"}]"#,
        )
        .unwrap();
        ResolvedAbi {
            abi,
            source: AbiSource::Sourcify,
        }
    }

    #[tokio::test]
    async fn cache_hit_never_calls_the_network() {
        // The resolver for an unmapped chain has no explorer endpoint and
        // no reachable sourcify entry; with a seeded cache, resolve must
        // come back from the map alone.
        let resolver = AbiResolver::new("");
        resolver.seed(424242, "0xABCD000000000000000000000000000000000001", entry());

        let hit = resolver
            .resolve(424242, "0xabcd000000000000000000000000000000000001")
            .await
            .expect("key is normalized to lowercase");
        assert_eq!(hit.source, AbiSource::Sourcify);
        assert!(hit.abi.function("transfer").is_ok());
    }

    #[test]
    fn cache_key_is_case_insensitive_on_address() {
        assert_eq!(
            cache_key(1, "0xAbCd"),
            cache_key(1, "0xabcd"),
        );
        assert_ne!(cache_key(1, "0xabcd"), cache_key(5, "0xabcd"));
    }
}
