use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;
use vigil_core::{chains, AbiSource, ContractIntel, IntelLabel};

const FLAGGED_KEYWORDS: &[&str] = &[
    "phish",
    "hack",
    "scam",
    "rug",
    "exploit",
    "suspicious",
    "fake",
];

struct CreationInfo {
    age_days: Option<i64>,
    created_at: Option<DateTime<Utc>>,
}

struct ExplorerMeta {
    labels: Vec<IntelLabel>,
    verified: bool,
}

/// Collects off-chain context for a contract: first-activity age from the
/// explorer transaction list, and name/verification status from its source
/// metadata. Both lookups run concurrently; either failing leaves a null
/// partial result, never a gather failure.
pub struct IntelGatherer {
    client: reqwest::Client,
    api_key: String,
}

impl IntelGatherer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
        }
    }

    pub async fn gather(
        &self,
        chain_id: u64,
        address: Option<&str>,
        abi_source: Option<AbiSource>,
    ) -> ContractIntel {
        let Some(address) = address else {
            return ContractIntel::empty(abi_source);
        };

        let (explorer, creation) = tokio::join!(
            self.fetch_source_meta(chain_id, address),
            self.fetch_creation(chain_id, address)
        );

        let mut labels = explorer.labels;
        match abi_source {
            Some(AbiSource::Sourcify) => labels.push(IntelLabel {
                source: "sourcify".to_string(),
                label: "Verified on Sourcify".to_string(),
                detail: None,
            }),
            Some(AbiSource::Etherscan) if !explorer.verified => labels.push(IntelLabel {
                source: "etherscan".to_string(),
                label: "ABI fetched but contract not verified".to_string(),
                detail: None,
            }),
            _ => {}
        }

        ContractIntel {
            labels,
            age_days: creation.age_days,
            created_at: creation.created_at,
            verified: abi_source.is_some() || explorer.verified,
            abi_source,
        }
    }

    async fn fetch_creation(&self, chain_id: u64, address: &str) -> CreationInfo {
        let none = CreationInfo {
            age_days: None,
            created_at: None,
        };
        let Some(base) = chains::explorer_base(chain_id) else {
            return none;
        };
        let url = format!(
            "{base}/api?module=account&action=txlist&address={address}\
             &startblock=0&endblock=99999999&page=1&offset=1&sort=asc&apikey={}",
            self.api_key
        );
        let Ok(resp) = self.client.get(&url).send().await else {
            return none;
        };
        let Ok(body) = resp.json::<Value>().await else {
            return none;
        };
        if body["status"].as_str() != Some("1") {
            return none;
        }
        let Some(first) = body["result"].as_array().and_then(|r| r.first()) else {
            return none;
        };
        let Some(ts) = first["timeStamp"].as_str().and_then(|s| s.parse::<i64>().ok()) else {
            return none;
        };
        let Some(created_at) = DateTime::from_timestamp(ts, 0) else {
            return none;
        };
        let age_days = (Utc::now() - created_at).num_days();
        debug!(chain_id, address = %address, age_days, "contract age resolved");
        CreationInfo {
            age_days: Some(age_days),
            created_at: Some(created_at),
        }
    }

    async fn fetch_source_meta(&self, chain_id: u64, address: &str) -> ExplorerMeta {
        let none = ExplorerMeta {
            labels: Vec::new(),
            verified: false,
        };
        let Some(base) = chains::explorer_base(chain_id) else {
            return none;
        };
        let url = format!(
            "{base}/api?module=contract&action=getsourcecode&address={address}&apikey={}",
            self.api_key
        );
        let Ok(resp) = self.client.get(&url).send().await else {
            return none;
        };
        let Ok(body) = resp.json::<Value>().await else {
            return none;
        };
        let Some(entry) = body["result"].as_array().and_then(|r| r.first()) else {
            return none;
        };

        let verified = entry["ABI"]
            .as_str()
            .is_some_and(|abi| !abi.is_empty() && abi != "Contract source code not verified");

        let mut labels = Vec::new();
        if let Some(name) = entry["ContractName"].as_str().map(str::trim) {
            if !name.is_empty() && name.to_lowercase() != "contract" {
                labels.push(IntelLabel {
                    source: "etherscan".to_string(),
                    label: name.to_string(),
                    detail: flagged_detail(name),
                });
            }
        }

        ExplorerMeta { labels, verified }
    }
}

/// Case-insensitive substring match of the contract name against the risk
/// keyword denylist.
fn flagged_detail(name: &str) -> Option<String> {
    let lowered = name.to_lowercase();
    let matched: Vec<&str> = FLAGGED_KEYWORDS
        .iter()
        .copied()
        .filter(|kw| lowered.contains(kw))
        .collect();
    if matched.is_empty() {
        None
    } else {
        Some(format!("Flagged keywords: {}", matched.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_risk_keywords_case_insensitively() {
        let detail = flagged_detail("SuperScamToken").unwrap();
        assert_eq!(detail, "Flagged keywords: scam");

        let detail = flagged_detail("PHISH-and-Rug").unwrap();
        assert_eq!(detail, "Flagged keywords: phish, rug");

        assert!(flagged_detail("UniswapV2Router02").is_none());
    }

    #[tokio::test]
    async fn missing_address_yields_empty_intel() {
        let gatherer = IntelGatherer::new("");
        let intel = gatherer.gather(1, None, Some(AbiSource::Sourcify)).await;
        assert!(intel.labels.is_empty());
        assert_eq!(intel.age_days, None);
        assert!(intel.verified);
        assert_eq!(intel.abi_source, Some(AbiSource::Sourcify));
    }

    #[tokio::test]
    async fn unmapped_chain_degrades_to_partial_nulls() {
        let gatherer = IntelGatherer::new("");
        let intel = gatherer
            .gather(424242, Some("0x0000000000000000000000000000000000000001"), None)
            .await;
        assert_eq!(intel.age_days, None);
        assert!(!intel.verified);
        assert!(intel.labels.is_empty());
    }
}
