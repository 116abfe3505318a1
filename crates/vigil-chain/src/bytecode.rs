use std::collections::HashMap;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};
use vigil_core::{chains, BytecodeMeta};

use crate::disasm;

/// Storage-slot constant from EIP-1967 minimal-proxy bytecode; its presence
/// in the code stream is the proxy fingerprint.
pub const EIP1967_PROXY_MARKER: &str =
    "360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc";

const EMPTY_CODE: &str = "0x";

/// RPC URL selection: explicit per-chain override, then the global
/// override, then the built-in default map.
#[derive(Debug, Clone, Default)]
pub struct RpcEndpoints {
    pub overrides: HashMap<u64, String>,
    pub default_url: Option<String>,
}

impl RpcEndpoints {
    pub fn resolve(&self, chain_id: u64) -> Option<String> {
        self.overrides
            .get(&chain_id)
            .cloned()
            .or_else(|| self.default_url.clone())
            .or_else(|| chains::default_rpc(chain_id).map(str::to_string))
    }
}

pub struct BytecodeFetcher {
    client: reqwest::Client,
    endpoints: RpcEndpoints,
}

impl BytecodeFetcher {
    pub fn new(endpoints: RpcEndpoints) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(6))
                .build()
                .unwrap_or_default(),
            endpoints,
        }
    }

    /// One `eth_getCode` at the latest block. Every failure mode degrades
    /// to the empty-code sentinel; an unreachable node never stalls or
    /// fails the pipeline.
    pub async fn fetch(&self, chain_id: u64, address: &str) -> String {
        let Some(url) = self.endpoints.resolve(chain_id) else {
            debug!(chain_id, "no rpc endpoint for chain, treating code as empty");
            return EMPTY_CODE.to_string();
        };
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_getCode",
            "params": [address, "latest"]
        });
        match self.client.post(&url).json(&body).send().await {
            Ok(resp) => match resp.json::<Value>().await {
                Ok(v) => v["result"].as_str().unwrap_or(EMPTY_CODE).to_string(),
                Err(e) => {
                    warn!(chain_id, error = %e, "eth_getCode returned malformed body");
                    EMPTY_CODE.to_string()
                }
            },
            Err(e) => {
                warn!(chain_id, error = %e, "eth_getCode failed");
                EMPTY_CODE.to_string()
            }
        }
    }
}

/// Pure, synchronous static analysis of fetched code.
pub fn analyze_bytecode(code: &str, verified: bool) -> BytecodeMeta {
    let bytes = hex::decode(code.trim_start_matches("0x")).unwrap_or_default();
    let scan = disasm::scan_opcodes(&bytes);
    BytecodeMeta {
        byte_length: bytes.len(),
        has_delegatecall: scan.has_delegatecall,
        has_selfdestruct: scan.has_selfdestruct,
        is_proxy: code.contains(EIP1967_PROXY_MARKER),
        verified,
    }
}
