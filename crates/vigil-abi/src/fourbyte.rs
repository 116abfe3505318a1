use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

const FOURBYTE_API: &str = "https://www.4byte.directory/api/v1/signatures/";

#[derive(Deserialize)]
struct FourByteResponse {
    results: Vec<FourByteEntry>,
}

#[derive(Deserialize)]
struct FourByteEntry {
    text_signature: String,
}

/// Public selector directory, consulted only when no ABI resolved. Best
/// effort: any failure or empty result is simply "no signature known".
pub struct FourByteClient {
    client: reqwest::Client,
}

impl Default for FourByteClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FourByteClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(4))
                .build()
                .unwrap_or_default(),
        }
    }

    pub async fn lookup(&self, data: &str) -> Option<String> {
        let trimmed = data.trim_start_matches("0x");
        if trimmed.len() < 8 {
            return None;
        }
        let selector = &trimmed[..8];
        let url = format!("{FOURBYTE_API}?hex_signature=0x{selector}");
        let resp = self.client.get(&url).send().await.ok()?;
        let body: FourByteResponse = resp.json().await.ok()?;
        let signature = body.results.into_iter().next()?.text_signature;
        debug!(selector = %selector, signature = %signature, "4byte lookup");
        Some(signature)
    }
}
