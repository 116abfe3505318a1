use vigil_abi::{decode_calldata, AbiResolver, FourByteClient};
use vigil_chain::{analyze_bytecode, BytecodeFetcher, IntelGatherer, RpcEndpoints};
use vigil_core::{
    AbiSource, ContractIntel, DecodedCall, ExplainReport, RiskResult, TransactionIntent,
};
use vigil_risk::RiskContext;

/// Resolver → decoder → (bytecode ∥ intel) → risk engine, in one place.
/// Every remote signal degrades independently; the pipeline itself cannot
/// fail on data-source trouble.
pub struct ExplainPipeline {
    resolver: AbiResolver,
    fourbyte: FourByteClient,
    fetcher: BytecodeFetcher,
    intel: IntelGatherer,
}

impl ExplainPipeline {
    pub fn new(etherscan_api_key: &str, endpoints: RpcEndpoints) -> Self {
        Self {
            resolver: AbiResolver::new(etherscan_api_key),
            fourbyte: FourByteClient::new(),
            fetcher: BytecodeFetcher::new(endpoints),
            intel: IntelGatherer::new(etherscan_api_key),
        }
    }

    pub async fn explain(&self, intent: &TransactionIntent) -> ExplainReport {
        let target = intent.to.as_deref();

        let resolved = match target {
            Some(address) => self.resolver.resolve(intent.chain_id, address).await,
            None => None,
        };
        let abi_source = resolved.as_ref().map(|r| r.source);

        let fallback = match resolved {
            Some(_) => None,
            None => self.fourbyte.lookup(&intent.data).await,
        };
        let decoded = decode_calldata(
            &intent.data,
            resolved.as_ref().map(|r| &r.abi),
            fallback.as_deref(),
        );

        // Both outbound lookups start together; one failing never cancels
        // the other.
        let (code, intel) = match target {
            Some(address) => tokio::join!(
                self.fetcher.fetch(intent.chain_id, address),
                self.intel.gather(intent.chain_id, Some(address), abi_source)
            ),
            None => ("0x".to_string(), ContractIntel::empty(None)),
        };

        let bytecode_meta = analyze_bytecode(&code, resolved.is_some());
        let risk = vigil_risk::evaluate(&RiskContext {
            decoded: decoded.as_ref(),
            data: &intent.data,
            bytecode: Some(&bytecode_meta),
            abi_available: resolved.is_some(),
            intel: Some(&intel),
        });
        let explanation = build_explanation(decoded.as_ref(), &risk);

        ExplainReport {
            decoded,
            bytecode_meta,
            risk,
            explanation,
            intel,
            target_address: intent.to.clone(),
            chain_id: intent.chain_id,
        }
    }

    /// Decode without scoring, for the standalone decode endpoint.
    pub async fn decode_only(
        &self,
        intent: &TransactionIntent,
    ) -> (Option<DecodedCall>, Option<AbiSource>, Option<String>) {
        let resolved = match intent.to.as_deref() {
            Some(address) => self.resolver.resolve(intent.chain_id, address).await,
            None => None,
        };
        let abi_source = resolved.as_ref().map(|r| r.source);
        let fallback = match resolved {
            Some(_) => None,
            None => self.fourbyte.lookup(&intent.data).await,
        };
        let decoded = decode_calldata(
            &intent.data,
            resolved.as_ref().map(|r| &r.abi),
            fallback.as_deref(),
        );
        (decoded, abi_source, fallback)
    }
}

pub fn build_explanation(decoded: Option<&DecodedCall>, risk: &RiskResult) -> String {
    let action = decoded
        .and_then(|d| d.human_readable.clone())
        .or_else(|| decoded.map(|d| d.method.clone()))
        .unwrap_or_else(|| "Unknown action".to_string());

    let mut text = format!(
        "Action: {action}. Risk level {} (score {}).",
        risk.level, risk.score
    );
    let top: Vec<&str> = risk
        .reasons
        .iter()
        .take(2)
        .map(|r| r.description.as_str())
        .collect();
    if !top.is_empty() {
        text.push_str(&format!(" Key risks: {}.", top.join("; ")));
    }
    text
}
