use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A transaction the host is about to submit for signing. Immutable once
/// built; `data` is 0x-prefixed hex calldata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionIntent {
    pub chain_id: u64,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    pub data: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedParam {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Canonical string rendering; uint values are full-precision decimal.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedCall {
    pub method: String,
    #[serde(default)]
    pub signature: Option<String>,
    pub params: Vec<DecodedParam>,
    #[serde(default)]
    pub human_readable: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BytecodeMeta {
    pub byte_length: usize,
    pub has_delegatecall: bool,
    pub has_selfdestruct: bool,
    pub is_proxy: bool,
    pub verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbiSource {
    Sourcify,
    Etherscan,
}

impl std::fmt::Display for AbiSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbiSource::Sourcify => write!(f, "sourcify"),
            AbiSource::Etherscan => write!(f, "etherscan"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntelLabel {
    pub source: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractIntel {
    pub labels: Vec<IntelLabel>,
    pub age_days: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub verified: bool,
    pub abi_source: Option<AbiSource>,
}

impl ContractIntel {
    pub fn empty(abi_source: Option<AbiSource>) -> Self {
        Self {
            labels: Vec::new(),
            age_days: None,
            created_at: None,
            verified: abi_source.is_some(),
            abi_source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskReason {
    pub id: String,
    pub score: u32,
    pub level: RiskLevel,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskResult {
    pub score: u32,
    pub level: RiskLevel,
    pub reasons: Vec<RiskReason>,
}

/// Everything the pipeline learned about one transaction intent, handed to
/// the decision surface as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainReport {
    pub decoded: Option<DecodedCall>,
    pub bytecode_meta: BytecodeMeta,
    pub risk: RiskResult,
    pub explanation: String,
    pub intel: ContractIntel,
    pub target_address: Option<String>,
    pub chain_id: u64,
}
