use ethers_core::types::U256;
use ethers_core::utils::format_units;
use vigil_core::{BytecodeMeta, ContractIntel, DecodedCall, RiskLevel, RiskReason, RiskResult};

/// Keywords in explorer labels that mark a contract as reported-risky.
const LABEL_RISK_KEYWORDS: &[&str] = &["scam", "phish", "hack", "rug", "exploit"];

/// Calldata longer than this with no decode under any strategy looks like
/// a deployment or constructor blob (hex chars, ≈100 bytes).
const CONSTRUCTOR_LIKE_HEX_LEN: usize = 200;

const ROUTER_SWAP_SELECTOR: &str = "0x38ed1739";
const APPROVE_SELECTOR: &str = "0x095ea7b3";

/// Inputs to one risk evaluation. Everything is borrowed and optional
/// except the raw calldata; a missing signal simply keeps its rules from
/// firing.
#[derive(Default)]
pub struct RiskContext<'a> {
    pub decoded: Option<&'a DecodedCall>,
    pub data: &'a str,
    pub bytecode: Option<&'a BytecodeMeta>,
    pub abi_available: bool,
    pub intel: Option<&'a ContractIntel>,
}

pub fn level_for_score(score: u32) -> RiskLevel {
    match score {
        s if s > 85 => RiskLevel::Critical,
        s if s > 60 => RiskLevel::High,
        s if s > 25 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

/// Evaluates the fixed rule set against one transaction. Pure and
/// deterministic: same inputs, same result, no shared state. Reasons come
/// back sorted by descending score, ties keeping rule-table order.
pub fn evaluate(ctx: &RiskContext) -> RiskResult {
    let mut reasons: Vec<RiskReason> = Vec::new();

    let method = ctx.decoded.map(|d| d.method.to_lowercase());
    let method = method.as_deref();
    let selector = ctx.data.get(..10).unwrap_or("").to_lowercase();
    let bytecode = ctx.bytecode;
    let age_days = ctx.intel.and_then(|i| i.age_days);

    let infinite_allowance = method == Some("approve")
        && ctx
            .decoded
            .and_then(|d| d.params.get(1))
            .map(|p| is_max_uint(&p.value))
            .unwrap_or(false);
    fire(
        &mut reasons,
        infinite_allowance,
        "infinite-approval",
        50,
        RiskLevel::High,
        || "Approval sets unlimited allowance".to_string(),
    );

    fire(
        &mut reasons,
        bytecode.is_some_and(|b| b.has_delegatecall),
        "delegatecall",
        50,
        RiskLevel::High,
        || "Contract can delegatecall into other code".to_string(),
    );

    fire(
        &mut reasons,
        bytecode.is_some_and(|b| b.has_selfdestruct),
        "selfdestruct",
        50,
        RiskLevel::High,
        || "Contract can self-destruct".to_string(),
    );

    fire(
        &mut reasons,
        age_days.is_some_and(|d| d < 30),
        "age-30",
        55,
        RiskLevel::High,
        || {
            format!(
                "Contract is very new ({} days old)",
                age_days.unwrap_or_default()
            )
        },
    );

    let flagged: Vec<String> = ctx
        .intel
        .map(|i| {
            i.labels
                .iter()
                .filter(|l| l.detail.is_some() || label_matches_risk_keyword(&l.label))
                .map(|l| format!("{}: {}", l.source, l.label))
                .collect()
        })
        .unwrap_or_default();
    fire(
        &mut reasons,
        !flagged.is_empty(),
        "flagged-label",
        70,
        RiskLevel::High,
        || format!("Explorer labels suggest risk: {}", flagged.join("; ")),
    );

    fire(
        &mut reasons,
        !ctx.abi_available && bytecode.is_some_and(|b| b.byte_length > 0),
        "unverified",
        45,
        RiskLevel::High,
        || "Contract has code but no resolvable interface".to_string(),
    );

    fire(
        &mut reasons,
        method.is_some_and(|m| m.contains("owner") || m.contains("admin")),
        "owner-privileged",
        45,
        RiskLevel::High,
        || "Owner or admin privileged function called".to_string(),
    );

    let is_approval = matches!(method, Some("approve" | "increaseallowance" | "permit"))
        || selector == APPROVE_SELECTOR;
    fire(
        &mut reasons,
        is_approval,
        "token-permission",
        40,
        RiskLevel::Medium,
        || {
            let spender = ctx.decoded.and_then(|d| d.params.first());
            let amount = ctx.decoded.and_then(|d| {
                d.params
                    .get(1)
                    .or_else(|| d.params.iter().find(|p| p.name == "value"))
            });
            let mut desc = "This call grants spending rights".to_string();
            if let Some(spender) = spender {
                desc.push_str(&format!(" to {}", spender.value));
            }
            if let Some(amount) = amount {
                desc.push_str(&format!(" for {}", readable_amount(&amount.value)));
            }
            desc
        },
    );

    fire(
        &mut reasons,
        age_days.is_some_and(|d| (30..60).contains(&d)),
        "age-60",
        35,
        RiskLevel::Medium,
        || {
            format!(
                "Contract is relatively new ({} days old)",
                age_days.unwrap_or_default()
            )
        },
    );

    fire(
        &mut reasons,
        bytecode.is_some_and(|b| b.is_proxy),
        "proxy",
        25,
        RiskLevel::Medium,
        || "Proxy pattern detected (EIP-1967)".to_string(),
    );

    fire(
        &mut reasons,
        matches!(method, Some("mint" | "burn" | "burnfrom")),
        "mint-burn",
        20,
        RiskLevel::Medium,
        || "Token mint/burn operation which is often privileged".to_string(),
    );

    fire(
        &mut reasons,
        ctx.decoded.is_none() && ctx.data.len() > CONSTRUCTOR_LIKE_HEX_LEN,
        "constructor-like",
        20,
        RiskLevel::Medium,
        || "Calldata resembles contract deployment or constructor".to_string(),
    );

    fire(
        &mut reasons,
        method.is_some_and(|m| m.contains("swap")) || selector == ROUTER_SWAP_SELECTOR,
        "dex-router",
        8,
        RiskLevel::Low,
        || "Swap through router detected".to_string(),
    );

    fire(
        &mut reasons,
        method == Some("transfer"),
        "simple-transfer",
        5,
        RiskLevel::Low,
        || {
            let value = ctx.decoded.and_then(|d| {
                d.params
                    .iter()
                    .find(|p| p.name == "value" || p.kind.contains("uint"))
            });
            match value {
                Some(p) => format!("Simple transfer of {}", readable_amount(&p.value)),
                None => "Simple transfer".to_string(),
            }
        },
    );

    let score = reasons.iter().map(|r| r.score).sum::<u32>().min(100);
    // Vec::sort_by is stable: equal scores keep rule-table order.
    reasons.sort_by(|a, b| b.score.cmp(&a.score));

    RiskResult {
        score,
        level: level_for_score(score),
        reasons,
    }
}

fn fire(
    reasons: &mut Vec<RiskReason>,
    condition: bool,
    id: &str,
    score: u32,
    level: RiskLevel,
    describe: impl FnOnce() -> String,
) {
    if condition {
        reasons.push(RiskReason {
            id: id.to_string(),
            score,
            level,
            description: describe(),
        });
    }
}

fn label_matches_risk_keyword(label: &str) -> bool {
    let lowered = label.to_lowercase();
    LABEL_RISK_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

fn parse_u256(value: &str) -> Option<U256> {
    if let Some(hex) = value.strip_prefix("0x") {
        U256::from_str_radix(hex, 16).ok()
    } else {
        U256::from_dec_str(value).ok()
    }
}

fn is_max_uint(value: &str) -> bool {
    parse_u256(value) == Some(U256::MAX)
}

/// Renders a token amount at the assumed 18-decimal scale; values that do
/// not parse as integers come back verbatim.
fn readable_amount(value: &str) -> String {
    match parse_u256(value) {
        Some(v) => format_units(v, 18u32).unwrap_or_else(|_| value.to_string()),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_a_pure_function_of_score() {
        assert_eq!(level_for_score(0), RiskLevel::Low);
        assert_eq!(level_for_score(25), RiskLevel::Low);
        assert_eq!(level_for_score(26), RiskLevel::Medium);
        assert_eq!(level_for_score(60), RiskLevel::Medium);
        assert_eq!(level_for_score(61), RiskLevel::High);
        assert_eq!(level_for_score(85), RiskLevel::High);
        assert_eq!(level_for_score(86), RiskLevel::Critical);
        assert_eq!(level_for_score(100), RiskLevel::Critical);
    }

    #[test]
    fn max_uint_parses_in_hex_and_decimal() {
        let hex = format!("0x{}", "f".repeat(64));
        assert!(is_max_uint(&hex));
        assert!(is_max_uint(
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        ));
        assert!(!is_max_uint("1000"));
        assert!(!is_max_uint("not-a-number"));
    }

    #[test]
    fn unparsable_amounts_render_verbatim() {
        assert_eq!(readable_amount("[1, 2]"), "[1, 2]");
        assert_eq!(readable_amount("1000000000000000000"), "1.000000000000000000");
    }
}
