use ethers_core::abi::{Abi, AbiParser, Function, Token};
use vigil_core::{DecodedCall, DecodedParam};

use crate::selectors;

/// Decodes raw calldata into a structured call. Strategies in order: match
/// the selector against the resolved ABI, then against an explicitly
/// supplied fallback signature, then against the built-in selector table.
/// Undecodable calldata is a legitimate outcome, never an error.
pub fn decode_calldata(
    data: &str,
    abi: Option<&Abi>,
    fallback_signature: Option<&str>,
) -> Option<DecodedCall> {
    let bytes = calldata_bytes(data)?;
    let selector: [u8; 4] = bytes[..4].try_into().ok()?;
    let input = &bytes[4..];

    if let Some(abi) = abi {
        if let Some(call) = decode_with_abi(abi, selector, input) {
            return Some(call);
        }
    }

    let signature = fallback_signature.or_else(|| selectors::known_signature(selector))?;
    decode_with_signature(signature, selector, input)
}

fn calldata_bytes(data: &str) -> Option<Vec<u8>> {
    let trimmed = data.trim_start_matches("0x");
    if trimmed.is_empty() {
        return None;
    }
    let bytes = hex::decode(trimmed).ok()?;
    if bytes.len() < 4 {
        return None;
    }
    Some(bytes)
}

fn decode_with_abi(abi: &Abi, selector: [u8; 4], input: &[u8]) -> Option<DecodedCall> {
    let function = abi
        .functions()
        .find(|f| f.short_signature() == selector)?;
    let tokens = function.decode_input(input).ok()?;
    Some(build_call(function, &tokens))
}

fn decode_with_signature(signature: &str, selector: [u8; 4], input: &[u8]) -> Option<DecodedCall> {
    let mut parser = AbiParser::default();
    let function = parser.parse_function(signature).ok()?;
    if function.short_signature() != selector {
        return None;
    }
    let tokens = function.decode_input(input).ok()?;
    Some(build_call(&function, &tokens))
}

fn build_call(function: &Function, tokens: &[Token]) -> DecodedCall {
    let params: Vec<DecodedParam> = function
        .inputs
        .iter()
        .zip(tokens)
        .enumerate()
        .map(|(idx, (input, token))| DecodedParam {
            name: if input.name.is_empty() {
                format!("arg{idx}")
            } else {
                input.name.clone()
            },
            kind: input.kind.to_string(),
            value: render_token(token),
        })
        .collect();

    let args = params
        .iter()
        .map(|p| p.value.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    DecodedCall {
        method: function.name.clone(),
        signature: Some(canonical_signature(function)),
        human_readable: Some(format!("{}({})", function.name, args)),
        params,
    }
}

fn canonical_signature(function: &Function) -> String {
    let inputs = function
        .inputs
        .iter()
        .map(|p| p.kind.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("{}({})", function.name, inputs)
}

fn render_token(token: &Token) -> String {
    match token {
        Token::Address(addr) => format!("{addr:?}"),
        Token::Uint(v) | Token::Int(v) => v.to_string(),
        Token::Bool(b) => b.to_string(),
        Token::String(s) => s.clone(),
        Token::Bytes(b) | Token::FixedBytes(b) => format!("0x{}", hex::encode(b)),
        Token::Array(items) | Token::FixedArray(items) | Token::Tuple(items) => {
            let inner = items
                .iter()
                .map(render_token)
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{inner}]")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::abi::AbiParser;
    use ethers_core::types::{Address, U256};

    fn transfer_calldata(amount: U256) -> String {
        let mut parser = AbiParser::default();
        let f = parser
            .parse_function("transfer(address to, uint256 value)")
            .unwrap();
        let to: Address = "0x000000000000000000000000000000000000dEaD"
            .parse()
            .unwrap();
        let encoded = f
            .encode_input(&[Token::Address(to), Token::Uint(amount)])
            .unwrap();
        format!("0x{}", hex::encode(encoded))
    }

    #[test]
    fn decodes_known_selector_without_abi() {
        let data = transfer_calldata(U256::from(1000u64));
        let decoded = decode_calldata(&data, None, None).unwrap();
        assert_eq!(decoded.method, "transfer");
        assert_eq!(decoded.signature.as_deref(), Some("transfer(address,uint256)"));
        assert_eq!(decoded.params[0].kind, "address");
        assert_eq!(decoded.params[1].value, "1000");
    }

    #[test]
    fn empty_calldata_is_a_miss() {
        assert!(decode_calldata("0x", None, None).is_none());
        assert!(decode_calldata("", None, None).is_none());
    }

    #[test]
    fn unknown_selector_without_fallback_is_a_miss() {
        assert!(decode_calldata("0xdeadbeef", None, None).is_none());
    }

    #[test]
    fn fallback_signature_must_match_selector() {
        let data = transfer_calldata(U256::from(5u64));
        // Wrong signature for the transfer selector: miss, not a panic. An
        // explicit fallback replaces the table lookup entirely.
        let decoded = decode_calldata(&data, None, Some("withdraw(uint256)"));
        assert!(decoded.is_none());
    }

    #[test]
    fn abi_match_takes_priority() {
        let abi: Abi = serde_json::from_str(
            r#"[{"type":"function","name":"transfer","inputs":[{"name":"dst","type":"address"},{"name":"wad","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"}]"#,
        )
        .unwrap();
        let data = transfer_calldata(U256::from(7u64));
        let decoded = decode_calldata(&data, Some(&abi), None).unwrap();
        assert_eq!(decoded.params[0].name, "dst");
        assert_eq!(decoded.params[1].value, "7");
    }

    #[test]
    fn decoding_is_idempotent() {
        let data = transfer_calldata(U256::from(42u64));
        let a = decode_calldata(&data, None, None).unwrap();
        let b = decode_calldata(&data, None, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn renders_human_readable_call() {
        let data = transfer_calldata(U256::from(9u64));
        let decoded = decode_calldata(&data, None, None).unwrap();
        let human = decoded.human_readable.unwrap();
        assert!(human.starts_with("transfer(0x"));
        assert!(human.ends_with(", 9)"));
    }
}
