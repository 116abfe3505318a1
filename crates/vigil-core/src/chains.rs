/// Explorer API base URL for chains we have a mapping for. Unmapped chains
/// get no explorer-backed signals at all, no probing.
pub fn explorer_base(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("https://api.etherscan.io"),
        5 => Some("https://api-goerli.etherscan.io"),
        8453 => Some("https://api.basescan.org"),
        11155111 => Some("https://api-sepolia.etherscan.io"),
        _ => None,
    }
}

/// Built-in public RPC endpoints, used when the config supplies no
/// override for the chain.
pub fn default_rpc(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("https://cloudflare-eth.com"),
        5 => Some("https://rpc.ankr.com/eth_goerli"),
        8453 => Some("https://mainnet.base.org"),
        11155111 => Some("https://rpc.sepolia.org"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_chains_yield_none() {
        assert!(explorer_base(1).is_some());
        assert!(explorer_base(424242).is_none());
        assert!(default_rpc(424242).is_none());
    }
}
