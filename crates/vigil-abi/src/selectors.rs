/// Canonical signatures for selectors that show up constantly in wallet
/// traffic: ERC-20 transfers and permissions, WETH wrap/unwrap, token
/// supply changes, V2-router swaps, multicall.
const KNOWN_SELECTORS: &[(u32, &str)] = &[
    (0xa9059cbb, "transfer(address,uint256)"),
    (0x095ea7b3, "approve(address,uint256)"),
    (0x23b872dd, "transferFrom(address,address,uint256)"),
    (0x39509351, "increaseAllowance(address,uint256)"),
    (
        0xd505accf,
        "permit(address,address,uint256,uint256,uint8,bytes32,bytes32)",
    ),
    (0x2e1a7d4d, "withdraw(uint256)"),
    (0xd0e30db0, "deposit()"),
    (0x40c10f19, "mint(address,uint256)"),
    (0x42966c68, "burn(uint256)"),
    (
        0x38ed1739,
        "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)",
    ),
    (
        0x7ff36ab5,
        "swapExactETHForTokens(uint256,address[],address,uint256)",
    ),
    (0xac9650d8, "multicall(bytes[])"),
];

pub fn known_signature(selector: [u8; 4]) -> Option<&'static str> {
    let wanted = u32::from_be_bytes(selector);
    KNOWN_SELECTORS
        .iter()
        .find(|(sel, _)| *sel == wanted)
        .map(|(_, sig)| *sig)
}
