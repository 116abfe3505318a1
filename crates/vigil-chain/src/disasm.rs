const PUSH1: u8 = 0x60;
const PUSH32: u8 = 0x7f;
const DELEGATECALL: u8 = 0xf4;
const SELFDESTRUCT: u8 = 0xff;

#[derive(Debug, Clone, Copy, Default)]
pub struct OpcodeScan {
    pub has_delegatecall: bool,
    pub has_selfdestruct: bool,
    pub instruction_count: usize,
}

/// Linear-scan disassembly of an EVM bytecode stream. PUSH1..PUSH32
/// immediates are skipped so data bytes are never mistaken for opcodes;
/// no control-flow reconstruction, so unreachable instructions and the
/// Solidity metadata trailer still count.
pub fn scan_opcodes(code: &[u8]) -> OpcodeScan {
    let mut scan = OpcodeScan::default();
    let mut i = 0;
    while i < code.len() {
        let opcode = code[i];
        scan.instruction_count += 1;
        match opcode {
            PUSH1..=PUSH32 => {
                let immediates = (opcode - PUSH1 + 1) as usize;
                i += 1 + immediates;
            }
            DELEGATECALL => {
                scan.has_delegatecall = true;
                i += 1;
            }
            SELFDESTRUCT => {
                scan.has_selfdestruct = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    scan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_delegatecall_opcode() {
        // PUSH1 0x00, DELEGATECALL
        let scan = scan_opcodes(&[0x60, 0x00, 0xf4]);
        assert!(scan.has_delegatecall);
        assert!(!scan.has_selfdestruct);
    }

    #[test]
    fn flags_selfdestruct_opcode() {
        let scan = scan_opcodes(&[0x60, 0x00, 0xff]);
        assert!(scan.has_selfdestruct);
    }

    #[test]
    fn push_immediates_are_not_opcodes() {
        // PUSH2 0xf4ff: both hazard bytes live inside the immediate.
        let scan = scan_opcodes(&[0x61, 0xf4, 0xff, 0x00]);
        assert!(!scan.has_delegatecall);
        assert!(!scan.has_selfdestruct);
        assert_eq!(scan.instruction_count, 2);
    }

    #[test]
    fn truncated_push_does_not_overrun() {
        let scan = scan_opcodes(&[0x7f, 0x01, 0x02]);
        assert_eq!(scan.instruction_count, 1);
    }

    #[test]
    fn empty_code_is_clean() {
        let scan = scan_opcodes(&[]);
        assert!(!scan.has_delegatecall);
        assert!(!scan.has_selfdestruct);
        assert_eq!(scan.instruction_count, 0);
    }
}
