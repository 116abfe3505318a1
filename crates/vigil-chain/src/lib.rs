pub mod bytecode;
pub mod disasm;
pub mod intel;

pub use bytecode::{analyze_bytecode, BytecodeFetcher, RpcEndpoints};
pub use intel::IntelGatherer;
