pub mod decoder;
pub mod fourbyte;
pub mod resolver;
pub mod selectors;

pub use decoder::decode_calldata;
pub use fourbyte::FourByteClient;
pub use resolver::{AbiResolver, ResolvedAbi};
