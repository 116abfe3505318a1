pub mod chains;
pub mod error;
pub mod types;

pub use error::{VigilError, VigilResult};
pub use types::*;
