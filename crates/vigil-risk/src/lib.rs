pub mod engine;

pub use engine::{evaluate, level_for_score, RiskContext};
