pub mod aggregate;
pub mod decision;

pub use aggregate::ScoreAggregator;
pub use decision::{decide, Decision, Label, DEFAULT_DECISION_THRESHOLD};
