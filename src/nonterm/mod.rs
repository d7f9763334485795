//! Boundary statistics around the placeholders of hierarchical rules.

pub mod property;
pub mod store;

pub use property::{NonTermContext, NonTermContextBuilder};
pub use store::{ContextPosition, PairPosition, ProbStore};
