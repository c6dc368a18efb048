//! Consistency models
//!
//! Checkers judge a tentative read response against committed history.
//! Selectors choose which candidate version a read observes, consulting a
//! checker where the model requires one.

mod checker;
mod selector;

pub use checker::{CausalChecker, ConsistencyChecker};
pub use selector::{CausalSelector, KCausalSelector, LinearizableSelector, ReadSelector};
