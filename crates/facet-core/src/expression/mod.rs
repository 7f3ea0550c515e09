//! Condition and filter expressions.
//!
//! [`ast`] holds the condition tree and its JSON tuple parser; [`compile`]
//! turns a tree into an expression string plus name/value placeholder maps.

pub mod ast;
pub mod compile;

pub use ast::{CompareOp, Condition, Operator};
pub use compile::{CompiledExpression, compile_condition, compile_filter};

/// Placeholder prefix for conditional-write expressions.
pub const CONDITION_PREFIX: &str = "condition";

/// Placeholder prefix for query filters.
pub const FILTER_PREFIX: &str = "filter";
