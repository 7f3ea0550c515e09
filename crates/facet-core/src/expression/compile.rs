//! Compile condition trees into parameterized expression strings.
//!
//! Placeholders are derived from the node's path in the tree: the root uses
//! the caller's prefix `p`, the children of a combinator use `p_0` and `p_1`,
//! and the child of a `NOT` uses `p_0`. Every leaf therefore owns a distinct
//! prefix, and all placeholders in one compiled expression are unique even
//! when the same field appears at several positions.
//!
//! | node | statement |
//! |------|-----------|
//! | compare | `#p >= :p` |
//! | between | `#p BETWEEN :p_start AND :p_end` |
//! | begins_with | `begins_with(#p, :p)` |
//! | contains | `contains(#p, :p)` |
//! | size | `size(#p) > :p` |
//! | in | `#p IN (:p_in0, :p_in1)` |
//! | exists | `attribute_exists(#p)` |
//! | not_exists | `attribute_not_exists(#p)` |
//! | and / or | `(left) AND (right)` |
//! | not | `NOT (inner)` |

use facet_model::types::{ExpressionAttributeNames, ExpressionAttributeValues};
use serde_json::Value;

use super::ast::{Condition, Operator};
use crate::codec::to_wire_value;
use crate::error::{FacetError, FacetResult};

/// A compiled expression and the placeholders it references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledExpression {
    /// The expression text.
    pub statement: String,
    /// `#placeholder` to attribute name.
    pub names: ExpressionAttributeNames,
    /// `:placeholder` to wire value.
    pub values: ExpressionAttributeValues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Condition,
    Filter,
}

/// Compile a condition for a conditional put or delete.
///
/// All operators are allowed.
pub fn compile_condition(condition: &Condition, prefix: &str) -> FacetResult<CompiledExpression> {
    compile_root(condition, prefix, Mode::Condition)
}

/// Compile a query filter.
///
/// Filters accept comparisons, `between`, `begins_with` and the boolean
/// combinators; any other operator fails with
/// [`FacetError::UnsupportedOperator`].
pub fn compile_filter(condition: &Condition, prefix: &str) -> FacetResult<CompiledExpression> {
    compile_root(condition, prefix, Mode::Filter)
}

fn compile_root(
    condition: &Condition,
    prefix: &str,
    mode: Mode,
) -> FacetResult<CompiledExpression> {
    let mut out = CompiledExpression::default();
    let statement = compile_node(condition, prefix, mode, &mut out)?;
    Ok(CompiledExpression { statement, ..out })
}

fn allowed_in_filter(op: Operator) -> bool {
    matches!(
        op,
        Operator::Compare(_)
            | Operator::Between
            | Operator::BeginsWith
            | Operator::And
            | Operator::Or
            | Operator::Not
    )
}

fn compile_node(
    condition: &Condition,
    prefix: &str,
    mode: Mode,
    out: &mut CompiledExpression,
) -> FacetResult<String> {
    let op = condition.operator();
    if mode == Mode::Filter && !allowed_in_filter(op) {
        return Err(FacetError::unsupported(op.as_str()));
    }

    let statement = match condition {
        Condition::And(left, right) | Condition::Or(left, right) => {
            let left = compile_node(left, &format!("{prefix}_0"), mode, out)?;
            let right = compile_node(right, &format!("{prefix}_1"), mode, out)?;
            format!("({left}) {op} ({right})")
        }
        Condition::Not(inner) => {
            let inner = compile_node(inner, &format!("{prefix}_0"), mode, out)?;
            format!("NOT ({inner})")
        }
        Condition::Compare { field, op, value } => {
            let name = bind_name(out, prefix, field);
            let value = bind_value(out, prefix, value);
            format!("{name} {op} {value}")
        }
        Condition::Between { field, low, high } => {
            let name = bind_name(out, prefix, field);
            let low = bind_value(out, &format!("{prefix}_start"), low);
            let high = bind_value(out, &format!("{prefix}_end"), high);
            format!("{name} BETWEEN {low} AND {high}")
        }
        Condition::BeginsWith {
            field,
            prefix: start,
        } => {
            let name = bind_name(out, prefix, field);
            let value = bind_value(out, prefix, start);
            format!("begins_with({name}, {value})")
        }
        Condition::Contains { field, value } => {
            let name = bind_name(out, prefix, field);
            let value = bind_value(out, prefix, value);
            format!("contains({name}, {value})")
        }
        Condition::Size { field, op, value } => {
            let name = bind_name(out, prefix, field);
            let value = bind_value(out, prefix, value);
            format!("size({name}) {op} {value}")
        }
        Condition::In { field, values } => {
            if values.is_empty() {
                return Err(FacetError::InvalidCondition(format!(
                    "'in' on '{field}' needs at least one value"
                )));
            }
            let name = bind_name(out, prefix, field);
            let list = values
                .iter()
                .enumerate()
                .map(|(i, v)| bind_value(out, &format!("{prefix}_in{i}"), v))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{name} IN ({list})")
        }
        Condition::Exists { field } => {
            let name = bind_name(out, prefix, field);
            format!("attribute_exists({name})")
        }
        Condition::NotExists { field } => {
            let name = bind_name(out, prefix, field);
            format!("attribute_not_exists({name})")
        }
    };
    Ok(statement)
}

fn bind_name(out: &mut CompiledExpression, prefix: &str, field: &str) -> String {
    let placeholder = format!("#{prefix}");
    out.names.insert(placeholder.clone(), field.to_owned());
    placeholder
}

fn bind_value(out: &mut CompiledExpression, prefix: &str, value: &Value) -> String {
    let placeholder = format!(":{prefix}");
    out.values.insert(placeholder.clone(), to_wire_value(value));
    placeholder
}
