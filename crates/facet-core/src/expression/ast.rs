//! Condition trees for conditional writes and query filters.
//!
//! Trees are built either with the constructor functions on [`Condition`] or
//! from the JSON tuple form accepted by [`Condition::from_json`]:
//!
//! ```text
//! ["age", ">=", 21]                       comparison leaf
//! ["age", "between", 18, 65]              range leaf
//! ["email", "exists"]                     presence leaf
//! ["tags", "size", ">", 2]                size leaf
//! ["role", "in", ["admin", "owner"]]      membership leaf
//! [<tree>, "AND", <tree>]                 combinator
//! {"NOT": <tree>}                         negation
//! ```

use std::fmt;
use std::ops::Not;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{FacetError, FacetResult};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (`=`).
    Eq,
    /// Not equal (`<>`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
}

impl CompareOp {
    /// The expression-language token.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every operator token a condition tree may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// A comparison.
    Compare(CompareOp),
    /// `between`
    Between,
    /// `exists`
    Exists,
    /// `not_exists`
    NotExists,
    /// `begins_with`
    BeginsWith,
    /// `contains`
    Contains,
    /// `size`
    Size,
    /// `in`
    In,
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `NOT`
    Not,
}

impl Operator {
    /// The token as written in a condition tree.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compare(op) => op.as_str(),
            Self::Between => "between",
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
            Self::BeginsWith => "begins_with",
            Self::Contains => "contains",
            Self::Size => "size",
            Self::In => "in",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = FacetError;

    /// Symbols match exactly; word tokens match case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "=" => Self::Compare(CompareOp::Eq),
            "<>" => Self::Compare(CompareOp::Ne),
            "<" => Self::Compare(CompareOp::Lt),
            "<=" => Self::Compare(CompareOp::Le),
            ">" => Self::Compare(CompareOp::Gt),
            ">=" => Self::Compare(CompareOp::Ge),
            word => match word.to_ascii_lowercase().as_str() {
                "between" => Self::Between,
                "exists" => Self::Exists,
                "not_exists" => Self::NotExists,
                "begins_with" => Self::BeginsWith,
                "contains" => Self::Contains,
                "size" => Self::Size,
                "in" => Self::In,
                "and" => Self::And,
                "or" => Self::Or,
                "not" => Self::Not,
                _ => return Err(FacetError::unsupported(s)),
            },
        };
        Ok(op)
    }
}

/// A condition tree.
///
/// Operand values are plain JSON values; they are converted to wire
/// attributes when the tree is compiled.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `field <op> value`
    Compare {
        /// Attribute name.
        field: String,
        /// Comparison.
        op: CompareOp,
        /// Right-hand value.
        value: Value,
    },
    /// `field BETWEEN low AND high`
    Between {
        /// Attribute name.
        field: String,
        /// Inclusive lower bound.
        low: Value,
        /// Inclusive upper bound.
        high: Value,
    },
    /// `begins_with(field, prefix)`
    BeginsWith {
        /// Attribute name.
        field: String,
        /// Prefix to match.
        prefix: Value,
    },
    /// `contains(field, value)`
    Contains {
        /// Attribute name.
        field: String,
        /// Element or substring to look for.
        value: Value,
    },
    /// `size(field) <op> value`
    Size {
        /// Attribute name.
        field: String,
        /// Comparison applied to the size.
        op: CompareOp,
        /// Size to compare with.
        value: Value,
    },
    /// `field IN (values...)`
    In {
        /// Attribute name.
        field: String,
        /// Candidate values.
        values: Vec<Value>,
    },
    /// `attribute_exists(field)`
    Exists {
        /// Attribute name.
        field: String,
    },
    /// `attribute_not_exists(field)`
    NotExists {
        /// Attribute name.
        field: String,
    },
    /// Both subtrees hold.
    And(Box<Condition>, Box<Condition>),
    /// Either subtree holds.
    Or(Box<Condition>, Box<Condition>),
    /// The subtree does not hold.
    Not(Box<Condition>),
}

impl Condition {
    /// `field <op> value`
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// `field = value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// `field <> value`
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    /// `field < value`
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    /// `field <= value`
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    /// `field > value`
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    /// `field >= value`
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    /// `field BETWEEN low AND high`
    pub fn between(
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::Between {
            field: field.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    /// `begins_with(field, prefix)`
    pub fn begins_with(field: impl Into<String>, prefix: impl Into<Value>) -> Self {
        Self::BeginsWith {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    /// `contains(field, value)`
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    /// `size(field) <op> value`
    pub fn size(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Size {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// `field IN (values...)`
    pub fn is_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `attribute_exists(field)`
    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists {
            field: field.into(),
        }
    }

    /// `attribute_not_exists(field)`
    pub fn not_exists(field: impl Into<String>) -> Self {
        Self::NotExists {
            field: field.into(),
        }
    }

    /// `(self) AND (other)`
    #[must_use]
    pub fn and(self, other: Condition) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// `(self) OR (other)`
    #[must_use]
    pub fn or(self, other: Condition) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// The operator at the root of this tree.
    #[must_use]
    pub fn operator(&self) -> Operator {
        match self {
            Self::Compare { op, .. } => Operator::Compare(*op),
            Self::Between { .. } => Operator::Between,
            Self::BeginsWith { .. } => Operator::BeginsWith,
            Self::Contains { .. } => Operator::Contains,
            Self::Size { .. } => Operator::Size,
            Self::In { .. } => Operator::In,
            Self::Exists { .. } => Operator::Exists,
            Self::NotExists { .. } => Operator::NotExists,
            Self::And(..) => Operator::And,
            Self::Or(..) => Operator::Or,
            Self::Not(_) => Operator::Not,
        }
    }

    /// Parse the JSON tuple form described in the module docs.
    ///
    /// Unknown operator tokens fail with [`FacetError::UnsupportedOperator`];
    /// anything else that does not fit the grammar fails with
    /// [`FacetError::InvalidCondition`].
    pub fn from_json(value: &Value) -> FacetResult<Self> {
        match value {
            Value::Object(fields) => {
                let mut entries = fields.iter();
                match (entries.next(), entries.next()) {
                    (Some((key, inner)), None) if key.eq_ignore_ascii_case("NOT") => {
                        Ok(!Self::from_json(inner)?)
                    }
                    (Some((key, _)), None) => Err(FacetError::unsupported(key.as_str())),
                    _ => Err(invalid("negation must be an object with a single NOT key")),
                }
            }
            Value::Array(parts) => parse_tuple(parts),
            other => Err(invalid(format!(
                "expected a tuple or NOT object, got {other}"
            ))),
        }
    }
}

impl Not for Condition {
    type Output = Condition;

    fn not(self) -> Self::Output {
        Condition::Not(Box::new(self))
    }
}

fn invalid(message: impl Into<String>) -> FacetError {
    FacetError::InvalidCondition(message.into())
}

fn parse_tuple(parts: &[Value]) -> FacetResult<Condition> {
    let (Some(head), Some(token)) = (parts.first(), parts.get(1)) else {
        return Err(invalid(
            "a condition tuple needs at least a field and an operator",
        ));
    };
    let Some(token) = token.as_str() else {
        return Err(invalid(format!("operator must be a string, got {token}")));
    };

    match token.parse::<Operator>()? {
        op @ (Operator::And | Operator::Or) => {
            let [left, _, right] = parts else {
                return Err(invalid(format!("{op} needs exactly two operands")));
            };
            let left = Condition::from_json(left)?;
            let right = Condition::from_json(right)?;
            Ok(if op == Operator::And {
                left.and(right)
            } else {
                left.or(right)
            })
        }
        Operator::Not => Err(invalid("NOT is written as {\"NOT\": <condition>}")),
        leaf => {
            let Some(field) = head.as_str() else {
                return Err(invalid(format!("field name must be a string, got {head}")));
            };
            parse_leaf(field, token, leaf, &parts[2..])
        }
    }
}

fn parse_leaf(
    field: &str,
    token: &str,
    op: Operator,
    operands: &[Value],
) -> FacetResult<Condition> {
    let arity = |n: usize| -> FacetResult<()> {
        if operands.len() == n {
            Ok(())
        } else {
            Err(invalid(format!(
                "'{token}' on '{field}' takes {n} operand(s), got {}",
                operands.len()
            )))
        }
    };

    match op {
        Operator::Compare(cmp) => {
            arity(1)?;
            Ok(Condition::compare(field, cmp, operands[0].clone()))
        }
        Operator::Between => {
            arity(2)?;
            Ok(Condition::between(
                field,
                operands[0].clone(),
                operands[1].clone(),
            ))
        }
        Operator::BeginsWith => {
            arity(1)?;
            Ok(Condition::begins_with(field, operands[0].clone()))
        }
        Operator::Contains => {
            arity(1)?;
            Ok(Condition::contains(field, operands[0].clone()))
        }
        Operator::Size => {
            arity(2)?;
            let Some(cmp_token) = operands[0].as_str() else {
                return Err(invalid("size needs a comparison operator"));
            };
            match cmp_token.parse()? {
                Operator::Compare(cmp) => Ok(Condition::size(field, cmp, operands[1].clone())),
                _ => Err(FacetError::unsupported(cmp_token)),
            }
        }
        Operator::In => {
            let values = match operands {
                [Value::Array(list)] => list.clone(),
                _ => operands.to_vec(),
            };
            if values.is_empty() {
                return Err(invalid(format!(
                    "'in' on '{field}' needs at least one value"
                )));
            }
            Ok(Condition::is_in(field, values))
        }
        Operator::Exists => {
            arity(0)?;
            Ok(Condition::exists(field))
        }
        Operator::NotExists => {
            arity(0)?;
            Ok(Condition::not_exists(field))
        }
        Operator::And | Operator::Or | Operator::Not => {
            Err(invalid(format!("'{token}' is not a leaf operator")))
        }
    }
}
