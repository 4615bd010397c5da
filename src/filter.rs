//! Typed helpers for PostgREST filter expressions.
//!
//! The builder never validates filters: [`QueryBuilder::raw_param`] takes any
//! string. These helpers only render the operator grammar so callers do not
//! have to assemble it by hand.
//!
//! ```
//! use pgrest::filter::Filter;
//!
//! assert_eq!(Filter::gt("age", 21).to_string(), "age=gt.21");
//! assert_eq!(
//!     Filter::or([Filter::eq("role", "admin"), Filter::eq("role", "mod")]).to_string(),
//!     "or=(role.eq.admin,role.eq.mod)"
//! );
//! ```
//!
//! [`QueryBuilder::raw_param`]: crate::builder::QueryBuilder::raw_param

use std::fmt;

/// Comparison operators understood by PostgREST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    Is,
    In,
    /// Array/range contains.
    Cs,
    /// Array/range contained in.
    Cd,
    /// Full-text search.
    Fts,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Like => "like",
            Operator::Ilike => "ilike",
            Operator::Is => "is",
            Operator::In => "in",
            Operator::Cs => "cs",
            Operator::Cd => "cd",
            Operator::Fts => "fts",
        }
    }
}

/// A single filter condition or a logical group of them.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Condition {
        column: String,
        op: Operator,
        value: String,
        negated: bool,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    /// A negated `and` / `or` group.
    Not(Box<Filter>),
}

impl Filter {
    pub fn new(column: impl Into<String>, op: Operator, value: impl ToString) -> Self {
        Filter::Condition {
            column: column.into(),
            op,
            value: value.to_string(),
            negated: false,
        }
    }

    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Self::new(column, Operator::Eq, value)
    }

    pub fn neq(column: impl Into<String>, value: impl ToString) -> Self {
        Self::new(column, Operator::Neq, value)
    }

    pub fn gt(column: impl Into<String>, value: impl ToString) -> Self {
        Self::new(column, Operator::Gt, value)
    }

    pub fn gte(column: impl Into<String>, value: impl ToString) -> Self {
        Self::new(column, Operator::Gte, value)
    }

    pub fn lt(column: impl Into<String>, value: impl ToString) -> Self {
        Self::new(column, Operator::Lt, value)
    }

    pub fn lte(column: impl Into<String>, value: impl ToString) -> Self {
        Self::new(column, Operator::Lte, value)
    }

    pub fn like(column: impl Into<String>, pattern: impl ToString) -> Self {
        Self::new(column, Operator::Like, pattern)
    }

    pub fn ilike(column: impl Into<String>, pattern: impl ToString) -> Self {
        Self::new(column, Operator::Ilike, pattern)
    }

    /// `is.null`, `is.true`, `is.false`.
    pub fn is(column: impl Into<String>, value: impl ToString) -> Self {
        Self::new(column, Operator::Is, value)
    }

    /// `in.(a,b,c)`
    pub fn in_list<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let list: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
        Self::new(column, Operator::In, format!("({})", list.join(",")))
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    /// Prefix the operator with `not.`. Groups become `not.and` / `not.or`.
    pub fn not(self) -> Self {
        match self {
            Filter::Condition {
                column,
                op,
                value,
                negated,
            } => Filter::Condition {
                column,
                op,
                value,
                negated: !negated,
            },
            Filter::Not(group) => *group,
            group => Filter::Not(Box::new(group)),
        }
    }

    /// Nested form used inside `and=(...)` / `or=(...)`: `column.op.value`.
    fn to_nested(&self) -> String {
        match self {
            Filter::Condition {
                column,
                op,
                value,
                negated,
            } => {
                let not = if *negated { "not." } else { "" };
                format!("{}.{}{}.{}", column, not, op.as_str(), value)
            }
            Filter::And(items) => format!("and({})", join_nested(items)),
            Filter::Or(items) => format!("or({})", join_nested(items)),
            Filter::Not(group) => format!("not.{}", group.to_nested()),
        }
    }
}

fn join_nested(items: &[Filter]) -> String {
    items.iter().map(Filter::to_nested).collect::<Vec<_>>().join(",")
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Condition {
                column,
                op,
                value,
                negated,
            } => {
                let not = if *negated { "not." } else { "" };
                write!(f, "{}={}{}.{}", column, not, op.as_str(), value)
            }
            Filter::And(items) => write!(f, "and=({})", join_nested(items)),
            Filter::Or(items) => write!(f, "or=({})", join_nested(items)),
            Filter::Not(group) => write!(f, "not.{}", group),
        }
    }
}
