//! User-facing condition builder.
//!
//! A [`Condition`] is an unbound tree of named predicates assembled with
//! leaf constructors and the [`and`](Condition::and)/[`or`](Condition::or)
//! combinators. [`compile`](Condition::compile) resolves names against a
//! [`Schema`], validates literals and produces a bound [`Node`] tree ready
//! for [`optimize`](Node::optimize) and evaluation.

use std::fmt;

use crate::{
    error::FilterError,
    filter::{Filter, Schema},
    node::Node,
    types::FilterMode,
    value::{FilterValue, RangeValue, Value, ValueSeq},
};

/// One unbound predicate or a combination of them.
#[derive(Clone, Debug, Default)]
pub struct Condition {
    name: Option<String>,
    mode: FilterMode,
    value: FilterValue,
    or_kind: bool,
    children: Vec<Condition>,
}

impl Condition {
    fn leaf(col: impl Into<String>, mode: FilterMode, value: FilterValue) -> Self {
        Self {
            name: Some(col.into()),
            mode,
            value,
            ..Self::default()
        }
    }

    /// All of `conds` must match.
    #[must_use]
    pub fn and(conds: Vec<Condition>) -> Self {
        Self {
            children: conds,
            ..Self::default()
        }
    }

    /// Any of `conds` must match.
    #[must_use]
    pub fn or(conds: Vec<Condition>) -> Self {
        Self {
            or_kind: true,
            children: conds,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn equal(col: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(col, FilterMode::Equal, value.into().into())
    }

    #[must_use]
    pub fn not_equal(col: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(col, FilterMode::NotEqual, value.into().into())
    }

    #[must_use]
    pub fn gt(col: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(col, FilterMode::Gt, value.into().into())
    }

    #[must_use]
    pub fn ge(col: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(col, FilterMode::Ge, value.into().into())
    }

    #[must_use]
    pub fn lt(col: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(col, FilterMode::Lt, value.into().into())
    }

    #[must_use]
    pub fn le(col: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::leaf(col, FilterMode::Le, value.into().into())
    }

    #[must_use]
    pub fn in_(col: impl Into<String>, values: impl Into<ValueSeq>) -> Self {
        Self::leaf(col, FilterMode::In, values.into().into())
    }

    #[must_use]
    pub fn not_in(col: impl Into<String>, values: impl Into<ValueSeq>) -> Self {
        Self::leaf(col, FilterMode::NotIn, values.into().into())
    }

    /// Inclusive range predicate `from <= col <= to`.
    #[must_use]
    pub fn between(
        col: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        Self::leaf(
            col,
            FilterMode::Range,
            RangeValue::new(from.into(), to.into()).into(),
        )
    }

    /// Regular expression predicate over a bytes column.
    #[must_use]
    pub fn regexp(col: impl Into<String>, pattern: impl Into<Value>) -> Self {
        Self::leaf(col, FilterMode::Regexp, pattern.into().into())
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.name.is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.children.is_empty()
    }

    /// Adds a condition, lifting a leaf receiver into an AND branch and
    /// splicing same-kind branches instead of nesting them.
    pub fn add(&mut self, c: Condition) {
        if c.is_empty() {
            return;
        }
        if self.is_leaf() {
            let prev = std::mem::take(self);
            self.children.push(prev);
        }
        if self.or_kind == c.or_kind && !c.is_leaf() {
            self.children.extend(c.children);
        } else {
            self.children.push(c);
        }
    }

    /// Resolves column names against `schema` and binds matchers, producing
    /// an evaluable tree. Empty branches are dropped; a fully empty
    /// condition compiles to the match-all tree.
    pub fn compile(&self, schema: &Schema) -> Result<Node, FilterError> {
        if let Some(name) = &self.name {
            let (index, field) = schema
                .lookup(name)
                .ok_or_else(|| FilterError::UnknownColumn(name.clone()))?;
            let filter = Filter::new(field, index, self.mode, self.value.clone())?;
            return Ok(Node::leaf(filter));
        }
        let mut children = Vec::with_capacity(self.children.len());
        for child in &self.children {
            if child.is_empty() {
                continue;
            }
            children.push(child.compile(schema)?);
        }
        Ok(if self.or_kind {
            Node::or(children)
        } else {
            Node::and(children)
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} {} {}", name, self.mode, self.value),
            None => {
                let sep = if self.or_kind { " OR " } else { " AND " };
                write!(f, "(")?;
                for (i, child) in self.children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{filter::Field, types::BlockType};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("amount", 1, BlockType::Int64),
            Field::new("name", 2, BlockType::Bytes),
            Field::new("active", 3, BlockType::Bool),
        ])
    }

    #[test]
    fn compile_binds_leaves() {
        let cond = Condition::and(vec![
            Condition::equal("amount", 5i64),
            Condition::or(vec![
                Condition::regexp("name", "^a"),
                Condition::in_("amount", vec![1i64, 2, 3]),
            ]),
        ]);
        let tree = cond.compile(&schema()).unwrap();
        assert_eq!(tree.size(), 3);
        tree.validate("root").unwrap();
        assert_eq!(
            tree.to_string(),
            "(amount = 5 AND (name ~ '^a' OR amount in [1, 2, 3]))"
        );
        // leaf positions follow schema order
        let leaf = tree.children().first().and_then(Node::filter).unwrap();
        assert_eq!(leaf.index(), 0);
        assert_eq!(leaf.id(), 1);
    }

    #[test]
    fn compile_rejects_unknown_and_mistyped() {
        let err = Condition::equal("missing", 1i64)
            .compile(&schema())
            .unwrap_err();
        assert!(matches!(err, FilterError::UnknownColumn(_)));

        let err = Condition::equal("amount", "text")
            .compile(&schema())
            .unwrap_err();
        assert!(matches!(err, FilterError::TypeMismatch { .. }));
    }

    #[test]
    fn add_lifts_and_splices() {
        let mut cond = Condition::equal("amount", 5i64);
        cond.add(Condition::gt("amount", 1i64));
        assert!(!cond.is_leaf());
        assert_eq!(cond.children.len(), 2);

        cond.add(Condition::and(vec![
            Condition::lt("amount", 9i64),
            Condition::not_equal("amount", 7i64),
        ]));
        assert_eq!(cond.children.len(), 4);

        cond.add(Condition::or(vec![
            Condition::equal("active", true),
            Condition::equal("amount", 0i64),
        ]));
        assert_eq!(cond.children.len(), 5);
        assert!(cond.children[4].or_kind);
    }

    #[test]
    fn empty_condition_compiles_to_match_all() {
        let tree = Condition::and(Vec::new()).compile(&schema()).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn between_builds_range() {
        let tree = Condition::between("amount", 1i64, 9i64)
            .compile(&schema())
            .unwrap();
        assert_eq!(tree.to_string(), "amount rg [1, 9]");
    }
}
