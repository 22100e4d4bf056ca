//! Named predicates bound to schema fields.
//!
//! A [`Filter`] couples one column with one comparison mode, the literal it
//! compares against and the matcher instance that executes it. Construction
//! validates user input; the derivative constructors (`as_true`, `as_false`,
//! `as_filter`, `as_set`) are the only post-construction creation path and
//! always rebind a fresh matcher, so two filters never share one.

use std::{fmt, sync::Arc};

use roaring::RoaringTreemap;

use crate::{
    error::FilterError,
    matcher::{new_matcher, Matcher},
    types::{BlockType, FilterMode},
    value::{FilterValue, Value},
};

/// Minimal schema field descriptor the predicate core binds against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: Arc<str>,
    pub id: u16,
    pub typ: BlockType,
}

impl Field {
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, id: u16, typ: BlockType) -> Self {
        Self {
            name: name.into(),
            id,
            typ,
        }
    }
}

/// Ordered field list with name lookup; field position doubles as the
/// column index used for block access.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    #[must_use]
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Field position and descriptor for `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<(usize, &Field)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| &*f.name == name)
    }

    #[must_use]
    pub fn field(&self, index: usize) -> &Field {
        &self.fields[index]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One bound predicate: column identity, comparison mode, literal and the
/// matcher executing it.
#[derive(Debug)]
pub struct Filter {
    name: Arc<str>,
    typ: BlockType,
    mode: FilterMode,
    index: usize,
    id: u16,
    value: FilterValue,
    matcher: Box<dyn Matcher>,
}

impl Filter {
    /// Builds a filter for `field` at column position `index`, validating
    /// the literal against mode and domain and binding a fresh matcher.
    pub fn new(
        field: &Field,
        index: usize,
        mode: FilterMode,
        value: FilterValue,
    ) -> Result<Self, FilterError> {
        if field.name.is_empty() {
            return Err(FilterError::EmptyName);
        }
        let value = check_value(&field.name, field.typ, mode, value)?;
        Ok(Self::bind(
            field.name.clone(),
            field.typ,
            mode,
            index,
            field.id,
            value,
        ))
    }

    /// Binds a matcher for already-validated inputs. Shared by `new` and
    /// the derivative constructors.
    fn bind(
        name: Arc<str>,
        typ: BlockType,
        mode: FilterMode,
        index: usize,
        id: u16,
        value: FilterValue,
    ) -> Self {
        let mut matcher = new_matcher(typ, mode);
        match &value {
            FilterValue::Unit => {}
            FilterValue::Scalar(v) => matcher.with_value(v),
            FilterValue::Range(r) => matcher.with_range(r),
            FilterValue::Set(s) => matcher.with_slice(s),
        }
        Self {
            name,
            typ,
            mode,
            index,
            id,
            value,
            matcher,
        }
    }

    /// Derivative proven to match every row.
    #[must_use]
    pub fn as_true(&self) -> Self {
        Self::bind(
            self.name.clone(),
            self.typ,
            FilterMode::True,
            self.index,
            self.id,
            FilterValue::Unit,
        )
    }

    /// Derivative proven to match no row.
    #[must_use]
    pub fn as_false(&self) -> Self {
        Self::bind(
            self.name.clone(),
            self.typ,
            FilterMode::False,
            self.index,
            self.id,
            FilterValue::Unit,
        )
    }

    /// Derivative with a different mode and literal on the same column.
    /// Optimizer-internal inputs are trusted; a mismatched literal domain
    /// faults in the matcher binding.
    #[must_use]
    pub fn as_filter(&self, mode: FilterMode, value: FilterValue) -> Self {
        Self::bind(
            self.name.clone(),
            self.typ,
            mode,
            self.index,
            self.id,
            value,
        )
    }

    /// Derivative bound to a pre-built key set; the stored literal is
    /// reconstructed from the matcher.
    #[must_use]
    pub fn as_set(&self, mode: FilterMode, set: &RoaringTreemap) -> Self {
        debug_assert!(mode.is_set());
        let mut matcher = new_matcher(self.typ, mode);
        matcher.with_set(set);
        let value = matcher.value();
        Self {
            name: self.name.clone(),
            typ: self.typ,
            mode,
            index: self.index,
            id: self.id,
            value,
            matcher,
        }
    }

    /// Structural check: named, and carrying the literal kind its mode
    /// requires.
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.name.is_empty() {
            return Err(FilterError::EmptyName);
        }
        if self.mode.is_const() {
            return Ok(());
        }
        let ok = match self.mode {
            FilterMode::Range => matches!(self.value, FilterValue::Range(_)),
            FilterMode::In | FilterMode::NotIn => matches!(self.value, FilterValue::Set(_)),
            _ => matches!(self.value, FilterValue::Scalar(_)),
        };
        if matches!(self.value, FilterValue::Unit) {
            return Err(FilterError::MissingValue(self.name.to_string()));
        }
        if !ok {
            return Err(FilterError::ValueKind {
                filter: self.name.to_string(),
                mode: self.mode,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    #[must_use]
    pub fn typ(&self) -> BlockType {
        self.typ
    }

    #[must_use]
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Column position inside the pack.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Stable schema field id.
    #[must_use]
    pub fn id(&self) -> u16 {
        self.id
    }

    #[must_use]
    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    #[must_use]
    pub fn matcher(&self) -> &dyn Matcher {
        self.matcher.as_ref()
    }

    /// Relative evaluation cost.
    #[must_use]
    pub fn weight(&self) -> usize {
        self.matcher.weight()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mode.is_const() {
            write!(f, "{} {}", self.name, self.mode)
        } else {
            write!(f, "{} {} {}", self.name, self.mode, self.value)
        }
    }
}

/// Validates and normalizes the literal for a (domain, mode) pair.
fn check_value(
    name: &str,
    typ: BlockType,
    mode: FilterMode,
    value: FilterValue,
) -> Result<FilterValue, FilterError> {
    let kind_err = || FilterError::ValueKind {
        filter: name.to_string(),
        mode,
    };
    let type_err = |actual: BlockType| FilterError::TypeMismatch {
        filter: name.to_string(),
        expected: typ,
        actual,
    };
    match mode {
        FilterMode::True | FilterMode::False => Ok(FilterValue::Unit),
        FilterMode::Regexp => {
            let FilterValue::Scalar(Value::Bytes(pattern)) = &value else {
                return Err(kind_err());
            };
            regex::bytes::Regex::new(&String::from_utf8_lossy(pattern)).map_err(|source| {
                FilterError::InvalidRegexp {
                    filter: name.to_string(),
                    source,
                }
            })?;
            Ok(value)
        }
        FilterMode::Range => {
            let FilterValue::Range(r) = &value else {
                return Err(kind_err());
            };
            for v in [&r.from, &r.to] {
                if v.block_type() != typ {
                    return Err(type_err(v.block_type()));
                }
            }
            Ok(value)
        }
        FilterMode::In | FilterMode::NotIn => {
            let FilterValue::Set(seq) = value else {
                return Err(kind_err());
            };
            if seq.block_type() != typ {
                return Err(type_err(seq.block_type()));
            }
            let mut seq = seq;
            seq.sort_unique();
            Ok(FilterValue::Set(seq))
        }
        _ => {
            let FilterValue::Scalar(v) = &value else {
                return Err(kind_err());
            };
            if v.block_type() != typ {
                return Err(type_err(v.block_type()));
            }
            Ok(value)
        }
    }
}
