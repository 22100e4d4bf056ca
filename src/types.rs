//! Comparison modes and column domains.

use std::fmt;

use crate::value::Value;

/// Comparison mode carried by a [`Filter`](crate::filter::Filter).
///
/// [`True`](FilterMode::True) and [`False`](FilterMode::False) are synthetic:
/// they are produced by the optimizer (or the explicit derivative
/// constructors) when a predicate is proven tautological or contradictory,
/// and they never touch column data during evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    #[default]
    Equal,
    NotEqual,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    NotIn,
    Range,
    Regexp,
    True,
    False,
}

impl FilterMode {
    /// Short operator symbol used when rendering condition trees.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::In => "in",
            Self::NotIn => "!in",
            Self::Range => "rg",
            Self::Regexp => "~",
            Self::True => "true",
            Self::False => "false",
        }
    }

    /// True for the modes that carry a single scalar literal.
    #[must_use]
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::Equal | Self::NotEqual | Self::Gt | Self::Ge | Self::Lt | Self::Le | Self::Regexp
        )
    }

    /// True for the set-literal modes.
    #[must_use]
    pub fn is_set(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// True for the synthetic constant modes.
    #[must_use]
    pub fn is_const(self) -> bool {
        matches!(self, Self::True | Self::False)
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Physical domain of a column block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockType {
    Int64,
    Int32,
    Int16,
    Int8,
    Uint64,
    Uint32,
    Uint16,
    Uint8,
    Float64,
    Float32,
    Bool,
    Bytes,
    Int128,
    Int256,
}

impl BlockType {
    /// Ordering sentinels used by range arithmetic in the optimizer.
    ///
    /// Integer and bool domains report their true extremes. Float domains
    /// report ±infinity; this is sound because every range-like predicate
    /// excludes NaN on both sides of a rewrite. Bytes has no usable
    /// extremes and returns `None`.
    #[must_use]
    pub fn bounds(self) -> Option<(Value, Value)> {
        use crate::num::I256;
        Some(match self {
            Self::Int64 => (Value::I64(i64::MIN), Value::I64(i64::MAX)),
            Self::Int32 => (Value::I32(i32::MIN), Value::I32(i32::MAX)),
            Self::Int16 => (Value::I16(i16::MIN), Value::I16(i16::MAX)),
            Self::Int8 => (Value::I8(i8::MIN), Value::I8(i8::MAX)),
            Self::Uint64 => (Value::U64(u64::MIN), Value::U64(u64::MAX)),
            Self::Uint32 => (Value::U32(u32::MIN), Value::U32(u32::MAX)),
            Self::Uint16 => (Value::U16(u16::MIN), Value::U16(u16::MAX)),
            Self::Uint8 => (Value::U8(u8::MIN), Value::U8(u8::MAX)),
            Self::Float64 => (Value::F64(f64::NEG_INFINITY), Value::F64(f64::INFINITY)),
            Self::Float32 => (Value::F32(f32::NEG_INFINITY), Value::F32(f32::INFINITY)),
            Self::Bool => (Value::Bool(false), Value::Bool(true)),
            Self::Bytes => return None,
            Self::Int128 => (Value::I128(i128::MIN), Value::I128(i128::MAX)),
            Self::Int256 => (Value::I256(I256::MIN), Value::I256(I256::MAX)),
        })
    }

    /// True when the domain is discrete and its [`bounds`](Self::bounds) are
    /// reachable values, so extreme predicates may collapse to tautologies.
    ///
    /// Float domains are excluded: NaN rows fail every comparison, so no
    /// float predicate may ever rewrite to `True`.
    #[must_use]
    pub fn is_exact_domain(self) -> bool {
        !matches!(self, Self::Float64 | Self::Float32 | Self::Bytes)
    }

    /// True for the two IEEE float domains.
    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(self, Self::Float64 | Self::Float32)
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int64 => "i64",
            Self::Int32 => "i32",
            Self::Int16 => "i16",
            Self::Int8 => "i8",
            Self::Uint64 => "u64",
            Self::Uint32 => "u32",
            Self::Uint16 => "u16",
            Self::Uint8 => "u8",
            Self::Float64 => "f64",
            Self::Float32 => "f32",
            Self::Bool => "bool",
            Self::Bytes => "bytes",
            Self::Int128 => "i128",
            Self::Int256 => "i256",
        };
        f.write_str(name)
    }
}

/// All column domains, in evaluation-kernel order. Used by tests and by
/// callers that register matchers for every domain.
pub const BLOCK_TYPES: [BlockType; 14] = [
    BlockType::Int64,
    BlockType::Int32,
    BlockType::Int16,
    BlockType::Int8,
    BlockType::Uint64,
    BlockType::Uint32,
    BlockType::Uint16,
    BlockType::Uint8,
    BlockType::Float64,
    BlockType::Float32,
    BlockType::Bool,
    BlockType::Bytes,
    BlockType::Int128,
    BlockType::Int256,
];
