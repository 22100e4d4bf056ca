//! Literal values exchanged between filters, matchers and the optimizer.
//!
//! Every literal is a closed tagged union over the column domains; there is
//! no dynamic boxing and no reflection. Cross-domain operations are upstream
//! cast-layer bugs and fault immediately instead of being silently coerced.

use std::{
    cmp::Ordering,
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
};

use crate::{num::I256, types::BlockType};

/// A single typed literal.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bytes(Vec<u8>),
    I128(i128),
    I256(I256),
}

macro_rules! with_int_variants {
    ($m:ident) => {
        $m!(I8, i8, Int8);
        $m!(I16, i16, Int16);
        $m!(I32, i32, Int32);
        $m!(I64, i64, Int64);
        $m!(U8, u8, Uint8);
        $m!(U16, u16, Uint16);
        $m!(U32, u32, Uint32);
        $m!(U64, u64, Uint64);
        $m!(I128, i128, Int128);
    };
}

impl Value {
    /// Domain this literal belongs to.
    #[must_use]
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Bool(_) => BlockType::Bool,
            Self::I8(_) => BlockType::Int8,
            Self::I16(_) => BlockType::Int16,
            Self::I32(_) => BlockType::Int32,
            Self::I64(_) => BlockType::Int64,
            Self::U8(_) => BlockType::Uint8,
            Self::U16(_) => BlockType::Uint16,
            Self::U32(_) => BlockType::Uint32,
            Self::U64(_) => BlockType::Uint64,
            Self::F32(_) => BlockType::Float32,
            Self::F64(_) => BlockType::Float64,
            Self::Bytes(_) => BlockType::Bytes,
            Self::I128(_) => BlockType::Int128,
            Self::I256(_) => BlockType::Int256,
        }
    }

    /// Compares two literals of the same domain.
    ///
    /// Returns `None` across domains and for unordered float pairs (NaN),
    /// mirroring IEEE comparison semantics.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::I8(a), Self::I8(b)) => Some(a.cmp(b)),
            (Self::I16(a), Self::I16(b)) => Some(a.cmp(b)),
            (Self::I32(a), Self::I32(b)) => Some(a.cmp(b)),
            (Self::I64(a), Self::I64(b)) => Some(a.cmp(b)),
            (Self::U8(a), Self::U8(b)) => Some(a.cmp(b)),
            (Self::U16(a), Self::U16(b)) => Some(a.cmp(b)),
            (Self::U32(a), Self::U32(b)) => Some(a.cmp(b)),
            (Self::U64(a), Self::U64(b)) => Some(a.cmp(b)),
            (Self::F32(a), Self::F32(b)) => a.partial_cmp(b),
            (Self::F64(a), Self::F64(b)) => a.partial_cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => Some(a.cmp(b)),
            (Self::I128(a), Self::I128(b)) => Some(a.cmp(b)),
            (Self::I256(a), Self::I256(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Successor in the domain order, `None` at the maximum and for
    /// continuous domains (floats, bytes).
    #[must_use]
    pub fn succ(&self) -> Option<Self> {
        macro_rules! arm {
            ($variant:ident, $ty:ty, $block:ident) => {
                if let Self::$variant(v) = self {
                    return v.checked_add(1).map(Self::$variant);
                }
            };
        }
        with_int_variants!(arm);
        match self {
            Self::Bool(false) => Some(Self::Bool(true)),
            Self::I256(v) => v.checked_inc().map(Self::I256),
            _ => None,
        }
    }

    /// Predecessor in the domain order, `None` at the minimum and for
    /// continuous domains.
    #[must_use]
    pub fn pred(&self) -> Option<Self> {
        macro_rules! arm {
            ($variant:ident, $ty:ty, $block:ident) => {
                if let Self::$variant(v) = self {
                    return v.checked_sub(1).map(Self::$variant);
                }
            };
        }
        with_int_variants!(arm);
        match self {
            Self::Bool(true) => Some(Self::Bool(false)),
            Self::I256(v) => v.checked_dec().map(Self::I256),
            _ => None,
        }
    }

    /// Key under which this literal appears in [`Membership`] structures.
    ///
    /// Integers are cast to `u64` (two's complement wraparound for negative
    /// values), floats use their bit pattern, bytes a deterministic hash.
    /// Wide integers have no key and force conservative membership answers.
    ///
    /// [`Membership`]: crate::bitmap::Membership
    #[must_use]
    pub fn filter_key(&self) -> Option<u64> {
        match self {
            Self::Bool(v) => Some(u64::from(*v)),
            Self::I8(v) => Some(*v as u64),
            Self::I16(v) => Some(*v as u64),
            Self::I32(v) => Some(*v as u64),
            Self::I64(v) => Some(*v as u64),
            Self::U8(v) => Some(u64::from(*v)),
            Self::U16(v) => Some(u64::from(*v)),
            Self::U32(v) => Some(u64::from(*v)),
            Self::U64(v) => Some(*v),
            // -0.0 and 0.0 are IEEE-equal but have different bit patterns
            Self::F32(v) => Some(u64::from((if *v == 0.0 { 0.0 } else { *v }).to_bits())),
            Self::F64(v) => Some((if *v == 0.0 { 0.0 } else { *v }).to_bits()),
            Self::Bytes(v) => Some(bytes_key(v)),
            Self::I128(_) | Self::I256(_) => None,
        }
    }
}

/// Deterministic membership key for a byte string.
#[must_use]
pub fn bytes_key(buf: &[u8]) -> u64 {
    // DefaultHasher::new() uses fixed keys, so values are stable within and
    // across processes of the same std version.
    let mut h = DefaultHasher::new();
    buf.hash(&mut h);
    h.finish()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Bytes(v) => write!(f, "'{}'", String::from_utf8_lossy(v)),
            Self::I128(v) => write!(f, "{v}"),
            Self::I256(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! value_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        }
    };
}

value_from!(Bool, bool);
value_from!(I8, i8);
value_from!(I16, i16);
value_from!(I32, i32);
value_from!(I64, i64);
value_from!(U8, u8);
value_from!(U16, u16);
value_from!(U32, u32);
value_from!(U64, u64);
value_from!(F32, f32);
value_from!(F64, f64);
value_from!(Bytes, Vec<u8>);
value_from!(I128, i128);
value_from!(I256, I256);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Bytes(v.as_bytes().to_vec())
    }
}

/// Inclusive range literal. Live ranges satisfy `from <= to`; the optimizer
/// collapses inverted ranges to `False` before evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeValue {
    pub from: Value,
    pub to: Value,
}

impl RangeValue {
    #[must_use]
    pub fn new(from: Value, to: Value) -> Self {
        Self { from, to }
    }

    /// True when `from > to`, i.e. the range matches nothing.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        matches!(self.from.compare(&self.to), Some(Ordering::Greater))
    }

    /// True when the range spans the whole domain of an exact domain.
    #[must_use]
    pub fn is_full_domain(&self, typ: BlockType) -> bool {
        if !typ.is_exact_domain() {
            return false;
        }
        match typ.bounds() {
            Some((min, max)) => self.from == min && self.to == max,
            None => false,
        }
    }
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

/// Element behavior shared by all typed sequences.
pub(crate) trait SeqValue: Clone {
    const BLOCK: BlockType;
    fn from_value(v: &Value) -> Self;
    fn into_value(self) -> Value;
    fn cmp_total(&self, other: &Self) -> Ordering;
    /// Number of discrete steps between `lo` and `hi` (`hi >= lo`); `None`
    /// for continuous domains or when the count exceeds `u128`.
    fn distance(lo: &Self, hi: &Self) -> Option<u128>;
}

macro_rules! seq_value_int {
    ($variant:ident, $ty:ty, $unsigned:ty, $block:ident) => {
        impl SeqValue for $ty {
            const BLOCK: BlockType = BlockType::$block;

            fn from_value(v: &Value) -> Self {
                match v {
                    Value::$variant(x) => *x,
                    _ => panic!("expected {} literal, got {:?}", Self::BLOCK, v),
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn cmp_total(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }

            fn distance(lo: &Self, hi: &Self) -> Option<u128> {
                Some((*hi as $unsigned).wrapping_sub(*lo as $unsigned) as u128)
            }
        }
    };
}

seq_value_int!(I8, i8, u8, Int8);
seq_value_int!(I16, i16, u16, Int16);
seq_value_int!(I32, i32, u32, Int32);
seq_value_int!(I64, i64, u64, Int64);
seq_value_int!(U8, u8, u8, Uint8);
seq_value_int!(U16, u16, u16, Uint16);
seq_value_int!(U32, u32, u32, Uint32);
seq_value_int!(U64, u64, u64, Uint64);
seq_value_int!(I128, i128, u128, Int128);

macro_rules! seq_value_float {
    ($variant:ident, $ty:ty, $block:ident) => {
        impl SeqValue for $ty {
            const BLOCK: BlockType = BlockType::$block;

            fn from_value(v: &Value) -> Self {
                match v {
                    Value::$variant(x) => *x,
                    _ => panic!("expected {} literal, got {:?}", Self::BLOCK, v),
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn cmp_total(&self, other: &Self) -> Ordering {
                self.total_cmp(other)
            }

            fn distance(_lo: &Self, _hi: &Self) -> Option<u128> {
                None
            }
        }
    };
}

seq_value_float!(F32, f32, Float32);
seq_value_float!(F64, f64, Float64);

impl SeqValue for bool {
    const BLOCK: BlockType = BlockType::Bool;

    fn from_value(v: &Value) -> Self {
        match v {
            Value::Bool(x) => *x,
            _ => panic!("expected bool literal, got {v:?}"),
        }
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn cmp_total(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn distance(lo: &Self, hi: &Self) -> Option<u128> {
        Some(u128::from(*hi) - u128::from(*lo))
    }
}

impl SeqValue for Vec<u8> {
    const BLOCK: BlockType = BlockType::Bytes;

    fn from_value(v: &Value) -> Self {
        match v {
            Value::Bytes(x) => x.clone(),
            _ => panic!("expected bytes literal, got {v:?}"),
        }
    }

    fn into_value(self) -> Value {
        Value::Bytes(self)
    }

    fn cmp_total(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }

    fn distance(_lo: &Self, _hi: &Self) -> Option<u128> {
        None
    }
}

impl SeqValue for I256 {
    const BLOCK: BlockType = BlockType::Int256;

    fn from_value(v: &Value) -> Self {
        match v {
            Value::I256(x) => *x,
            _ => panic!("expected i256 literal, got {v:?}"),
        }
    }

    fn into_value(self) -> Value {
        Value::I256(self)
    }

    fn cmp_total(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn distance(lo: &Self, hi: &Self) -> Option<u128> {
        let (low, borrow) = hi.low().overflowing_sub(lo.low());
        let high = (hi.high() as u128)
            .wrapping_sub(lo.high() as u128)
            .wrapping_sub(u128::from(borrow));
        (high == 0).then_some(low)
    }
}

/// Typed sequence of set literals, one variant per domain.
///
/// Filters keep set literals sorted and deduplicated; the merge operations
/// below rely on that invariant.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueSeq {
    Bool(Vec<bool>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Bytes(Vec<Vec<u8>>),
    I128(Vec<i128>),
    I256(Vec<I256>),
}

macro_rules! seq_each {
    ($self:expr, |$s:ident| $body:expr) => {
        match $self {
            ValueSeq::Bool($s) => $body,
            ValueSeq::I8($s) => $body,
            ValueSeq::I16($s) => $body,
            ValueSeq::I32($s) => $body,
            ValueSeq::I64($s) => $body,
            ValueSeq::U8($s) => $body,
            ValueSeq::U16($s) => $body,
            ValueSeq::U32($s) => $body,
            ValueSeq::U64($s) => $body,
            ValueSeq::F32($s) => $body,
            ValueSeq::F64($s) => $body,
            ValueSeq::Bytes($s) => $body,
            ValueSeq::I128($s) => $body,
            ValueSeq::I256($s) => $body,
        }
    };
}

macro_rules! seq_zip {
    ($a:expr, $b:expr, |$x:ident, $y:ident| $body:expr) => {
        match ($a, $b) {
            (ValueSeq::Bool($x), ValueSeq::Bool($y)) => ValueSeq::Bool($body),
            (ValueSeq::I8($x), ValueSeq::I8($y)) => ValueSeq::I8($body),
            (ValueSeq::I16($x), ValueSeq::I16($y)) => ValueSeq::I16($body),
            (ValueSeq::I32($x), ValueSeq::I32($y)) => ValueSeq::I32($body),
            (ValueSeq::I64($x), ValueSeq::I64($y)) => ValueSeq::I64($body),
            (ValueSeq::U8($x), ValueSeq::U8($y)) => ValueSeq::U8($body),
            (ValueSeq::U16($x), ValueSeq::U16($y)) => ValueSeq::U16($body),
            (ValueSeq::U32($x), ValueSeq::U32($y)) => ValueSeq::U32($body),
            (ValueSeq::U64($x), ValueSeq::U64($y)) => ValueSeq::U64($body),
            (ValueSeq::F32($x), ValueSeq::F32($y)) => ValueSeq::F32($body),
            (ValueSeq::F64($x), ValueSeq::F64($y)) => ValueSeq::F64($body),
            (ValueSeq::Bytes($x), ValueSeq::Bytes($y)) => ValueSeq::Bytes($body),
            (ValueSeq::I128($x), ValueSeq::I128($y)) => ValueSeq::I128($body),
            (ValueSeq::I256($x), ValueSeq::I256($y)) => ValueSeq::I256($body),
            (a, b) => panic!(
                "mismatched set domains {} and {}",
                a.block_type(),
                b.block_type()
            ),
        }
    };
}

impl ValueSeq {
    /// Domain of the sequence elements.
    #[must_use]
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Bool(_) => BlockType::Bool,
            Self::I8(_) => BlockType::Int8,
            Self::I16(_) => BlockType::Int16,
            Self::I32(_) => BlockType::Int32,
            Self::I64(_) => BlockType::Int64,
            Self::U8(_) => BlockType::Uint8,
            Self::U16(_) => BlockType::Uint16,
            Self::U32(_) => BlockType::Uint32,
            Self::U64(_) => BlockType::Uint64,
            Self::F32(_) => BlockType::Float32,
            Self::F64(_) => BlockType::Float64,
            Self::Bytes(_) => BlockType::Bytes,
            Self::I128(_) => BlockType::Int128,
            Self::I256(_) => BlockType::Int256,
        }
    }

    /// Empty sequence for a domain.
    #[must_use]
    pub fn empty(typ: BlockType) -> Self {
        match typ {
            BlockType::Bool => Self::Bool(Vec::new()),
            BlockType::Int8 => Self::I8(Vec::new()),
            BlockType::Int16 => Self::I16(Vec::new()),
            BlockType::Int32 => Self::I32(Vec::new()),
            BlockType::Int64 => Self::I64(Vec::new()),
            BlockType::Uint8 => Self::U8(Vec::new()),
            BlockType::Uint16 => Self::U16(Vec::new()),
            BlockType::Uint32 => Self::U32(Vec::new()),
            BlockType::Uint64 => Self::U64(Vec::new()),
            BlockType::Float32 => Self::F32(Vec::new()),
            BlockType::Float64 => Self::F64(Vec::new()),
            BlockType::Bytes => Self::Bytes(Vec::new()),
            BlockType::Int128 => Self::I128(Vec::new()),
            BlockType::Int256 => Self::I256(Vec::new()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        seq_each!(self, |s| s.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index` as a [`Value`].
    #[must_use]
    pub fn get(&self, index: usize) -> Value {
        seq_each!(self, |s| s[index].clone().into_value())
    }

    /// Appends a literal of the matching domain.
    pub fn push(&mut self, v: &Value) {
        seq_each!(self, |s| s.push(SeqValue::from_value(v)))
    }

    /// Sorts in total order and removes duplicates.
    pub fn sort_unique(&mut self) {
        seq_each!(self, |s| {
            s.sort_by(SeqValue::cmp_total);
            s.dedup_by(|a, b| a.cmp_total(b) == Ordering::Equal);
        })
    }

    /// Set union of two sorted unique sequences.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        seq_zip!(self, other, |a, b| merge_union(a, b))
    }

    /// Set intersection of two sorted unique sequences.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        seq_zip!(self, other, |a, b| merge_intersect(a, b))
    }

    /// Elements of `self` absent from `other` (both sorted unique).
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        seq_zip!(self, other, |a, b| merge_difference(a, b))
    }

    /// Keeps only elements inside the inclusive range `[lo, hi]`.
    pub fn retain_range(&mut self, lo: &Value, hi: &Value) {
        seq_each!(self, |s| retain_in_range(s, lo, hi))
    }

    /// Smallest and largest element, if any.
    #[must_use]
    pub fn min_max(&self) -> Option<(Value, Value)> {
        seq_each!(self, |s| {
            let first = s.first()?;
            let (lo, hi) = s.iter().skip(1).fold((first, first), |(lo, hi), v| {
                (
                    if v.cmp_total(lo) == Ordering::Less { v } else { lo },
                    if v.cmp_total(hi) == Ordering::Greater { v } else { hi },
                )
            });
            Some((lo.clone().into_value(), hi.clone().into_value()))
        })
    }

    /// For discrete domains: the span covered when the set holds every value
    /// between its minimum and maximum. `None` for continuous domains, empty
    /// sets and sets with gaps.
    #[must_use]
    pub fn contiguous_span(&self) -> Option<RangeValue> {
        let (lo, hi) = self.min_max()?;
        let steps = seq_each!(self, |s| {
            let first = s.first()?;
            let last = s.last()?;
            SeqValue::distance(first, last)
        })?;
        (steps == (self.len() as u128) - 1).then(|| RangeValue::new(lo, hi))
    }

    /// Sorted-set membership probe.
    #[must_use]
    pub fn contains(&self, v: &Value) -> bool {
        seq_each!(self, |s| {
            let probe = SeqValue::from_value(v);
            s.binary_search_by(|e| e.cmp_total(&probe)).is_ok()
        })
    }

    /// Iterates elements as [`Value`]s.
    pub fn iter_values(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}

macro_rules! seq_from {
    ($variant:ident, $ty:ty) => {
        impl From<Vec<$ty>> for ValueSeq {
            fn from(v: Vec<$ty>) -> Self {
                Self::$variant(v)
            }
        }
    };
}

seq_from!(Bool, bool);
seq_from!(I8, i8);
seq_from!(I16, i16);
seq_from!(I32, i32);
seq_from!(I64, i64);
seq_from!(U8, u8);
seq_from!(U16, u16);
seq_from!(U32, u32);
seq_from!(U64, u64);
seq_from!(F32, f32);
seq_from!(F64, f64);
seq_from!(Bytes, Vec<u8>);
seq_from!(I128, i128);
seq_from!(I256, I256);

fn merge_union<T: SeqValue>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp_total(&b[j]) {
            Ordering::Less => {
                out.push(a[i].clone());
                i += 1;
            }
            Ordering::Greater => {
                out.push(b[j].clone());
                j += 1;
            }
            Ordering::Equal => {
                out.push(a[i].clone());
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

fn merge_intersect<T: SeqValue>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp_total(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(a[i].clone());
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn merge_difference<T: SeqValue>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() {
        if j >= b.len() {
            out.extend_from_slice(&a[i..]);
            break;
        }
        match a[i].cmp_total(&b[j]) {
            Ordering::Less => {
                out.push(a[i].clone());
                i += 1;
            }
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn retain_in_range<T: SeqValue>(v: &mut Vec<T>, lo: &Value, hi: &Value) {
    let lo = T::from_value(lo);
    let hi = T::from_value(hi);
    v.retain(|e| {
        e.cmp_total(&lo) != Ordering::Less && e.cmp_total(&hi) != Ordering::Greater
    });
}

/// Literal payload owned by a [`Filter`](crate::filter::Filter).
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FilterValue {
    /// No payload; used by the synthetic `True`/`False` modes.
    #[default]
    Unit,
    Scalar(Value),
    Range(RangeValue),
    Set(ValueSeq),
}

impl FilterValue {
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_range(&self) -> Option<&RangeValue> {
        match self {
            Self::Range(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_set(&self) -> Option<&ValueSeq> {
        match self {
            Self::Set(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_RENDERED: usize = 16;
        match self {
            Self::Unit => Ok(()),
            Self::Scalar(v) => write!(f, "{v}"),
            Self::Range(r) => write!(f, "{r}"),
            Self::Set(s) if s.len() > MAX_RENDERED => write!(f, "[{} values]", s.len()),
            Self::Set(s) => {
                write!(f, "[")?;
                for (i, v) in s.iter_values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<Value> for FilterValue {
    fn from(v: Value) -> Self {
        Self::Scalar(v)
    }
}

impl From<RangeValue> for FilterValue {
    fn from(r: RangeValue) -> Self {
        Self::Range(r)
    }
}

impl From<ValueSeq> for FilterValue {
    fn from(s: ValueSeq) -> Self {
        Self::Set(s)
    }
}
