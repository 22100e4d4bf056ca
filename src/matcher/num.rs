//! Numeric matchers, monomorphized over the element type.
//!
//! Scalar comparisons use native IEEE/integer semantics (NaN fails every
//! comparison); set matchers use total order internally so float sets stay
//! well defined. Integer domains up to 64 bits keep set literals in a
//! roaring treemap keyed by the two's-complement `u64` cast; floats and wide
//! integers fall back to a sorted slice.

use std::{cmp::Ordering, fmt, marker::PhantomData};

use roaring::RoaringTreemap;

use crate::{
    bitmap::{Membership, Selection},
    block::{Block, CmpOp, NumColumn},
    matcher::{undecided, Matcher, NoopMatcher},
    num::I256,
    types::FilterMode,
    value::{FilterValue, RangeValue, SeqValue, Value, ValueSeq},
};

/// Element behavior required by the numeric matcher family.
pub(crate) trait Number:
    SeqValue + Copy + Default + PartialOrd + PartialEq + Send + Sync + fmt::Debug + 'static
{
    /// Per-comparison cost scale; wide integers compare slower.
    const WEIGHT: usize;

    /// Membership key, where the domain has one.
    fn filter_key(self) -> Option<u64>;

    /// Extracts this domain's column from a block; faults on domain
    /// mismatch (upstream binding bug).
    fn column(block: &Block) -> &NumColumn<Self>;
}

macro_rules! number_impl {
    ($ty:ty, $variant:ident, $weight:expr, |$v:ident| $key:expr) => {
        impl Number for $ty {
            const WEIGHT: usize = $weight;

            fn filter_key(self) -> Option<u64> {
                let $v = self;
                $key
            }

            fn column(block: &Block) -> &NumColumn<Self> {
                match block {
                    Block::$variant(c) => c,
                    _ => panic!(
                        "expected {} block, got {}",
                        <Self as SeqValue>::BLOCK,
                        block.block_type()
                    ),
                }
            }
        }
    };
}

number_impl!(i64, Int64, 1, |v| Some(v as u64));
number_impl!(i32, Int32, 1, |v| Some(v as u64));
number_impl!(i16, Int16, 1, |v| Some(v as u64));
number_impl!(i8, Int8, 1, |v| Some(v as u64));
number_impl!(u64, Uint64, 1, |v| Some(v));
number_impl!(u32, Uint32, 1, |v| Some(u64::from(v)));
number_impl!(u16, Uint16, 1, |v| Some(u64::from(v)));
number_impl!(u8, Uint8, 1, |v| Some(u64::from(v)));
// -0.0 normalizes to 0.0 so keys agree with IEEE equality, matching
// Value::filter_key
number_impl!(f64, Float64, 1, |v| Some(
    (if v == 0.0 { 0.0f64 } else { v }).to_bits()
));
number_impl!(f32, Float32, 1, |v| Some(u64::from(
    (if v == 0.0 { 0.0f32 } else { v }).to_bits()
)));
number_impl!(i128, Int128, 2, |_v| None);
number_impl!(I256, Int256, 4, |_v| None);

/// Integer domains whose set literals live in a roaring treemap.
pub(crate) trait BitmapKey: Number {
    fn to_key(self) -> u64;
    fn from_key(key: u64) -> Self;

    /// Key interval(s) covering the ordered value range `[from, to]`.
    /// Signed ranges straddling zero split into two intervals because the
    /// two's-complement cast wraps negative values to the top of the key
    /// space.
    fn split_keys(from: Self, to: Self) -> ((u64, u64), Option<(u64, u64)>);
}

macro_rules! bitmap_key_signed {
    ($ty:ty) => {
        impl BitmapKey for $ty {
            fn to_key(self) -> u64 {
                self as u64
            }

            fn from_key(key: u64) -> Self {
                key as $ty
            }

            fn split_keys(from: Self, to: Self) -> ((u64, u64), Option<(u64, u64)>) {
                if (from < 0) == (to < 0) {
                    ((from.to_key(), to.to_key()), None)
                } else {
                    ((from.to_key(), u64::MAX), Some((0, to.to_key())))
                }
            }
        }
    };
}

macro_rules! bitmap_key_unsigned {
    ($ty:ty) => {
        impl BitmapKey for $ty {
            fn to_key(self) -> u64 {
                self as u64
            }

            fn from_key(key: u64) -> Self {
                key as $ty
            }

            fn split_keys(from: Self, to: Self) -> ((u64, u64), Option<(u64, u64)>) {
                ((from.to_key(), to.to_key()), None)
            }
        }
    };
}

bitmap_key_signed!(i64);
bitmap_key_signed!(i32);
bitmap_key_signed!(i16);
bitmap_key_signed!(i8);
bitmap_key_unsigned!(u64);
bitmap_key_unsigned!(u32);
bitmap_key_unsigned!(u16);
bitmap_key_unsigned!(u8);

fn treemap_contains_keys(set: &RoaringTreemap, lo: u64, hi: u64) -> bool {
    debug_assert!(lo <= hi);
    let below = if lo == 0 { 0 } else { set.rank(lo - 1) };
    set.rank(hi) > below
}

fn treemap_contains_range<T: BitmapKey>(set: &RoaringTreemap, from: T, to: T) -> bool {
    let ((lo, hi), tail) = T::split_keys(from, to);
    treemap_contains_keys(set, lo, hi)
        || tail.is_some_and(|(lo, hi)| treemap_contains_keys(set, lo, hi))
}

fn any_in_range<T: Number>(vals: &[T], from: T, to: T) -> bool {
    let idx = vals.partition_point(|e| e.cmp_total(&from) == Ordering::Less);
    idx < vals.len() && vals[idx].cmp_total(&to) != Ordering::Greater
}

macro_rules! scalar_common {
    () => {
        fn with_value(&mut self, value: &Value) {
            self.val = <T as SeqValue>::from_value(value);
        }

        fn weight(&self) -> usize {
            T::WEIGHT
        }

        fn value(&self) -> FilterValue {
            FilterValue::Scalar(self.val.into_value())
        }
    };
}

#[derive(Debug, Default)]
struct EqualMatcher<T: Number> {
    val: T,
}

impl<T: Number> Matcher for EqualMatcher<T> {
    scalar_common!();

    fn match_value(&self, value: &Value) -> bool {
        T::from_value(value) == self.val
    }

    fn match_range(&self, from: &Value, to: &Value) -> bool {
        self.val >= T::from_value(from) && self.val <= T::from_value(to)
    }

    fn match_filter(&self, filter: &dyn Membership) -> bool {
        match self.val.filter_key() {
            Some(key) => filter.contains(key),
            None => true,
        }
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, mask: Option<&Selection>) {
        T::column(block).match_cmp(CmpOp::Eq, self.val, bits, mask);
    }

    fn match_range_vectors(
        &self,
        mins: &Block,
        maxs: &Block,
        bits: &mut Selection,
        mask: Option<&Selection>,
    ) {
        let mut lo = Selection::new(bits.len());
        T::column(mins).match_cmp(CmpOp::Le, self.val, &mut lo, mask);
        T::column(maxs).match_cmp(CmpOp::Ge, self.val, bits, Some(&lo));
    }
}

#[derive(Debug, Default)]
struct NotEqualMatcher<T: Number> {
    val: T,
}

impl<T: Number> Matcher for NotEqualMatcher<T> {
    scalar_common!();

    fn match_value(&self, value: &Value) -> bool {
        T::from_value(value) != self.val
    }

    fn match_range(&self, from: &Value, to: &Value) -> bool {
        !(T::from_value(from) == self.val && T::from_value(to) == self.val)
    }

    fn match_filter(&self, _filter: &dyn Membership) -> bool {
        true
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, mask: Option<&Selection>) {
        T::column(block).match_cmp(CmpOp::Ne, self.val, bits, mask);
    }

    fn match_range_vectors(
        &self,
        _mins: &Block,
        _maxs: &Block,
        bits: &mut Selection,
        mask: Option<&Selection>,
    ) {
        undecided(bits, mask);
    }
}

macro_rules! ordered_matcher {
    ($name:ident, $op:expr,
     range: |$s:ident, $from:ident, $to:ident| $range:expr,
     summary: $summary:ident) => {
        #[derive(Debug, Default)]
        struct $name<T: Number> {
            val: T,
        }

        impl<T: Number> Matcher for $name<T> {
            scalar_common!();

            fn match_value(&self, value: &Value) -> bool {
                $op.test_val(T::from_value(value), self.val)
            }

            fn match_range(&self, from: &Value, to: &Value) -> bool {
                let $s = self;
                let $from = T::from_value(from);
                let $to = T::from_value(to);
                $range
            }

            fn match_filter(&self, _filter: &dyn Membership) -> bool {
                true
            }

            fn match_vector(&self, block: &Block, bits: &mut Selection, mask: Option<&Selection>) {
                T::column(block).match_cmp($op, self.val, bits, mask);
            }

            fn match_range_vectors(
                &self,
                mins: &Block,
                maxs: &Block,
                bits: &mut Selection,
                mask: Option<&Selection>,
            ) {
                // A summary row can hold a match when its extreme on the
                // relevant side clears the bound.
                let col = summary_side!($summary, mins, maxs);
                T::column(col).match_cmp($op, self.val, bits, mask);
            }
        }
    };
}

macro_rules! summary_side {
    (maxs, $mins:expr, $maxs:expr) => {{
        let _ = $mins;
        $maxs
    }};
    (mins, $mins:expr, $maxs:expr) => {{
        let _ = $maxs;
        $mins
    }};
}

trait TestOp {
    fn test_val<T: PartialOrd>(self, v: T, val: T) -> bool;
}

impl TestOp for CmpOp {
    fn test_val<T: PartialOrd>(self, v: T, val: T) -> bool {
        match self {
            CmpOp::Eq => v == val,
            CmpOp::Ne => v != val,
            CmpOp::Gt => v > val,
            CmpOp::Ge => v >= val,
            CmpOp::Lt => v < val,
            CmpOp::Le => v <= val,
        }
    }
}

ordered_matcher!(GtMatcher, CmpOp::Gt, range: |s, _from, to| to > s.val, summary: maxs);
ordered_matcher!(GeMatcher, CmpOp::Ge, range: |s, _from, to| to >= s.val, summary: maxs);
ordered_matcher!(LtMatcher, CmpOp::Lt, range: |s, from, _to| from < s.val, summary: mins);
ordered_matcher!(LeMatcher, CmpOp::Le, range: |s, from, _to| from <= s.val, summary: mins);

#[derive(Debug, Default)]
struct RangeMatcher<T: Number> {
    from: T,
    to: T,
}

impl<T: Number> Matcher for RangeMatcher<T> {
    fn with_range(&mut self, range: &RangeValue) {
        self.from = T::from_value(&range.from);
        self.to = T::from_value(&range.to);
    }

    fn weight(&self) -> usize {
        2 * T::WEIGHT
    }

    fn len(&self) -> usize {
        2
    }

    fn value(&self) -> FilterValue {
        FilterValue::Range(RangeValue::new(
            self.from.into_value(),
            self.to.into_value(),
        ))
    }

    fn match_value(&self, value: &Value) -> bool {
        let v = T::from_value(value);
        v >= self.from && v <= self.to
    }

    fn match_range(&self, from: &Value, to: &Value) -> bool {
        T::from_value(to) >= self.from && T::from_value(from) <= self.to
    }

    fn match_filter(&self, _filter: &dyn Membership) -> bool {
        true
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, mask: Option<&Selection>) {
        T::column(block).match_between(self.from, self.to, bits, mask);
    }

    fn match_range_vectors(
        &self,
        mins: &Block,
        maxs: &Block,
        bits: &mut Selection,
        mask: Option<&Selection>,
    ) {
        let mut lo = Selection::new(bits.len());
        T::column(mins).match_cmp(CmpOp::Le, self.to, &mut lo, mask);
        T::column(maxs).match_cmp(CmpOp::Ge, self.from, bits, Some(&lo));
    }
}

#[derive(Debug, Default)]
struct BitmapSetMatcher<T: BitmapKey> {
    set: RoaringTreemap,
    _marker: PhantomData<fn() -> T>,
}

impl<T: BitmapKey> BitmapSetMatcher<T> {
    fn bind_slice(&mut self, values: &ValueSeq) {
        for v in values.iter_values() {
            self.set.insert(T::from_value(&v).to_key());
        }
    }

    fn rebuild(&self) -> FilterValue {
        let mut seq = ValueSeq::empty(<T as SeqValue>::BLOCK);
        for key in self.set.iter() {
            seq.push(&T::from_key(key).into_value());
        }
        FilterValue::Set(seq)
    }
}

#[derive(Debug, Default)]
struct InSetMatcher<T: BitmapKey> {
    inner: BitmapSetMatcher<T>,
}

impl<T: BitmapKey> Matcher for InSetMatcher<T> {
    fn with_slice(&mut self, values: &ValueSeq) {
        self.inner.bind_slice(values);
    }

    fn with_set(&mut self, set: &RoaringTreemap) {
        self.inner.set = set.clone();
    }

    fn len(&self) -> usize {
        self.inner.set.len() as usize
    }

    fn value(&self) -> FilterValue {
        self.inner.rebuild()
    }

    fn match_value(&self, value: &Value) -> bool {
        self.inner.set.contains(T::from_value(value).to_key())
    }

    fn match_range(&self, from: &Value, to: &Value) -> bool {
        treemap_contains_range(&self.inner.set, T::from_value(from), T::from_value(to))
    }

    fn match_filter(&self, filter: &dyn Membership) -> bool {
        self.inner.set.iter().any(|key| filter.contains(key))
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, mask: Option<&Selection>) {
        let set = &self.inner.set;
        T::column(block).match_with(bits, mask, |v| set.contains(v.to_key()));
    }

    fn match_range_vectors(
        &self,
        mins: &Block,
        maxs: &Block,
        bits: &mut Selection,
        mask: Option<&Selection>,
    ) {
        let minc = T::column(mins);
        let maxc = T::column(maxs);
        let probe = |row: u32| treemap_contains_range(
            &self.inner.set,
            minc.get(row as usize),
            maxc.get(row as usize),
        );
        match mask {
            Some(mask) => {
                for row in mask.iter() {
                    if probe(row) {
                        bits.set(row);
                    }
                }
            }
            None => {
                for row in 0..minc.len() as u32 {
                    if probe(row) {
                        bits.set(row);
                    }
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct NotInSetMatcher<T: BitmapKey> {
    inner: BitmapSetMatcher<T>,
}

impl<T: BitmapKey> Matcher for NotInSetMatcher<T> {
    fn with_slice(&mut self, values: &ValueSeq) {
        self.inner.bind_slice(values);
    }

    fn with_set(&mut self, set: &RoaringTreemap) {
        self.inner.set = set.clone();
    }

    fn len(&self) -> usize {
        self.inner.set.len() as usize
    }

    fn value(&self) -> FilterValue {
        self.inner.rebuild()
    }

    fn match_value(&self, value: &Value) -> bool {
        !self.inner.set.contains(T::from_value(value).to_key())
    }

    fn match_range(&self, _from: &Value, _to: &Value) -> bool {
        // A range excludes every set element only when it is a single
        // excluded point; callers normalize that case to NotEqual first.
        true
    }

    fn match_filter(&self, _filter: &dyn Membership) -> bool {
        true
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, mask: Option<&Selection>) {
        let set = &self.inner.set;
        T::column(block).match_with(bits, mask, |v| !set.contains(v.to_key()));
    }

    fn match_range_vectors(
        &self,
        _mins: &Block,
        _maxs: &Block,
        bits: &mut Selection,
        mask: Option<&Selection>,
    ) {
        undecided(bits, mask);
    }
}

#[derive(Debug, Default)]
struct OrdSetMatcher<T: Number> {
    vals: Vec<T>,
}

impl<T: Number> OrdSetMatcher<T> {
    fn bind_slice(&mut self, values: &ValueSeq) {
        self.vals = (0..values.len())
            .map(|i| T::from_value(&values.get(i)))
            .collect();
        self.vals.sort_by(SeqValue::cmp_total);
        self.vals
            .dedup_by(|a, b| a.cmp_total(b) == Ordering::Equal);
    }

    fn contains(&self, v: &T) -> bool {
        self.vals.binary_search_by(|e| e.cmp_total(v)).is_ok()
    }

    fn rebuild(&self) -> FilterValue {
        let mut seq = ValueSeq::empty(<T as SeqValue>::BLOCK);
        for v in &self.vals {
            seq.push(&(*v).into_value());
        }
        FilterValue::Set(seq)
    }
}

#[derive(Debug, Default)]
struct OrdInSetMatcher<T: Number> {
    inner: OrdSetMatcher<T>,
}

impl<T: Number> Matcher for OrdInSetMatcher<T> {
    fn with_slice(&mut self, values: &ValueSeq) {
        self.inner.bind_slice(values);
    }

    fn weight(&self) -> usize {
        self.inner.vals.len().max(1) * T::WEIGHT
    }

    fn len(&self) -> usize {
        self.inner.vals.len()
    }

    fn value(&self) -> FilterValue {
        self.inner.rebuild()
    }

    fn match_value(&self, value: &Value) -> bool {
        self.inner.contains(&T::from_value(value))
    }

    fn match_range(&self, from: &Value, to: &Value) -> bool {
        any_in_range(&self.inner.vals, T::from_value(from), T::from_value(to))
    }

    fn match_filter(&self, filter: &dyn Membership) -> bool {
        let mut keys = Vec::with_capacity(self.inner.vals.len());
        for v in &self.inner.vals {
            match v.filter_key() {
                Some(key) => keys.push(key),
                None => return true,
            }
        }
        filter.contains_any(&keys)
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, mask: Option<&Selection>) {
        let inner = &self.inner;
        T::column(block).match_with(bits, mask, |v| inner.contains(&v));
    }

    fn match_range_vectors(
        &self,
        mins: &Block,
        maxs: &Block,
        bits: &mut Selection,
        mask: Option<&Selection>,
    ) {
        let minc = T::column(mins);
        let maxc = T::column(maxs);
        let vals = &self.inner.vals;
        let probe =
            |row: u32| any_in_range(vals, minc.get(row as usize), maxc.get(row as usize));
        match mask {
            Some(mask) => {
                for row in mask.iter() {
                    if probe(row) {
                        bits.set(row);
                    }
                }
            }
            None => {
                for row in 0..minc.len() as u32 {
                    if probe(row) {
                        bits.set(row);
                    }
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct OrdNotInSetMatcher<T: Number> {
    inner: OrdSetMatcher<T>,
}

impl<T: Number> Matcher for OrdNotInSetMatcher<T> {
    fn with_slice(&mut self, values: &ValueSeq) {
        self.inner.bind_slice(values);
    }

    fn weight(&self) -> usize {
        self.inner.vals.len().max(1) * T::WEIGHT
    }

    fn len(&self) -> usize {
        self.inner.vals.len()
    }

    fn value(&self) -> FilterValue {
        self.inner.rebuild()
    }

    fn match_value(&self, value: &Value) -> bool {
        !self.inner.contains(&T::from_value(value))
    }

    fn match_range(&self, _from: &Value, _to: &Value) -> bool {
        true
    }

    fn match_filter(&self, _filter: &dyn Membership) -> bool {
        true
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, mask: Option<&Selection>) {
        let inner = &self.inner;
        T::column(block).match_with(bits, mask, |v| !inner.contains(&v));
    }

    fn match_range_vectors(
        &self,
        _mins: &Block,
        _maxs: &Block,
        bits: &mut Selection,
        mask: Option<&Selection>,
    ) {
        undecided(bits, mask);
    }
}

/// Matcher factory for integer domains with bitmap set support.
pub(crate) fn new_int_matcher<T: BitmapKey>(mode: FilterMode) -> Box<dyn Matcher> {
    match mode {
        FilterMode::Equal => Box::new(EqualMatcher::<T>::default()),
        FilterMode::NotEqual => Box::new(NotEqualMatcher::<T>::default()),
        FilterMode::Gt => Box::new(GtMatcher::<T>::default()),
        FilterMode::Ge => Box::new(GeMatcher::<T>::default()),
        FilterMode::Lt => Box::new(LtMatcher::<T>::default()),
        FilterMode::Le => Box::new(LeMatcher::<T>::default()),
        FilterMode::In => Box::new(InSetMatcher::<T>::default()),
        FilterMode::NotIn => Box::new(NotInSetMatcher::<T>::default()),
        FilterMode::Range => Box::new(RangeMatcher::<T>::default()),
        FilterMode::Regexp | FilterMode::True | FilterMode::False => Box::new(NoopMatcher),
    }
}

/// Matcher factory for float and wide integer domains; sets use sorted
/// slices in total order.
pub(crate) fn new_real_matcher<T: Number>(mode: FilterMode) -> Box<dyn Matcher> {
    match mode {
        FilterMode::Equal => Box::new(EqualMatcher::<T>::default()),
        FilterMode::NotEqual => Box::new(NotEqualMatcher::<T>::default()),
        FilterMode::Gt => Box::new(GtMatcher::<T>::default()),
        FilterMode::Ge => Box::new(GeMatcher::<T>::default()),
        FilterMode::Lt => Box::new(LtMatcher::<T>::default()),
        FilterMode::Le => Box::new(LeMatcher::<T>::default()),
        FilterMode::In => Box::new(OrdInSetMatcher::<T>::default()),
        FilterMode::NotIn => Box::new(OrdNotInSetMatcher::<T>::default()),
        FilterMode::Range => Box::new(RangeMatcher::<T>::default()),
        FilterMode::Regexp | FilterMode::True | FilterMode::False => Box::new(NoopMatcher),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{matcher::new_matcher, types::BlockType};

    fn bits_of(s: &Selection) -> Vec<u32> {
        s.iter().collect()
    }

    fn run(typ: BlockType, mode: FilterMode, bind: impl FnOnce(&mut dyn Matcher), block: &Block) -> Vec<u32> {
        let mut m = new_matcher(typ, mode);
        bind(m.as_mut());
        let mut bits = Selection::new(block.len() as u32);
        m.match_vector(block, &mut bits, None);
        bits_of(&bits)
    }

    #[test]
    fn scalar_truth_tables_i64() {
        let block = Block::from(vec![-3i64, 0, 5, 5, 9]);
        let v = Value::I64(5);
        let cases: [(FilterMode, Vec<u32>); 6] = [
            (FilterMode::Equal, vec![2, 3]),
            (FilterMode::NotEqual, vec![0, 1, 4]),
            (FilterMode::Gt, vec![4]),
            (FilterMode::Ge, vec![2, 3, 4]),
            (FilterMode::Lt, vec![0, 1]),
            (FilterMode::Le, vec![0, 1, 2, 3]),
        ];
        for (mode, want) in cases {
            let got = run(BlockType::Int64, mode, |m| m.with_value(&v), &block);
            assert_eq!(got, want, "{mode}");
        }
    }

    #[test]
    fn range_matcher_inclusive_bounds() {
        let block = Block::from(vec![1u16, 4, 7, 10]);
        let got = run(
            BlockType::Uint16,
            FilterMode::Range,
            |m| m.with_range(&RangeValue::new(Value::U16(4), Value::U16(7))),
            &block,
        );
        assert_eq!(got, vec![1, 2]);

        let mut m = new_matcher(BlockType::Uint16, FilterMode::Range);
        m.with_range(&RangeValue::new(Value::U16(4), Value::U16(7)));
        assert!(m.match_value(&Value::U16(4)));
        assert!(m.match_value(&Value::U16(7)));
        assert!(!m.match_value(&Value::U16(8)));
        assert!(m.match_range(&Value::U16(7), &Value::U16(20)));
        assert!(!m.match_range(&Value::U16(8), &Value::U16(20)));
    }

    #[test]
    fn bitmap_set_negative_values() {
        let seq = ValueSeq::from(vec![-2i32, 3]);
        let mut m = new_matcher(BlockType::Int32, FilterMode::In);
        m.with_slice(&seq);
        assert!(m.match_value(&Value::I32(-2)));
        assert!(m.match_value(&Value::I32(3)));
        assert!(!m.match_value(&Value::I32(0)));
        assert_eq!(m.len(), 2);

        // range straddling zero must see both halves of the key space
        assert!(m.match_range(&Value::I32(-5), &Value::I32(0)));
        assert!(m.match_range(&Value::I32(0), &Value::I32(5)));
        assert!(!m.match_range(&Value::I32(-1), &Value::I32(2)));

        let block = Block::from(vec![-2i32, -1, 3, 7]);
        let mut bits = Selection::new(4);
        m.match_vector(&block, &mut bits, None);
        assert_eq!(bits_of(&bits), vec![0, 2]);
    }

    #[test]
    fn not_in_set_vector() {
        let seq = ValueSeq::from(vec![5u8, 7]);
        let mut m = new_matcher(BlockType::Uint8, FilterMode::NotIn);
        m.with_slice(&seq);
        let block = Block::from(vec![5u8, 6, 7, 8]);
        let mut bits = Selection::new(4);
        m.match_vector(&block, &mut bits, None);
        assert_eq!(bits_of(&bits), vec![1, 3]);
        assert!(m.match_range(&Value::U8(0), &Value::U8(255)));
    }

    #[test]
    fn ord_set_floats_and_nan() {
        let seq = ValueSeq::from(vec![1.5f64, -0.5]);
        let mut m = new_matcher(BlockType::Float64, FilterMode::In);
        m.with_slice(&seq);
        assert!(m.match_value(&Value::F64(1.5)));
        assert!(!m.match_value(&Value::F64(0.0)));
        assert!(!m.match_value(&Value::F64(f64::NAN)));
        assert!(m.match_range(&Value::F64(0.0), &Value::F64(2.0)));
        assert!(!m.match_range(&Value::F64(2.0), &Value::F64(3.0)));
        assert_eq!(m.weight(), 2);
    }

    #[test]
    fn nan_fails_scalar_comparisons() {
        let block = Block::from(vec![1.0f64, f64::NAN, 3.0]);
        for mode in [
            FilterMode::Equal,
            FilterMode::Gt,
            FilterMode::Ge,
            FilterMode::Lt,
            FilterMode::Le,
        ] {
            let got = run(
                BlockType::Float64,
                mode,
                |m| m.with_value(&Value::F64(2.0)),
                &block,
            );
            assert!(!got.contains(&1), "{mode} matched NaN");
        }
        // NaN != x is true under IEEE
        let got = run(
            BlockType::Float64,
            FilterMode::NotEqual,
            |m| m.with_value(&Value::F64(2.0)),
            &block,
        );
        assert_eq!(got, vec![0, 1, 2]);
    }

    #[test]
    fn wide_integer_matchers() {
        let block = Block::from(vec![I256::from(-5i128), I256::ZERO, I256::MAX]);
        let got = run(
            BlockType::Int256,
            FilterMode::Gt,
            |m| m.with_value(&Value::I256(I256::ZERO)),
            &block,
        );
        assert_eq!(got, vec![2]);

        let mut m = new_matcher(BlockType::Int256, FilterMode::Equal);
        m.with_value(&Value::I256(I256::ZERO));
        assert_eq!(m.weight(), 4);

        let got = run(
            BlockType::Int128,
            FilterMode::In,
            |m| m.with_slice(&ValueSeq::from(vec![1i128, i128::MIN])),
            &Block::from(vec![i128::MIN, 0, 1]),
        );
        assert_eq!(got, vec![0, 2]);
    }

    #[test]
    fn range_vectors_per_mode() {
        // summary vectors: three stripes with [min,max] pairs
        let mins = Block::from(vec![0i64, 10, 20]);
        let maxs = Block::from(vec![9i64, 19, 29]);
        let probe = |mode: FilterMode, bind: &dyn Fn(&mut dyn Matcher)| {
            let mut m = new_matcher(BlockType::Int64, mode);
            bind(&mut *m);
            let mut bits = Selection::new(3);
            m.match_range_vectors(&mins, &maxs, &mut bits, None);
            bits_of(&bits)
        };

        let v = Value::I64(12);
        assert_eq!(probe(FilterMode::Equal, &|m| m.with_value(&v)), vec![1]);
        assert_eq!(probe(FilterMode::Gt, &|m| m.with_value(&Value::I64(19))), vec![2]);
        assert_eq!(probe(FilterMode::Ge, &|m| m.with_value(&Value::I64(19))), vec![1, 2]);
        assert_eq!(probe(FilterMode::Lt, &|m| m.with_value(&Value::I64(10))), vec![0]);
        assert_eq!(probe(FilterMode::Le, &|m| m.with_value(&Value::I64(10))), vec![0, 1]);
        assert_eq!(
            probe(FilterMode::Range, &|m| m.with_range(&RangeValue::new(
                Value::I64(15),
                Value::I64(22)
            ))),
            vec![1, 2]
        );
        assert_eq!(
            probe(FilterMode::In, &|m| m.with_slice(&ValueSeq::from(vec![5i64, 25]))),
            vec![0, 2]
        );
        // undecided modes select every candidate
        assert_eq!(
            probe(FilterMode::NotEqual, &|m| m.with_value(&v)),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn set_value_round_trip() {
        let mut m = new_matcher(BlockType::Uint32, FilterMode::In);
        m.with_slice(&ValueSeq::from(vec![9u32, 2, 9, 4]));
        assert_eq!(
            m.value(),
            FilterValue::Set(ValueSeq::from(vec![2u32, 4, 9]))
        );
    }
}
