//! Boolean matchers.
//!
//! Bool columns are bit vectors, so every mode reduces to a closed form
//! over the column bits: copy, complement, all-ones or all-zeros. The
//! two-value domain also collapses set literals to a pair of flags.

use roaring::RoaringTreemap;

use crate::{
    bitmap::{Membership, Selection},
    block::Block,
    matcher::{Matcher, NoopMatcher},
    types::FilterMode,
    value::{FilterValue, RangeValue, SeqValue, Value, ValueSeq},
};

fn bool_column(block: &Block) -> &Selection {
    match block {
        Block::Bool(bits) => bits,
        _ => panic!("expected bool block, got {}", block.block_type()),
    }
}

macro_rules! bool_scalar_common {
    () => {
        fn with_value(&mut self, value: &Value) {
            self.val = bool::from_value(value);
        }

        fn value(&self) -> FilterValue {
            FilterValue::Scalar(Value::Bool(self.val))
        }
    };
}

#[derive(Debug, Default)]
struct BoolEqualMatcher {
    val: bool,
}

impl Matcher for BoolEqualMatcher {
    bool_scalar_common!();

    fn match_value(&self, value: &Value) -> bool {
        bool::from_value(value) == self.val
    }

    fn match_range(&self, from: &Value, to: &Value) -> bool {
        bool::from_value(from) <= self.val && self.val <= bool::from_value(to)
    }

    fn match_filter(&self, filter: &dyn Membership) -> bool {
        filter.contains(u64::from(self.val))
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, _mask: Option<&Selection>) {
        bits.copy_from(bool_column(block));
        if !self.val {
            bits.neg();
        }
    }

    fn match_range_vectors(
        &self,
        mins: &Block,
        maxs: &Block,
        bits: &mut Selection,
        _mask: Option<&Selection>,
    ) {
        if self.val {
            bits.copy_from(bool_column(maxs));
        } else {
            bits.copy_from(bool_column(mins));
            bits.neg();
        }
    }
}

#[derive(Debug, Default)]
struct BoolNotEqualMatcher {
    val: bool,
}

impl Matcher for BoolNotEqualMatcher {
    bool_scalar_common!();

    fn match_value(&self, value: &Value) -> bool {
        bool::from_value(value) != self.val
    }

    fn match_range(&self, from: &Value, to: &Value) -> bool {
        !(bool::from_value(from) == self.val && bool::from_value(to) == self.val)
    }

    fn match_filter(&self, _filter: &dyn Membership) -> bool {
        true
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, _mask: Option<&Selection>) {
        bits.copy_from(bool_column(block));
        if self.val {
            bits.neg();
        }
    }

    fn match_range_vectors(
        &self,
        mins: &Block,
        maxs: &Block,
        bits: &mut Selection,
        _mask: Option<&Selection>,
    ) {
        // excluded only when min == max == val
        bits.copy_from(bool_column(mins));
        if self.val {
            bits.and(bool_column(maxs));
            bits.neg();
        } else {
            bits.or(bool_column(maxs));
        }
    }
}

#[derive(Debug, Default)]
struct BoolGtMatcher {
    val: bool,
}

impl Matcher for BoolGtMatcher {
    bool_scalar_common!();

    fn match_value(&self, value: &Value) -> bool {
        bool::from_value(value) > self.val
    }

    fn match_range(&self, _from: &Value, to: &Value) -> bool {
        bool::from_value(to) > self.val
    }

    fn match_filter(&self, _filter: &dyn Membership) -> bool {
        true
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, _mask: Option<&Selection>) {
        // v > true never holds
        if !self.val {
            bits.copy_from(bool_column(block));
        }
    }

    fn match_range_vectors(
        &self,
        _mins: &Block,
        maxs: &Block,
        bits: &mut Selection,
        _mask: Option<&Selection>,
    ) {
        if !self.val {
            bits.copy_from(bool_column(maxs));
        }
    }
}

#[derive(Debug, Default)]
struct BoolGeMatcher {
    val: bool,
}

impl Matcher for BoolGeMatcher {
    bool_scalar_common!();

    fn match_value(&self, value: &Value) -> bool {
        bool::from_value(value) >= self.val
    }

    fn match_range(&self, _from: &Value, to: &Value) -> bool {
        bool::from_value(to) >= self.val
    }

    fn match_filter(&self, _filter: &dyn Membership) -> bool {
        true
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, _mask: Option<&Selection>) {
        // v >= false always holds
        if self.val {
            bits.copy_from(bool_column(block));
        } else {
            bits.one();
        }
    }

    fn match_range_vectors(
        &self,
        _mins: &Block,
        maxs: &Block,
        bits: &mut Selection,
        _mask: Option<&Selection>,
    ) {
        if self.val {
            bits.copy_from(bool_column(maxs));
        } else {
            bits.one();
        }
    }
}

#[derive(Debug, Default)]
struct BoolLtMatcher {
    val: bool,
}

impl Matcher for BoolLtMatcher {
    bool_scalar_common!();

    fn match_value(&self, value: &Value) -> bool {
        bool::from_value(value) < self.val
    }

    fn match_range(&self, from: &Value, _to: &Value) -> bool {
        bool::from_value(from) < self.val
    }

    fn match_filter(&self, _filter: &dyn Membership) -> bool {
        true
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, _mask: Option<&Selection>) {
        if self.val {
            bits.copy_from(bool_column(block));
            bits.neg();
        }
    }

    fn match_range_vectors(
        &self,
        mins: &Block,
        _maxs: &Block,
        bits: &mut Selection,
        _mask: Option<&Selection>,
    ) {
        if self.val {
            bits.copy_from(bool_column(mins));
            bits.neg();
        }
    }
}

#[derive(Debug, Default)]
struct BoolLeMatcher {
    val: bool,
}

impl Matcher for BoolLeMatcher {
    bool_scalar_common!();

    fn match_value(&self, value: &Value) -> bool {
        bool::from_value(value) <= self.val
    }

    fn match_range(&self, from: &Value, _to: &Value) -> bool {
        bool::from_value(from) <= self.val
    }

    fn match_filter(&self, _filter: &dyn Membership) -> bool {
        true
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, _mask: Option<&Selection>) {
        if self.val {
            bits.one();
        } else {
            bits.copy_from(bool_column(block));
            bits.neg();
        }
    }

    fn match_range_vectors(
        &self,
        mins: &Block,
        _maxs: &Block,
        bits: &mut Selection,
        _mask: Option<&Selection>,
    ) {
        if self.val {
            bits.one();
        } else {
            bits.copy_from(bool_column(mins));
            bits.neg();
        }
    }
}

#[derive(Debug, Default)]
struct BoolRangeMatcher {
    from: bool,
    to: bool,
}

impl BoolRangeMatcher {
    fn kernel(&self, col: &Selection, bits: &mut Selection) {
        match (self.from, self.to) {
            (false, true) => bits.one(),
            (true, true) => bits.copy_from(col),
            (false, false) => {
                bits.copy_from(col);
                bits.neg();
            }
            (true, false) => {}
        }
    }
}

impl Matcher for BoolRangeMatcher {
    fn with_range(&mut self, range: &RangeValue) {
        self.from = bool::from_value(&range.from);
        self.to = bool::from_value(&range.to);
    }

    fn len(&self) -> usize {
        2
    }

    fn value(&self) -> FilterValue {
        FilterValue::Range(RangeValue::new(
            Value::Bool(self.from),
            Value::Bool(self.to),
        ))
    }

    fn match_value(&self, value: &Value) -> bool {
        let v = bool::from_value(value);
        v >= self.from && v <= self.to
    }

    fn match_range(&self, from: &Value, to: &Value) -> bool {
        bool::from_value(to) >= self.from && bool::from_value(from) <= self.to
    }

    fn match_filter(&self, _filter: &dyn Membership) -> bool {
        true
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, _mask: Option<&Selection>) {
        self.kernel(bool_column(block), bits);
    }

    fn match_range_vectors(
        &self,
        mins: &Block,
        maxs: &Block,
        bits: &mut Selection,
        _mask: Option<&Selection>,
    ) {
        match (self.from, self.to) {
            (false, true) => bits.one(),
            (true, true) => bits.copy_from(bool_column(maxs)),
            (false, false) => {
                bits.copy_from(bool_column(mins));
                bits.neg();
            }
            (true, false) => {}
        }
    }
}

/// Shared flag pair: which of the two domain values a set matcher accepts.
#[derive(Debug, Default)]
struct BoolFlags {
    has_false: bool,
    has_true: bool,
}

impl BoolFlags {
    fn bind_slice(&mut self, values: &ValueSeq) {
        for v in values.iter_values() {
            if bool::from_value(&v) {
                self.has_true = true;
            } else {
                self.has_false = true;
            }
        }
    }

    fn bind_set(&mut self, set: &RoaringTreemap) {
        self.has_false = set.contains(0);
        self.has_true = set.contains(1);
    }

    fn count(&self) -> usize {
        usize::from(self.has_false) + usize::from(self.has_true)
    }

    fn rebuild(&self) -> ValueSeq {
        let mut vals = Vec::new();
        if self.has_false {
            vals.push(false);
        }
        if self.has_true {
            vals.push(true);
        }
        ValueSeq::Bool(vals)
    }

    fn accepts(&self, v: bool) -> bool {
        if v {
            self.has_true
        } else {
            self.has_false
        }
    }

    /// Could a value in `[from, to]` be accepted?
    fn overlaps(&self, from: bool, to: bool) -> bool {
        (self.has_false && !from) || (self.has_true && to)
    }

    fn kernel(&self, col: &Selection, bits: &mut Selection) {
        match (self.has_false, self.has_true) {
            (true, true) => bits.one(),
            (false, true) => bits.copy_from(col),
            (true, false) => {
                bits.copy_from(col);
                bits.neg();
            }
            (false, false) => {}
        }
    }

    fn summary_kernel(&self, mins: &Selection, maxs: &Selection, bits: &mut Selection) {
        match (self.has_false, self.has_true) {
            (true, true) => bits.one(),
            (false, true) => bits.copy_from(maxs),
            (true, false) => {
                bits.copy_from(mins);
                bits.neg();
            }
            (false, false) => {}
        }
    }
}

#[derive(Debug, Default)]
struct BoolInSetMatcher {
    flags: BoolFlags,
}

impl Matcher for BoolInSetMatcher {
    fn with_slice(&mut self, values: &ValueSeq) {
        self.flags.bind_slice(values);
    }

    fn with_set(&mut self, set: &RoaringTreemap) {
        self.flags.bind_set(set);
    }

    fn len(&self) -> usize {
        self.flags.count()
    }

    fn value(&self) -> FilterValue {
        FilterValue::Set(self.flags.rebuild())
    }

    fn match_value(&self, value: &Value) -> bool {
        self.flags.accepts(bool::from_value(value))
    }

    fn match_range(&self, from: &Value, to: &Value) -> bool {
        self.flags
            .overlaps(bool::from_value(from), bool::from_value(to))
    }

    fn match_filter(&self, filter: &dyn Membership) -> bool {
        (self.flags.has_false && filter.contains(0))
            || (self.flags.has_true && filter.contains(1))
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, _mask: Option<&Selection>) {
        self.flags.kernel(bool_column(block), bits);
    }

    fn match_range_vectors(
        &self,
        mins: &Block,
        maxs: &Block,
        bits: &mut Selection,
        _mask: Option<&Selection>,
    ) {
        self.flags
            .summary_kernel(bool_column(mins), bool_column(maxs), bits);
    }
}

#[derive(Debug, Default)]
struct BoolNotInSetMatcher {
    excluded: BoolFlags,
    allowed: BoolFlags,
}

impl BoolNotInSetMatcher {
    fn refresh(&mut self) {
        self.allowed = BoolFlags {
            has_false: !self.excluded.has_false,
            has_true: !self.excluded.has_true,
        };
    }
}

impl Matcher for BoolNotInSetMatcher {
    fn with_slice(&mut self, values: &ValueSeq) {
        self.excluded.bind_slice(values);
        self.refresh();
    }

    fn with_set(&mut self, set: &RoaringTreemap) {
        self.excluded.bind_set(set);
        self.refresh();
    }

    fn len(&self) -> usize {
        self.excluded.count()
    }

    fn value(&self) -> FilterValue {
        FilterValue::Set(self.excluded.rebuild())
    }

    fn match_value(&self, value: &Value) -> bool {
        self.allowed.accepts(bool::from_value(value))
    }

    fn match_range(&self, from: &Value, to: &Value) -> bool {
        self.allowed
            .overlaps(bool::from_value(from), bool::from_value(to))
    }

    fn match_filter(&self, _filter: &dyn Membership) -> bool {
        true
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, _mask: Option<&Selection>) {
        self.allowed.kernel(bool_column(block), bits);
    }

    fn match_range_vectors(
        &self,
        mins: &Block,
        maxs: &Block,
        bits: &mut Selection,
        _mask: Option<&Selection>,
    ) {
        self.allowed
            .summary_kernel(bool_column(mins), bool_column(maxs), bits);
    }
}

/// Matcher factory for the bool domain.
pub(crate) fn new_bool_matcher(mode: FilterMode) -> Box<dyn Matcher> {
    match mode {
        FilterMode::Equal => Box::<BoolEqualMatcher>::default(),
        FilterMode::NotEqual => Box::<BoolNotEqualMatcher>::default(),
        FilterMode::Gt => Box::<BoolGtMatcher>::default(),
        FilterMode::Ge => Box::<BoolGeMatcher>::default(),
        FilterMode::Lt => Box::<BoolLtMatcher>::default(),
        FilterMode::Le => Box::<BoolLeMatcher>::default(),
        FilterMode::In => Box::<BoolInSetMatcher>::default(),
        FilterMode::NotIn => Box::<BoolNotInSetMatcher>::default(),
        FilterMode::Range => Box::<BoolRangeMatcher>::default(),
        FilterMode::Regexp | FilterMode::True | FilterMode::False => Box::new(NoopMatcher),
    }
}
