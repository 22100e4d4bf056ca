//! Byte-string matchers: lexicographic comparisons, ordered set lookups
//! and regular expressions over raw bytes.

use std::cmp::Ordering;

use crate::{
    bitmap::{Membership, Selection},
    block::Block,
    matcher::{undecided, Matcher, NoopMatcher},
    types::FilterMode,
    value::{bytes_key, FilterValue, RangeValue, Value, ValueSeq},
};

fn bytes_column(block: &Block) -> &[Vec<u8>] {
    match block {
        Block::Bytes(vals) => vals,
        _ => panic!("expected bytes block, got {}", block.block_type()),
    }
}

fn bytes_value(value: &Value) -> &[u8] {
    match value {
        Value::Bytes(v) => v,
        _ => panic!("expected bytes literal, got {value:?}"),
    }
}

fn scan(vals: &[Vec<u8>], bits: &mut Selection, mask: Option<&Selection>, pred: impl Fn(&[u8]) -> bool) {
    match mask {
        Some(mask) => {
            for row in mask.iter() {
                if pred(&vals[row as usize]) {
                    bits.set(row);
                }
            }
        }
        None => {
            for (row, v) in vals.iter().enumerate() {
                if pred(v) {
                    bits.set(row as u32);
                }
            }
        }
    }
}

fn scan_rows(len: usize, bits: &mut Selection, mask: Option<&Selection>, pred: impl Fn(u32) -> bool) {
    match mask {
        Some(mask) => {
            for row in mask.iter() {
                if pred(row) {
                    bits.set(row);
                }
            }
        }
        None => {
            for row in 0..len as u32 {
                if pred(row) {
                    bits.set(row);
                }
            }
        }
    }
}

macro_rules! bytes_scalar_common {
    () => {
        fn with_value(&mut self, value: &Value) {
            self.val = bytes_value(value).to_vec();
        }

        fn weight(&self) -> usize {
            self.val.len().max(1)
        }

        fn value(&self) -> FilterValue {
            FilterValue::Scalar(Value::Bytes(self.val.clone()))
        }
    };
}

macro_rules! bytes_cmp_matcher {
    ($name:ident,
     test: |$v:ident, $val:ident| $test:expr,
     range: |$s:ident, $from:ident, $to:ident| $range:expr,
     summary: |$mins:ident, $maxs:ident, $row:ident, $sv:ident| $summary:expr) => {
        #[derive(Debug, Default)]
        struct $name {
            val: Vec<u8>,
        }

        impl Matcher for $name {
            bytes_scalar_common!();

            fn match_value(&self, value: &Value) -> bool {
                let $v = bytes_value(value);
                let $val = self.val.as_slice();
                $test
            }

            fn match_range(&self, from: &Value, to: &Value) -> bool {
                let $s = self.val.as_slice();
                let $from = bytes_value(from);
                let $to = bytes_value(to);
                $range
            }

            fn match_filter(&self, _filter: &dyn Membership) -> bool {
                true
            }

            fn match_vector(&self, block: &Block, bits: &mut Selection, mask: Option<&Selection>) {
                let val = self.val.as_slice();
                scan(bytes_column(block), bits, mask, |$v| {
                    let $val = val;
                    $test
                });
            }

            fn match_range_vectors(
                &self,
                mins: &Block,
                maxs: &Block,
                bits: &mut Selection,
                mask: Option<&Selection>,
            ) {
                let $mins = bytes_column(mins);
                let $maxs = bytes_column(maxs);
                let $sv = self.val.as_slice();
                scan_rows($mins.len(), bits, mask, |$row| $summary);
            }
        }
    };
}

bytes_cmp_matcher!(
    BytesNotEqualMatcher,
    test: |v, val| v != val,
    range: |s, from, to| !(from == s && to == s),
    summary: |mins, maxs, row, sv| {
        !(mins[row as usize].as_slice() == sv && maxs[row as usize].as_slice() == sv)
    }
);
bytes_cmp_matcher!(
    BytesGtMatcher,
    test: |v, val| v > val,
    range: |s, _from, to| to > s,
    summary: |_mins, maxs, row, sv| maxs[row as usize].as_slice() > sv
);
bytes_cmp_matcher!(
    BytesGeMatcher,
    test: |v, val| v >= val,
    range: |s, _from, to| to >= s,
    summary: |_mins, maxs, row, sv| maxs[row as usize].as_slice() >= sv
);
bytes_cmp_matcher!(
    BytesLtMatcher,
    test: |v, val| v < val,
    range: |s, from, _to| from < s,
    summary: |mins, _maxs, row, sv| mins[row as usize].as_slice() < sv
);
bytes_cmp_matcher!(
    BytesLeMatcher,
    test: |v, val| v <= val,
    range: |s, from, _to| from <= s,
    summary: |mins, _maxs, row, sv| mins[row as usize].as_slice() <= sv
);

#[derive(Debug, Default)]
struct BytesEqualMatcher {
    val: Vec<u8>,
}

impl Matcher for BytesEqualMatcher {
    bytes_scalar_common!();

    fn match_value(&self, value: &Value) -> bool {
        bytes_value(value) == self.val.as_slice()
    }

    fn match_range(&self, from: &Value, to: &Value) -> bool {
        let val = self.val.as_slice();
        bytes_value(from) <= val && val <= bytes_value(to)
    }

    fn match_filter(&self, filter: &dyn Membership) -> bool {
        filter.contains(bytes_key(&self.val))
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, mask: Option<&Selection>) {
        let val = self.val.as_slice();
        scan(bytes_column(block), bits, mask, |v| v == val);
    }

    fn match_range_vectors(
        &self,
        mins: &Block,
        maxs: &Block,
        bits: &mut Selection,
        mask: Option<&Selection>,
    ) {
        let mins = bytes_column(mins);
        let maxs = bytes_column(maxs);
        let val = self.val.as_slice();
        scan_rows(mins.len(), bits, mask, |row| {
            mins[row as usize].as_slice() <= val && maxs[row as usize].as_slice() >= val
        });
    }
}

#[derive(Debug, Default)]
struct BytesRangeMatcher {
    from: Vec<u8>,
    to: Vec<u8>,
}

impl Matcher for BytesRangeMatcher {
    fn with_range(&mut self, range: &RangeValue) {
        self.from = bytes_value(&range.from).to_vec();
        self.to = bytes_value(&range.to).to_vec();
    }

    fn weight(&self) -> usize {
        (self.from.len() + self.to.len()).max(1)
    }

    fn len(&self) -> usize {
        2
    }

    fn value(&self) -> FilterValue {
        FilterValue::Range(RangeValue::new(
            Value::Bytes(self.from.clone()),
            Value::Bytes(self.to.clone()),
        ))
    }

    fn match_value(&self, value: &Value) -> bool {
        let v = bytes_value(value);
        v >= self.from.as_slice() && v <= self.to.as_slice()
    }

    fn match_range(&self, from: &Value, to: &Value) -> bool {
        bytes_value(to) >= self.from.as_slice() && bytes_value(from) <= self.to.as_slice()
    }

    fn match_filter(&self, _filter: &dyn Membership) -> bool {
        true
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, mask: Option<&Selection>) {
        let (from, to) = (self.from.as_slice(), self.to.as_slice());
        scan(bytes_column(block), bits, mask, |v| v >= from && v <= to);
    }

    fn match_range_vectors(
        &self,
        mins: &Block,
        maxs: &Block,
        bits: &mut Selection,
        mask: Option<&Selection>,
    ) {
        let mins = bytes_column(mins);
        let maxs = bytes_column(maxs);
        let (from, to) = (self.from.as_slice(), self.to.as_slice());
        scan_rows(mins.len(), bits, mask, |row| {
            mins[row as usize].as_slice() <= to && maxs[row as usize].as_slice() >= from
        });
    }
}

const BYTES_SET_WEIGHT: usize = 10;

/// Sorted unique literal set plus precomputed membership keys.
#[derive(Debug, Default)]
struct BytesSet {
    vals: Vec<Vec<u8>>,
    keys: Vec<u64>,
}

impl BytesSet {
    fn bind_slice(&mut self, values: &ValueSeq) {
        let mut vals: Vec<Vec<u8>> = match values {
            ValueSeq::Bytes(v) => v.clone(),
            _ => panic!("expected bytes set, got {} set", values.block_type()),
        };
        vals.sort();
        vals.dedup();
        self.keys = vals.iter().map(|v| bytes_key(v)).collect();
        self.vals = vals;
    }

    fn contains(&self, v: &[u8]) -> bool {
        self.vals.binary_search_by(|e| e.as_slice().cmp(v)).is_ok()
    }

    fn any_in_range(&self, from: &[u8], to: &[u8]) -> bool {
        let idx = self
            .vals
            .partition_point(|e| e.as_slice().cmp(from) == Ordering::Less);
        idx < self.vals.len() && self.vals[idx].as_slice() <= to
    }

    fn rebuild(&self) -> FilterValue {
        FilterValue::Set(ValueSeq::Bytes(self.vals.clone()))
    }
}

#[derive(Debug, Default)]
struct BytesInSetMatcher {
    set: BytesSet,
}

impl Matcher for BytesInSetMatcher {
    fn with_slice(&mut self, values: &ValueSeq) {
        self.set.bind_slice(values);
    }

    fn weight(&self) -> usize {
        BYTES_SET_WEIGHT
    }

    fn len(&self) -> usize {
        self.set.vals.len()
    }

    fn value(&self) -> FilterValue {
        self.set.rebuild()
    }

    fn match_value(&self, value: &Value) -> bool {
        self.set.contains(bytes_value(value))
    }

    fn match_range(&self, from: &Value, to: &Value) -> bool {
        self.set.any_in_range(bytes_value(from), bytes_value(to))
    }

    fn match_filter(&self, filter: &dyn Membership) -> bool {
        filter.contains_any(&self.set.keys)
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, mask: Option<&Selection>) {
        let set = &self.set;
        scan(bytes_column(block), bits, mask, |v| set.contains(v));
    }

    fn match_range_vectors(
        &self,
        mins: &Block,
        maxs: &Block,
        bits: &mut Selection,
        mask: Option<&Selection>,
    ) {
        let mins = bytes_column(mins);
        let maxs = bytes_column(maxs);
        let set = &self.set;
        scan_rows(mins.len(), bits, mask, |row| {
            set.any_in_range(&mins[row as usize], &maxs[row as usize])
        });
    }
}

#[derive(Debug, Default)]
struct BytesNotInSetMatcher {
    set: BytesSet,
}

impl Matcher for BytesNotInSetMatcher {
    fn with_slice(&mut self, values: &ValueSeq) {
        self.set.bind_slice(values);
    }

    fn weight(&self) -> usize {
        BYTES_SET_WEIGHT
    }

    fn len(&self) -> usize {
        self.set.vals.len()
    }

    fn value(&self) -> FilterValue {
        self.set.rebuild()
    }

    fn match_value(&self, value: &Value) -> bool {
        !self.set.contains(bytes_value(value))
    }

    fn match_range(&self, _from: &Value, _to: &Value) -> bool {
        true
    }

    fn match_filter(&self, _filter: &dyn Membership) -> bool {
        true
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, mask: Option<&Selection>) {
        let set = &self.set;
        scan(bytes_column(block), bits, mask, |v| !set.contains(v));
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

/// Regular expression matcher over raw bytes.
///
/// An unparseable pattern degrades to match-all so evaluation stays total;
/// user-facing validation happens at filter construction time.
#[derive(Debug, Default)]
struct RegexpMatcher {
    pattern: Vec<u8>,
    re: Option<regex::bytes::Regex>,
}

const REGEXP_WEIGHT: usize = 100;

impl Matcher for RegexpMatcher {
    fn with_value(&mut self, value: &Value) {
        self.pattern = bytes_value(value).to_vec();
        let pattern = String::from_utf8_lossy(&self.pattern);
        match regex::bytes::Regex::new(&pattern) {
            Ok(re) => self.re = Some(re),
            Err(err) => {
                log::warn!(target: "sift", "invalid regexp {pattern:?}: {err}");
                self.re = None;
            }
        }
    }

    fn weight(&self) -> usize {
        REGEXP_WEIGHT
    }

    fn value(&self) -> FilterValue {
        FilterValue::Scalar(Value::Bytes(self.pattern.clone()))
    }

    fn match_value(&self, value: &Value) -> bool {
        match &self.re {
            Some(re) => re.is_match(bytes_value(value)),
            None => true,
        }
    }

    fn match_range(&self, _from: &Value, _to: &Value) -> bool {
        true
    }

    fn match_filter(&self, _filter: &dyn Membership) -> bool {
        true
    }

    fn match_vector(&self, block: &Block, bits: &mut Selection, mask: Option<&Selection>) {
        match &self.re {
            Some(re) => scan(bytes_column(block), bits, mask, |v| re.is_match(v)),
            None => undecided(bits, mask),
        }
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

/// Matcher factory for the bytes domain.
pub(crate) fn new_bytes_matcher(mode: FilterMode) -> Box<dyn Matcher> {
    match mode {
        FilterMode::Equal => Box::<BytesEqualMatcher>::default(),
        FilterMode::NotEqual => Box::<BytesNotEqualMatcher>::default(),
        FilterMode::Gt => Box::<BytesGtMatcher>::default(),
        FilterMode::Ge => Box::<BytesGeMatcher>::default(),
        FilterMode::Lt => Box::<BytesLtMatcher>::default(),
        FilterMode::Le => Box::<BytesLeMatcher>::default(),
        FilterMode::In => Box::<BytesInSetMatcher>::default(),
        FilterMode::NotIn => Box::<BytesNotInSetMatcher>::default(),
        FilterMode::Range => Box::<BytesRangeMatcher>::default(),
        FilterMode::Regexp => Box::<RegexpMatcher>::default(),
        FilterMode::True | FilterMode::False => Box::new(NoopMatcher),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{matcher::new_matcher, types::BlockType};

    fn block() -> Block {
        Block::from(vec![
            b"apple".to_vec(),
            b"banana".to_vec(),
            b"cherry".to_vec(),
            b"banana".to_vec(),
        ])
    }

    fn eval(mode: FilterMode, bind: impl FnOnce(&mut dyn Matcher)) -> Vec<u32> {
        let mut m = new_matcher(BlockType::Bytes, mode);
        bind(m.as_mut());
        let b = block();
        let mut bits = Selection::new(b.len() as u32);
        m.match_vector(&b, &mut bits, None);
        bits.iter().collect()
    }

    #[test]
    fn lexicographic_comparisons() {
        let v = Value::from("banana");
        assert_eq!(eval(FilterMode::Equal, |m| m.with_value(&v)), vec![1, 3]);
        assert_eq!(eval(FilterMode::NotEqual, |m| m.with_value(&v)), vec![0, 2]);
        assert_eq!(eval(FilterMode::Gt, |m| m.with_value(&v)), vec![2]);
        assert_eq!(eval(FilterMode::Ge, |m| m.with_value(&v)), vec![1, 2, 3]);
        assert_eq!(eval(FilterMode::Lt, |m| m.with_value(&v)), vec![0]);
        assert_eq!(eval(FilterMode::Le, |m| m.with_value(&v)), vec![0, 1, 3]);
    }

    #[test]
    fn range_and_set() {
        assert_eq!(
            eval(FilterMode::Range, |m| m.with_range(&RangeValue::new(
                Value::from("b"),
                Value::from("c")
            ))),
            vec![1, 3]
        );
        let set = ValueSeq::from(vec![b"cherry".to_vec(), b"apple".to_vec()]);
        assert_eq!(eval(FilterMode::In, |m| m.with_slice(&set)), vec![0, 2]);
        assert_eq!(eval(FilterMode::NotIn, |m| m.with_slice(&set)), vec![1, 3]);

        let mut m = new_matcher(BlockType::Bytes, FilterMode::In);
        m.with_slice(&set);
        assert!(m.match_range(&Value::from("a"), &Value::from("b")));
        assert!(!m.match_range(&Value::from("b"), &Value::from("c")));
        assert_eq!(m.weight(), BYTES_SET_WEIGHT);
    }

    #[test]
    fn regexp_matches_bytes() {
        let pat = Value::from("^ba.*a$");
        assert_eq!(eval(FilterMode::Regexp, |m| m.with_value(&pat)), vec![1, 3]);
        let mut m = new_matcher(BlockType::Bytes, FilterMode::Regexp);
        m.with_value(&pat);
        assert_eq!(m.weight(), REGEXP_WEIGHT);
        assert!(m.match_range(&Value::from("a"), &Value::from("z")));
    }

    #[test]
    fn invalid_regexp_degrades_to_match_all() {
        let mut m = new_matcher(BlockType::Bytes, FilterMode::Regexp);
        m.with_value(&Value::from("(unclosed"));
        assert!(m.match_value(&Value::from("anything")));
        let b = block();
        let mut bits = Selection::new(b.len() as u32);
        m.match_vector(&b, &mut bits, None);
        assert!(bits.all());
    }

    #[test]
    fn summary_vectors_prune_stripes() {
        let mins = Block::from(vec![b"a".to_vec(), b"m".to_vec()]);
        let maxs = Block::from(vec![b"f".to_vec(), b"z".to_vec()]);
        let mut m = new_matcher(BlockType::Bytes, FilterMode::Equal);
        m.with_value(&Value::from("q"));
        let mut bits = Selection::new(2);
        m.match_range_vectors(&mins, &maxs, &mut bits, None);
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![1]);
    }
}
