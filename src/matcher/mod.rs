//! Type-polymorphic comparison engine.
//!
//! One matcher instance serves one (domain, mode) pair. Matchers are created
//! unbound through [`new_matcher`] and initialized exactly once with the
//! literal they compare against; after that they are immutable and safe to
//! share across threads.
//!
//! The trait defaults implement the no-op behavior: scalar probes never
//! match and vectorized calls pass the mask through unchanged. Structurally
//! impossible (domain, mode) pairs are served by [`NoopMatcher`], so the
//! factory is total and evaluation never dereferences a missing matcher.

mod boolean;
mod bytes;
mod num;

use std::fmt;

use roaring::RoaringTreemap;

use crate::{
    bitmap::{Membership, Selection},
    block::Block,
    num::I256,
    types::{BlockType, FilterMode},
    value::{FilterValue, RangeValue, Value, ValueSeq},
};

/// Vectorized comparison engine for one (domain, mode) pair.
pub trait Matcher: fmt::Debug + Send + Sync {
    /// Binds a scalar literal. No-op unless the mode takes a scalar.
    fn with_value(&mut self, _value: &Value) {}

    /// Binds a range literal. No-op unless the mode is `Range`.
    fn with_range(&mut self, _range: &RangeValue) {}

    /// Binds a set literal; implementations deduplicate and sort. No-op
    /// unless the mode is `In`/`NotIn`.
    fn with_slice(&mut self, _values: &ValueSeq) {}

    /// Binds a pre-built key set. No-op unless the mode is `In`/`NotIn` over
    /// a domain with bitmap keys.
    fn with_set(&mut self, _set: &RoaringTreemap) {}

    /// Relative evaluation cost; used to order siblings cheapest-first.
    fn weight(&self) -> usize {
        1
    }

    /// Number of bound literals.
    fn len(&self) -> usize {
        1
    }

    /// The bound literal, reconstructed.
    fn value(&self) -> FilterValue {
        FilterValue::Unit
    }

    /// Point probe against a single value.
    fn match_value(&self, _value: &Value) -> bool {
        false
    }

    /// True when some value in `[from, to]` could match. Sound
    /// over-approximation used for block pruning.
    fn match_range(&self, _from: &Value, _to: &Value) -> bool {
        false
    }

    /// Probe against a membership structure. Must not produce false
    /// negatives; `true` means the block needs a scan.
    fn match_filter(&self, _filter: &dyn Membership) -> bool {
        false
    }

    /// Sets `bits` for matching rows of `block`. With a mask, only masked
    /// positions are probed and unmasked positions are left untouched;
    /// implementations may over-select outside the mask (callers AND/OR the
    /// result into an accumulator).
    fn match_vector(&self, _block: &Block, bits: &mut Selection, mask: Option<&Selection>) {
        if let Some(mask) = mask {
            bits.copy_from(mask);
        }
    }

    /// Sets `bits` for vector positions whose `[min, max]` summary could
    /// contain a match. Sound over-approximation per position.
    fn match_range_vectors(
        &self,
        _mins: &Block,
        _maxs: &Block,
        bits: &mut Selection,
        mask: Option<&Selection>,
    ) {
        if let Some(mask) = mask {
            bits.copy_from(mask);
        }
    }
}

/// Always-safe default matcher for unsupported (domain, mode) pairs.
///
/// Never matches a value and passes vector masks through unchanged, so an
/// impossible predicate degrades to "select nothing" instead of faulting.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMatcher;

impl Matcher for NoopMatcher {}

/// Sets `bits` to all ones, or to a copy of the mask when one is given.
/// Shared kernel for matchers whose outcome is undecidable from summaries.
pub(crate) fn undecided(bits: &mut Selection, mask: Option<&Selection>) {
    match mask {
        Some(mask) => bits.copy_from(mask),
        None => bits.one(),
    }
}

/// Builds the matcher for a (domain, mode) pair. Total: unsupported pairs
/// yield a [`NoopMatcher`].
#[must_use]
pub fn new_matcher(typ: BlockType, mode: FilterMode) -> Box<dyn Matcher> {
    match typ {
        BlockType::Int64 => num::new_int_matcher::<i64>(mode),
        BlockType::Int32 => num::new_int_matcher::<i32>(mode),
        BlockType::Int16 => num::new_int_matcher::<i16>(mode),
        BlockType::Int8 => num::new_int_matcher::<i8>(mode),
        BlockType::Uint64 => num::new_int_matcher::<u64>(mode),
        BlockType::Uint32 => num::new_int_matcher::<u32>(mode),
        BlockType::Uint16 => num::new_int_matcher::<u16>(mode),
        BlockType::Uint8 => num::new_int_matcher::<u8>(mode),
        BlockType::Float64 => num::new_real_matcher::<f64>(mode),
        BlockType::Float32 => num::new_real_matcher::<f32>(mode),
        BlockType::Bool => boolean::new_bool_matcher(mode),
        BlockType::Bytes => bytes::new_bytes_matcher(mode),
        BlockType::Int128 => num::new_real_matcher::<i128>(mode),
        BlockType::Int256 => num::new_real_matcher::<I256>(mode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_is_total() {
        use crate::types::BLOCK_TYPES;
        let modes = [
            FilterMode::Equal,
            FilterMode::NotEqual,
            FilterMode::Gt,
            FilterMode::Ge,
            FilterMode::Lt,
            FilterMode::Le,
            FilterMode::In,
            FilterMode::NotIn,
            FilterMode::Range,
            FilterMode::Regexp,
            FilterMode::True,
            FilterMode::False,
        ];
        for typ in BLOCK_TYPES {
            for mode in modes {
                let m = new_matcher(typ, mode);
                assert!(m.weight() >= 1, "{typ} {mode}");
            }
        }
    }

    #[test]
    fn noop_selects_nothing_without_mask() {
        let m = new_matcher(BlockType::Int64, FilterMode::Regexp);
        let block = Block::from(vec![1i64, 2, 3]);
        let mut bits = Selection::new(3);
        m.match_vector(&block, &mut bits, None);
        assert!(!bits.any());
        assert!(!m.match_value(&Value::I64(1)));
        assert!(!m.match_range(&Value::I64(0), &Value::I64(9)));
    }

    #[test]
    fn noop_passes_mask_through() {
        let m = NoopMatcher;
        let block = Block::from(vec![1i64, 2, 3]);
        let mut mask = Selection::new(3);
        mask.set(2);
        let mut bits = Selection::new(3);
        m.match_vector(&block, &mut bits, Some(&mask));
        assert_eq!(bits, mask);
    }
}
