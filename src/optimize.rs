//! Bottom-up rewrite engine for condition trees.
//!
//! Rewrites replace predicates with semantically equal but cheaper forms:
//! constants are propagated through AND/OR, range-like predicates per column
//! merge into at most one range (AND) or a minimal cover (OR), set-like
//! predicates merge by set algebra, and children end up sorted cheapest
//! first. The pass is idempotent: optimizing an optimized tree changes
//! nothing.

use std::cmp::Ordering;

use crate::{
    filter::Filter,
    node::Node,
    types::FilterMode,
    value::{RangeValue, Value, ValueSeq},
};

impl Node {
    /// Rewrites the subtree in place. Leaves are untouched; branches are
    /// rebuilt bottom-up.
    pub fn optimize(&mut self) {
        if self.is_leaf() {
            return;
        }

        for child in &mut self.children {
            child.optimize();
        }

        let children = std::mem::take(&mut self.children);
        let before = children.len();
        let mut kept = Vec::with_capacity(before);

        // drop resolved and empty children, lift single-child and
        // same-kind branches
        for mut child in children {
            if child.skip {
                continue;
            }
            if child.is_leaf() || child.bits.is_some() {
                kept.push(child);
                continue;
            }
            if child.children.is_empty() {
                continue;
            }
            if child.children.len() == 1 {
                if let Some(only) = child.children.pop() {
                    kept.push(only);
                }
                continue;
            }
            if child.or_kind == self.or_kind {
                kept.extend(child.children);
                continue;
            }
            kept.push(child);
        }

        let mut nodes = simplify_nodes(kept, self.or_kind);
        nodes.sort_by_key(Node::weight);

        if nodes.len() != before {
            log::trace!(
                target: "sift",
                "optimize: {} children reduced to {}",
                before,
                nodes.len()
            );
        }
        self.children = nodes;
    }
}

fn leaf_mode(node: &Node) -> Option<FilterMode> {
    node.filter().map(Filter::mode)
}

fn simplify_nodes(nodes: Vec<Node>, or_kind: bool) -> Vec<Node> {
    let (leaves, branches): (Vec<_>, Vec<_>) = nodes.into_iter().partition(Node::is_leaf);
    if leaves.is_empty() {
        return branches;
    }

    let mut leaves = leaves;
    leaves.sort_by_key(|n| n.filter().map_or(0, Filter::index));

    let leaves = simplify_single(leaves);
    let leaves = simplify_ranges(leaves, or_kind);
    let leaves = simplify_sets(leaves, or_kind);

    let mut nodes = leaves;
    nodes.extend(branches);

    // constant propagation
    let (dominant, removable) = if or_kind {
        (FilterMode::True, FilterMode::False)
    } else {
        (FilterMode::False, FilterMode::True)
    };
    if let Some(pos) = nodes.iter().position(|n| leaf_mode(n) == Some(dominant)) {
        return vec![nodes.swap_remove(pos)];
    }
    if nodes.len() > 1 {
        let removed = nodes
            .iter()
            .filter(|n| leaf_mode(n) == Some(removable))
            .count();
        if removed == nodes.len() {
            // all children are the neutral constant, keep one
            nodes.truncate(1);
        } else if removed > 0 {
            nodes.retain(|n| leaf_mode(n) != Some(removable));
        }
    }
    nodes
}

/// Per-leaf normalization independent of the surrounding AND/OR kind.
/// Returns `Some` replacement filter or `None` to keep the node.
fn simplify_one(f: &Filter) -> Option<Filter> {
    let bounds = f.typ().bounds();
    match f.mode() {
        FilterMode::In => {
            let seq = f.value().as_set()?;
            match seq.len() {
                0 => Some(f.as_false()),
                1 => Some(f.as_filter(FilterMode::Equal, seq.get(0).into())),
                _ => {
                    let rg = seq.contiguous_span()?;
                    if rg.is_full_domain(f.typ()) {
                        Some(f.as_true())
                    } else {
                        Some(f.as_filter(FilterMode::Range, rg.into()))
                    }
                }
            }
        }
        FilterMode::NotIn => {
            let seq = f.value().as_set()?;
            match seq.len() {
                0 => Some(f.as_true()),
                1 => Some(f.as_filter(FilterMode::NotEqual, seq.get(0).into())),
                _ => {
                    let rg = seq.contiguous_span()?;
                    rg.is_full_domain(f.typ()).then(|| f.as_false())
                }
            }
        }
        FilterMode::Lt => {
            let (min, _) = bounds?;
            (*f.value().as_scalar()? == min).then(|| f.as_false())
        }
        FilterMode::Gt => {
            let (_, max) = bounds?;
            (*f.value().as_scalar()? == max).then(|| f.as_false())
        }
        FilterMode::Le => {
            let (min, max) = bounds?;
            let v = f.value().as_scalar()?;
            if *v == max && f.typ().is_exact_domain() {
                Some(f.as_true())
            } else if *v == min {
                Some(f.as_filter(FilterMode::Equal, v.clone().into()))
            } else {
                None
            }
        }
        FilterMode::Ge => {
            let (min, max) = bounds?;
            let v = f.value().as_scalar()?;
            if *v == min && f.typ().is_exact_domain() {
                Some(f.as_true())
            } else if *v == max {
                Some(f.as_filter(FilterMode::Equal, v.clone().into()))
            } else {
                None
            }
        }
        FilterMode::Range => {
            let rg = f.value().as_range()?;
            if rg.is_inverted() {
                return Some(f.as_false());
            }
            if rg.from == rg.to {
                return Some(f.as_filter(FilterMode::Equal, rg.from.clone().into()));
            }
            if rg.is_full_domain(f.typ()) {
                return Some(f.as_true());
            }
            let (min, max) = bounds?;
            if rg.from == min {
                return Some(f.as_filter(FilterMode::Le, rg.to.clone().into()));
            }
            if rg.to == max {
                return Some(f.as_filter(FilterMode::Ge, rg.from.clone().into()));
            }
            None
        }
        _ => None,
    }
}

fn simplify_single(nodes: Vec<Node>) -> Vec<Node> {
    let mut res = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node.filter().and_then(simplify_one) {
            Some(filter) => res.push(Node::leaf(filter)),
            None => res.push(node),
        }
    }
    res
}

fn cmp_v(a: &Value, b: &Value) -> Ordering {
    a.compare(b).unwrap_or(Ordering::Equal)
}

fn sort_ranges(vals: &mut [RangeValue]) {
    vals.sort_by(|x, y| cmp_v(&x.from, &y.from).then_with(|| cmp_v(&x.to, &y.to)));
}

/// Intersects ranges; the result is one range or nothing.
fn merge_ranges_and(mut vals: Vec<RangeValue>) -> Vec<RangeValue> {
    sort_ranges(&mut vals);
    let mut iter = vals.into_iter();
    let Some(mut merged) = iter.next() else {
        return Vec::new();
    };
    for v in iter {
        // sorted by lows, so the next low is the tighter one
        if cmp_v(&merged.to, &v.from) == Ordering::Less {
            return Vec::new();
        }
        merged.from = v.from;
        if cmp_v(&merged.to, &v.to) == Ordering::Greater {
            merged.to = v.to;
        }
    }
    vec![merged]
}

/// Unions overlapping and adjacent ranges into a minimal cover.
fn merge_ranges_or(mut vals: Vec<RangeValue>) -> Vec<RangeValue> {
    sort_ranges(&mut vals);
    let mut out: Vec<RangeValue> = Vec::with_capacity(vals.len());
    for v in vals {
        match out.last_mut() {
            Some(last) => {
                // adjacency counts as overlap in discrete domains
                let reach = v.from.pred().unwrap_or_else(|| v.from.clone());
                if cmp_v(&last.to, &reach) != Ordering::Less {
                    if cmp_v(&last.to, &v.to) == Ordering::Less {
                        last.to = v.to;
                    }
                } else {
                    out.push(v);
                }
            }
            None => out.push(v),
        }
    }
    out
}

const EQ_INCLUSIVE: u8 = 1;
const EQ_EXCLUSIVE: u8 = 2;

/// Converts a merged range back to the narrowest filter form, honoring
/// whether inclusive or exclusive predicates contributed to the group.
fn make_range_filter(f: &Filter, rg: &RangeValue, eq_mode: u8) -> Filter {
    if rg.from == rg.to {
        return f.as_filter(FilterMode::Equal, rg.from.clone().into());
    }
    if let Some((min, max)) = f.typ().bounds() {
        if rg.from == min {
            if eq_mode & EQ_INCLUSIVE != 0 {
                return f.as_filter(FilterMode::Le, rg.to.clone().into());
            }
            if let Some(s) = rg.to.succ() {
                return f.as_filter(FilterMode::Lt, s.into());
            }
            return f.as_filter(FilterMode::Le, rg.to.clone().into());
        }
        if rg.to == max {
            if eq_mode & EQ_INCLUSIVE != 0 {
                return f.as_filter(FilterMode::Ge, rg.from.clone().into());
            }
            if let Some(p) = rg.from.pred() {
                return f.as_filter(FilterMode::Gt, p.into());
            }
            return f.as_filter(FilterMode::Ge, rg.from.clone().into());
        }
    }
    f.as_filter(FilterMode::Range, rg.clone().into())
}

fn flush_ranges(
    group: Vec<Node>,
    ranges: Vec<RangeValue>,
    eq_mode: u8,
    or_kind: bool,
    out: &mut Vec<Node>,
) {
    if group.len() <= 1 {
        out.extend(group);
        return;
    }
    let merged = if or_kind {
        merge_ranges_or(ranges)
    } else {
        merge_ranges_and(ranges)
    };
    // no reduction achieved, keep the original predicates
    if merged.len() == group.len() {
        out.extend(group);
        return;
    }
    let Some(f) = group.last().and_then(Node::filter) else {
        out.extend(group);
        return;
    };
    let mut filters = Vec::with_capacity(merged.len().max(1));
    if merged.is_empty() {
        filters.push(f.as_false());
    } else if merged.len() == 1 && merged[0].is_full_domain(f.typ()) {
        filters.push(f.as_true());
    } else {
        for rg in &merged {
            filters.push(make_range_filter(f, rg, eq_mode));
        }
    }
    out.extend(filters.into_iter().map(Node::leaf));
}

/// Merges range-like predicates per column. Nodes must be leaves sorted by
/// column index.
fn simplify_ranges(nodes: Vec<Node>, or_kind: bool) -> Vec<Node> {
    let mut result = Vec::with_capacity(nodes.len());
    let mut group: Vec<Node> = Vec::new();
    let mut ranges: Vec<RangeValue> = Vec::new();
    let mut eq_mode = 0u8;
    let mut last_idx: Option<usize> = None;

    for node in nodes {
        let Some((idx, mode, typ)) = node.filter().map(|f| (f.index(), f.mode(), f.typ())) else {
            result.push(node);
            continue;
        };

        if last_idx != Some(idx) {
            flush_ranges(
                std::mem::take(&mut group),
                std::mem::take(&mut ranges),
                eq_mode,
                or_kind,
                &mut result,
            );
            eq_mode = 0;
            last_idx = Some(idx);
        }

        let bounds = typ.bounds();
        let scalar = node.filter().and_then(|f| f.value().as_scalar().cloned());
        match (mode, bounds) {
            (FilterMode::Equal, Some(_)) => {
                if let Some(v) = scalar {
                    ranges.push(RangeValue::new(v.clone(), v));
                    eq_mode |= EQ_INCLUSIVE;
                    group.push(node);
                } else {
                    result.push(node);
                }
            }
            (FilterMode::Range, Some(_)) => {
                let Some(rg) = node.filter().and_then(|f| f.value().as_range().cloned()) else {
                    result.push(node);
                    continue;
                };
                if rg.is_inverted() {
                    if let Some(f) = node.filter() {
                        result.push(Node::leaf(f.as_false()));
                    }
                    continue;
                }
                ranges.push(rg);
                eq_mode |= EQ_INCLUSIVE;
                group.push(node);
            }
            (FilterMode::Lt, Some((min, _))) => match scalar {
                Some(v) if v == min => {
                    if let Some(f) = node.filter() {
                        result.push(Node::leaf(f.as_false()));
                    }
                }
                Some(v) => match v.pred() {
                    Some(p) => {
                        ranges.push(RangeValue::new(min, p));
                        eq_mode |= EQ_EXCLUSIVE;
                        group.push(node);
                    }
                    // continuous domain, no inclusive form
                    None => result.push(node),
                },
                None => result.push(node),
            },
            (FilterMode::Le, Some((min, _))) => {
                if let Some(v) = scalar {
                    ranges.push(RangeValue::new(min, v));
                    eq_mode |= EQ_INCLUSIVE;
                    group.push(node);
                } else {
                    result.push(node);
                }
            }
            (FilterMode::Gt, Some((_, max))) => match scalar {
                Some(v) if v == max => {
                    if let Some(f) = node.filter() {
                        result.push(Node::leaf(f.as_false()));
                    }
                }
                Some(v) => match v.succ() {
                    Some(s) => {
                        ranges.push(RangeValue::new(s, max));
                        eq_mode |= EQ_EXCLUSIVE;
                        group.push(node);
                    }
                    None => result.push(node),
                },
                None => result.push(node),
            },
            (FilterMode::Ge, Some((_, max))) => {
                if let Some(v) = scalar {
                    ranges.push(RangeValue::new(v, max));
                    eq_mode |= EQ_INCLUSIVE;
                    group.push(node);
                } else {
                    result.push(node);
                }
            }
            _ => result.push(node),
        }
    }

    flush_ranges(group, ranges, eq_mode, or_kind, &mut result);
    result
}

fn scalar_seq(typ: crate::types::BlockType, v: &Value) -> ValueSeq {
    let mut seq = ValueSeq::empty(typ);
    seq.push(v);
    seq
}

fn flush_sets(
    res: &mut Vec<Node>,
    template: Option<Filter>,
    ins: Option<ValueSeq>,
    nis: Option<ValueSeq>,
    or_kind: bool,
) {
    let Some(f) = template else {
        return;
    };
    let filter = match (ins, nis) {
        (Some(ins), Some(nis)) => {
            // polarity decides the difference direction
            let set = if or_kind {
                nis.difference(&ins)
            } else {
                ins.difference(&nis)
            };
            match set.len() {
                0 if or_kind => f.as_true(),
                0 => f.as_false(),
                1 if or_kind => f.as_filter(FilterMode::NotEqual, set.get(0).into()),
                1 => f.as_filter(FilterMode::Equal, set.get(0).into()),
                _ if or_kind => f.as_filter(FilterMode::NotIn, set.into()),
                _ => f.as_filter(FilterMode::In, set.into()),
            }
        }
        (Some(ins), None) => match ins.len() {
            0 => f.as_false(),
            1 => f.as_filter(FilterMode::Equal, ins.get(0).into()),
            _ => f.as_filter(FilterMode::In, ins.into()),
        },
        (None, Some(nis)) => match nis.len() {
            0 => f.as_true(),
            1 => f.as_filter(FilterMode::NotEqual, nis.get(0).into()),
            _ => f.as_filter(FilterMode::NotIn, nis.into()),
        },
        (None, None) => return,
    };
    // a rebuilt set may itself be reducible, e.g. a union that became
    // contiguous or covers the whole domain
    let filter = simplify_one(&filter).unwrap_or(filter);
    res.push(Node::leaf(filter));
}

/// Merges equality and set predicates per column by set algebra; under AND
/// additionally folds range predicates into an accumulated in-set.
fn simplify_sets(mut nodes: Vec<Node>, or_kind: bool) -> Vec<Node> {
    // group by column, set predicates first within each group
    nodes.sort_by(|a, b| {
        let key = |n: &Node| {
            n.filter()
                .map_or((0, false), |f| (f.index(), f.mode().is_set()))
        };
        let (ai, a_set) = key(a);
        let (bi, b_set) = key(b);
        ai.cmp(&bi).then(b_set.cmp(&a_set))
    });

    let mut res = Vec::with_capacity(nodes.len());
    let mut ins: Option<ValueSeq> = None;
    let mut nis: Option<ValueSeq> = None;
    let mut template: Option<Filter> = None;
    let mut last_idx: Option<usize> = None;

    for mut node in nodes {
        let Some((idx, mode, typ)) = node.filter().map(|f| (f.index(), f.mode(), f.typ())) else {
            res.push(node);
            continue;
        };

        if last_idx != Some(idx) {
            flush_sets(&mut res, template.take(), ins.take(), nis.take(), or_kind);
            last_idx = Some(idx);
        }

        match mode {
            FilterMode::Equal | FilterMode::In => {
                let add = match node.filter().map(Filter::value) {
                    Some(crate::value::FilterValue::Scalar(v)) => scalar_seq(typ, v),
                    Some(crate::value::FilterValue::Set(s)) => s.clone(),
                    _ => {
                        res.push(node);
                        continue;
                    }
                };
                ins = Some(match ins.take() {
                    None => add,
                    Some(cur) if or_kind => cur.union(&add),
                    Some(cur) => cur.intersect(&add),
                });
                template = node.filter.take();
            }
            FilterMode::NotEqual | FilterMode::NotIn => {
                let add = match node.filter().map(Filter::value) {
                    Some(crate::value::FilterValue::Scalar(v)) => scalar_seq(typ, v),
                    Some(crate::value::FilterValue::Set(s)) => s.clone(),
                    _ => {
                        res.push(node);
                        continue;
                    }
                };
                nis = Some(match nis.take() {
                    None => add,
                    Some(cur) if or_kind => cur.intersect(&add),
                    Some(cur) => cur.union(&add),
                });
                template = node.filter.take();
            }
            FilterMode::Gt | FilterMode::Ge | FilterMode::Lt | FilterMode::Le | FilterMode::Range
                if !or_kind && ins.is_some() =>
            {
                // intersect the accumulated in-set with the range and drop
                // the range predicate
                let range = node.filter().and_then(|f| range_bounds_of(f, mode));
                let Some((lo, hi)) = range else {
                    res.push(node);
                    continue;
                };
                if let Some(mut set) = ins.take() {
                    if let Some((smin, smax)) = set.min_max() {
                        let lo = lo.unwrap_or(smin);
                        let hi = hi.unwrap_or(smax);
                        set.retain_range(&lo, &hi);
                    }
                    ins = Some(set);
                }
                template = node.filter.take();
            }
            _ => res.push(node),
        }
    }

    flush_sets(&mut res, template, ins, nis, or_kind);
    res
}

/// Inclusive bounds a range-like predicate imposes; `None` in a position
/// means unbounded on that side, an outer `None` means the predicate has no
/// inclusive form (exclusive bound on a continuous domain).
fn range_bounds_of(f: &Filter, mode: FilterMode) -> Option<(Option<Value>, Option<Value>)> {
    match mode {
        FilterMode::Gt => {
            let v = f.value().as_scalar()?;
            Some((Some(v.succ()?), None))
        }
        FilterMode::Ge => Some((Some(f.value().as_scalar()?.clone()), None)),
        FilterMode::Lt => {
            let v = f.value().as_scalar()?;
            Some((None, Some(v.pred()?)))
        }
        FilterMode::Le => Some((None, Some(f.value().as_scalar()?.clone()))),
        FilterMode::Range => {
            let rg = f.value().as_range()?;
            Some((Some(rg.from.clone()), Some(rg.to.clone())))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        filter::Field,
        types::BlockType,
        value::Value,
    };

    fn field(name: &str, typ: BlockType) -> Field {
        Field::new(name, 1, typ)
    }

    fn u8_leaf(mode: FilterMode, v: u8) -> Node {
        let f = field("x", BlockType::Uint8);
        Node::leaf(Filter::new(&f, 0, mode, Value::U8(v).into()).unwrap())
    }

    #[test]
    fn merge_and_intersects() {
        let merged = merge_ranges_and(vec![
            RangeValue::new(Value::U8(0), Value::U8(10)),
            RangeValue::new(Value::U8(5), Value::U8(20)),
        ]);
        assert_eq!(merged, vec![RangeValue::new(Value::U8(5), Value::U8(10))]);

        let empty = merge_ranges_and(vec![
            RangeValue::new(Value::U8(0), Value::U8(3)),
            RangeValue::new(Value::U8(5), Value::U8(9)),
        ]);
        assert!(empty.is_empty());
    }

    #[test]
    fn merge_or_coalesces_adjacent() {
        let merged = merge_ranges_or(vec![
            RangeValue::new(Value::U8(0), Value::U8(4)),
            RangeValue::new(Value::U8(5), Value::U8(9)),
            RangeValue::new(Value::U8(20), Value::U8(30)),
        ]);
        assert_eq!(
            merged,
            vec![
                RangeValue::new(Value::U8(0), Value::U8(9)),
                RangeValue::new(Value::U8(20), Value::U8(30)),
            ]
        );
    }

    #[test]
    fn single_leaf_extreme_rules() {
        let lt0 = u8_leaf(FilterMode::Lt, 0);
        let f = lt0.filter().unwrap();
        assert_eq!(simplify_one(f).map(|f| f.mode()), Some(FilterMode::False));

        let le_max = u8_leaf(FilterMode::Le, 255);
        assert_eq!(
            simplify_one(le_max.filter().unwrap()).map(|f| f.mode()),
            Some(FilterMode::True)
        );

        let ge0 = u8_leaf(FilterMode::Ge, 0);
        assert_eq!(
            simplify_one(ge0.filter().unwrap()).map(|f| f.mode()),
            Some(FilterMode::True)
        );

        let le0 = u8_leaf(FilterMode::Le, 0);
        let got = simplify_one(le0.filter().unwrap()).map(|f| (f.mode(), f.value().clone()));
        assert_eq!(got, Some((FilterMode::Equal, Value::U8(0).into())));
    }

    #[test]
    fn float_tautologies_are_not_produced() {
        let f = field("f", BlockType::Float64);
        let le_inf = Node::leaf(
            Filter::new(&f, 0, FilterMode::Le, Value::F64(f64::INFINITY).into()).unwrap(),
        );
        assert!(simplify_one(le_inf.filter().unwrap()).is_none());

        // Lt(-inf) is still provably false
        let lt_ninf = Node::leaf(
            Filter::new(&f, 0, FilterMode::Lt, Value::F64(f64::NEG_INFINITY).into()).unwrap(),
        );
        assert_eq!(
            simplify_one(lt_ninf.filter().unwrap()).map(|f| f.mode()),
            Some(FilterMode::False)
        );
    }

    #[test]
    fn or_of_two_false_stays_false() {
        let a = u8_leaf(FilterMode::Equal, 1);
        let fls1 = Node::leaf(a.filter().unwrap().as_false());
        let fls2 = Node::leaf(a.filter().unwrap().as_false());
        let mut tree = Node::and(vec![Node::or(vec![fls1, fls2])]);
        tree.optimize();
        assert!(tree.is_no_match());
    }
}
