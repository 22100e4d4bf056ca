//! Statistics-driven evaluation of condition trees against packs.
//!
//! [`match_tree`] walks an AND/OR tree and produces a [`Selection`] over the
//! pack's rows. Children are visited in the order the optimizer left them
//! (cheapest first); block statistics prove some children always-true so
//! their column scan is skipped entirely, and aggregation stops early once
//! the outcome is fixed. [`maybe_match_tree`] answers the coarser question
//! whether a pack can contain any match at all, without reading columns.

use crate::{
    bitmap::Selection,
    block::{BlockReader, StatsReader},
    filter::Filter,
    node::Node,
    types::FilterMode,
    value::Value,
};

/// Matches one filter against its column, honoring the mask contract of
/// [`Matcher::match_vector`](crate::matcher::Matcher::match_vector).
/// Constant modes never touch the column.
pub fn match_filter(
    f: &Filter,
    pack: &dyn BlockReader,
    bits: &mut Selection,
    mask: Option<&Selection>,
) {
    match f.mode() {
        FilterMode::True => match mask {
            Some(mask) => bits.copy_from(mask),
            None => bits.one(),
        },
        FilterMode::False => bits.zero(),
        _ => f.matcher().match_vector(pack.column(f.index()), bits, mask),
    }
}

/// Matches a condition tree against pack contents and returns the selected
/// rows. `stats` enables per-child short-circuiting; `None` disables it and
/// only costs full scans, never correctness.
#[must_use]
pub fn match_tree(
    node: &Node,
    pack: &dyn BlockReader,
    stats: Option<&dyn StatsReader>,
) -> Selection {
    let rows = pack.rows();

    // pre-resolved subtree, e.g. answered from an index
    if let Some(bits) = node.cached_bits() {
        return bits.clone();
    }

    if let Some(f) = node.filter() {
        let mut bits = Selection::new(rows);
        match_filter(f, pack, &mut bits, None);
        return bits;
    }

    // an empty tree selects everything
    if node.is_empty() {
        return Selection::full(rows);
    }

    if node.is_or() {
        match_tree_or(node, pack, stats)
    } else {
        match_tree_and(node, pack, stats)
    }
}

fn match_tree_and(
    node: &Node,
    pack: &dyn BlockReader,
    stats: Option<&dyn StatsReader>,
) -> Selection {
    let rows = pack.rows();
    let mut bits = Selection::full(rows);

    for child in node.children() {
        let mut scratch = Selection::new(rows);
        if !child.is_leaf() || child.cached_bits().is_some() {
            scratch = match_tree(child, pack, stats);
        } else if let Some(f) = child.filter() {
            // a child proven always-true contributes nothing to an AND
            if proves_all_rows(f, stats) {
                continue;
            }
            // the accumulator doubles as mask, rows already excluded are
            // not probed again
            match_filter(f, pack, &mut scratch, Some(&bits));
        }

        bits.and(&scratch);
        if !bits.any() {
            break;
        }
    }
    bits
}

fn match_tree_or(
    node: &Node,
    pack: &dyn BlockReader,
    stats: Option<&dyn StatsReader>,
) -> Selection {
    let rows = pack.rows();
    let mut bits = Selection::new(rows);

    for child in node.children() {
        let mut scratch = Selection::new(rows);
        if !child.is_leaf() || child.cached_bits().is_some() {
            scratch = match_tree(child, pack, stats);
        } else if let Some(f) = child.filter() {
            // all-true dominates whatever the accumulator holds
            if proves_all_rows(f, stats) {
                return Selection::full(rows);
            }
            // only rows still unselected need probing
            let mask = bits.complement();
            match_filter(f, pack, &mut scratch, Some(&mask));
        }

        bits.or(&scratch);
        if bits.all() {
            break;
        }
    }
    bits
}

/// True when block statistics prove `f` matches every row of the pack.
/// Conservative: any missing statistic or unordered comparison disables the
/// shortcut.
fn proves_all_rows(f: &Filter, stats: Option<&dyn StatsReader>) -> bool {
    if f.mode() == FilterMode::True {
        return true;
    }
    let Some((min, max)) = stats.and_then(|s| s.min_max(f.index())) else {
        return false;
    };
    let lt = |a: &Value, b: &Value| a.compare(b).is_some_and(|o| o.is_lt());
    let le = |a: &Value, b: &Value| a.compare(b).is_some_and(|o| o.is_le());
    match f.mode() {
        FilterMode::Equal => match f.value().as_scalar() {
            Some(v) => min == *v && max == *v,
            None => false,
        },
        FilterMode::NotEqual => match f.value().as_scalar() {
            Some(v) => lt(v, &min) || lt(&max, v),
            None => false,
        },
        FilterMode::Range => match f.value().as_range() {
            Some(rg) => le(&rg.from, &min) && le(&max, &rg.to),
            None => false,
        },
        FilterMode::Gt => match f.value().as_scalar() {
            Some(v) => lt(v, &min),
            None => false,
        },
        FilterMode::Ge => match f.value().as_scalar() {
            Some(v) => le(v, &min),
            None => false,
        },
        FilterMode::Lt => match f.value().as_scalar() {
            Some(v) => lt(&max, v),
            None => false,
        },
        FilterMode::Le => match f.value().as_scalar() {
            Some(v) => le(&max, v),
            None => false,
        },
        _ => false,
    }
}

/// Single-row tree evaluation. Slow path used for journal rows and as the
/// reference oracle in tests.
#[must_use]
pub fn match_at(node: &Node, pack: &dyn BlockReader, row: u32) -> bool {
    if let Some(bits) = node.cached_bits() {
        return bits.contains(row);
    }
    if let Some(f) = node.filter() {
        return match f.mode() {
            FilterMode::True => true,
            FilterMode::False => false,
            _ => f
                .matcher()
                .match_value(&pack.column(f.index()).value_at(row as usize)),
        };
    }
    if node.children().is_empty() {
        return true;
    }
    if node.is_or() {
        node.children().iter().any(|c| match_at(c, pack, row))
    } else {
        node.children().iter().all(|c| match_at(c, pack, row))
    }
}

/// Whole-pack skip decision from statistics alone. Probabilistic in one
/// direction only: `false` guarantees no row matches, `true` means the pack
/// needs a scan.
#[must_use]
pub fn maybe_match_tree(node: &Node, stats: &dyn StatsReader) -> bool {
    if node.is_empty() {
        return true;
    }
    if let Some(f) = node.filter() {
        return maybe_match_filter(f, stats);
    }
    if node.is_or() {
        node.children().iter().any(|c| maybe_match_tree(c, stats))
    } else {
        node.children().iter().all(|c| maybe_match_tree(c, stats))
    }
}

/// Per-filter skip decision combining the min/max range probe with the
/// membership shortcut for equality and set predicates.
#[must_use]
pub fn maybe_match_filter(f: &Filter, stats: &dyn StatsReader) -> bool {
    match f.mode() {
        FilterMode::True => return true,
        FilterMode::False => return false,
        _ => {}
    }
    let Some((min, max)) = stats.min_max(f.index()) else {
        // no statistics, scan required
        return true;
    };
    // total-order stats may report a NaN bound; IEEE range probes cannot
    // decide anything against it
    if min.compare(&max).is_none() {
        return true;
    }
    let hit = match f.mode() {
        // the range probe brackets the literal, membership refines it
        FilterMode::Equal | FilterMode::In => {
            f.matcher().match_range(&min, &max)
                && match stats.membership(f.index()) {
                    Some(m) => f.matcher().match_filter(m),
                    None => true,
                }
        }
        // matches may hide anywhere in the range
        FilterMode::Regexp | FilterMode::NotEqual | FilterMode::NotIn => true,
        _ => f.matcher().match_range(&min, &max),
    };
    if !hit {
        log::trace!(target: "sift", "stats prune: {f}");
    }
    hit
}
