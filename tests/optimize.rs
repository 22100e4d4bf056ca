//! Rewrite engine scenarios: merging, constant propagation, reordering and
//! end-to-end soundness against brute-force row evaluation.

use sift::{
    match_at, match_tree, Block, BlockType, Field, Filter, FilterMode, FilterValue, Node, Pack,
    PackStats, RangeValue, Value, ValueSeq,
};

fn node(field: &Field, index: usize, mode: FilterMode, value: FilterValue) -> Node {
    Node::leaf(Filter::new(field, index, mode, value).unwrap())
}

fn f1(typ: BlockType) -> Field {
    Field::new("f1", 1, typ)
}

fn i64_node(mode: FilterMode, v: i64) -> Node {
    node(&f1(BlockType::Int64), 0, mode, Value::I64(v).into())
}

fn i64_set(mode: FilterMode, vals: Vec<i64>) -> Node {
    node(&f1(BlockType::Int64), 0, mode, ValueSeq::from(vals).into())
}

fn i64_range(from: i64, to: i64) -> Node {
    node(
        &f1(BlockType::Int64),
        0,
        FilterMode::Range,
        RangeValue::new(Value::I64(from), Value::I64(to)).into(),
    )
}

fn u8_node(mode: FilterMode, v: u8) -> Node {
    node(&f1(BlockType::Uint8), 0, mode, Value::U8(v).into())
}

fn u8_range(from: u8, to: u8) -> Node {
    node(
        &f1(BlockType::Uint8),
        0,
        FilterMode::Range,
        RangeValue::new(Value::U8(from), Value::U8(to)).into(),
    )
}

fn bool_node(mode: FilterMode, v: bool) -> Node {
    node(&f1(BlockType::Bool), 0, mode, Value::Bool(v).into())
}

fn bool_set(mode: FilterMode, vals: Vec<bool>) -> Node {
    node(&f1(BlockType::Bool), 0, mode, ValueSeq::from(vals).into())
}

fn bool_range(from: bool, to: bool) -> Node {
    node(
        &f1(BlockType::Bool),
        0,
        FilterMode::Range,
        RangeValue::new(Value::Bool(from), Value::Bool(to)).into(),
    )
}

/// Optimizes, checks the rendering, then optimizes again to pin
/// idempotence.
fn check(mut tree: Node, expect: &str) {
    tree.optimize();
    assert_eq!(tree.to_string(), expect);
    tree.optimize();
    assert_eq!(tree.to_string(), expect, "second pass must be a no-op");
}

#[test]
fn adjacent_sets_merge_to_range() {
    // IN(2,3) OR EQ(4) OR IN(5,6,7), the equal fills the gap
    check(
        Node::or(vec![
            i64_set(FilterMode::In, vec![2, 3]),
            i64_node(FilterMode::Equal, 4),
            i64_set(FilterMode::In, vec![5, 6, 7]),
        ]),
        "(f1 rg [2, 7])",
    );
}

#[test]
fn overlapping_sets_merge_to_range() {
    check(
        Node::or(vec![
            i64_set(FilterMode::In, vec![1, 2, 3]),
            i64_set(FilterMode::In, vec![2, 3, 4]),
        ]),
        "(f1 rg [1, 4])",
    );
}

#[test]
fn full_bool_set_is_tautology() {
    check(
        Node::or(vec![
            bool_set(FilterMode::In, vec![false, true]),
            bool_node(FilterMode::Equal, true),
        ]),
        "(f1 true)",
    );
    check(
        Node::and(vec![bool_set(FilterMode::In, vec![false, true])]),
        "(f1 true)",
    );
}

#[test]
fn contiguous_set_becomes_range() {
    check(
        Node::and(vec![i64_set(FilterMode::In, vec![1, 2, 3])]),
        "(f1 rg [1, 3])",
    );
}

#[test]
fn range_and_equal_collapse() {
    check(
        Node::and(vec![i64_range(0, 100), i64_node(FilterMode::Equal, 50)]),
        "(f1 = 50)",
    );
}

#[test]
fn overlapping_ranges_and_merge_to_most_restrictive() {
    check(
        Node::and(vec![
            i64_node(FilterMode::Gt, 10),
            i64_node(FilterMode::Lt, 90),
            i64_node(FilterMode::Ge, 20),
            i64_node(FilterMode::Le, 80),
            i64_range(30, 70),
        ]),
        "(f1 rg [30, 70])",
    );
}

#[test]
fn bool_extreme_comparison_is_contradiction() {
    check(
        Node::and(vec![
            bool_node(FilterMode::Gt, true),
            bool_node(FilterMode::Le, false),
        ]),
        "(f1 false)",
    );
}

#[test]
fn overlapping_ranges_or_merge() {
    check(
        Node::or(vec![i64_range(0, 15), i64_range(10, 30)]),
        "(f1 rg [0, 30])",
    );
    // at the unsigned domain minimum the merged range turns into <=
    check(
        Node::or(vec![u8_range(0, 15), u8_range(10, 30)]),
        "(f1 <= 30)",
    );
}

#[test]
fn disjoint_ranges_or_stay_separate() {
    check(
        Node::or(vec![i64_range(0, 10), i64_range(20, 30)]),
        "(f1 rg [0, 10] OR f1 rg [20, 30])",
    );
    check(
        Node::or(vec![u8_range(0, 10), u8_range(20, 30)]),
        "(f1 <= 10 OR f1 rg [20, 30])",
    );
}

#[test]
fn bool_range_rewrites() {
    // inverted range is dropped as false, the degenerate one becomes equal
    check(
        Node::or(vec![bool_range(true, false), bool_range(true, true)]),
        "(f1 = true)",
    );
    check(
        Node::or(vec![bool_range(false, true), bool_node(FilterMode::Equal, true)]),
        "(f1 true)",
    );
}

#[test]
fn exclusive_bounds_merge_to_inner_range() {
    check(
        Node::and(vec![
            i64_node(FilterMode::Gt, 0),
            i64_node(FilterMode::Lt, 100),
        ]),
        "(f1 rg [1, 99])",
    );
}

#[test]
fn inclusive_bounds_merge_to_range() {
    check(
        Node::and(vec![
            i64_node(FilterMode::Ge, 0),
            i64_node(FilterMode::Le, 100),
        ]),
        "(f1 rg [0, 100])",
    );
    // >= domain minimum is a tautology and falls away
    check(
        Node::and(vec![
            u8_node(FilterMode::Ge, 0),
            u8_node(FilterMode::Le, 100),
        ]),
        "(f1 <= 100)",
    );
}

#[test]
fn bool_inclusive_bounds_merge_to_equal() {
    check(
        Node::and(vec![
            bool_node(FilterMode::Ge, true),
            bool_node(FilterMode::Le, true),
        ]),
        "(f1 = true)",
    );
}

#[test]
fn negated_leaves_do_not_join_range_merging() {
    check(
        Node::and(vec![i64_range(1, 100), i64_node(FilterMode::NotEqual, 50)]),
        "(f1 != 50 AND f1 rg [1, 100])",
    );
    check(
        Node::or(vec![
            i64_range(0, 100),
            i64_node(FilterMode::NotEqual, 50),
            i64_range(40, 60),
        ]),
        "(f1 != 50 OR f1 rg [0, 100])",
    );
}

#[test]
fn equal_absorbs_looser_bound() {
    check(
        Node::and(vec![
            i64_node(FilterMode::Equal, 42),
            i64_node(FilterMode::Gt, 41),
        ]),
        "(f1 = 42)",
    );
}

#[test]
fn not_in_set_algebra() {
    check(
        Node::and(vec![i64_set(FilterMode::NotIn, vec![42])]),
        "(f1 != 42)",
    );
    check(
        Node::and(vec![
            i64_set(FilterMode::NotIn, vec![42]),
            i64_set(FilterMode::NotIn, vec![43]),
        ]),
        "(f1 !in [42, 43])",
    );
    check(
        Node::or(vec![
            i64_set(FilterMode::NotIn, vec![42, 43, 44]),
            i64_set(FilterMode::NotIn, vec![43, 44, 45]),
        ]),
        "(f1 !in [43, 44])",
    );
    check(
        Node::or(vec![
            i64_set(FilterMode::NotIn, vec![42, 43]),
            i64_set(FilterMode::NotIn, vec![43, 44, 45]),
        ]),
        "(f1 != 43)",
    );
}

#[test]
fn full_domain_not_in_is_contradiction() {
    check(
        Node::and(vec![bool_set(FilterMode::NotIn, vec![false, true])]),
        "(f1 false)",
    );
    check(
        Node::or(vec![
            bool_set(FilterMode::NotIn, vec![true]),
            bool_set(FilterMode::NotIn, vec![false]),
        ]),
        "(f1 true)",
    );
}

#[test]
fn expensive_leaves_sort_last() {
    let bytes = Field::new("f1", 1, BlockType::Bytes);
    check(
        Node::and(vec![
            node(&bytes, 0, FilterMode::Regexp, Value::from(".*").into()),
            node(&bytes, 0, FilterMode::Equal, Value::from("x").into()),
        ]),
        "(f1 = 'x' AND f1 ~ '.*')",
    );
}

#[test]
fn independent_columns_are_untouched() {
    let a = f1(BlockType::Int64);
    let b = Field::new("f2", 2, BlockType::Int64);
    check(
        Node::and(vec![
            node(&a, 0, FilterMode::Equal, Value::I64(1).into()),
            node(&b, 1, FilterMode::Equal, Value::I64(2).into()),
        ]),
        "(f1 = 1 AND f2 = 2)",
    );
}

#[test]
fn lifts_nested_same_kind_branches() {
    let mut tree = Node::and(vec![
        Node::and(vec![
            i64_node(FilterMode::Ge, 10),
            Node::and(vec![i64_node(FilterMode::Le, 20)]),
        ]),
        Node::or(vec![i64_node(FilterMode::Equal, 15)]),
    ]);
    tree.optimize();
    // nested branches flatten, then range and equal collapse
    assert_eq!(tree.to_string(), "(f1 = 15)");
}

#[test]
fn float_extremes_never_become_tautologies() {
    let f = Field::new("f1", 1, BlockType::Float64);
    let mut tree = Node::and(vec![
        node(&f, 0, FilterMode::Le, Value::F64(f64::INFINITY).into()),
        node(&f, 0, FilterMode::Ge, Value::F64(0.0).into()),
    ]);
    tree.optimize();
    // merged against the infinity sentinel, never collapsed to true
    assert_eq!(tree.to_string(), "(f1 >= 0)");
}

fn rand_leaf(rng: &mut fastrand::Rng, fields: &[Field]) -> Node {
    use FilterMode::*;
    let index = rng.usize(0..fields.len());
    let mode = [Equal, NotEqual, Gt, Ge, Lt, Le, Range, In, NotIn][rng.usize(0..9)];
    let value: FilterValue = match mode {
        Range => RangeValue::new(
            Value::I64(rng.i64(0..20)),
            Value::I64(rng.i64(0..20)),
        )
        .into(),
        In | NotIn => {
            let vals: Vec<i64> = (0..rng.usize(1..5)).map(|_| rng.i64(0..20)).collect();
            ValueSeq::from(vals).into()
        }
        _ => Value::I64(rng.i64(0..20)).into(),
    };
    node(&fields[index], index, mode, value)
}

fn rand_tree(rng: &mut fastrand::Rng, fields: &[Field]) -> Node {
    let mut children = Vec::new();
    for _ in 0..rng.usize(1..5) {
        if rng.bool() {
            let leaves = (0..rng.usize(2..4))
                .map(|_| rand_leaf(rng, fields))
                .collect();
            children.push(if rng.bool() {
                Node::or(leaves)
            } else {
                Node::and(leaves)
            });
        } else {
            children.push(rand_leaf(rng, fields));
        }
    }
    Node::and(children)
}

#[test]
fn randomized_rewrites_preserve_semantics() {
    const ROWS: u32 = 64;
    let mut rng = fastrand::Rng::with_seed(0x5eed_cafe);
    let fields = [
        Field::new("f1", 1, BlockType::Int64),
        Field::new("f2", 2, BlockType::Int64),
    ];
    let col = |rng: &mut fastrand::Rng| -> Vec<i64> {
        (0..ROWS).map(|_| rng.i64(0..20)).collect()
    };
    let pack = Pack::from_blocks(vec![Block::from(col(&mut rng)), Block::from(col(&mut rng))]);
    let stats = PackStats::collect(&pack);

    for round in 0..250 {
        let mut tree = rand_tree(&mut rng, &fields);
        let before = match_tree(&tree, &pack, None);
        assert_eq!(
            before,
            match_tree(&tree, &pack, Some(&stats)),
            "round {round}: stats shortcuts changed the result"
        );
        for row in 0..ROWS {
            assert_eq!(
                before.contains(row),
                match_at(&tree, &pack, row),
                "round {round} row {row}: vectorized and scalar paths disagree"
            );
        }

        tree.optimize();
        tree.validate("root").unwrap_or_else(|e| {
            panic!("round {round}: optimized tree invalid: {e} ({tree})")
        });
        assert_eq!(
            before,
            match_tree(&tree, &pack, None),
            "round {round}: rewrite changed semantics ({tree})"
        );
        assert_eq!(
            before,
            match_tree(&tree, &pack, Some(&stats)),
            "round {round}: rewrite with stats changed semantics ({tree})"
        );
    }
}
