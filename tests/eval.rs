//! End-to-end evaluation: condition building, compilation, optimization and
//! matching against packs of mixed column domains.

use std::cmp::Ordering;

use sift::{
    match_at, match_tree, maybe_match_tree, Block, BlockReader, BlockType, CmpOp, Condition,
    EncodedColumn, Field, Filter, FilterMode, Node, NumColumn, Pack, PackStats, RangeValue,
    Schema, Selection, Value, ValueSeq, I256, BLOCK_TYPES,
};

fn schema() -> Schema {
    Schema::new(vec![
        Field::new("amount", 1, BlockType::Int64),
        Field::new("name", 2, BlockType::Bytes),
        Field::new("active", 3, BlockType::Bool),
        Field::new("score", 4, BlockType::Float64),
    ])
}

fn pack() -> Pack {
    Pack::from_blocks(vec![
        Block::from(vec![10i64, -3, 42, 7, 42, 0]),
        Block::from(vec![
            b"alpha".to_vec(),
            b"beta".to_vec(),
            b"gamma".to_vec(),
            b"beta".to_vec(),
            b"delta".to_vec(),
            b"".to_vec(),
        ]),
        Block::from(vec![true, false, true, true, false, false]),
        Block::from(vec![0.5f64, -1.0, f64::NAN, 2.5, 0.0, 9.75]),
    ])
}

fn rows(bits: &Selection) -> Vec<u32> {
    bits.iter().collect()
}

fn verify_against_oracle(tree: &Node, pack: &Pack) {
    let bits = match_tree(tree, pack, None);
    for row in 0..pack.rows() {
        assert_eq!(
            bits.contains(row),
            match_at(tree, pack, row),
            "row {row} of {tree}"
        );
    }
}

#[test]
fn pipeline_across_domains() {
    let p = pack();
    let stats = PackStats::collect(&p);
    let mut tree = Condition::and(vec![
        Condition::ge("amount", 0i64),
        Condition::or(vec![
            Condition::regexp("name", "^[bd]"),
            Condition::equal("active", true),
        ]),
    ])
    .compile(&schema())
    .unwrap();
    tree.optimize();

    let hits = match_tree(&tree, &p, Some(&stats));
    assert_eq!(rows(&hits), vec![0, 2, 3, 4]);
    assert_eq!(hits, match_tree(&tree, &p, None));
    verify_against_oracle(&tree, &p);
}

#[test]
fn float_predicates_exclude_nan() {
    let p = pack();
    let le = Condition::le("score", 10.0f64).compile(&schema()).unwrap();
    // NaN at row 2 fails every comparison
    assert_eq!(rows(&match_tree(&le, &p, None)), vec![0, 1, 3, 4, 5]);
    verify_against_oracle(&le, &p);

    let mut tree = Condition::and(vec![
        Condition::ge("score", -100.0f64),
        Condition::le("score", 100.0f64),
    ])
    .compile(&schema())
    .unwrap();
    tree.optimize();
    let bits = match_tree(&tree, &p, None);
    assert!(!bits.contains(2), "optimizer must not select the NaN row");
    verify_against_oracle(&tree, &p);
}

#[test]
fn bytes_and_set_predicates() {
    let p = pack();
    let tree = Condition::or(vec![
        Condition::in_("name", vec![b"beta".to_vec(), b"delta".to_vec()]),
        Condition::gt("name", "f"),
    ])
    .compile(&schema())
    .unwrap();
    assert_eq!(rows(&match_tree(&tree, &p, None)), vec![1, 2, 3, 4]);
    verify_against_oracle(&tree, &p);
}

#[test]
fn or_mask_excludes_already_selected_rows() {
    // both children match overlapping row sets, the union must still be exact
    let p = pack();
    let tree = Condition::or(vec![
        Condition::ge("amount", 7i64),
        Condition::equal("amount", 42i64),
    ])
    .compile(&schema())
    .unwrap();
    assert_eq!(rows(&match_tree(&tree, &p, None)), vec![0, 2, 3, 4]);
    verify_against_oracle(&tree, &p);
}

#[test]
fn stats_prune_whole_packs() {
    let p = pack();
    let stats = PackStats::collect(&p);
    let schema = schema();

    let miss = Condition::equal("amount", 1000i64).compile(&schema).unwrap();
    assert!(!maybe_match_tree(&miss, &stats));

    // inside min/max but absent from the column, membership prunes it
    let gap = Condition::equal("amount", 5i64).compile(&schema).unwrap();
    assert!(!maybe_match_tree(&gap, &stats));

    let hit = Condition::equal("amount", 42i64).compile(&schema).unwrap();
    assert!(maybe_match_tree(&hit, &stats));

    // an AND with one impossible leaf prunes the pack
    let and = Condition::and(vec![
        Condition::equal("active", true),
        Condition::gt("amount", 1000i64),
    ])
    .compile(&schema)
    .unwrap();
    assert!(!maybe_match_tree(&and, &stats));
}

struct DeltaColumn {
    base: i64,
    deltas: Vec<i64>,
}

impl EncodedColumn<i64> for DeltaColumn {
    fn len(&self) -> usize {
        self.deltas.len()
    }

    fn get(&self, row: usize) -> i64 {
        self.base + self.deltas[row]
    }
}

#[test]
fn encoded_and_materialized_columns_agree() {
    let values = vec![10i64, -3, 42, 7, 42, 0];
    let deltas: Vec<i64> = values.iter().map(|v| v - 5).collect();
    let plain = Pack::from_blocks(vec![Block::from(values)]);
    let encoded = Pack::from_blocks(vec![Block::Int64(NumColumn::Encoded(Box::new(
        DeltaColumn { base: 5, deltas },
    )))]);

    let field = Field::new("amount", 1, BlockType::Int64);
    for (mode, v) in [
        (FilterMode::Equal, 42i64),
        (FilterMode::NotEqual, 42),
        (FilterMode::Gt, 7),
        (FilterMode::Le, 9),
    ] {
        let tree = Node::leaf(Filter::new(&field, 0, mode, Value::I64(v).into()).unwrap());
        assert_eq!(
            match_tree(&tree, &plain, None),
            match_tree(&tree, &encoded, None),
            "{tree}"
        );
    }
}

#[test]
fn encoded_column_override_matches_default() {
    struct Shifted(Vec<i64>);

    impl EncodedColumn<i64> for Shifted {
        fn len(&self) -> usize {
            self.0.len()
        }

        fn get(&self, row: usize) -> i64 {
            self.0[row] + 1
        }

        fn match_cmp(
            &self,
            op: CmpOp,
            value: i64,
            bits: &mut Selection,
            mask: Option<&Selection>,
        ) {
            // fast path answered without decoding row by row
            match mask {
                Some(mask) => {
                    for row in mask.iter() {
                        if cmp(op, self.0[row as usize] + 1, value) {
                            bits.set(row);
                        }
                    }
                }
                None => {
                    for (row, v) in self.0.iter().enumerate() {
                        if cmp(op, v + 1, value) {
                            bits.set(row as u32);
                        }
                    }
                }
            }
        }
    }

    fn cmp(op: CmpOp, a: i64, b: i64) -> bool {
        match op {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
        }
    }

    let raw = vec![1i64, 41, 7, 41];
    let decoded: Vec<i64> = raw.iter().map(|v| v + 1).collect();
    let encoded = Pack::from_blocks(vec![Block::Int64(NumColumn::Encoded(Box::new(Shifted(
        raw,
    ))))]);
    let plain = Pack::from_blocks(vec![Block::from(decoded)]);

    let field = Field::new("amount", 1, BlockType::Int64);
    let tree = Node::leaf(Filter::new(&field, 0, FilterMode::Equal, Value::I64(42).into()).unwrap());
    assert_eq!(
        rows(&match_tree(&tree, &encoded, None)),
        rows(&match_tree(&tree, &plain, None))
    );
    assert_eq!(rows(&match_tree(&tree, &encoded, None)), vec![1, 3]);
}

/// Sample rows for one domain: both extremes plus interior values, and NaN
/// for the float domains.
fn domain_fixture(typ: BlockType) -> (Vec<Value>, Block) {
    macro_rules! fx {
        ($variant:ident, $vals:expr) => {{
            let v = $vals;
            let values = v.iter().map(|x| Value::$variant(x.clone())).collect();
            (values, Block::from(v))
        }};
    }
    match typ {
        BlockType::Int64 => fx!(I64, vec![i64::MIN, -3, 0, 7, i64::MAX]),
        BlockType::Int32 => fx!(I32, vec![i32::MIN, -3, 0, 7, i32::MAX]),
        BlockType::Int16 => fx!(I16, vec![i16::MIN, -3, 0, 7, i16::MAX]),
        BlockType::Int8 => fx!(I8, vec![i8::MIN, -3, 0, 7, i8::MAX]),
        BlockType::Uint64 => fx!(U64, vec![0u64, 1, 7, 100, u64::MAX]),
        BlockType::Uint32 => fx!(U32, vec![0u32, 1, 7, 100, u32::MAX]),
        BlockType::Uint16 => fx!(U16, vec![0u16, 1, 7, 100, u16::MAX]),
        BlockType::Uint8 => fx!(U8, vec![0u8, 1, 7, 100, u8::MAX]),
        BlockType::Float64 => fx!(
            F64,
            vec![f64::NEG_INFINITY, -1.5, 0.0, 2.5, f64::INFINITY, f64::NAN]
        ),
        BlockType::Float32 => fx!(
            F32,
            vec![f32::NEG_INFINITY, -1.5, 0.0, 2.5, f32::INFINITY, f32::NAN]
        ),
        BlockType::Bool => fx!(Bool, vec![false, true]),
        BlockType::Bytes => fx!(
            Bytes,
            vec![b"".to_vec(), b"a".to_vec(), b"ab".to_vec(), b"zz".to_vec()]
        ),
        BlockType::Int128 => fx!(I128, vec![i128::MIN, -3, 0, 7, i128::MAX]),
        BlockType::Int256 => fx!(
            I256,
            vec![
                I256::MIN,
                I256::from(-3i128),
                I256::ZERO,
                I256::from(7i128),
                I256::MAX
            ]
        ),
    }
}

fn brute_scalar(mode: FilterMode, v: &Value, lit: &Value) -> bool {
    let cmp = v.compare(lit);
    match mode {
        FilterMode::Equal => cmp == Some(Ordering::Equal),
        FilterMode::NotEqual => cmp != Some(Ordering::Equal),
        FilterMode::Gt => cmp == Some(Ordering::Greater),
        FilterMode::Ge => matches!(cmp, Some(Ordering::Greater | Ordering::Equal)),
        FilterMode::Lt => cmp == Some(Ordering::Less),
        FilterMode::Le => matches!(cmp, Some(Ordering::Less | Ordering::Equal)),
        _ => unreachable!("not a scalar mode: {mode}"),
    }
}

fn assert_filter_agrees(f: &Filter, pack: &Pack, values: &[Value], want: impl Fn(&Value) -> bool) {
    let bits = match_tree(&Node::leaf(f.as_filter(f.mode(), f.value().clone())), pack, None);
    for (row, v) in values.iter().enumerate() {
        assert_eq!(
            bits.contains(row as u32),
            want(v),
            "{f} row {row} ({v})"
        );
        assert_eq!(f.matcher().match_value(v), want(v), "{f} point probe ({v})");
        // a matching point must survive the degenerate range probe
        if f.matcher().match_value(v) {
            assert!(f.matcher().match_range(v, v), "{f} range identity ({v})");
        }
    }
}

#[test]
fn matcher_modes_agree_with_brute_force_across_domains() {
    let scalar_modes = [
        FilterMode::Equal,
        FilterMode::NotEqual,
        FilterMode::Gt,
        FilterMode::Ge,
        FilterMode::Lt,
        FilterMode::Le,
    ];
    for typ in BLOCK_TYPES {
        let (values, block) = domain_fixture(typ);
        let pack = Pack::from_blocks(vec![block]);
        let field = Field::new("col", 1, typ);

        for mode in scalar_modes {
            for lit in &values {
                let f = Filter::new(&field, 0, mode, lit.clone().into()).unwrap();
                assert_filter_agrees(&f, &pack, &values, |v| brute_scalar(mode, v, lit));
            }
        }

        // interior pair for range and set literals; NaN compares to nothing
        // and is excluded
        let ordered: Vec<&Value> = values.iter().filter(|v| v.compare(v).is_some()).collect();
        let (lo, hi) = (ordered[1].clone(), ordered[ordered.len() - 2].clone());
        let (lo, hi) = if lo.compare(&hi) == Some(Ordering::Greater) {
            (hi, lo)
        } else {
            (lo, hi)
        };

        let rg = Filter::new(
            &field,
            0,
            FilterMode::Range,
            RangeValue::new(lo.clone(), hi.clone()).into(),
        )
        .unwrap();
        assert_filter_agrees(&rg, &pack, &values, |v| {
            matches!(v.compare(&lo), Some(Ordering::Greater | Ordering::Equal))
                && matches!(v.compare(&hi), Some(Ordering::Less | Ordering::Equal))
        });

        let mut seq = ValueSeq::empty(typ);
        seq.push(&lo);
        seq.push(&hi);
        seq.sort_unique();
        let in_set = |v: &Value| {
            v.compare(&lo) == Some(Ordering::Equal) || v.compare(&hi) == Some(Ordering::Equal)
        };
        let ins = Filter::new(&field, 0, FilterMode::In, seq.clone().into()).unwrap();
        assert_filter_agrees(&ins, &pack, &values, in_set);
        let nis = Filter::new(&field, 0, FilterMode::NotIn, seq.into()).unwrap();
        assert_filter_agrees(&nis, &pack, &values, |v| !in_set(v));
    }
}

#[test]
fn derivative_filters_evaluate_like_originals() {
    let p = pack();
    let field = Field::new("amount", 1, BlockType::Int64);
    let base = Filter::new(&field, 0, FilterMode::Equal, Value::I64(42).into()).unwrap();

    let again = base.as_filter(FilterMode::Equal, Value::I64(42).into());
    let a = match_tree(&Node::leaf(base), &p, None);
    let b = match_tree(&Node::leaf(again), &p, None);
    assert_eq!(a, b);
}
