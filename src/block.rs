//! Column block boundary between the storage layer and the matchers.
//!
//! This module defines the narrow interface the evaluation core needs from a
//! columnar store: typed blocks of values, per-block statistics and optional
//! membership structures. Implementations live behind small traits so the
//! core stays independent of any concrete storage engine.

use std::fmt;

use roaring::RoaringTreemap;

use crate::{
    bitmap::{Membership, Selection},
    num::I256,
    types::BlockType,
    value::{SeqValue, Value},
};

/// Comparison kernels an encoded column must answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CmpOp {
    fn test<T: PartialOrd>(self, v: T, value: T) -> bool {
        match self {
            Self::Eq => v == value,
            Self::Ne => v != value,
            Self::Gt => v > value,
            Self::Ge => v >= value,
            Self::Lt => v < value,
            Self::Le => v <= value,
        }
    }
}

/// Escape hatch for compressed numeric blocks.
///
/// The default kernels decode point-wise through [`get`](Self::get);
/// implementations override them when the encoding admits a faster path
/// (dictionary, run-length, bit-packed, ...).
pub trait EncodedColumn<T: Copy + PartialOrd>: Send + Sync {
    /// Number of rows in the block.
    fn len(&self) -> usize;

    /// True when the block holds no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes the value at `row`.
    fn get(&self, row: usize) -> T;

    /// Sets `bits` for rows where `row op value` holds. Only positions set
    /// in `mask` are probed; positions outside it are left untouched.
    fn match_cmp(&self, op: CmpOp, value: T, bits: &mut Selection, mask: Option<&Selection>) {
        match mask {
            Some(mask) => {
                for row in mask.iter() {
                    if op.test(self.get(row as usize), value) {
                        bits.set(row);
                    }
                }
            }
            None => {
                for row in 0..self.len() {
                    if op.test(self.get(row), value) {
                        bits.set(row as u32);
                    }
                }
            }
        }
    }

    /// Sets `bits` for rows inside the inclusive range `[from, to]`.
    fn match_between(&self, from: T, to: T, bits: &mut Selection, mask: Option<&Selection>) {
        match mask {
            Some(mask) => {
                for row in mask.iter() {
                    let v = self.get(row as usize);
                    if v >= from && v <= to {
                        bits.set(row);
                    }
                }
            }
            None => {
                for row in 0..self.len() {
                    let v = self.get(row);
                    if v >= from && v <= to {
                        bits.set(row as u32);
                    }
                }
            }
        }
    }
}

/// Numeric column, either fully materialized or behind an encoding.
pub enum NumColumn<T: Copy + PartialOrd> {
    Materialized(Vec<T>),
    Encoded(Box<dyn EncodedColumn<T>>),
}

impl<T: Copy + PartialOrd> NumColumn<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Materialized(v) => v.len(),
            Self::Encoded(c) => c.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, row: usize) -> T {
        match self {
            Self::Materialized(v) => v[row],
            Self::Encoded(c) => c.get(row),
        }
    }

    /// Vectorized comparison against a scalar.
    pub fn match_cmp(&self, op: CmpOp, value: T, bits: &mut Selection, mask: Option<&Selection>) {
        match self {
            Self::Materialized(v) => scan(v, bits, mask, |x| op.test(x, value)),
            Self::Encoded(c) => c.match_cmp(op, value, bits, mask),
        }
    }

    /// Vectorized inclusive range test.
    pub fn match_between(&self, from: T, to: T, bits: &mut Selection, mask: Option<&Selection>) {
        match self {
            Self::Materialized(v) => scan(v, bits, mask, |x| x >= from && x <= to),
            Self::Encoded(c) => c.match_between(from, to, bits, mask),
        }
    }

    /// Vectorized scan with an arbitrary row predicate; decodes point-wise
    /// for encoded blocks.
    pub fn match_with(
        &self,
        bits: &mut Selection,
        mask: Option<&Selection>,
        pred: impl Fn(T) -> bool,
    ) {
        match self {
            Self::Materialized(v) => scan(v, bits, mask, pred),
            Self::Encoded(c) => match mask {
                Some(mask) => {
                    for row in mask.iter() {
                        if pred(c.get(row as usize)) {
                            bits.set(row);
                        }
                    }
                }
                None => {
                    for row in 0..c.len() {
                        if pred(c.get(row)) {
                            bits.set(row as u32);
                        }
                    }
                }
            },
        }
    }
}

fn scan<T: Copy>(
    values: &[T],
    bits: &mut Selection,
    mask: Option<&Selection>,
    pred: impl Fn(T) -> bool,
) {
    match mask {
        Some(mask) => {
            for row in mask.iter() {
                if pred(values[row as usize]) {
                    bits.set(row);
                }
            }
        }
        None => {
            for (row, v) in values.iter().enumerate() {
                if pred(*v) {
                    bits.set(row as u32);
                }
            }
        }
    }
}

impl<T: Copy + PartialOrd> fmt::Debug for NumColumn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Materialized(v) => write!(f, "Materialized(len={})", v.len()),
            Self::Encoded(c) => write!(f, "Encoded(len={})", c.len()),
        }
    }
}

/// One column block of a pack.
///
/// Bool columns are bit vectors; bytes columns are materialized. Numeric
/// columns may additionally sit behind an [`EncodedColumn`].
#[derive(Debug)]
pub enum Block {
    Int64(NumColumn<i64>),
    Int32(NumColumn<i32>),
    Int16(NumColumn<i16>),
    Int8(NumColumn<i8>),
    Uint64(NumColumn<u64>),
    Uint32(NumColumn<u32>),
    Uint16(NumColumn<u16>),
    Uint8(NumColumn<u8>),
    Float64(NumColumn<f64>),
    Float32(NumColumn<f32>),
    Bool(Selection),
    Bytes(Vec<Vec<u8>>),
    Int128(NumColumn<i128>),
    Int256(NumColumn<I256>),
}

macro_rules! block_each_num {
    ($self:expr, |$c:ident| $body:expr, |$b:ident| $bool_body:expr, |$s:ident| $bytes_body:expr) => {
        match $self {
            Block::Int64($c) => $body,
            Block::Int32($c) => $body,
            Block::Int16($c) => $body,
            Block::Int8($c) => $body,
            Block::Uint64($c) => $body,
            Block::Uint32($c) => $body,
            Block::Uint16($c) => $body,
            Block::Uint8($c) => $body,
            Block::Float64($c) => $body,
            Block::Float32($c) => $body,
            Block::Int128($c) => $body,
            Block::Int256($c) => $body,
            Block::Bool($b) => $bool_body,
            Block::Bytes($s) => $bytes_body,
        }
    };
}

impl Block {
    /// Domain of this block.
    #[must_use]
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Int64(_) => BlockType::Int64,
            Self::Int32(_) => BlockType::Int32,
            Self::Int16(_) => BlockType::Int16,
            Self::Int8(_) => BlockType::Int8,
            Self::Uint64(_) => BlockType::Uint64,
            Self::Uint32(_) => BlockType::Uint32,
            Self::Uint16(_) => BlockType::Uint16,
            Self::Uint8(_) => BlockType::Uint8,
            Self::Float64(_) => BlockType::Float64,
            Self::Float32(_) => BlockType::Float32,
            Self::Bool(_) => BlockType::Bool,
            Self::Bytes(_) => BlockType::Bytes,
            Self::Int128(_) => BlockType::Int128,
            Self::Int256(_) => BlockType::Int256,
        }
    }

    /// Number of rows in the block.
    #[must_use]
    pub fn len(&self) -> usize {
        block_each_num!(self, |c| c.len(), |b| b.len() as usize, |s| s.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point accessor; used by the single-row evaluator and by tests.
    #[must_use]
    pub fn value_at(&self, row: usize) -> Value {
        block_each_num!(
            self,
            |c| c.get(row).into_value(),
            |b| Value::Bool(b.contains(row as u32)),
            |s| Value::Bytes(s[row].clone())
        )
    }

    /// Smallest and largest value in the block under total order, or `None`
    /// for empty blocks.
    #[must_use]
    pub fn min_max(&self) -> Option<(Value, Value)> {
        block_each_num!(
            self,
            |c| num_min_max(c),
            |b| {
                if b.is_empty() {
                    None
                } else {
                    let ones = b.count();
                    let min = ones != u64::from(b.len());
                    let max = ones > 0;
                    Some((Value::Bool(!min), Value::Bool(max)))
                }
            },
            |s| {
                let min = s.iter().min()?;
                let max = s.iter().max()?;
                Some((Value::Bytes(min.clone()), Value::Bytes(max.clone())))
            }
        )
    }
}

fn num_min_max<T: SeqValue + Copy + PartialOrd>(col: &NumColumn<T>) -> Option<(Value, Value)> {
    if col.is_empty() {
        return None;
    }
    let mut min = col.get(0);
    let mut max = min;
    for row in 1..col.len() {
        let v = col.get(row);
        if v.cmp_total(&min).is_lt() {
            min = v;
        }
        if v.cmp_total(&max).is_gt() {
            max = v;
        }
    }
    Some((min.into_value(), max.into_value()))
}

macro_rules! block_from {
    ($variant:ident, $ty:ty) => {
        impl From<Vec<$ty>> for Block {
            fn from(v: Vec<$ty>) -> Self {
                Self::$variant(NumColumn::Materialized(v))
            }
        }
    };
}

block_from!(Int64, i64);
block_from!(Int32, i32);
block_from!(Int16, i16);
block_from!(Int8, i8);
block_from!(Uint64, u64);
block_from!(Uint32, u32);
block_from!(Uint16, u16);
block_from!(Uint8, u8);
block_from!(Float64, f64);
block_from!(Float32, f32);
block_from!(Int128, i128);
block_from!(Int256, I256);

impl From<Vec<bool>> for Block {
    fn from(v: Vec<bool>) -> Self {
        let mut bits = Selection::new(v.len() as u32);
        for (row, b) in v.iter().enumerate() {
            if *b {
                bits.set(row as u32);
            }
        }
        Self::Bool(bits)
    }
}

impl From<Vec<Vec<u8>>> for Block {
    fn from(v: Vec<Vec<u8>>) -> Self {
        Self::Bytes(v)
    }
}

/// Read access to the blocks of one pack.
pub trait BlockReader {
    /// Number of rows shared by every block.
    fn rows(&self) -> u32;

    /// Block at column position `index`.
    fn column(&self, index: usize) -> &Block;
}

/// Per-column statistics used for block skipping and short-circuiting.
///
/// Conservative answers (`None`) are always safe and simply disable the
/// corresponding shortcut.
pub trait StatsReader {
    /// Minimum and maximum value stored in the column, if known.
    fn min_max(&self, column: usize) -> Option<(Value, Value)>;

    /// Optional membership structure over the column's
    /// [`filter_key`](Value::filter_key) space.
    fn membership(&self, _column: usize) -> Option<&dyn Membership> {
        None
    }
}

/// Owned pack of blocks; the trivial [`BlockReader`].
#[derive(Debug, Default)]
pub struct Pack {
    rows: u32,
    blocks: Vec<Block>,
}

impl Pack {
    /// Builds a pack from blocks of equal length.
    #[must_use]
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let rows = blocks.first().map_or(0, |b| b.len() as u32);
        debug_assert!(blocks.iter().all(|b| b.len() as u32 == rows));
        Self { rows, blocks }
    }

    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

impl BlockReader for Pack {
    fn rows(&self) -> u32 {
        self.rows
    }

    fn column(&self, index: usize) -> &Block {
        &self.blocks[index]
    }
}

/// Eagerly collected per-pack statistics; the trivial [`StatsReader`].
#[derive(Debug, Default)]
pub struct PackStats {
    ranges: Vec<Option<(Value, Value)>>,
    members: Vec<Option<RoaringTreemap>>,
}

impl PackStats {
    /// Scans every block of `pack` and records min/max plus an exact
    /// membership bitmap for domains that have filter keys.
    #[must_use]
    pub fn collect(pack: &Pack) -> Self {
        let mut ranges = Vec::with_capacity(pack.blocks.len());
        let mut members = Vec::with_capacity(pack.blocks.len());
        for block in &pack.blocks {
            ranges.push(block.min_max());
            let mut set = RoaringTreemap::new();
            let mut keyed = block.len() > 0;
            for row in 0..block.len() {
                match block.value_at(row).filter_key() {
                    Some(key) => {
                        set.insert(key);
                    }
                    None => {
                        keyed = false;
                        break;
                    }
                }
            }
            members.push(keyed.then_some(set));
        }
        Self { ranges, members }
    }
}

impl StatsReader for PackStats {
    fn min_max(&self, column: usize) -> Option<(Value, Value)> {
        self.ranges.get(column)?.clone()
    }

    fn membership(&self, column: usize) -> Option<&dyn Membership> {
        match self.members.get(column)? {
            Some(set) => Some(set),
            None => None,
        }
    }
}
