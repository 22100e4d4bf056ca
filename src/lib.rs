//! Predicate evaluation core for columnar query engines.
//!
//! The crate covers the filter path of a column store: user conditions are
//! assembled into an AND/OR [`Condition`] tree, compiled against a
//! [`Schema`] into bound [`Node`] trees, rewritten by the symbolic
//! [`optimize`](Node::optimize) pass and finally evaluated against column
//! [`Block`]s into row [`Selection`] bitmaps. Per-column statistics drive
//! whole-pack skipping ([`maybe_match_tree`]) and per-child short-circuits
//! inside [`match_tree`].
//!
//! ```
//! use sift::{match_tree, Condition, Field, BlockType, Block, Pack, Schema};
//!
//! let schema = Schema::new(vec![Field::new("amount", 1, BlockType::Int64)]);
//! let pack = Pack::from_blocks(vec![Block::from(vec![10i64, 50, 90])]);
//!
//! let mut tree = Condition::and(vec![
//!     Condition::gt("amount", 10i64),
//!     Condition::le("amount", 60i64),
//! ])
//! .compile(&schema)?;
//! tree.optimize();
//!
//! let hits = match_tree(&tree, &pack, None);
//! assert_eq!(hits.iter().collect::<Vec<_>>(), vec![1]);
//! # Ok::<(), sift::FilterError>(())
//! ```

pub mod bitmap;
pub mod block;
pub mod condition;
pub mod error;
mod eval;
pub mod filter;
pub mod matcher;
mod node;
pub mod num;
mod optimize;
pub mod types;
pub mod value;

pub use crate::{
    bitmap::{Membership, Selection},
    block::{Block, BlockReader, CmpOp, EncodedColumn, NumColumn, Pack, PackStats, StatsReader},
    condition::Condition,
    error::FilterError,
    eval::{match_at, match_filter, match_tree, maybe_match_filter, maybe_match_tree},
    filter::{Field, Filter, Schema},
    matcher::{new_matcher, Matcher},
    node::Node,
    num::I256,
    types::{BlockType, FilterMode, BLOCK_TYPES},
    value::{FilterValue, RangeValue, Value, ValueSeq},
};
