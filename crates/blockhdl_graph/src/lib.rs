//! The block-diagram graph model for blockhdl.
//!
//! A model description ([`ModelDescription`]) is loaded into a mutable
//! [`BlockGraph`] of [`Block`]s, then reduced by [`simplify`] to the blocks
//! that will actually become hardware: splitters disappear and chains of
//! summations collapse into a single adder each.

#![warn(missing_docs)]

pub mod arena;
pub mod description;
pub mod error;
pub mod graph;
pub mod ids;
pub mod kind;
pub mod simplify;

pub use arena::{Arena, ArenaId};
pub use description::{BlockRecord, LinkRecord, ModelDescription, MODEL_INPUT, MODEL_OUTPUT};
pub use error::GraphError;
pub use graph::{Block, BlockGraph};
pub use ids::BlockId;
pub use kind::{BlockKind, UnknownKind};
pub use simplify::{simplify, SimplifyStats};
