//! Shared infrastructure: the node arena, bit sets and graph algorithms.

mod arena;
mod bitset;
pub mod graph;

pub use arena::{Arena, ArenaIndex};
pub use bitset::BitSet;
