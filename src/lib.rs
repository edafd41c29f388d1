//! Storage-memory core of an educational relational database.
//!
//! The crate mediates between a byte-addressable page store on disk and the
//! rest of the engine: a bounded pool of fixed-size page frames backed by a
//! background I/O worker, an LRU-K replacement policy, a scoped page-guard
//! protocol for pin/unpin discipline, and a copy-on-write trie that serves as
//! the primer for the persistent structures the index layers build on.

pub mod buffer;
pub mod index;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod tests;
