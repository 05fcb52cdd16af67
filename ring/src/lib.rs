//! Weighted consistent hashing for routing string keys to named nodes.
//!
//! Each physical node is projected onto a circular `u128` hash space as
//! many virtual nodes (proportional to its weight), so membership changes
//! only remap the small slice of keys adjacent to the node that joined or
//! left. Lookups walk clockwise from the key's hash: [`HashRing::get_node`]
//! returns the nearest owner, [`HashRing::get_replicas`] keeps walking to
//! collect a deduplicated set of distinct physical nodes.
//!
//! [`HashRing`] is a plain single-threaded value; wrap it in [`SharedRing`]
//! when several threads route through one ring.

mod error;
mod hash;
mod ring;
mod shared;

pub use error::{Result, RingError};
pub use hash::position;
pub use ring::{HashRing, RingConfig};
pub use shared::SharedRing;
