pub mod bitmap;
pub mod connectivity;

pub use bitmap::{BitMap, BitOwnerKind, BitOwnerRef};
pub use connectivity::{BitId, Connectivity, NetId, UnionFind};
